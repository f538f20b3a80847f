//! Static HTML generation for crawlers
//!
//! Each page is a complete HTML document with meta description, Open
//! Graph and Twitter Card tags, and a schema.org JSON-LD block. All user
//! content is escaped; the JSON-LD object is built as a
//! `serde_json::Value` and serialized, so it needs no manual escaping.

use serde_json::json;

use crate::models::{Article, Category, Episode};
use crate::seo::text::{
    escape_html, keywords, reading_time_minutes, strip_markup, truncate_description,
    DESCRIPTION_MAX_LEN,
};

/// Site-wide values shared by every rendered page
#[derive(Debug, Clone)]
pub struct SiteContext {
    /// Site name (settings table)
    pub name: String,
    /// Site description (settings table)
    pub description: String,
    /// Absolute base URL without a trailing slash
    pub base_url: String,
}

/// Serialize a JSON-LD value for embedding in a `<script>` block.
///
/// `<` is escaped as a unicode escape so user content can never close
/// the script element.
fn json_ld_string(value: &serde_json::Value) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "{}".to_string())
        .replace('<', "\\u003c")
}

/// Render a news article page for crawlers
pub fn article_page(
    article: &Article,
    categories: &[Category],
    author_name: &str,
    site: &SiteContext,
) -> String {
    let url = format!("{}/news/{}", site.base_url, article.id);
    let source = if article.summary.trim().is_empty() {
        article.content.as_str()
    } else {
        article.summary.as_str()
    };
    let description = truncate_description(&strip_markup(source), DESCRIPTION_MAX_LEN);
    let category_names: Vec<String> = categories.iter().map(|c| c.name.clone()).collect();
    let keyword_list = keywords(&category_names);
    let reading_minutes = reading_time_minutes(&article.content);

    let published = article
        .published_at
        .map(|d| d.to_rfc3339())
        .unwrap_or_default();
    let modified = article.updated_at.to_rfc3339();

    let json_ld = json!({
        "@context": "https://schema.org",
        "@type": "NewsArticle",
        "headline": article.title,
        "description": description,
        "url": url,
        "datePublished": published,
        "dateModified": modified,
        "author": {
            "@type": "Person",
            "name": author_name,
        },
        "publisher": {
            "@type": "Organization",
            "name": site.name,
            "url": site.base_url,
        },
        "image": article.cover_image,
        "articleSection": category_names,
        "keywords": keyword_list,
        "timeRequired": format!("PT{}M", reading_minutes),
    });

    let cover_meta = article
        .cover_image
        .as_deref()
        .map(|img| {
            format!(
                "<meta property=\"og:image\" content=\"{}\">\n<meta name=\"twitter:image\" content=\"{}\">\n",
                escape_html(img),
                escape_html(img)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} - {site_name}</title>
<meta name="description" content="{description}">
<meta name="keywords" content="{keywords}">
<link rel="canonical" href="{url}">
<meta property="og:type" content="article">
<meta property="og:title" content="{title}">
<meta property="og:description" content="{description}">
<meta property="og:url" content="{url}">
<meta property="og:site_name" content="{site_name}">
<meta property="article:published_time" content="{published}">
<meta name="twitter:card" content="summary_large_image">
<meta name="twitter:title" content="{title}">
<meta name="twitter:description" content="{description}">
{cover_meta}<script type="application/ld+json">{json_ld}</script>
</head>
<body>
<article>
<h1>{title}</h1>
<p class="byline">By {author} · {reading_minutes} min read</p>
{body}
</article>
</body>
</html>
"#,
        title = escape_html(&article.title),
        site_name = escape_html(&site.name),
        description = escape_html(&description),
        keywords = escape_html(&keyword_list),
        url = escape_html(&url),
        published = escape_html(&published),
        cover_meta = cover_meta,
        json_ld = json_ld_string(&json_ld),
        author = escape_html(author_name),
        reading_minutes = reading_minutes,
        body = escape_html(&strip_markup(&article.content)),
    )
}

/// Render a podcast episode page for crawlers
pub fn episode_page(episode: &Episode, categories: &[Category], site: &SiteContext) -> String {
    let url = format!("{}/podcasts/{}", site.base_url, episode.id);
    let description = truncate_description(&strip_markup(&episode.description), DESCRIPTION_MAX_LEN);
    let category_names: Vec<String> = categories.iter().map(|c| c.name.clone()).collect();
    let keyword_list = keywords(&category_names);

    let published = episode
        .published_at
        .map(|d| d.to_rfc3339())
        .unwrap_or_default();

    let json_ld = json!({
        "@context": "https://schema.org",
        "@type": "PodcastEpisode",
        "name": episode.title,
        "description": description,
        "url": url,
        "episodeNumber": episode.episode_number,
        "datePublished": published,
        "timeRequired": episode.iso_duration(),
        "associatedMedia": {
            "@type": "MediaObject",
            "contentUrl": episode.audio_url,
        },
        "partOfSeries": {
            "@type": "PodcastSeries",
            "name": site.name,
            "url": format!("{}/podcasts", site.base_url),
        },
        "keywords": keyword_list,
    });

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} - {site_name}</title>
<meta name="description" content="{description}">
<meta name="keywords" content="{keywords}">
<link rel="canonical" href="{url}">
<meta property="og:type" content="music.song">
<meta property="og:title" content="{title}">
<meta property="og:description" content="{description}">
<meta property="og:url" content="{url}">
<meta property="og:site_name" content="{site_name}">
<meta property="og:audio" content="{audio_url}">
<meta name="twitter:card" content="summary">
<meta name="twitter:title" content="{title}">
<meta name="twitter:description" content="{description}">
<script type="application/ld+json">{json_ld}</script>
</head>
<body>
<article>
<h1>Episode {number}: {title}</h1>
<p class="byline">Hosted by {host}</p>
<p>{body}</p>
<audio controls src="{audio_url}"></audio>
</article>
</body>
</html>
"#,
        title = escape_html(&episode.title),
        site_name = escape_html(&site.name),
        description = escape_html(&description),
        keywords = escape_html(&keyword_list),
        url = escape_html(&url),
        audio_url = escape_html(&episode.audio_url),
        json_ld = json_ld_string(&json_ld),
        number = episode.episode_number,
        host = escape_html(&episode.host_name),
        body = escape_html(&strip_markup(&episode.description)),
    )
}

/// Render the podcast index page for crawlers
pub fn episode_index_page(episodes: &[Episode], site: &SiteContext) -> String {
    let url = format!("{}/podcasts", site.base_url);
    let description = truncate_description(&strip_markup(&site.description), DESCRIPTION_MAX_LEN);

    let items: Vec<serde_json::Value> = episodes
        .iter()
        .enumerate()
        .map(|(i, e)| {
            json!({
                "@type": "ListItem",
                "position": i + 1,
                "name": e.title,
                "url": format!("{}/podcasts/{}", site.base_url, e.id),
            })
        })
        .collect();

    let json_ld = json!({
        "@context": "https://schema.org",
        "@type": "ItemList",
        "name": format!("{} Podcast", site.name),
        "url": url,
        "numberOfItems": episodes.len(),
        "itemListElement": items,
    });

    let listing: String = episodes
        .iter()
        .map(|e| {
            format!(
                "<li><a href=\"{}/podcasts/{}\">Episode {}: {}</a></li>\n",
                escape_html(&site.base_url),
                e.id,
                e.episode_number,
                escape_html(&e.title)
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Podcast - {site_name}</title>
<meta name="description" content="{description}">
<link rel="canonical" href="{url}">
<meta property="og:type" content="website">
<meta property="og:title" content="Podcast - {site_name}">
<meta property="og:description" content="{description}">
<meta property="og:url" content="{url}">
<meta name="twitter:card" content="summary">
<script type="application/ld+json">{json_ld}</script>
</head>
<body>
<h1>{site_name} Podcast</h1>
<ul>
{listing}</ul>
</body>
</html>
"#,
        site_name = escape_html(&site.name),
        description = escape_html(&description),
        url = escape_html(&url),
        json_ld = json_ld_string(&json_ld),
        listing = listing,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ArticleStatus;
    use chrono::Utc;

    fn site() -> SiteContext {
        SiteContext {
            name: "The Digital Ledger".into(),
            description: "News for the finance community".into(),
            base_url: "https://ledger.example.com".into(),
        }
    }

    fn article() -> Article {
        Article {
            id: 7,
            slug: "q3-results".into(),
            title: "Q3 results & what's next".into(),
            summary: "Revenue grew. Margins held steady across the board.".into(),
            content: "## Details\n\nRevenue grew by 12% in the third quarter.".into(),
            content_html: "<h2>Details</h2>".into(),
            cover_image: Some("https://cdn.example.com/q3.png".into()),
            author_id: 1,
            status: ArticleStatus::Published,
            published_at: Some(Utc::now()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            view_count: 0,
        }
    }

    fn episode() -> Episode {
        Episode {
            id: 3,
            slug: "ep-3".into(),
            title: "Talking <audits>".into(),
            description: "A deep dive into audit season.".into(),
            audio_url: "https://cdn.example.com/ep3.mp3".into(),
            duration_seconds: 1800,
            episode_number: 3,
            host_name: "Jordan".into(),
            status: ArticleStatus::Published,
            published_at: Some(Utc::now()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn extract_json_ld(html: &str) -> serde_json::Value {
        let start = html.find(r#"<script type="application/ld+json">"#).unwrap()
            + r#"<script type="application/ld+json">"#.len();
        let end = html[start..].find("</script>").unwrap() + start;
        serde_json::from_str(&html[start..end]).expect("JSON-LD must parse")
    }

    #[test]
    fn test_article_page_has_parseable_news_article_json_ld() {
        let html = article_page(&article(), &[], "pat", &site());
        let json_ld = extract_json_ld(&html);
        assert_eq!(json_ld["@type"], "NewsArticle");
        assert_eq!(json_ld["headline"], "Q3 results & what's next");
        assert_eq!(json_ld["author"]["name"], "pat");
    }

    #[test]
    fn test_article_page_escapes_title() {
        let mut a = article();
        a.title = "<script>alert(1)</script>".into();
        let html = article_page(&a, &[], "pat", &site());
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_article_page_meta_tags() {
        let html = article_page(&article(), &[], "pat", &site());
        assert!(html.contains(r#"<meta property="og:type" content="article">"#));
        assert!(html.contains(r#"<meta name="twitter:card" content="summary_large_image">"#));
        assert!(html.contains("https://ledger.example.com/news/7"));
        assert!(html.contains("min read"));
    }

    #[test]
    fn test_episode_page_json_ld() {
        let html = episode_page(&episode(), &[], &site());
        let json_ld = extract_json_ld(&html);
        assert_eq!(json_ld["@type"], "PodcastEpisode");
        assert_eq!(json_ld["episodeNumber"], 3);
        assert_eq!(json_ld["timeRequired"], "PT30M0S");
        // The escaped title never leaks raw angle brackets into the body
        assert!(!html.contains("Talking <audits>"));
    }

    #[test]
    fn test_episode_index_lists_entries() {
        let html = episode_index_page(&[episode()], &site());
        let json_ld = extract_json_ld(&html);
        assert_eq!(json_ld["@type"], "ItemList");
        assert_eq!(json_ld["numberOfItems"], 1);
        assert!(html.contains("/podcasts/3"));
    }
}
