//! robots.txt and sitemap.xml
//!
//! Derived text endpoints for crawlers. The sitemap lists the static
//! section pages plus every published article and episode.

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::Response,
};

use crate::api::middleware::AppState;
use crate::models::ListParams;
use crate::seo::text::escape_html;

/// Upper bound on per-section sitemap entries
const SITEMAP_PAGE_SIZE: u32 = 500;

/// GET /robots.txt
pub async fn robots_txt(State(state): State<AppState>) -> Response {
    let base_url = state.settings_service.base_url().await;
    let body = format!(
        "User-agent: *\nAllow: /\nDisallow: /api/\nDisallow: /admin\n\nSitemap: {}/sitemap.xml\n",
        base_url
    );

    text_response(body, "text/plain; charset=utf-8")
}

/// GET /sitemap.xml
///
/// Errors while loading content degrade to a sitemap with only the
/// static section entries.
pub async fn sitemap_xml(State(state): State<AppState>) -> Response {
    let base_url = state.settings_service.base_url().await;
    let params = ListParams::new(1, SITEMAP_PAGE_SIZE);

    let (articles, episodes) = match futures::try_join!(
        state.news_service.list_published(&params),
        state.podcast_service.list_published(&params),
    ) {
        Ok((articles, episodes)) => (articles.items, episodes.items),
        Err(e) => {
            tracing::warn!("Sitemap content lookup failed: {}", e);
            (Vec::new(), Vec::new())
        }
    };

    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n");

    for path in ["", "/news", "/podcasts", "/forum", "/resources"] {
        xml.push_str(&format!(
            "  <url><loc>{}{}/</loc></url>\n",
            escape_html(&base_url),
            path
        ));
    }

    for article in &articles {
        let lastmod = article
            .published_at
            .unwrap_or(article.updated_at)
            .format("%Y-%m-%d");
        xml.push_str(&format!(
            "  <url><loc>{}/news/{}</loc><lastmod>{}</lastmod></url>\n",
            escape_html(&base_url),
            article.id,
            lastmod
        ));
    }

    for episode in &episodes {
        let lastmod = episode
            .published_at
            .unwrap_or(episode.updated_at)
            .format("%Y-%m-%d");
        xml.push_str(&format!(
            "  <url><loc>{}/podcasts/{}</loc><lastmod>{}</lastmod></url>\n",
            escape_html(&base_url),
            episode.id,
            lastmod
        ));
    }

    xml.push_str("</urlset>\n");

    text_response(xml, "application/xml; charset=utf-8")
}

fn text_response(body: String, content_type: &str) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, "public, max-age=3600")
        .body(Body::from(body))
        .unwrap()
}
