//! Crawler-facing content rendering
//!
//! Search engines, social link-preview fetchers and AI assistants get
//! fully-formed static HTML for article and podcast pages instead of the
//! SPA shell. The middleware sits ahead of the static-file fallback:
//! requests from ordinary browsers pass through untouched, and any error
//! on the bot path also falls through to the SPA rather than surfacing.

pub mod bots;
pub mod render;
pub mod sitemap;
pub mod text;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, Method, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::api::middleware::AppState;

/// Longest Cache-Control max-age the renderer will emit, regardless of
/// configuration (1 day).
const MAX_CACHE_MAX_AGE: u32 = 86_400;

/// How many episodes the crawler-facing podcast index lists
const EPISODE_INDEX_LIMIT: u32 = 20;

/// The routes the renderer intercepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RenderTarget {
    /// /news/{id}
    Article(i64),
    /// /podcasts/{id}
    Episode(i64),
    /// /podcasts
    EpisodeIndex,
}

impl RenderTarget {
    /// Parse a request path into a render target.
    ///
    /// Anything that does not match exactly (including an unparsable id)
    /// is not a target and passes through to the SPA.
    fn from_path(path: &str) -> Option<Self> {
        let path = path.trim_end_matches('/');
        if path == "/podcasts" {
            return Some(Self::EpisodeIndex);
        }
        if let Some(rest) = path.strip_prefix("/news/") {
            return rest.parse().ok().map(Self::Article);
        }
        if let Some(rest) = path.strip_prefix("/podcasts/") {
            return rest.parse().ok().map(Self::Episode);
        }
        None
    }
}

/// Middleware that serves static HTML to crawlers.
///
/// Non-GET requests, non-content routes, ordinary browsers, unknown ids
/// and internal errors all fall through to the next layer.
pub async fn render_for_crawlers(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() != Method::GET {
        return next.run(request).await;
    }

    let target = match RenderTarget::from_path(request.uri().path()) {
        Some(target) => target,
        None => return next.run(request).await,
    };

    let user_agent = header_str(&request, header::USER_AGENT);
    let signature_agent = header_str(&request, "signature-agent");

    if !bots::is_crawler(user_agent.as_deref(), signature_agent.as_deref()) {
        return next.run(request).await;
    }

    match try_render(&state, target).await {
        Ok(Some(html)) => {
            let max_age = state.seo_config.cache_max_age.min(MAX_CACHE_MAX_AGE);
            crawler_response(html, max_age)
        }
        Ok(None) => next.run(request).await,
        Err(e) => {
            tracing::debug!("Crawler rendering failed, serving SPA instead: {}", e);
            next.run(request).await
        }
    }
}

/// Load the target entity and render it; `None` means "not renderable,
/// serve the SPA" (unknown id, unpublished entity).
async fn try_render(state: &AppState, target: RenderTarget) -> anyhow::Result<Option<String>> {
    let site = render::SiteContext {
        name: state.settings_service.site_name().await,
        description: state.settings_service.site_description().await,
        base_url: state.settings_service.base_url().await,
    };

    match target {
        RenderTarget::Article(id) => {
            let article = match state.news_service.get_published(id).await? {
                Some(article) => article,
                None => return Ok(None),
            };
            let categories = state.news_service.categories(article.id).await?;
            let author = state.user_service.get_by_id(article.author_id).await?;
            let author_name = author
                .map(|u| u.username)
                .unwrap_or_else(|| site.name.clone());

            state.news_service.record_view(article.id).await.ok();

            Ok(Some(render::article_page(
                &article,
                &categories,
                &author_name,
                &site,
            )))
        }
        RenderTarget::Episode(id) => {
            let episode = match state.podcast_service.get_published(id).await? {
                Some(episode) => episode,
                None => return Ok(None),
            };
            let categories = state.podcast_service.categories(episode.id).await?;
            Ok(Some(render::episode_page(&episode, &categories, &site)))
        }
        RenderTarget::EpisodeIndex => {
            let params = crate::models::ListParams::new(1, EPISODE_INDEX_LIMIT);
            let episodes = state.podcast_service.list_published(&params).await?;
            Ok(Some(render::episode_index_page(&episodes.items, &site)))
        }
    }
}

fn crawler_response(html: String, max_age: u32) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
        .header(
            header::CACHE_CONTROL,
            format!("public, max-age={}", max_age),
        )
        .body(Body::from(html))
        .unwrap()
}

fn header_str(request: &Request, name: impl header::AsHeaderName) -> Option<String> {
    request
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_parsing() {
        assert_eq!(
            RenderTarget::from_path("/news/42"),
            Some(RenderTarget::Article(42))
        );
        assert_eq!(
            RenderTarget::from_path("/podcasts/7"),
            Some(RenderTarget::Episode(7))
        );
        assert_eq!(
            RenderTarget::from_path("/podcasts"),
            Some(RenderTarget::EpisodeIndex)
        );
        assert_eq!(
            RenderTarget::from_path("/podcasts/"),
            Some(RenderTarget::EpisodeIndex)
        );
    }

    #[test]
    fn test_target_parsing_rejects_noise() {
        assert_eq!(RenderTarget::from_path("/news/abc"), None);
        assert_eq!(RenderTarget::from_path("/news/"), None);
        assert_eq!(RenderTarget::from_path("/news/1/edit"), None);
        assert_eq!(RenderTarget::from_path("/forum/1"), None);
        assert_eq!(RenderTarget::from_path("/"), None);
    }
}
