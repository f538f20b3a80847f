//! API layer - HTTP handlers and routing
//!
//! All REST endpoints of the Digital Ledger server:
//! - News article and category endpoints
//! - Podcast episode endpoints
//! - Forum endpoints
//! - Resource, poll, menu and subscriber endpoints
//! - Auth endpoints and the admin surface
//! - Embedded SPA serving with the crawler middleware ahead of it

pub mod admin;
pub mod auth;
pub mod categories;
pub mod forum;
pub mod menu;
pub mod middleware;
pub mod news;
pub mod podcasts;
pub mod polls;
pub mod resources;
pub mod site;
pub mod static_files;
pub mod subscribers;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

pub use middleware::{ApiError, AppState, AuthenticatedUser, RequestStats};

/// Build the versioned API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Admin-only routes
    let admin_routes = Router::new()
        .route("/admin/dashboard", get(admin::dashboard))
        .route(
            "/admin/users",
            get(admin::list_users).post(admin::create_user),
        )
        .route(
            "/admin/users/{id}",
            put(admin::update_user).delete(admin::delete_user),
        )
        .route(
            "/admin/invitations",
            get(admin::list_invitations).post(admin::create_invitation),
        )
        .route("/admin/invitations/{id}", delete(admin::delete_invitation))
        .route("/admin/subscribers", get(subscribers::list_subscribers))
        .route("/admin/menu", get(menu::list_menu))
        .route("/admin/menu/{key}", put(menu::update_menu))
        .route(
            "/admin/settings",
            get(admin::list_settings).put(admin::update_settings),
        )
        .route(
            "/admin/polls",
            get(polls::list_polls).post(polls::create_poll),
        )
        .route(
            "/admin/polls/{id}",
            put(polls::update_poll).delete(polls::delete_poll),
        )
        .route_layer(axum_middleware::from_fn(middleware::require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Editor routes (content management)
    let editor_routes = Router::new()
        .route("/news", post(news::create_news))
        .route(
            "/news/{id}",
            put(news::update_news).delete(news::delete_news),
        )
        .route("/admin/news", get(news::list_news_all))
        .route("/admin/news/{id}", get(news::get_news_any_status))
        .route("/podcasts", post(podcasts::create_episode))
        .route(
            "/podcasts/{id}",
            put(podcasts::update_episode).delete(podcasts::delete_episode),
        )
        .route("/admin/podcasts", get(podcasts::list_episodes_all))
        .route("/admin/categories", post(categories::create_category))
        .route(
            "/admin/categories/{id}",
            put(categories::update_category).delete(categories::delete_category),
        )
        .route(
            "/admin/forum/{id}",
            put(forum::moderate_discussion).delete(forum::delete_discussion),
        )
        .route("/admin/forum/replies/{id}", delete(forum::delete_reply))
        .route("/admin/resources", post(resources::create_resource))
        .route(
            "/admin/resources/{id}",
            put(resources::update_resource).delete(resources::delete_resource),
        )
        .route_layer(axum_middleware::from_fn(middleware::require_editor))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Authenticated member routes
    let member_routes = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/forum", post(forum::create_discussion))
        .route("/forum/{id}/replies", post(forum::create_reply))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .route("/news", get(news::list_news))
        .route("/news/categories", get(categories::list_categories))
        .route("/news/{id}", get(news::get_news))
        .route("/podcasts", get(podcasts::list_episodes))
        .route("/podcasts/{id}", get(podcasts::get_episode))
        .route("/forum", get(forum::list_discussions))
        .route("/forum/{id}", get(forum::get_discussion))
        .route("/resources", get(resources::list_resources))
        .route("/polls/active", get(polls::get_active_poll))
        .route("/polls/{id}/vote", post(polls::vote))
        .route("/menu", get(menu::list_visible_menu))
        .route("/subscribers", post(subscribers::subscribe))
        .route("/subscribers/{email}", delete(subscribers::unsubscribe))
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/auth/logout", post(auth::logout))
        .route("/site", get(site::site_info))
        .merge(admin_routes)
        .merge(editor_routes)
        .merge(member_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    // CORS configuration for cookie-based auth from the SPA dev server
    let cors = CorsLayer::new()
        .allow_origin(cors_origin.parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        .route("/robots.txt", get(crate::seo::sitemap::robots_txt))
        .route("/sitemap.xml", get(crate::seo::sitemap::sitemap_xml))
        // Everything else is the SPA
        .fallback(static_files::serve_static)
        // Outermost first: stats wrap everything; crawler rendering runs
        // last so bot requests to content routes never reach the SPA
        // fallback
        .layer(
            ServiceBuilder::new()
                .layer(axum_middleware::from_fn_with_state(
                    state.clone(),
                    middleware::request_stats_middleware,
                ))
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors)
                .layer(axum_middleware::from_fn_with_state(
                    state.clone(),
                    crate::seo::render_for_crawlers,
                )),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{Cache, MemoryCache};
    use crate::config::SeoConfig;
    use crate::db::repositories::{
        SqlxCategoryRepository, SqlxForumRepository, SqlxInvitationRepository, SqlxMenuRepository,
        SqlxNewsRepository, SqlxPodcastRepository, SqlxPollRepository, SqlxResourceRepository,
        SqlxSessionRepository, SqlxSettingsRepository, SqlxSubscriberRepository,
        SqlxUserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{ArticleStatus, CreateArticleInput, CreateEpisodeInput};
    use crate::services::{
        EmailService, ForumService, InvitationService, LoginRateLimiter, MarkdownRenderer,
        MenuService, NewsService, PodcastService, PollService, ResourceService, SettingsService,
        SubscriberService, UserService,
    };
    use axum::http::{HeaderName, HeaderValue};
    use axum_test::TestServer;
    use std::sync::Arc;

    const GOOGLEBOT: &str =
        "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";
    const CHROME: &str =
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/120.0 Safari/537.36";

    async fn test_state() -> AppState {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let cache = Arc::new(Cache::Memory(MemoryCache::new()));
        let markdown = MarkdownRenderer::new();
        let settings_repo = SqlxSettingsRepository::boxed(pool.clone());
        let email_service = Arc::new(EmailService::new(settings_repo.clone()));
        let category_repo = SqlxCategoryRepository::boxed(pool.clone());

        AppState {
            pool: pool.clone(),
            user_service: Arc::new(UserService::new(
                SqlxUserRepository::boxed(pool.clone()),
                SqlxSessionRepository::boxed(pool.clone()),
            )),
            news_service: Arc::new(NewsService::new(
                SqlxNewsRepository::boxed(pool.clone()),
                category_repo.clone(),
                cache.clone(),
                markdown.clone(),
            )),
            podcast_service: Arc::new(PodcastService::new(
                SqlxPodcastRepository::boxed(pool.clone()),
                category_repo.clone(),
                cache.clone(),
            )),
            category_repo,
            forum_service: Arc::new(ForumService::new(
                SqlxForumRepository::boxed(pool.clone()),
                markdown,
            )),
            resource_service: Arc::new(ResourceService::new(SqlxResourceRepository::boxed(
                pool.clone(),
            ))),
            poll_service: Arc::new(PollService::new(SqlxPollRepository::boxed(pool.clone()))),
            subscriber_service: Arc::new(SubscriberService::new(
                SqlxSubscriberRepository::boxed(pool.clone()),
                email_service.clone(),
            )),
            invitation_service: Arc::new(InvitationService::new(
                SqlxInvitationRepository::boxed(pool.clone()),
                email_service,
            )),
            menu_service: Arc::new(MenuService::new(SqlxMenuRepository::boxed(pool.clone()))),
            settings_service: Arc::new(SettingsService::new(settings_repo)),
            rate_limiter: Arc::new(LoginRateLimiter::new()),
            request_stats: Arc::new(RequestStats::new()),
            seo_config: SeoConfig::default(),
        }
    }

    async fn seed_editor(state: &AppState) -> i64 {
        state
            .user_service
            .create_user(
                "editor",
                "editor@example.com",
                "password123",
                crate::models::UserRole::Editor,
            )
            .await
            .expect("Failed to create editor")
            .id
    }

    async fn seed_article(state: &AppState, author_id: i64, status: ArticleStatus) -> i64 {
        state
            .news_service
            .create(
                CreateArticleInput {
                    slug: "q3-review".into(),
                    title: "Q3 review".into(),
                    summary: "The quarter in numbers.".into(),
                    content: "Revenue grew by twelve percent.".into(),
                    content_html: None,
                    cover_image: None,
                    author_id,
                    status: Some(status),
                },
                &[],
            )
            .await
            .expect("Failed to create article")
            .id
    }

    async fn server(state: AppState) -> TestServer {
        TestServer::new(build_router(state, "http://localhost:3000")).unwrap()
    }

    #[tokio::test]
    async fn test_bot_request_gets_html_with_json_ld() {
        let state = test_state().await;
        let editor = seed_editor(&state).await;
        let article_id = seed_article(&state, editor, ArticleStatus::Published).await;
        let server = server(state).await;

        let response = server
            .get(&format!("/news/{}", article_id))
            .add_header(header::USER_AGENT, HeaderValue::from_static(GOOGLEBOT))
            .await;

        response.assert_status_ok();
        let content_type = response.header("content-type");
        assert!(content_type.to_str().unwrap().starts_with("text/html"));
        assert!(response
            .header("cache-control")
            .to_str()
            .unwrap()
            .contains("max-age"));

        let body = response.text();
        let marker = r#"<script type="application/ld+json">"#;
        let start = body.find(marker).expect("JSON-LD block present") + marker.len();
        let end = body[start..].find("</script>").unwrap() + start;
        let json_ld: serde_json::Value =
            serde_json::from_str(&body[start..end]).expect("JSON-LD parses");
        assert_eq!(json_ld["@type"], "NewsArticle");
        assert_eq!(json_ld["headline"], "Q3 review");
    }

    #[tokio::test]
    async fn test_browser_request_gets_spa_shell() {
        let state = test_state().await;
        let editor = seed_editor(&state).await;
        let article_id = seed_article(&state, editor, ArticleStatus::Published).await;
        let server = server(state).await;

        let response = server
            .get(&format!("/news/{}", article_id))
            .add_header(header::USER_AGENT, HeaderValue::from_static(CHROME))
            .await;

        response.assert_status_ok();
        let body = response.text();
        // The SPA shell, not the rendered article
        assert!(body.contains("id=\"root\""));
        assert!(!body.contains("application/ld+json"));
    }

    #[tokio::test]
    async fn test_bot_request_for_missing_article_falls_through() {
        let state = test_state().await;
        let server = server(state).await;

        let response = server
            .get("/news/99999")
            .add_header(header::USER_AGENT, HeaderValue::from_static(GOOGLEBOT))
            .await;

        // Falls through to the SPA rather than erroring
        response.assert_status_ok();
        assert!(response.text().contains("id=\"root\""));
    }

    #[tokio::test]
    async fn test_bot_request_for_draft_falls_through() {
        let state = test_state().await;
        let editor = seed_editor(&state).await;
        let article_id = seed_article(&state, editor, ArticleStatus::Draft).await;
        let server = server(state).await;

        let response = server
            .get(&format!("/news/{}", article_id))
            .add_header(header::USER_AGENT, HeaderValue::from_static(GOOGLEBOT))
            .await;

        response.assert_status_ok();
        assert!(response.text().contains("id=\"root\""));
    }

    #[tokio::test]
    async fn test_bot_podcast_index() {
        let state = test_state().await;
        state
            .podcast_service
            .create(
                CreateEpisodeInput {
                    slug: "ep-1".into(),
                    title: "Episode one".into(),
                    description: "The first episode.".into(),
                    audio_url: "https://cdn.example.com/1.mp3".into(),
                    duration_seconds: 1200,
                    episode_number: 1,
                    host_name: "Jordan".into(),
                    status: Some(ArticleStatus::Published),
                },
                &[],
            )
            .await
            .unwrap();
        let server = server(state).await;

        let response = server
            .get("/podcasts")
            .add_header(header::USER_AGENT, HeaderValue::from_static(GOOGLEBOT))
            .await;

        response.assert_status_ok();
        let body = response.text();
        assert!(body.contains("ItemList"));
        assert!(body.contains("Episode one"));
    }

    #[tokio::test]
    async fn test_signature_agent_header_triggers_rendering() {
        let state = test_state().await;
        let editor = seed_editor(&state).await;
        let article_id = seed_article(&state, editor, ArticleStatus::Published).await;
        let server = server(state).await;

        let response = server
            .get(&format!("/news/{}", article_id))
            .add_header(header::USER_AGENT, HeaderValue::from_static(CHROME))
            .add_header(
                HeaderName::from_static("signature-agent"),
                HeaderValue::from_static("\"https://chatgpt.com\""),
            )
            .await;

        response.assert_status_ok();
        assert!(response.text().contains("application/ld+json"));
    }

    #[tokio::test]
    async fn test_robots_and_sitemap() {
        let state = test_state().await;
        let editor = seed_editor(&state).await;
        let article_id = seed_article(&state, editor, ArticleStatus::Published).await;
        let server = server(state).await;

        let robots = server.get("/robots.txt").await;
        robots.assert_status_ok();
        assert!(robots.text().contains("Sitemap:"));

        let sitemap = server.get("/sitemap.xml").await;
        sitemap.assert_status_ok();
        let body = sitemap.text();
        assert!(body.contains("<urlset"));
        assert!(body.contains(&format!("/news/{}", article_id)));
    }

    #[tokio::test]
    async fn test_api_news_listing_is_json() {
        let state = test_state().await;
        let editor = seed_editor(&state).await;
        seed_article(&state, editor, ArticleStatus::Published).await;
        let server = server(state).await;

        let response = server.get("/api/v1/news").await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["total"], 1);
        assert_eq!(body["articles"][0]["title"], "Q3 review");
    }

    #[tokio::test]
    async fn test_api_draft_article_hidden_from_public() {
        let state = test_state().await;
        let editor = seed_editor(&state).await;
        let article_id = seed_article(&state, editor, ArticleStatus::Draft).await;
        let server = server(state).await;

        let response = server.get(&format!("/api/v1/news/{}", article_id)).await;
        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn test_api_write_requires_auth() {
        let state = test_state().await;
        let server = server(state).await;

        let response = server
            .post("/api/v1/news")
            .json(&serde_json::json!({
                "slug": "x", "title": "X", "content": "body"
            }))
            .await;
        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn test_login_and_editor_create_flow() {
        let state = test_state().await;
        seed_editor(&state).await;
        let server = server(state).await;

        let login = server
            .post("/api/v1/auth/login")
            .json(&serde_json::json!({
                "username": "editor",
                "password": "password123"
            }))
            .await;
        login.assert_status_ok();
        let token = login.json::<serde_json::Value>()["token"]
            .as_str()
            .unwrap()
            .to_string();

        let created = server
            .post("/api/v1/news")
            .add_header(
                header::AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
            )
            .json(&serde_json::json!({
                "slug": "new-post",
                "title": "New post",
                "content": "Hello",
                "status": "published"
            }))
            .await;
        created.assert_status(axum::http::StatusCode::CREATED);

        let me = server
            .get("/api/v1/auth/me")
            .add_header(
                header::AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
            )
            .await;
        me.assert_status_ok();
        assert_eq!(me.json::<serde_json::Value>()["username"], "editor");
    }

    #[tokio::test]
    async fn test_member_cannot_use_editor_surface() {
        let state = test_state().await;
        state
            .user_service
            .create_user(
                "member",
                "member@example.com",
                "password123",
                crate::models::UserRole::Member,
            )
            .await
            .unwrap();
        let server = server(state).await;

        let login = server
            .post("/api/v1/auth/login")
            .json(&serde_json::json!({
                "username": "member",
                "password": "password123"
            }))
            .await;
        let token = login.json::<serde_json::Value>()["token"]
            .as_str()
            .unwrap()
            .to_string();

        let response = server
            .post("/api/v1/news")
            .add_header(
                header::AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
            )
            .json(&serde_json::json!({
                "slug": "x", "title": "X", "content": "body"
            }))
            .await;
        response.assert_status_forbidden();
    }

    #[tokio::test]
    async fn test_subscribe_and_unsubscribe() {
        let state = test_state().await;
        let server = server(state).await;

        let response = server
            .post("/api/v1/subscribers")
            .json(&serde_json::json!({"email": "reader@example.com"}))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);

        let duplicate = server
            .post("/api/v1/subscribers")
            .json(&serde_json::json!({"email": "reader@example.com"}))
            .await;
        duplicate.assert_status(axum::http::StatusCode::CONFLICT);

        let gone = server.delete("/api/v1/subscribers/reader@example.com").await;
        gone.assert_status(axum::http::StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_menu_endpoint_lists_visible_entries() {
        let state = test_state().await;
        let server = server(state).await;

        let response = server.get("/api/v1/menu").await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body.as_array().unwrap().len(), 5);
    }
}
