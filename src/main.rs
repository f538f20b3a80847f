//! The Digital Ledger - content management server

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use digital_ledger::{
    api::{self, AppState, RequestStats},
    cache::create_cache,
    config::Config,
    db::{
        self,
        repositories::{
            SqlxCategoryRepository, SqlxForumRepository, SqlxInvitationRepository,
            SqlxMenuRepository, SqlxNewsRepository, SqlxPodcastRepository, SqlxPollRepository,
            SqlxResourceRepository, SqlxSessionRepository, SqlxSettingsRepository,
            SqlxSubscriberRepository, SqlxUserRepository,
        },
    },
    services::{
        EmailService, ForumService, InvitationService, LoginRateLimiter, MarkdownRenderer,
        MenuService, NewsService, PodcastService, PollService, ResourceService, SettingsService,
        SubscriberService, UserService,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "digital_ledger=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting the Digital Ledger server...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Initialize cache
    let cache = create_cache(&config.cache).await?;
    tracing::info!("Cache initialized");

    let markdown_renderer = MarkdownRenderer::new();

    // Create repositories
    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let session_repo = SqlxSessionRepository::boxed(pool.clone());
    let news_repo = SqlxNewsRepository::boxed(pool.clone());
    let category_repo = SqlxCategoryRepository::boxed(pool.clone());
    let podcast_repo = SqlxPodcastRepository::boxed(pool.clone());
    let forum_repo = SqlxForumRepository::boxed(pool.clone());
    let resource_repo = SqlxResourceRepository::boxed(pool.clone());
    let poll_repo = SqlxPollRepository::boxed(pool.clone());
    let subscriber_repo = SqlxSubscriberRepository::boxed(pool.clone());
    let invitation_repo = SqlxInvitationRepository::boxed(pool.clone());
    let menu_repo = SqlxMenuRepository::boxed(pool.clone());
    let settings_repo = SqlxSettingsRepository::boxed(pool.clone());

    // Initialize services
    let email_service = Arc::new(EmailService::new(settings_repo.clone()));
    let user_service = Arc::new(UserService::new(user_repo, session_repo));
    let news_service = Arc::new(NewsService::new(
        news_repo,
        category_repo.clone(),
        cache.clone(),
        markdown_renderer.clone(),
    ));
    let podcast_service = Arc::new(PodcastService::new(
        podcast_repo,
        category_repo.clone(),
        cache.clone(),
    ));
    let forum_service = Arc::new(ForumService::new(forum_repo, markdown_renderer));
    let resource_service = Arc::new(ResourceService::new(resource_repo));
    let poll_service = Arc::new(PollService::new(poll_repo));
    let subscriber_service = Arc::new(SubscriberService::new(
        subscriber_repo,
        email_service.clone(),
    ));
    let invitation_service = Arc::new(InvitationService::new(invitation_repo, email_service));
    let menu_service = Arc::new(MenuService::new(menu_repo));
    let settings_service = Arc::new(SettingsService::new(settings_repo));

    // Build application state
    let request_stats = Arc::new(RequestStats::new());
    let rate_limiter = Arc::new(LoginRateLimiter::new());

    let state = AppState {
        pool: pool.clone(),
        user_service: user_service.clone(),
        news_service,
        podcast_service,
        category_repo,
        forum_service,
        resource_service,
        poll_service,
        subscriber_service,
        invitation_service: invitation_service.clone(),
        menu_service,
        settings_service,
        rate_limiter: rate_limiter.clone(),
        request_stats,
        seo_config: config.seo.clone(),
    };

    // Periodic cleanup: rate limiter buckets, expired sessions and
    // expired invitations (runs every 5 minutes)
    {
        let limiter = rate_limiter.clone();
        let users = user_service.clone();
        let invitations = invitation_service.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(300));
            loop {
                interval.tick().await;
                limiter.cleanup().await;
                if let Err(e) = users.purge_expired_sessions().await {
                    tracing::warn!("Session cleanup failed: {}", e);
                }
                if let Err(e) = invitations.purge_expired().await {
                    tracing::warn!("Invitation cleanup failed: {}", e);
                }
            }
        });
    }

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
