//! API middleware
//!
//! Shared application state, the JSON error envelope, session-token
//! authentication and role checks, and lightweight request statistics.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::config::SeoConfig;
use crate::db::repositories::CategoryRepository;
use crate::db::DynDatabasePool;
use crate::models::User;
use crate::services::forum::ForumServiceError;
use crate::services::invitation::InvitationServiceError;
use crate::services::menu::MenuServiceError;
use crate::services::news::NewsServiceError;
use crate::services::podcast::PodcastServiceError;
use crate::services::poll::PollServiceError;
use crate::services::resource::ResourceServiceError;
use crate::services::subscriber::SubscriberServiceError;
use crate::services::user::UserServiceError;
use crate::services::{
    ForumService, InvitationService, LoginRateLimiter, MenuService, NewsService, PodcastService,
    PollService, ResourceService, SettingsService, SubscriberService, UserService,
};

// ============================================================================
// Request Statistics
// ============================================================================

/// Lightweight request statistics using atomic counters
pub struct RequestStats {
    /// Total number of requests processed
    total_requests: AtomicU64,
    /// Total response time in microseconds (for calculating average)
    total_response_time_us: AtomicU64,
    /// Application start time
    start_time: Instant,
}

impl RequestStats {
    /// Create new stats tracker
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            total_response_time_us: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a request with its response time
    pub fn record(&self, duration_us: u64) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.total_response_time_us
            .fetch_add(duration_us, Ordering::Relaxed);
    }

    /// Get total request count
    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    /// Get average response time in microseconds
    pub fn avg_response_time_us(&self) -> f64 {
        let total = self.total_requests.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        let total_time = self.total_response_time_us.load(Ordering::Relaxed);
        total_time as f64 / total as f64
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl Default for RequestStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub user_service: Arc<UserService>,
    pub news_service: Arc<NewsService>,
    pub podcast_service: Arc<PodcastService>,
    pub category_repo: Arc<dyn CategoryRepository>,
    pub forum_service: Arc<ForumService>,
    pub resource_service: Arc<ResourceService>,
    pub poll_service: Arc<PollService>,
    pub subscriber_service: Arc<SubscriberService>,
    pub invitation_service: Arc<InvitationService>,
    pub menu_service: Arc<MenuService>,
    pub settings_service: Arc<SettingsService>,
    pub rate_limiter: Arc<LoginRateLimiter>,
    pub request_stats: Arc<RequestStats>,
    pub seo_config: SeoConfig,
}

/// Authenticated user extracted from request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new("RATE_LIMITED", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            "RATE_LIMITED" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

// Service error mapping: validation-class errors keep their message,
// internal errors collapse to a generic body (details go to the logs).

impl From<NewsServiceError> for ApiError {
    fn from(e: NewsServiceError) -> Self {
        match e {
            NewsServiceError::NotFound(id) => ApiError::not_found(format!("Article not found: {}", id)),
            NewsServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            NewsServiceError::DuplicateSlug(slug) => {
                ApiError::conflict(format!("Slug already exists: {}", slug))
            }
            NewsServiceError::InternalError(e) => internal(e),
        }
    }
}

impl From<PodcastServiceError> for ApiError {
    fn from(e: PodcastServiceError) -> Self {
        match e {
            PodcastServiceError::NotFound(id) => {
                ApiError::not_found(format!("Episode not found: {}", id))
            }
            PodcastServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            PodcastServiceError::DuplicateSlug(slug) => {
                ApiError::conflict(format!("Slug already exists: {}", slug))
            }
            PodcastServiceError::InternalError(e) => internal(e),
        }
    }
}

impl From<ForumServiceError> for ApiError {
    fn from(e: ForumServiceError) -> Self {
        match e {
            ForumServiceError::NotFound(id) => {
                ApiError::not_found(format!("Discussion not found: {}", id))
            }
            ForumServiceError::Locked => ApiError::forbidden("Discussion is locked"),
            ForumServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            ForumServiceError::InternalError(e) => internal(e),
        }
    }
}

impl From<PollServiceError> for ApiError {
    fn from(e: PollServiceError) -> Self {
        match e {
            PollServiceError::NotFound(id) => ApiError::not_found(format!("Poll not found: {}", id)),
            PollServiceError::OptionNotFound => ApiError::not_found("Poll option not found"),
            PollServiceError::Inactive => ApiError::validation_error("Poll is not accepting votes"),
            PollServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            PollServiceError::InternalError(e) => internal(e),
        }
    }
}

impl From<ResourceServiceError> for ApiError {
    fn from(e: ResourceServiceError) -> Self {
        match e {
            ResourceServiceError::NotFound(id) => {
                ApiError::not_found(format!("Resource not found: {}", id))
            }
            ResourceServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            ResourceServiceError::InternalError(e) => internal(e),
        }
    }
}

impl From<SubscriberServiceError> for ApiError {
    fn from(e: SubscriberServiceError) -> Self {
        match e {
            SubscriberServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            SubscriberServiceError::AlreadySubscribed => {
                ApiError::conflict("Email is already subscribed")
            }
            SubscriberServiceError::NotSubscribed => ApiError::not_found("Email is not subscribed"),
            SubscriberServiceError::InternalError(e) => internal(e),
        }
    }
}

impl From<InvitationServiceError> for ApiError {
    fn from(e: InvitationServiceError) -> Self {
        match e {
            InvitationServiceError::NotFound => ApiError::not_found("Invitation not found"),
            InvitationServiceError::NotUsable => {
                ApiError::validation_error("Invitation has expired or was already used")
            }
            InvitationServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            InvitationServiceError::InternalError(e) => internal(e),
        }
    }
}

impl From<MenuServiceError> for ApiError {
    fn from(e: MenuServiceError) -> Self {
        match e {
            MenuServiceError::NotFound(key) => {
                ApiError::not_found(format!("Menu entry not found: {}", key))
            }
            MenuServiceError::InternalError(e) => internal(e),
        }
    }
}

impl From<UserServiceError> for ApiError {
    fn from(e: UserServiceError) -> Self {
        match e {
            UserServiceError::NotFound(id) => ApiError::not_found(format!("User not found: {}", id)),
            UserServiceError::InvalidCredentials => {
                ApiError::unauthorized("Invalid username or password")
            }
            UserServiceError::AccountDisabled => ApiError::forbidden("Account is disabled"),
            UserServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            UserServiceError::Duplicate => ApiError::conflict("Username or email already taken"),
            UserServiceError::InternalError(e) => internal(e),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        internal(e)
    }
}

fn internal(e: anyhow::Error) -> ApiError {
    tracing::error!("Internal error: {:#}", e);
    ApiError::internal_error("Internal server error")
}

/// Extract session token from Authorization header or session cookie
fn extract_session_token(request: &Request) -> Option<String> {
    if let Some(auth_header) = request.headers().get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    if let Some(cookie_header) = request.headers().get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                let cookie = cookie.trim();
                if let Some(token) = cookie.strip_prefix("session=") {
                    return Some(token.to_string());
                }
            }
        }
    }

    None
}

/// Authentication middleware
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_session_token(&request)
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let user = state
        .user_service
        .validate_session(&token)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired session"))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

/// Editor authorization middleware (editors and admins)
pub async fn require_editor(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !user.0.is_editor() {
        return Err(ApiError::forbidden("Editor privileges required"));
    }

    Ok(next.run(request).await)
}

/// Admin authorization middleware
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !user.0.is_admin() {
        return Err(ApiError::forbidden("Admin privileges required"));
    }

    Ok(next.run(request).await)
}

/// Request statistics middleware; atomic counters, negligible overhead
pub async fn request_stats_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();

    let response = next.run(request).await;

    let duration_us = start.elapsed().as_micros() as u64;
    state.request_stats.record(duration_us);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_stats_average() {
        let stats = RequestStats::new();
        assert_eq!(stats.avg_response_time_us(), 0.0);

        stats.record(100);
        stats.record(300);
        assert_eq!(stats.total_requests(), 2);
        assert_eq!(stats.avg_response_time_us(), 200.0);
    }

    #[test]
    fn test_api_error_status_mapping() {
        use axum::response::IntoResponse;

        let cases = [
            (ApiError::unauthorized("x"), StatusCode::UNAUTHORIZED),
            (ApiError::forbidden("x"), StatusCode::FORBIDDEN),
            (ApiError::not_found("x"), StatusCode::NOT_FOUND),
            (ApiError::validation_error("x"), StatusCode::BAD_REQUEST),
            (ApiError::conflict("x"), StatusCode::CONFLICT),
            (ApiError::rate_limited("x"), StatusCode::TOO_MANY_REQUESTS),
            (
                ApiError::internal_error("x"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
