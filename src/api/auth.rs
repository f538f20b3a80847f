//! Authentication API endpoints
//!
//! - POST /api/v1/auth/login - credentials to session token
//! - POST /api/v1/auth/register - invitation-token registration
//! - POST /api/v1/auth/logout
//! - GET /api/v1/auth/me

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::User;

/// Request body for login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Request body for registration
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub token: String,
    pub username: String,
    pub password: String,
}

/// Response for the authenticated user
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
    pub status: String,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role.to_string(),
            status: user.status.to_string(),
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Response for a successful login
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

/// POST /api/v1/auth/login
///
/// Failed attempts are rate limited per username. The session token is
/// returned in the body and also set as an HttpOnly cookie.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    if state.rate_limiter.is_limited(&request.username).await {
        return Err(ApiError::rate_limited(
            "Too many failed attempts, try again later",
        ));
    }

    let (user, session) = match state
        .user_service
        .login(&request.username, &request.password)
        .await
    {
        Ok(result) => result,
        Err(e) => {
            state
                .rate_limiter
                .record_failed_attempt(&request.username)
                .await;
            return Err(e.into());
        }
    };

    state.rate_limiter.clear_attempts(&request.username).await;

    let cookie = format!(
        "session={}; Path=/; HttpOnly; SameSite=Lax; Max-Age=604800",
        session.id
    );

    let body = Json(LoginResponse {
        token: session.id,
        user: user.into(),
    });

    Ok(([(header::SET_COOKIE, cookie)], body).into_response())
}

/// POST /api/v1/auth/register
///
/// Registration is invitation-only: the request must carry a usable
/// invitation token, which fixes the email and the granted role.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let invitation = state.invitation_service.get_usable(&request.token).await?;

    let user = state
        .user_service
        .create_user(
            &request.username,
            &invitation.email,
            &request.password,
            invitation.role,
        )
        .await?;

    state
        .invitation_service
        .redeem(invitation.id)
        .await
        .map_err(ApiError::from)?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// POST /api/v1/auth/logout
pub async fn logout(State(state): State<AppState>, request: Request) -> Result<Response, ApiError> {
    // Best effort: a missing token still clears the cookie
    if let Some(token) = extract_token(&request) {
        state.user_service.logout(&token).await.ok();
    }

    let cookie = "session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0";
    Ok((
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, cookie.to_string())],
    )
        .into_response())
}

/// GET /api/v1/auth/me - the current session's user
pub async fn me(user: AuthenticatedUser) -> Json<UserResponse> {
    Json(user.0.into())
}

fn extract_token(request: &Request) -> Option<String> {
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
                if let Some(token) = cookie.trim().strip_prefix("session=") {
                    return Some(token.to_string());
                }
            }
        }
    }

    None
}
