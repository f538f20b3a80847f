//! Admin API endpoints
//!
//! Dashboard statistics, user and invitation management, and site
//! settings. Everything here sits behind the admin middleware stack.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use sysinfo::{Pid, System};
use std::process;

use crate::api::auth::UserResponse;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{CreateInvitationInput, Invitation, ListParams, UserRole, UserStatus};

/// Response for dashboard stats
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub total_articles: i64,
    pub published_articles: i64,
    pub total_episodes: i64,
    pub published_episodes: i64,
    pub total_discussions: i64,
    pub total_resources: i64,
    pub total_polls: i64,
    pub total_users: i64,
    pub total_subscribers: i64,
    pub system: SystemStats,
}

/// Process-level runtime statistics
#[derive(Debug, Serialize)]
pub struct SystemStats {
    pub memory_bytes: u64,
    pub cpu_usage_percent: f32,
    pub uptime_seconds: u64,
    pub total_requests: u64,
    pub avg_response_time_us: f64,
}

/// GET /api/v1/admin/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<Json<DashboardResponse>, ApiError> {
    let (
        (total_articles, published_articles),
        (total_episodes, published_episodes),
        total_discussions,
        total_resources,
        total_polls,
        total_users,
        total_subscribers,
    ) = futures::try_join!(
        state.news_service.counts(),
        state.podcast_service.counts(),
        state.forum_service.count(),
        state.resource_service.count(),
        state.poll_service.count(),
        state.user_service.count(),
        state.subscriber_service.count(),
    )?;

    let mut system = System::new();
    let pid = Pid::from_u32(process::id());
    system.refresh_processes(sysinfo::ProcessesToUpdate::Some(&[pid]));
    let (memory_bytes, cpu_usage_percent) = system
        .process(pid)
        .map(|p| (p.memory(), p.cpu_usage()))
        .unwrap_or((0, 0.0));

    Ok(Json(DashboardResponse {
        total_articles,
        published_articles,
        total_episodes,
        published_episodes,
        total_discussions,
        total_resources,
        total_polls,
        total_users,
        total_subscribers,
        system: SystemStats {
            memory_bytes,
            cpu_usage_percent,
            uptime_seconds: state.request_stats.uptime_seconds(),
            total_requests: state.request_stats.total_requests(),
            avg_response_time_us: state.request_stats.avg_response_time_us(),
        },
    }))
}

// ============================================================================
// User management
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page() -> u32 {
    1
}
fn default_page_size() -> u32 {
    50
}

/// Request for creating a user directly (without an invitation)
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Option<String>,
}

/// Request for updating a user's role or status
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub role: Option<String>,
    pub status: Option<String>,
}

/// GET /api/v1/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let params = ListParams::new(query.page, query.page_size);
    let users = state
        .user_service
        .list(params.offset(), params.limit())
        .await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// POST /api/v1/admin/users
pub async fn create_user(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let role = parse_role(request.role.as_deref())?.unwrap_or_default();

    let user = state
        .user_service
        .create_user(&request.username, &request.email, &request.password, role)
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// PUT /api/v1/admin/users/{id} - change role or status
pub async fn update_user(
    State(state): State<AppState>,
    admin: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    if id == admin.0.id && request.status.as_deref() == Some("disabled") {
        return Err(ApiError::validation_error(
            "Cannot disable your own account",
        ));
    }

    if let Some(role) = parse_role(request.role.as_deref())? {
        state.user_service.set_role(id, role).await?;
    }
    if let Some(status) = parse_status(request.status.as_deref())? {
        state.user_service.set_status(id, status).await?;
    }

    let user = state
        .user_service
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User not found: {}", id)))?;
    Ok(Json(user.into()))
}

/// DELETE /api/v1/admin/users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    admin: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if id == admin.0.id {
        return Err(ApiError::validation_error("Cannot delete your own account"));
    }

    state.user_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn parse_role(role: Option<&str>) -> Result<Option<UserRole>, ApiError> {
    match role {
        None => Ok(None),
        Some(s) => UserRole::from_str(s)
            .map(Some)
            .ok_or_else(|| ApiError::validation_error(format!("Invalid role: {}", s))),
    }
}

fn parse_status(status: Option<&str>) -> Result<Option<UserStatus>, ApiError> {
    match status {
        None => Ok(None),
        Some(s) => UserStatus::from_str(s)
            .map(Some)
            .ok_or_else(|| ApiError::validation_error(format!("Invalid status: {}", s))),
    }
}

// ============================================================================
// Invitations
// ============================================================================

/// Request for issuing an invitation
#[derive(Debug, Deserialize)]
pub struct CreateInvitationRequest {
    pub email: String,
    pub role: Option<String>,
}

/// Response for an invitation
#[derive(Debug, Serialize)]
pub struct InvitationResponse {
    pub id: i64,
    pub email: String,
    pub token: String,
    pub role: String,
    pub invited_by: i64,
    pub expires_at: String,
    pub accepted_at: Option<String>,
    pub created_at: String,
}

impl From<Invitation> for InvitationResponse {
    fn from(i: Invitation) -> Self {
        Self {
            id: i.id,
            email: i.email,
            token: i.token,
            role: i.role.to_string(),
            invited_by: i.invited_by,
            expires_at: i.expires_at.to_rfc3339(),
            accepted_at: i.accepted_at.map(|d| d.to_rfc3339()),
            created_at: i.created_at.to_rfc3339(),
        }
    }
}

/// POST /api/v1/admin/invitations
pub async fn create_invitation(
    State(state): State<AppState>,
    admin: AuthenticatedUser,
    Json(request): Json<CreateInvitationRequest>,
) -> Result<(StatusCode, Json<InvitationResponse>), ApiError> {
    let role = parse_role(request.role.as_deref())?.unwrap_or_default();

    let invitation = state
        .invitation_service
        .issue(CreateInvitationInput {
            email: request.email,
            role,
            invited_by: admin.0.id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(invitation.into())))
}

/// GET /api/v1/admin/invitations
pub async fn list_invitations(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<InvitationResponse>>, ApiError> {
    let params = ListParams::new(query.page, query.page_size);
    let result = state.invitation_service.list(&params).await?;
    Ok(Json(result.items.into_iter().map(Into::into).collect()))
}

/// DELETE /api/v1/admin/invitations/{id}
pub async fn delete_invitation(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.invitation_service.revoke(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Settings
// ============================================================================

/// Request for updating settings
#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    pub settings: std::collections::BTreeMap<String, String>,
}

/// GET /api/v1/admin/settings
pub async fn list_settings(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<Json<std::collections::BTreeMap<String, String>>, ApiError> {
    let settings = state.settings_service.list().await?;
    Ok(Json(
        settings.into_iter().map(|s| (s.key, s.value)).collect(),
    ))
}

/// PUT /api/v1/admin/settings
pub async fn update_settings(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(request): Json<UpdateSettingsRequest>,
) -> Result<StatusCode, ApiError> {
    for (key, value) in &request.settings {
        if key.trim().is_empty() {
            return Err(ApiError::validation_error("Setting keys cannot be empty"));
        }
        state.settings_service.set(key, value).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}
