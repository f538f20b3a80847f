//! Poll API endpoints
//!
//! Voting is open to anonymous visitors; poll management is admin-only.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{CreatePollInput, ListParams, Poll, UpdatePollInput};

#[derive(Debug, Deserialize)]
pub struct ListPollsQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page() -> u32 {
    1
}
fn default_page_size() -> u32 {
    20
}

/// Response for a poll with options
#[derive(Debug, Serialize)]
pub struct PollResponse {
    pub id: i64,
    pub question: String,
    pub is_active: bool,
    pub created_at: String,
    pub total_votes: i64,
    pub options: Vec<PollOptionResponse>,
}

#[derive(Debug, Serialize)]
pub struct PollOptionResponse {
    pub id: i64,
    pub label: String,
    pub position: i32,
    pub vote_count: i64,
}

impl From<Poll> for PollResponse {
    fn from(poll: Poll) -> Self {
        Self {
            id: poll.id,
            question: poll.question.clone(),
            is_active: poll.is_active,
            created_at: poll.created_at.to_rfc3339(),
            total_votes: poll.total_votes(),
            options: poll
                .options
                .into_iter()
                .map(|o| PollOptionResponse {
                    id: o.id,
                    label: o.label,
                    position: o.position,
                    vote_count: o.vote_count,
                })
                .collect(),
        }
    }
}

/// Request for creating a poll
#[derive(Debug, Deserialize)]
pub struct CreatePollRequest {
    pub question: String,
    pub options: Vec<String>,
    #[serde(default)]
    pub is_active: bool,
}

/// Request for updating a poll
#[derive(Debug, Deserialize)]
pub struct UpdatePollRequest {
    pub question: Option<String>,
    pub is_active: Option<bool>,
}

/// Request for casting a vote
#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub option_id: i64,
}

/// GET /api/v1/polls/active - the poll currently shown on the site
pub async fn get_active_poll(
    State(state): State<AppState>,
) -> Result<Json<Option<PollResponse>>, ApiError> {
    let poll = state.poll_service.get_active().await?;
    Ok(Json(poll.map(Into::into)))
}

/// POST /api/v1/polls/{id}/vote - cast a vote
pub async fn vote(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<VoteRequest>,
) -> Result<Json<PollResponse>, ApiError> {
    let poll = state.poll_service.vote(id, request.option_id).await?;
    Ok(Json(poll.into()))
}

/// GET /api/v1/admin/polls - list all polls (admin)
pub async fn list_polls(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<ListPollsQuery>,
) -> Result<Json<Vec<PollResponse>>, ApiError> {
    let params = ListParams::new(query.page, query.page_size);
    let result = state.poll_service.list(&params).await?;
    Ok(Json(result.items.into_iter().map(Into::into).collect()))
}

/// POST /api/v1/admin/polls - create a poll (admin)
pub async fn create_poll(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(request): Json<CreatePollRequest>,
) -> Result<(StatusCode, Json<PollResponse>), ApiError> {
    let poll = state
        .poll_service
        .create(CreatePollInput {
            question: request.question,
            options: request.options,
            is_active: request.is_active,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(poll.into())))
}

/// PUT /api/v1/admin/polls/{id} - update a poll (admin)
pub async fn update_poll(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdatePollRequest>,
) -> Result<Json<PollResponse>, ApiError> {
    let poll = state
        .poll_service
        .update(
            id,
            UpdatePollInput {
                question: request.question,
                is_active: request.is_active,
            },
        )
        .await?;

    Ok(Json(poll.into()))
}

/// DELETE /api/v1/admin/polls/{id} - delete a poll (admin)
pub async fn delete_poll(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.poll_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
