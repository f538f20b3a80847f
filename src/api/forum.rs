//! Forum API endpoints
//!
//! Reading is public; posting requires a session; moderation requires an
//! editor.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{
    CreateDiscussionInput, CreateReplyInput, Discussion, ListParams, Reply, UpdateDiscussionInput,
};

#[derive(Debug, Deserialize)]
pub struct ListForumQuery {
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

/// Response for a discussion
#[derive(Debug, Serialize)]
pub struct DiscussionResponse {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub body_html: String,
    pub author_id: i64,
    pub is_locked: bool,
    pub is_pinned: bool,
    pub reply_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Discussion> for DiscussionResponse {
    fn from(d: Discussion) -> Self {
        Self {
            id: d.id,
            title: d.title,
            body: d.body,
            body_html: d.body_html,
            author_id: d.author_id,
            is_locked: d.is_locked,
            is_pinned: d.is_pinned,
            reply_count: d.reply_count,
            created_at: d.created_at.to_rfc3339(),
            updated_at: d.updated_at.to_rfc3339(),
        }
    }
}

/// Response for a reply
#[derive(Debug, Serialize)]
pub struct ReplyResponse {
    pub id: i64,
    pub discussion_id: i64,
    pub body: String,
    pub author_id: i64,
    pub created_at: String,
}

impl From<Reply> for ReplyResponse {
    fn from(r: Reply) -> Self {
        Self {
            id: r.id,
            discussion_id: r.discussion_id,
            body: r.body,
            author_id: r.author_id,
            created_at: r.created_at.to_rfc3339(),
        }
    }
}

/// Response for a discussion with its replies
#[derive(Debug, Serialize)]
pub struct DiscussionDetailResponse {
    #[serde(flatten)]
    pub discussion: DiscussionResponse,
    pub replies: Vec<ReplyResponse>,
}

/// Response for discussion lists
#[derive(Debug, Serialize)]
pub struct ForumListResponse {
    pub discussions: Vec<DiscussionResponse>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

/// Request for starting a discussion
#[derive(Debug, Deserialize)]
pub struct CreateDiscussionRequest {
    pub title: String,
    pub body: String,
}

/// Request for replying
#[derive(Debug, Deserialize)]
pub struct CreateReplyRequest {
    pub body: String,
}

/// Request for moderating a discussion
#[derive(Debug, Deserialize)]
pub struct ModerateDiscussionRequest {
    pub title: Option<String>,
    pub body: Option<String>,
    pub is_locked: Option<bool>,
    pub is_pinned: Option<bool>,
}

/// GET /api/v1/forum - list discussions
pub async fn list_discussions(
    State(state): State<AppState>,
    Query(query): Query<ListForumQuery>,
) -> Result<Json<ForumListResponse>, ApiError> {
    let params = ListParams::new(query.page, query.page_size);
    let result = state.forum_service.list(&params).await?;

    Ok(Json(ForumListResponse {
        total: result.total,
        total_pages: result.total_pages(),
        discussions: result.items.into_iter().map(Into::into).collect(),
        page: params.page,
        page_size: params.per_page,
    }))
}

/// GET /api/v1/forum/{id} - discussion with replies
pub async fn get_discussion(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DiscussionDetailResponse>, ApiError> {
    let (discussion, replies) = state.forum_service.get_discussion(id).await?;

    Ok(Json(DiscussionDetailResponse {
        discussion: discussion.into(),
        replies: replies.into_iter().map(Into::into).collect(),
    }))
}

/// POST /api/v1/forum - start a discussion (member)
pub async fn create_discussion(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateDiscussionRequest>,
) -> Result<(StatusCode, Json<DiscussionResponse>), ApiError> {
    let discussion = state
        .forum_service
        .create_discussion(CreateDiscussionInput {
            title: request.title,
            body: request.body,
            body_html: None,
            author_id: user.0.id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(discussion.into())))
}

/// POST /api/v1/forum/{id}/replies - reply to a discussion (member)
pub async fn create_reply(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(request): Json<CreateReplyRequest>,
) -> Result<(StatusCode, Json<ReplyResponse>), ApiError> {
    let reply = state
        .forum_service
        .reply(CreateReplyInput {
            discussion_id: id,
            body: request.body,
            author_id: user.0.id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(reply.into())))
}

/// PUT /api/v1/admin/forum/{id} - moderate a discussion (editor)
pub async fn moderate_discussion(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(request): Json<ModerateDiscussionRequest>,
) -> Result<Json<DiscussionResponse>, ApiError> {
    let discussion = state
        .forum_service
        .moderate(
            id,
            UpdateDiscussionInput {
                title: request.title,
                body: request.body,
                body_html: None,
                is_locked: request.is_locked,
                is_pinned: request.is_pinned,
            },
        )
        .await?;

    Ok(Json(discussion.into()))
}

/// DELETE /api/v1/admin/forum/{id} - delete a discussion (editor)
pub async fn delete_discussion(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.forum_service.delete_discussion(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/admin/forum/replies/{id} - delete a reply (editor)
pub async fn delete_reply(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.forum_service.delete_reply(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
