//! Newsletter subscriber API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{ListParams, Subscriber};

#[derive(Debug, Deserialize)]
pub struct ListSubscribersQuery {
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

/// Request to subscribe
#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub email: String,
}

/// Response for a subscriber
#[derive(Debug, Serialize)]
pub struct SubscriberResponse {
    pub id: i64,
    pub email: String,
    pub confirmed: bool,
    pub subscribed_at: String,
}

impl From<Subscriber> for SubscriberResponse {
    fn from(s: Subscriber) -> Self {
        Self {
            id: s.id,
            email: s.email,
            confirmed: s.confirmed,
            subscribed_at: s.subscribed_at.to_rfc3339(),
        }
    }
}

/// Response for subscriber lists
#[derive(Debug, Serialize)]
pub struct SubscriberListResponse {
    pub subscribers: Vec<SubscriberResponse>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

/// POST /api/v1/subscribers - subscribe to the newsletter
pub async fn subscribe(
    State(state): State<AppState>,
    Json(request): Json<SubscribeRequest>,
) -> Result<(StatusCode, Json<SubscriberResponse>), ApiError> {
    let subscriber = state.subscriber_service.subscribe(&request.email).await?;
    Ok((StatusCode::CREATED, Json(subscriber.into())))
}

/// DELETE /api/v1/subscribers/{email} - unsubscribe
pub async fn unsubscribe(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.subscriber_service.unsubscribe(&email).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/admin/subscribers - list subscribers (admin)
pub async fn list_subscribers(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<ListSubscribersQuery>,
) -> Result<Json<SubscriberListResponse>, ApiError> {
    let params = ListParams::new(query.page, query.page_size);
    let result = state.subscriber_service.list(&params).await?;

    Ok(Json(SubscriberListResponse {
        total: result.total,
        subscribers: result.items.into_iter().map(Into::into).collect(),
        page: params.page,
        page_size: params.per_page,
    }))
}
