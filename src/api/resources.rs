//! Resource API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{
    CreateResourceInput, ListParams, Resource, ResourceKind, UpdateResourceInput,
};

#[derive(Debug, Deserialize)]
pub struct ListResourcesQuery {
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

/// Response for a resource
#[derive(Debug, Serialize)]
pub struct ResourceResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub url: String,
    pub kind: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Resource> for ResourceResponse {
    fn from(r: Resource) -> Self {
        Self {
            id: r.id,
            title: r.title,
            description: r.description,
            url: r.url,
            kind: r.kind.to_string(),
            created_at: r.created_at.to_rfc3339(),
            updated_at: r.updated_at.to_rfc3339(),
        }
    }
}

/// Response for resource lists
#[derive(Debug, Serialize)]
pub struct ResourceListResponse {
    pub resources: Vec<ResourceResponse>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

/// Request for creating a resource
#[derive(Debug, Deserialize)]
pub struct CreateResourceRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub url: String,
    pub kind: Option<String>,
}

/// Request for updating a resource
#[derive(Debug, Deserialize)]
pub struct UpdateResourceRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub kind: Option<String>,
}

fn parse_kind(kind: Option<&str>) -> Result<Option<ResourceKind>, ApiError> {
    match kind {
        None => Ok(None),
        Some(s) => ResourceKind::from_str(s)
            .map(Some)
            .ok_or_else(|| ApiError::validation_error(format!("Invalid resource kind: {}", s))),
    }
}

/// GET /api/v1/resources - list resources
pub async fn list_resources(
    State(state): State<AppState>,
    Query(query): Query<ListResourcesQuery>,
) -> Result<Json<ResourceListResponse>, ApiError> {
    let params = ListParams::new(query.page, query.page_size);
    let result = state.resource_service.list(&params).await?;

    Ok(Json(ResourceListResponse {
        total: result.total,
        resources: result.items.into_iter().map(Into::into).collect(),
        page: params.page,
        page_size: params.per_page,
    }))
}

/// POST /api/v1/admin/resources - create a resource (editor)
pub async fn create_resource(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(request): Json<CreateResourceRequest>,
) -> Result<(StatusCode, Json<ResourceResponse>), ApiError> {
    let kind = parse_kind(request.kind.as_deref())?.unwrap_or_default();

    let resource = state
        .resource_service
        .create(CreateResourceInput {
            title: request.title,
            description: request.description,
            url: request.url,
            kind,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(resource.into())))
}

/// PUT /api/v1/admin/resources/{id} - update a resource (editor)
pub async fn update_resource(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateResourceRequest>,
) -> Result<Json<ResourceResponse>, ApiError> {
    let kind = parse_kind(request.kind.as_deref())?;

    let resource = state
        .resource_service
        .update(
            id,
            UpdateResourceInput {
                title: request.title,
                description: request.description,
                url: request.url,
                kind,
            },
        )
        .await?;

    Ok(Json(resource.into()))
}

/// DELETE /api/v1/admin/resources/{id} - delete a resource (editor)
pub async fn delete_resource(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.resource_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
