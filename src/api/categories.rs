//! Category API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{Category, CreateCategoryInput, UpdateCategoryInput};

/// Response for a category
#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            slug: category.slug,
            name: category.name,
            description: category.description,
            created_at: category.created_at.to_rfc3339(),
        }
    }
}

/// Request for creating a category
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
}

/// Request for updating a category
#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    pub slug: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
}

/// GET /api/v1/news/categories - list all categories
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let categories = state.category_repo.list().await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

/// POST /api/v1/admin/categories - create a category (editor)
pub async fn create_category(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>), ApiError> {
    if request.slug.trim().is_empty() || request.name.trim().is_empty() {
        return Err(ApiError::validation_error("Slug and name are required"));
    }
    if state.category_repo.get_by_slug(&request.slug).await?.is_some() {
        return Err(ApiError::conflict(format!(
            "Category slug already exists: {}",
            request.slug
        )));
    }

    let category = state
        .category_repo
        .create(&CreateCategoryInput {
            slug: request.slug,
            name: request.name,
            description: request.description,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(category.into())))
}

/// PUT /api/v1/admin/categories/{id} - update a category (editor)
pub async fn update_category(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateCategoryRequest>,
) -> Result<Json<CategoryResponse>, ApiError> {
    state
        .category_repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Category not found: {}", id)))?;

    let category = state
        .category_repo
        .update(
            id,
            &UpdateCategoryInput {
                slug: request.slug,
                name: request.name,
                description: request.description,
            },
        )
        .await?;

    Ok(Json(category.into()))
}

/// DELETE /api/v1/admin/categories/{id} - delete a category (editor)
pub async fn delete_category(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .category_repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Category not found: {}", id)))?;

    state.category_repo.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
