//! Menu API endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::MenuSetting;

/// Response for a menu entry
#[derive(Debug, Serialize)]
pub struct MenuResponse {
    pub key: String,
    pub label: String,
    pub is_visible: bool,
    pub sort_order: i32,
}

impl From<MenuSetting> for MenuResponse {
    fn from(m: MenuSetting) -> Self {
        Self {
            key: m.key,
            label: m.label,
            is_visible: m.is_visible,
            sort_order: m.sort_order,
        }
    }
}

/// Request for updating a menu entry
#[derive(Debug, Deserialize)]
pub struct UpdateMenuRequest {
    pub is_visible: bool,
    pub sort_order: i32,
}

/// GET /api/v1/menu - visible menu entries for the SPA
pub async fn list_visible_menu(
    State(state): State<AppState>,
) -> Result<Json<Vec<MenuResponse>>, ApiError> {
    let entries = state.menu_service.list_visible().await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

/// GET /api/v1/admin/menu - all menu entries (admin)
pub async fn list_menu(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<Json<Vec<MenuResponse>>, ApiError> {
    let entries = state.menu_service.list().await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

/// PUT /api/v1/admin/menu/{key} - toggle visibility / reorder (admin)
pub async fn update_menu(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(key): Path<String>,
    Json(request): Json<UpdateMenuRequest>,
) -> Result<Json<MenuResponse>, ApiError> {
    let entry = state
        .menu_service
        .update(&key, request.is_visible, request.sort_order)
        .await?;
    Ok(Json(entry.into()))
}
