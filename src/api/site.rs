//! Site info API endpoints

use axum::{extract::State, Json};
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState};

/// Public site metadata for the SPA shell
#[derive(Debug, Serialize)]
pub struct SiteResponse {
    pub name: String,
    pub description: String,
    pub base_url: String,
    pub version: &'static str,
}

/// GET /api/v1/site
pub async fn site_info(State(state): State<AppState>) -> Result<Json<SiteResponse>, ApiError> {
    Ok(Json(SiteResponse {
        name: state.settings_service.site_name().await,
        description: state.settings_service.site_description().await,
        base_url: state.settings_service.base_url().await,
        version: env!("CARGO_PKG_VERSION"),
    }))
}
