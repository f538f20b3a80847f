//! Podcast episode API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{
    ArticleStatus, Category, CreateEpisodeInput, Episode, ListParams, UpdateEpisodeInput,
};

/// Query parameters for listing episodes
#[derive(Debug, Deserialize)]
pub struct ListEpisodesQuery {
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

/// Response for a single episode
#[derive(Debug, Serialize)]
pub struct EpisodeResponse {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub audio_url: String,
    pub duration_seconds: i64,
    pub episode_number: i32,
    pub host_name: String,
    pub status: String,
    pub published_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub categories: Vec<super::news::CategoryInfo>,
}

impl EpisodeResponse {
    fn from_episode(episode: Episode, categories: Vec<Category>) -> Self {
        Self {
            id: episode.id,
            slug: episode.slug,
            title: episode.title,
            description: episode.description,
            audio_url: episode.audio_url,
            duration_seconds: episode.duration_seconds,
            episode_number: episode.episode_number,
            host_name: episode.host_name,
            status: episode.status.to_string(),
            published_at: episode.published_at.map(|dt| dt.to_rfc3339()),
            created_at: episode.created_at.to_rfc3339(),
            updated_at: episode.updated_at.to_rfc3339(),
            categories: categories
                .into_iter()
                .map(|c| super::news::CategoryInfo {
                    id: c.id,
                    slug: c.slug,
                    name: c.name,
                })
                .collect(),
        }
    }
}

/// Response for episode lists
#[derive(Debug, Serialize)]
pub struct EpisodeListResponse {
    pub episodes: Vec<EpisodeResponse>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

/// Request body for creating an episode
#[derive(Debug, Deserialize)]
pub struct CreateEpisodeRequest {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub audio_url: String,
    #[serde(default)]
    pub duration_seconds: i64,
    #[serde(default)]
    pub episode_number: i32,
    #[serde(default)]
    pub host_name: String,
    pub status: Option<String>,
    #[serde(default)]
    pub category_ids: Vec<i64>,
}

/// Request body for updating an episode
#[derive(Debug, Deserialize)]
pub struct UpdateEpisodeRequest {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub audio_url: Option<String>,
    pub duration_seconds: Option<i64>,
    pub episode_number: Option<i32>,
    pub host_name: Option<String>,
    pub status: Option<String>,
    pub category_ids: Option<Vec<i64>>,
}

fn parse_status(status: Option<&str>) -> Result<Option<ArticleStatus>, ApiError> {
    match status {
        None => Ok(None),
        Some(s) => ArticleStatus::from_str(s)
            .map(Some)
            .ok_or_else(|| ApiError::validation_error(format!("Invalid status: {}", s))),
    }
}

/// GET /api/v1/podcasts - list published episodes
pub async fn list_episodes(
    State(state): State<AppState>,
    Query(query): Query<ListEpisodesQuery>,
) -> Result<Json<EpisodeListResponse>, ApiError> {
    let params = ListParams::new(query.page, query.page_size);
    let result = state.podcast_service.list_published(&params).await?;
    build_list_response(&state, result, &params).await
}

/// GET /api/v1/admin/podcasts - list all episodes including drafts (editor)
pub async fn list_episodes_all(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<ListEpisodesQuery>,
) -> Result<Json<EpisodeListResponse>, ApiError> {
    let params = ListParams::new(query.page, query.page_size);
    let result = state.podcast_service.list(&params).await?;
    build_list_response(&state, result, &params).await
}

async fn build_list_response(
    state: &AppState,
    result: crate::models::PagedResult<Episode>,
    params: &ListParams,
) -> Result<Json<EpisodeListResponse>, ApiError> {
    let total = result.total;
    let total_pages = result.total_pages();

    let mut episodes = Vec::with_capacity(result.items.len());
    for episode in result.items {
        let categories = state
            .podcast_service
            .categories(episode.id)
            .await
            .unwrap_or_default();
        episodes.push(EpisodeResponse::from_episode(episode, categories));
    }

    Ok(Json(EpisodeListResponse {
        episodes,
        total,
        page: params.page,
        page_size: params.per_page,
        total_pages,
    }))
}

/// GET /api/v1/podcasts/{id} - single published episode
pub async fn get_episode(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<EpisodeResponse>, ApiError> {
    let episode = state
        .podcast_service
        .get_published(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Episode not found: {}", id)))?;

    let categories = state.podcast_service.categories(episode.id).await?;
    Ok(Json(EpisodeResponse::from_episode(episode, categories)))
}

/// POST /api/v1/podcasts - create episode (editor)
pub async fn create_episode(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(request): Json<CreateEpisodeRequest>,
) -> Result<(StatusCode, Json<EpisodeResponse>), ApiError> {
    let status = parse_status(request.status.as_deref())?;

    let input = CreateEpisodeInput {
        slug: request.slug,
        title: request.title,
        description: request.description,
        audio_url: request.audio_url,
        duration_seconds: request.duration_seconds,
        episode_number: request.episode_number,
        host_name: request.host_name,
        status,
    };

    let episode = state
        .podcast_service
        .create(input, &request.category_ids)
        .await?;
    let categories = state.podcast_service.categories(episode.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(EpisodeResponse::from_episode(episode, categories)),
    ))
}

/// PUT /api/v1/podcasts/{id} - update episode (editor)
pub async fn update_episode(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateEpisodeRequest>,
) -> Result<Json<EpisodeResponse>, ApiError> {
    let status = parse_status(request.status.as_deref())?;

    let input = UpdateEpisodeInput {
        slug: request.slug,
        title: request.title,
        description: request.description,
        audio_url: request.audio_url,
        duration_seconds: request.duration_seconds,
        episode_number: request.episode_number,
        host_name: request.host_name,
        status,
    };

    let episode = state
        .podcast_service
        .update(id, input, request.category_ids.as_deref())
        .await?;
    let categories = state.podcast_service.categories(episode.id).await?;

    Ok(Json(EpisodeResponse::from_episode(episode, categories)))
}

/// DELETE /api/v1/podcasts/{id} - delete episode (editor)
pub async fn delete_episode(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.podcast_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
