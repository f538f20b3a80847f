//! News article API endpoints
//!
//! - GET /api/v1/news - published articles with pagination
//! - GET /api/v1/news/{id} - single published article
//! - POST/PUT/DELETE under the editor surface

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{
    Article, ArticleStatus, Category, CreateArticleInput, ListParams, UpdateArticleInput,
};

/// Query parameters for listing articles
#[derive(Debug, Deserialize)]
pub struct ListNewsQuery {
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

/// Response for a single article
#[derive(Debug, Serialize)]
pub struct ArticleResponse {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub content_html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    pub author_id: i64,
    pub status: String,
    pub published_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub view_count: i64,
    pub categories: Vec<CategoryInfo>,
}

#[derive(Debug, Serialize, Clone)]
pub struct CategoryInfo {
    pub id: i64,
    pub slug: String,
    pub name: String,
}

impl ArticleResponse {
    fn from_article(article: Article, categories: Vec<Category>) -> Self {
        Self {
            id: article.id,
            slug: article.slug,
            title: article.title,
            summary: article.summary,
            content: article.content,
            content_html: article.content_html,
            cover_image: article.cover_image,
            author_id: article.author_id,
            status: article.status.to_string(),
            published_at: article.published_at.map(|dt| dt.to_rfc3339()),
            created_at: article.created_at.to_rfc3339(),
            updated_at: article.updated_at.to_rfc3339(),
            view_count: article.view_count,
            categories: categories
                .into_iter()
                .map(|c| CategoryInfo {
                    id: c.id,
                    slug: c.slug,
                    name: c.name,
                })
                .collect(),
        }
    }
}

/// Response for article lists
#[derive(Debug, Serialize)]
pub struct NewsListResponse {
    pub articles: Vec<ArticleResponse>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

/// Request body for creating an article
#[derive(Debug, Deserialize)]
pub struct CreateNewsRequest {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    pub content: String,
    pub cover_image: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub category_ids: Vec<i64>,
}

/// Request body for updating an article
#[derive(Debug, Deserialize)]
pub struct UpdateNewsRequest {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub cover_image: Option<String>,
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

/// GET /api/v1/news - list published articles
pub async fn list_news(
    State(state): State<AppState>,
    Query(query): Query<ListNewsQuery>,
) -> Result<Json<NewsListResponse>, ApiError> {
    let params = ListParams::new(query.page, query.page_size);
    let result = state.news_service.list_published(&params).await?;
    build_list_response(&state, result, &params).await
}

/// GET /api/v1/admin/news - list all articles including drafts (editor)
pub async fn list_news_all(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<ListNewsQuery>,
) -> Result<Json<NewsListResponse>, ApiError> {
    let params = ListParams::new(query.page, query.page_size);
    let result = state.news_service.list(&params).await?;
    build_list_response(&state, result, &params).await
}

async fn build_list_response(
    state: &AppState,
    result: crate::models::PagedResult<Article>,
    params: &ListParams,
) -> Result<Json<NewsListResponse>, ApiError> {
    let total = result.total;
    let total_pages = result.total_pages();

    let mut articles = Vec::with_capacity(result.items.len());
    for article in result.items {
        let categories = state
            .news_service
            .categories(article.id)
            .await
            .unwrap_or_default();
        articles.push(ArticleResponse::from_article(article, categories));
    }

    Ok(Json(NewsListResponse {
        articles,
        total,
        page: params.page,
        page_size: params.per_page,
        total_pages,
    }))
}

/// GET /api/v1/news/{id} - single published article.
///
/// Drafts and archived articles return 404 to avoid leaking their
/// existence.
pub async fn get_news(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ArticleResponse>, ApiError> {
    let article = state
        .news_service
        .get_published(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Article not found: {}", id)))?;

    state.news_service.record_view(article.id).await.ok();

    let categories = state.news_service.categories(article.id).await?;
    Ok(Json(ArticleResponse::from_article(article, categories)))
}

/// GET /api/v1/admin/news/{id} - any article regardless of status
pub async fn get_news_any_status(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<ArticleResponse>, ApiError> {
    let article = state
        .news_service
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Article not found: {}", id)))?;

    let categories = state.news_service.categories(article.id).await?;
    Ok(Json(ArticleResponse::from_article(article, categories)))
}

/// POST /api/v1/news - create article (editor)
pub async fn create_news(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateNewsRequest>,
) -> Result<(StatusCode, Json<ArticleResponse>), ApiError> {
    let status = parse_status(request.status.as_deref())?;

    let input = CreateArticleInput {
        slug: request.slug,
        title: request.title,
        summary: request.summary,
        content: request.content,
        content_html: None,
        cover_image: request.cover_image,
        author_id: user.0.id,
        status,
    };

    let article = state
        .news_service
        .create(input, &request.category_ids)
        .await?;
    let categories = state.news_service.categories(article.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(ArticleResponse::from_article(article, categories)),
    ))
}

/// PUT /api/v1/news/{id} - update article (editor)
pub async fn update_news(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateNewsRequest>,
) -> Result<Json<ArticleResponse>, ApiError> {
    let status = parse_status(request.status.as_deref())?;

    let input = UpdateArticleInput {
        slug: request.slug,
        title: request.title,
        summary: request.summary,
        content: request.content,
        content_html: None,
        cover_image: request.cover_image,
        status,
    };

    let article = state
        .news_service
        .update(id, input, request.category_ids.as_deref())
        .await?;
    let categories = state.news_service.categories(article.id).await?;

    Ok(Json(ArticleResponse::from_article(article, categories)))
}

/// DELETE /api/v1/news/{id} - delete article (editor)
pub async fn delete_news(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.news_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
