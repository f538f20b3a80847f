//! News article service
//!
//! Business logic for news articles:
//! - CRUD with validation and slug uniqueness
//! - Markdown rendering into stored HTML
//! - Cache management for single-article and published-list reads
//! - Category assignment

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{Cache, CacheLayer};
use crate::db::repositories::{CategoryRepository, NewsRepository};
use crate::models::{
    Article, Category, CreateArticleInput, ListParams, PagedResult, UpdateArticleInput,
};
use crate::services::markdown::MarkdownRenderer;

/// Cache TTL for single articles (1 hour)
const ARTICLE_CACHE_TTL_SECS: u64 = 3600;

/// Cache key prefixes
const CACHE_KEY_ARTICLE_BY_ID: &str = "news:id:";
const CACHE_KEY_PREFIX: &str = "news:";

/// Error types for news service operations
#[derive(Debug, thiserror::Error)]
pub enum NewsServiceError {
    #[error("Article not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Article slug already exists: {0}")]
    DuplicateSlug(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// News article service
pub struct NewsService {
    repo: Arc<dyn NewsRepository>,
    category_repo: Arc<dyn CategoryRepository>,
    cache: Arc<Cache>,
    markdown_renderer: MarkdownRenderer,
    cache_ttl: Duration,
}

impl NewsService {
    /// Create a new news service
    pub fn new(
        repo: Arc<dyn NewsRepository>,
        category_repo: Arc<dyn CategoryRepository>,
        cache: Arc<Cache>,
        markdown_renderer: MarkdownRenderer,
    ) -> Self {
        Self {
            repo,
            category_repo,
            cache,
            markdown_renderer,
            cache_ttl: Duration::from_secs(ARTICLE_CACHE_TTL_SECS),
        }
    }

    /// Create an article, rendering markdown when no HTML was supplied.
    ///
    /// `category_ids` replaces the article's category set.
    pub async fn create(
        &self,
        mut input: CreateArticleInput,
        category_ids: &[i64],
    ) -> Result<Article, NewsServiceError> {
        self.validate_create(&input)?;

        if self
            .repo
            .exists_by_slug(&input.slug)
            .await
            .context("Slug check failed")?
        {
            return Err(NewsServiceError::DuplicateSlug(input.slug));
        }

        if input.content_html.is_none() {
            input.content_html = Some(self.markdown_renderer.render(&input.content));
        }

        let article = self
            .repo
            .create(&input)
            .await
            .context("Article creation failed")?;

        self.category_repo
            .set_for_article(article.id, category_ids)
            .await
            .context("Category assignment failed")?;

        self.invalidate_cache(article.id).await;
        Ok(article)
    }

    /// Update an article; re-renders markdown when content changed but no
    /// HTML was supplied.
    pub async fn update(
        &self,
        id: i64,
        mut input: UpdateArticleInput,
        category_ids: Option<&[i64]>,
    ) -> Result<Article, NewsServiceError> {
        if !input.has_changes() && category_ids.is_none() {
            return Err(NewsServiceError::ValidationError(
                "No fields to update".into(),
            ));
        }

        if let Some(slug) = &input.slug {
            if slug.trim().is_empty() {
                return Err(NewsServiceError::ValidationError("Slug cannot be empty".into()));
            }
            if self
                .repo
                .exists_by_slug_excluding(slug, id)
                .await
                .context("Slug check failed")?
            {
                return Err(NewsServiceError::DuplicateSlug(slug.clone()));
            }
        }

        if let (Some(content), None) = (&input.content, &input.content_html) {
            input.content_html = Some(self.markdown_renderer.render(content));
        }

        let article = self.repo.update(id, &input).await.map_err(|e| {
            if e.to_string().contains("not found") {
                NewsServiceError::NotFound(id.to_string())
            } else {
                NewsServiceError::InternalError(e)
            }
        })?;

        if let Some(ids) = category_ids {
            self.category_repo
                .set_for_article(id, ids)
                .await
                .context("Category assignment failed")?;
        }

        self.invalidate_cache(id).await;
        Ok(article)
    }

    /// Get an article by ID, via the cache
    pub async fn get_by_id(&self, id: i64) -> anyhow::Result<Option<Article>> {
        let cache_key = format!("{}{}", CACHE_KEY_ARTICLE_BY_ID, id);

        if let Ok(Some(cached)) = self.cache.get::<Article>(&cache_key).await {
            return Ok(Some(cached));
        }

        let article = self.repo.get_by_id(id).await?;
        if let Some(ref article) = article {
            let _ = self.cache.set(&cache_key, article, self.cache_ttl).await;
        }
        Ok(article)
    }

    /// Get a published article by ID; drafts and archived articles are
    /// treated as absent.
    pub async fn get_published(&self, id: i64) -> anyhow::Result<Option<Article>> {
        Ok(self.get_by_id(id).await?.filter(|a| a.is_published()))
    }

    /// Get an article by slug (uncached; admin lookups)
    pub async fn get_by_slug(&self, slug: &str) -> anyhow::Result<Option<Article>> {
        self.repo.get_by_slug(slug).await
    }

    /// List all articles with pagination
    pub async fn list(&self, params: &ListParams) -> anyhow::Result<PagedResult<Article>> {
        let items = self.repo.list(params.offset(), params.limit()).await?;
        let total = self.repo.count().await?;
        Ok(PagedResult::new(items, total, params))
    }

    /// List published articles with pagination
    pub async fn list_published(&self, params: &ListParams) -> anyhow::Result<PagedResult<Article>> {
        let items = self
            .repo
            .list_published(params.offset(), params.limit())
            .await?;
        let total = self.repo.count_published().await?;
        Ok(PagedResult::new(items, total, params))
    }

    /// Delete an article
    pub async fn delete(&self, id: i64) -> Result<(), NewsServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Article lookup failed")?
            .ok_or_else(|| NewsServiceError::NotFound(id.to_string()))?;

        self.repo.delete(id).await.context("Article deletion failed")?;
        self.invalidate_cache(id).await;
        Ok(())
    }

    /// Categories attached to an article
    pub async fn categories(&self, article_id: i64) -> anyhow::Result<Vec<Category>> {
        self.category_repo.get_for_article(article_id).await
    }

    /// Record a view
    pub async fn record_view(&self, id: i64) -> anyhow::Result<()> {
        self.repo.increment_view(id).await
    }

    /// Total and published counts (admin dashboard)
    pub async fn counts(&self) -> anyhow::Result<(i64, i64)> {
        let total = self.repo.count().await?;
        let published = self.repo.count_published().await?;
        Ok((total, published))
    }

    fn validate_create(&self, input: &CreateArticleInput) -> Result<(), NewsServiceError> {
        if input.title.trim().is_empty() {
            return Err(NewsServiceError::ValidationError("Title cannot be empty".into()));
        }
        if input.slug.trim().is_empty() {
            return Err(NewsServiceError::ValidationError("Slug cannot be empty".into()));
        }
        if input.content.trim().is_empty() {
            return Err(NewsServiceError::ValidationError(
                "Content cannot be empty".into(),
            ));
        }
        Ok(())
    }

    async fn invalidate_cache(&self, id: i64) {
        let _ = self
            .cache
            .delete(&format!("{}{}", CACHE_KEY_ARTICLE_BY_ID, id))
            .await;
        let _ = self
            .cache
            .delete_pattern(&format!("{}list*", CACHE_KEY_PREFIX))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::db::repositories::{SqlxCategoryRepository, SqlxNewsRepository};
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use crate::models::ArticleStatus;

    async fn setup() -> (DynDatabasePool, NewsService) {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        sqlx::query(
            "INSERT INTO users (username, email, password_hash, role) VALUES ('e', 'e@x.com', 'h', 'editor')",
        )
        .execute(pool.as_sqlite().unwrap())
        .await
        .unwrap();

        let service = NewsService::new(
            SqlxNewsRepository::boxed(pool.clone()),
            SqlxCategoryRepository::boxed(pool.clone()),
            Arc::new(Cache::Memory(MemoryCache::new())),
            MarkdownRenderer::new(),
        );
        (pool, service)
    }

    fn input(slug: &str) -> CreateArticleInput {
        CreateArticleInput {
            slug: slug.to_string(),
            title: "Quarterly results".to_string(),
            summary: "A look at the quarter.".to_string(),
            content: "# Results\n\nRevenue was **up**.".to_string(),
            content_html: None,
            cover_image: None,
            author_id: 1,
            status: None,
        }
    }

    #[tokio::test]
    async fn test_create_renders_markdown() {
        let (_pool, service) = setup().await;

        let article = service.create(input("q1"), &[]).await.unwrap();
        assert!(article.content_html.contains("<h1>"));
        assert!(article.content_html.contains("<strong>up</strong>"));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_title() {
        let (_pool, service) = setup().await;
        let mut bad = input("q2");
        bad.title = "  ".into();

        let result = service.create(bad, &[]).await;
        assert!(matches!(result, Err(NewsServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_slug() {
        let (_pool, service) = setup().await;
        service.create(input("dup"), &[]).await.unwrap();

        let result = service.create(input("dup"), &[]).await;
        assert!(matches!(result, Err(NewsServiceError::DuplicateSlug(_))));
    }

    #[tokio::test]
    async fn test_get_published_hides_drafts() {
        let (_pool, service) = setup().await;
        let draft = service.create(input("draft"), &[]).await.unwrap();

        assert!(service.get_published(draft.id).await.unwrap().is_none());

        let update = UpdateArticleInput {
            status: Some(ArticleStatus::Published),
            ..Default::default()
        };
        service.update(draft.id, update, None).await.unwrap();
        assert!(service.get_published(draft.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_invalidates_cache() {
        let (_pool, service) = setup().await;
        let article = service.create(input("cached"), &[]).await.unwrap();

        // Prime the cache
        let _ = service.get_by_id(article.id).await.unwrap();

        let update = UpdateArticleInput {
            title: Some("New title".into()),
            ..Default::default()
        };
        service.update(article.id, update, None).await.unwrap();

        let reloaded = service.get_by_id(article.id).await.unwrap().unwrap();
        assert_eq!(reloaded.title, "New title");
    }

    #[tokio::test]
    async fn test_category_assignment() {
        let (pool, service) = setup().await;
        let category_repo = SqlxCategoryRepository::new(pool.clone());
        let markets = category_repo
            .create(&crate::models::CreateCategoryInput {
                slug: "markets".into(),
                name: "Markets".into(),
                description: None,
            })
            .await
            .unwrap();

        let article = service.create(input("cat"), &[markets.id]).await.unwrap();
        let categories = service.categories(article.id).await.unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].slug, "markets");
    }

    #[tokio::test]
    async fn test_delete_missing_article() {
        let (_pool, service) = setup().await;
        let result = service.delete(4242).await;
        assert!(matches!(result, Err(NewsServiceError::NotFound(_))));
    }
}
