//! Podcast episode service
//!
//! Same shape as the news service without the markdown step: episodes
//! store plain-text descriptions.

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{Cache, CacheLayer};
use crate::db::repositories::{CategoryRepository, PodcastRepository};
use crate::models::{
    Category, CreateEpisodeInput, Episode, ListParams, PagedResult, UpdateEpisodeInput,
};

/// Cache TTL for single episodes (1 hour)
const EPISODE_CACHE_TTL_SECS: u64 = 3600;

const CACHE_KEY_EPISODE_BY_ID: &str = "podcast:id:";
const CACHE_KEY_PREFIX: &str = "podcast:";

/// Error types for podcast service operations
#[derive(Debug, thiserror::Error)]
pub enum PodcastServiceError {
    #[error("Episode not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Episode slug already exists: {0}")]
    DuplicateSlug(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Podcast episode service
pub struct PodcastService {
    repo: Arc<dyn PodcastRepository>,
    category_repo: Arc<dyn CategoryRepository>,
    cache: Arc<Cache>,
    cache_ttl: Duration,
}

impl PodcastService {
    /// Create a new podcast service
    pub fn new(
        repo: Arc<dyn PodcastRepository>,
        category_repo: Arc<dyn CategoryRepository>,
        cache: Arc<Cache>,
    ) -> Self {
        Self {
            repo,
            category_repo,
            cache,
            cache_ttl: Duration::from_secs(EPISODE_CACHE_TTL_SECS),
        }
    }

    /// Create an episode
    pub async fn create(
        &self,
        input: CreateEpisodeInput,
        category_ids: &[i64],
    ) -> Result<Episode, PodcastServiceError> {
        if input.title.trim().is_empty() {
            return Err(PodcastServiceError::ValidationError(
                "Title cannot be empty".into(),
            ));
        }
        if input.slug.trim().is_empty() {
            return Err(PodcastServiceError::ValidationError(
                "Slug cannot be empty".into(),
            ));
        }
        if input.audio_url.trim().is_empty() {
            return Err(PodcastServiceError::ValidationError(
                "Audio URL cannot be empty".into(),
            ));
        }
        if input.duration_seconds < 0 {
            return Err(PodcastServiceError::ValidationError(
                "Duration cannot be negative".into(),
            ));
        }

        if self
            .repo
            .exists_by_slug(&input.slug)
            .await
            .context("Slug check failed")?
        {
            return Err(PodcastServiceError::DuplicateSlug(input.slug));
        }

        let episode = self
            .repo
            .create(&input)
            .await
            .context("Episode creation failed")?;

        self.category_repo
            .set_for_episode(episode.id, category_ids)
            .await
            .context("Category assignment failed")?;

        self.invalidate_cache(episode.id).await;
        Ok(episode)
    }

    /// Update an episode
    pub async fn update(
        &self,
        id: i64,
        input: UpdateEpisodeInput,
        category_ids: Option<&[i64]>,
    ) -> Result<Episode, PodcastServiceError> {
        if !input.has_changes() && category_ids.is_none() {
            return Err(PodcastServiceError::ValidationError(
                "No fields to update".into(),
            ));
        }

        let episode = self.repo.update(id, &input).await.map_err(|e| {
            if e.to_string().contains("not found") {
                PodcastServiceError::NotFound(id.to_string())
            } else {
                PodcastServiceError::InternalError(e)
            }
        })?;

        if let Some(ids) = category_ids {
            self.category_repo
                .set_for_episode(id, ids)
                .await
                .context("Category assignment failed")?;
        }

        self.invalidate_cache(id).await;
        Ok(episode)
    }

    /// Get an episode by ID, via the cache
    pub async fn get_by_id(&self, id: i64) -> anyhow::Result<Option<Episode>> {
        let cache_key = format!("{}{}", CACHE_KEY_EPISODE_BY_ID, id);

        if let Ok(Some(cached)) = self.cache.get::<Episode>(&cache_key).await {
            return Ok(Some(cached));
        }

        let episode = self.repo.get_by_id(id).await?;
        if let Some(ref episode) = episode {
            let _ = self.cache.set(&cache_key, episode, self.cache_ttl).await;
        }
        Ok(episode)
    }

    /// Get a published episode by ID
    pub async fn get_published(&self, id: i64) -> anyhow::Result<Option<Episode>> {
        Ok(self.get_by_id(id).await?.filter(|e| e.is_published()))
    }

    /// List all episodes with pagination
    pub async fn list(&self, params: &ListParams) -> anyhow::Result<PagedResult<Episode>> {
        let items = self.repo.list(params.offset(), params.limit()).await?;
        let total = self.repo.count().await?;
        Ok(PagedResult::new(items, total, params))
    }

    /// List published episodes with pagination
    pub async fn list_published(&self, params: &ListParams) -> anyhow::Result<PagedResult<Episode>> {
        let items = self
            .repo
            .list_published(params.offset(), params.limit())
            .await?;
        let total = self.repo.count_published().await?;
        Ok(PagedResult::new(items, total, params))
    }

    /// Delete an episode
    pub async fn delete(&self, id: i64) -> Result<(), PodcastServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Episode lookup failed")?
            .ok_or_else(|| PodcastServiceError::NotFound(id.to_string()))?;

        self.repo.delete(id).await.context("Episode deletion failed")?;
        self.invalidate_cache(id).await;
        Ok(())
    }

    /// Categories attached to an episode
    pub async fn categories(&self, episode_id: i64) -> anyhow::Result<Vec<Category>> {
        self.category_repo.get_for_episode(episode_id).await
    }

    /// Total and published counts (admin dashboard)
    pub async fn counts(&self) -> anyhow::Result<(i64, i64)> {
        let total = self.repo.count().await?;
        let published = self.repo.count_published().await?;
        Ok((total, published))
    }

    async fn invalidate_cache(&self, id: i64) {
        let _ = self
            .cache
            .delete(&format!("{}{}", CACHE_KEY_EPISODE_BY_ID, id))
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
    use crate::db::repositories::{SqlxCategoryRepository, SqlxPodcastRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::ArticleStatus;

    async fn setup() -> PodcastService {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        PodcastService::new(
            SqlxPodcastRepository::boxed(pool.clone()),
            SqlxCategoryRepository::boxed(pool),
            Arc::new(Cache::Memory(MemoryCache::new())),
        )
    }

    fn input(slug: &str) -> CreateEpisodeInput {
        CreateEpisodeInput {
            slug: slug.to_string(),
            title: "Audit season special".to_string(),
            description: "A conversation about audit season.".to_string(),
            audio_url: "https://cdn.example.com/ep.mp3".to_string(),
            duration_seconds: 2400,
            episode_number: 12,
            host_name: "Jordan".to_string(),
            status: Some(ArticleStatus::Published),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let service = setup().await;
        let episode = service.create(input("ep-12"), &[]).await.unwrap();
        assert!(episode.is_published());

        let found = service.get_published(episode.id).await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_validation() {
        let service = setup().await;
        let mut bad = input("bad");
        bad.audio_url = String::new();
        assert!(matches!(
            service.create(bad, &[]).await,
            Err(PodcastServiceError::ValidationError(_))
        ));

        let mut negative = input("neg");
        negative.duration_seconds = -5;
        assert!(matches!(
            service.create(negative, &[]).await,
            Err(PodcastServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_slug() {
        let service = setup().await;
        service.create(input("dup"), &[]).await.unwrap();
        assert!(matches!(
            service.create(input("dup"), &[]).await,
            Err(PodcastServiceError::DuplicateSlug(_))
        ));
    }
}
