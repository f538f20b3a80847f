//! Podcast episode repository
//!
//! Database operations for podcast episodes, mirroring the news repository
//! where the entities overlap (publication lifecycle, slug uniqueness).

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{ArticleStatus, CreateEpisodeInput, Episode, UpdateEpisodeInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Podcast episode repository trait
#[async_trait]
pub trait PodcastRepository: Send + Sync {
    /// Create a new episode
    async fn create(&self, input: &CreateEpisodeInput) -> Result<Episode>;

    /// Get episode by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Episode>>;

    /// Get episode by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Episode>>;

    /// List episodes with pagination (all statuses, newest first)
    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Episode>>;

    /// Count total episodes
    async fn count(&self) -> Result<i64>;

    /// List only published episodes (ordered by published_at DESC)
    async fn list_published(&self, offset: i64, limit: i64) -> Result<Vec<Episode>>;

    /// Count published episodes
    async fn count_published(&self) -> Result<i64>;

    /// Update an episode
    async fn update(&self, id: i64, input: &UpdateEpisodeInput) -> Result<Episode>;

    /// Delete an episode
    async fn delete(&self, id: i64) -> Result<()>;

    /// Check if a slug already exists
    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;
}

/// SQLx-based podcast repository implementation
pub struct SqlxPodcastRepository {
    pool: DynDatabasePool,
}

impl SqlxPodcastRepository {
    /// Create a new SQLx podcast repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PodcastRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PodcastRepository for SqlxPodcastRepository {
    async fn create(&self, input: &CreateEpisodeInput) -> Result<Episode> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_episode_sqlite(self.pool.as_sqlite().unwrap(), input).await
            }
            DatabaseDriver::Mysql => {
                create_episode_mysql(self.pool.as_mysql().unwrap(), input).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Episode>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_episode_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => {
                get_episode_by_id_mysql(self.pool.as_mysql().unwrap(), id).await
            }
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Episode>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_episode_by_slug_sqlite(self.pool.as_sqlite().unwrap(), slug).await
            }
            DatabaseDriver::Mysql => {
                get_episode_by_slug_mysql(self.pool.as_mysql().unwrap(), slug).await
            }
        }
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Episode>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_episodes_sqlite(self.pool.as_sqlite().unwrap(), offset, limit, false).await
            }
            DatabaseDriver::Mysql => {
                list_episodes_mysql(self.pool.as_mysql().unwrap(), offset, limit, false).await
            }
        }
    }

    async fn count(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                count_episodes_sqlite(self.pool.as_sqlite().unwrap(), false).await
            }
            DatabaseDriver::Mysql => {
                count_episodes_mysql(self.pool.as_mysql().unwrap(), false).await
            }
        }
    }

    async fn list_published(&self, offset: i64, limit: i64) -> Result<Vec<Episode>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_episodes_sqlite(self.pool.as_sqlite().unwrap(), offset, limit, true).await
            }
            DatabaseDriver::Mysql => {
                list_episodes_mysql(self.pool.as_mysql().unwrap(), offset, limit, true).await
            }
        }
    }

    async fn count_published(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                count_episodes_sqlite(self.pool.as_sqlite().unwrap(), true).await
            }
            DatabaseDriver::Mysql => count_episodes_mysql(self.pool.as_mysql().unwrap(), true).await,
        }
    }

    async fn update(&self, id: i64, input: &UpdateEpisodeInput) -> Result<Episode> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_episode_sqlite(self.pool.as_sqlite().unwrap(), id, input).await
            }
            DatabaseDriver::Mysql => {
                update_episode_mysql(self.pool.as_mysql().unwrap(), id, input).await
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                delete_episode_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => delete_episode_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                exists_by_slug_sqlite(self.pool.as_sqlite().unwrap(), slug).await
            }
            DatabaseDriver::Mysql => {
                exists_by_slug_mysql(self.pool.as_mysql().unwrap(), slug).await
            }
        }
    }
}

const EPISODE_COLUMNS: &str = "id, slug, title, description, audio_url, duration_seconds, \
     episode_number, host_name, status, published_at, created_at, updated_at";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_episode_sqlite(pool: &SqlitePool, input: &CreateEpisodeInput) -> Result<Episode> {
    let now = Utc::now();
    let status = input.status.unwrap_or_default();
    let published_at = if status == ArticleStatus::Published {
        Some(now)
    } else {
        None
    };

    let result = sqlx::query(
        r#"
        INSERT INTO podcast_episodes (slug, title, description, audio_url, duration_seconds, episode_number, host_name, status, published_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.slug)
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.audio_url)
    .bind(input.duration_seconds)
    .bind(input.episode_number)
    .bind(&input.host_name)
    .bind(status.as_str())
    .bind(published_at)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create episode")?;

    Ok(Episode {
        id: result.last_insert_rowid(),
        slug: input.slug.clone(),
        title: input.title.clone(),
        description: input.description.clone(),
        audio_url: input.audio_url.clone(),
        duration_seconds: input.duration_seconds,
        episode_number: input.episode_number,
        host_name: input.host_name.clone(),
        status,
        published_at,
        created_at: now,
        updated_at: now,
    })
}

async fn get_episode_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Episode>> {
    let query = format!(
        "SELECT {} FROM podcast_episodes WHERE id = ?",
        EPISODE_COLUMNS
    );
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get episode by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_episode_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn get_episode_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<Episode>> {
    let query = format!(
        "SELECT {} FROM podcast_episodes WHERE slug = ?",
        EPISODE_COLUMNS
    );
    let row = sqlx::query(&query)
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get episode by slug")?;

    match row {
        Some(row) => Ok(Some(row_to_episode_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn list_episodes_sqlite(
    pool: &SqlitePool,
    offset: i64,
    limit: i64,
    published_only: bool,
) -> Result<Vec<Episode>> {
    let query = if published_only {
        format!(
            "SELECT {} FROM podcast_episodes WHERE status = 'published' ORDER BY published_at DESC LIMIT ? OFFSET ?",
            EPISODE_COLUMNS
        )
    } else {
        format!(
            "SELECT {} FROM podcast_episodes ORDER BY created_at DESC LIMIT ? OFFSET ?",
            EPISODE_COLUMNS
        )
    };

    let rows = sqlx::query(&query)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list episodes")?;

    let mut episodes = Vec::new();
    for row in rows {
        episodes.push(row_to_episode_sqlite(&row)?);
    }

    Ok(episodes)
}

async fn count_episodes_sqlite(pool: &SqlitePool, published_only: bool) -> Result<i64> {
    let query = if published_only {
        "SELECT COUNT(*) as count FROM podcast_episodes WHERE status = 'published'"
    } else {
        "SELECT COUNT(*) as count FROM podcast_episodes"
    };
    let row = sqlx::query(query)
        .fetch_one(pool)
        .await
        .context("Failed to count episodes")?;
    Ok(row.get("count"))
}

async fn update_episode_sqlite(
    pool: &SqlitePool,
    id: i64,
    input: &UpdateEpisodeInput,
) -> Result<Episode> {
    let existing = get_episode_by_id_sqlite(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Episode not found"))?;

    let now = Utc::now();
    let new_slug = input.slug.as_ref().unwrap_or(&existing.slug);
    let new_title = input.title.as_ref().unwrap_or(&existing.title);
    let new_description = input.description.as_ref().unwrap_or(&existing.description);
    let new_audio_url = input.audio_url.as_ref().unwrap_or(&existing.audio_url);
    let new_duration = input.duration_seconds.unwrap_or(existing.duration_seconds);
    let new_number = input.episode_number.unwrap_or(existing.episode_number);
    let new_host = input.host_name.as_ref().unwrap_or(&existing.host_name);
    let new_status = input.status.unwrap_or(existing.status);

    let new_published_at = if new_status == ArticleStatus::Published
        && existing.status != ArticleStatus::Published
    {
        Some(now)
    } else if new_status != ArticleStatus::Published {
        None
    } else {
        existing.published_at
    };

    sqlx::query(
        r#"
        UPDATE podcast_episodes
        SET slug = ?, title = ?, description = ?, audio_url = ?, duration_seconds = ?, episode_number = ?, host_name = ?, status = ?, published_at = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(new_slug)
    .bind(new_title)
    .bind(new_description)
    .bind(new_audio_url)
    .bind(new_duration)
    .bind(new_number)
    .bind(new_host)
    .bind(new_status.as_str())
    .bind(new_published_at)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update episode")?;

    get_episode_by_id_sqlite(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Episode not found after update"))
}

async fn delete_episode_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM podcast_episodes WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete episode")?;
    Ok(())
}

async fn exists_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM podcast_episodes WHERE slug = ?")
        .bind(slug)
        .fetch_one(pool)
        .await
        .context("Failed to check episode slug existence")?;
    let count: i64 = row.get("count");
    Ok(count > 0)
}

fn row_to_episode_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Episode> {
    let status_str: String = row.get("status");
    let status = ArticleStatus::from_str(&status_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid episode status: {}", status_str))?;

    Ok(Episode {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        description: row.get("description"),
        audio_url: row.get("audio_url"),
        duration_seconds: row.get("duration_seconds"),
        episode_number: row.get("episode_number"),
        host_name: row.get("host_name"),
        status,
        published_at: row.get("published_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_episode_mysql(pool: &MySqlPool, input: &CreateEpisodeInput) -> Result<Episode> {
    let now = Utc::now();
    let status = input.status.unwrap_or_default();
    let published_at = if status == ArticleStatus::Published {
        Some(now)
    } else {
        None
    };

    let result = sqlx::query(
        r#"
        INSERT INTO podcast_episodes (slug, title, description, audio_url, duration_seconds, episode_number, host_name, status, published_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.slug)
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.audio_url)
    .bind(input.duration_seconds)
    .bind(input.episode_number)
    .bind(&input.host_name)
    .bind(status.as_str())
    .bind(published_at)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create episode")?;

    Ok(Episode {
        id: result.last_insert_id() as i64,
        slug: input.slug.clone(),
        title: input.title.clone(),
        description: input.description.clone(),
        audio_url: input.audio_url.clone(),
        duration_seconds: input.duration_seconds,
        episode_number: input.episode_number,
        host_name: input.host_name.clone(),
        status,
        published_at,
        created_at: now,
        updated_at: now,
    })
}

async fn get_episode_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Episode>> {
    let query = format!(
        "SELECT {} FROM podcast_episodes WHERE id = ?",
        EPISODE_COLUMNS
    );
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get episode by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_episode_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn get_episode_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<Option<Episode>> {
    let query = format!(
        "SELECT {} FROM podcast_episodes WHERE slug = ?",
        EPISODE_COLUMNS
    );
    let row = sqlx::query(&query)
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get episode by slug")?;

    match row {
        Some(row) => Ok(Some(row_to_episode_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn list_episodes_mysql(
    pool: &MySqlPool,
    offset: i64,
    limit: i64,
    published_only: bool,
) -> Result<Vec<Episode>> {
    let query = if published_only {
        format!(
            "SELECT {} FROM podcast_episodes WHERE status = 'published' ORDER BY published_at DESC LIMIT ? OFFSET ?",
            EPISODE_COLUMNS
        )
    } else {
        format!(
            "SELECT {} FROM podcast_episodes ORDER BY created_at DESC LIMIT ? OFFSET ?",
            EPISODE_COLUMNS
        )
    };

    let rows = sqlx::query(&query)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list episodes")?;

    let mut episodes = Vec::new();
    for row in rows {
        episodes.push(row_to_episode_mysql(&row)?);
    }

    Ok(episodes)
}

async fn count_episodes_mysql(pool: &MySqlPool, published_only: bool) -> Result<i64> {
    let query = if published_only {
        "SELECT COUNT(*) as count FROM podcast_episodes WHERE status = 'published'"
    } else {
        "SELECT COUNT(*) as count FROM podcast_episodes"
    };
    let row = sqlx::query(query)
        .fetch_one(pool)
        .await
        .context("Failed to count episodes")?;
    Ok(row.get("count"))
}

async fn update_episode_mysql(
    pool: &MySqlPool,
    id: i64,
    input: &UpdateEpisodeInput,
) -> Result<Episode> {
    let existing = get_episode_by_id_mysql(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Episode not found"))?;

    let now = Utc::now();
    let new_slug = input.slug.as_ref().unwrap_or(&existing.slug);
    let new_title = input.title.as_ref().unwrap_or(&existing.title);
    let new_description = input.description.as_ref().unwrap_or(&existing.description);
    let new_audio_url = input.audio_url.as_ref().unwrap_or(&existing.audio_url);
    let new_duration = input.duration_seconds.unwrap_or(existing.duration_seconds);
    let new_number = input.episode_number.unwrap_or(existing.episode_number);
    let new_host = input.host_name.as_ref().unwrap_or(&existing.host_name);
    let new_status = input.status.unwrap_or(existing.status);

    let new_published_at = if new_status == ArticleStatus::Published
        && existing.status != ArticleStatus::Published
    {
        Some(now)
    } else if new_status != ArticleStatus::Published {
        None
    } else {
        existing.published_at
    };

    sqlx::query(
        r#"
        UPDATE podcast_episodes
        SET slug = ?, title = ?, description = ?, audio_url = ?, duration_seconds = ?, episode_number = ?, host_name = ?, status = ?, published_at = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(new_slug)
    .bind(new_title)
    .bind(new_description)
    .bind(new_audio_url)
    .bind(new_duration)
    .bind(new_number)
    .bind(new_host)
    .bind(new_status.as_str())
    .bind(new_published_at)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update episode")?;

    get_episode_by_id_mysql(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Episode not found after update"))
}

async fn delete_episode_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM podcast_episodes WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete episode")?;
    Ok(())
}

async fn exists_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM podcast_episodes WHERE slug = ?")
        .bind(slug)
        .fetch_one(pool)
        .await
        .context("Failed to check episode slug existence")?;
    let count: i64 = row.get("count");
    Ok(count > 0)
}

fn row_to_episode_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Episode> {
    let status_str: String = row.get("status");
    let status = ArticleStatus::from_str(&status_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid episode status: {}", status_str))?;

    Ok(Episode {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        description: row.get("description"),
        audio_url: row.get("audio_url"),
        duration_seconds: row.get("duration_seconds"),
        episode_number: row.get("episode_number"),
        host_name: row.get("host_name"),
        status,
        published_at: row.get("published_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> (DynDatabasePool, SqlxPodcastRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxPodcastRepository::new(pool.clone());
        (pool, repo)
    }

    fn create_input(slug: &str, number: i32) -> CreateEpisodeInput {
        CreateEpisodeInput {
            slug: slug.to_string(),
            title: format!("Episode {}", number),
            description: "Quarterly earnings walkthrough".to_string(),
            audio_url: format!("https://cdn.example.com/{}.mp3", slug),
            duration_seconds: 1800,
            episode_number: number,
            host_name: "Jordan".to_string(),
            status: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_episode() {
        let (_pool, repo) = setup_test_repo().await;

        let created = repo.create(&create_input("ep-1", 1)).await.unwrap();
        assert!(created.id > 0);
        assert_eq!(created.status, ArticleStatus::Draft);

        let found = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(found.episode_number, 1);
        assert_eq!(found.duration_seconds, 1800);
    }

    #[tokio::test]
    async fn test_list_published_only() {
        let (_pool, repo) = setup_test_repo().await;

        repo.create(&create_input("draft", 1)).await.unwrap();
        let mut input = create_input("live", 2);
        input.status = Some(ArticleStatus::Published);
        repo.create(&input).await.unwrap();

        let published = repo.list_published(0, 10).await.unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].slug, "live");
        assert_eq!(repo.count_published().await.unwrap(), 1);
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_update_and_publish() {
        let (_pool, repo) = setup_test_repo().await;
        let created = repo.create(&create_input("ep-up", 3)).await.unwrap();

        let update = UpdateEpisodeInput {
            title: Some("Renamed".into()),
            status: Some(ArticleStatus::Published),
            ..Default::default()
        };
        let updated = repo.update(created.id, &update).await.unwrap();
        assert_eq!(updated.title, "Renamed");
        assert!(updated.published_at.is_some());
    }

    #[tokio::test]
    async fn test_delete_and_slug_check() {
        let (_pool, repo) = setup_test_repo().await;
        let created = repo.create(&create_input("ep-del", 4)).await.unwrap();

        assert!(repo.exists_by_slug("ep-del").await.unwrap());
        repo.delete(created.id).await.unwrap();
        assert!(!repo.exists_by_slug("ep-del").await.unwrap());
    }
}
