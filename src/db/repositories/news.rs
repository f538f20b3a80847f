//! News article repository
//!
//! Database operations for news articles.
//!
//! This module provides:
//! - `NewsRepository` trait defining the interface for article data access
//! - `SqlxNewsRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Article, ArticleStatus, CreateArticleInput, UpdateArticleInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// News article repository trait
#[async_trait]
pub trait NewsRepository: Send + Sync {
    /// Create a new article
    async fn create(&self, input: &CreateArticleInput) -> Result<Article>;

    /// Get article by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Article>>;

    /// Get article by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Article>>;

    /// List articles with pagination (all statuses, newest first)
    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Article>>;

    /// Count total articles
    async fn count(&self) -> Result<i64>;

    /// List only published articles (ordered by published_at DESC)
    async fn list_published(&self, offset: i64, limit: i64) -> Result<Vec<Article>>;

    /// Count published articles
    async fn count_published(&self) -> Result<i64>;

    /// Update an article
    async fn update(&self, id: i64, input: &UpdateArticleInput) -> Result<Article>;

    /// Delete an article
    async fn delete(&self, id: i64) -> Result<()>;

    /// Check if a slug already exists
    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;

    /// Check if a slug exists for a different article (for updates)
    async fn exists_by_slug_excluding(&self, slug: &str, exclude_id: i64) -> Result<bool>;

    /// Increment the view counter
    async fn increment_view(&self, id: i64) -> Result<()>;
}

/// SQLx-based news repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxNewsRepository {
    pool: DynDatabasePool,
}

impl SqlxNewsRepository {
    /// Create a new SQLx news repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn NewsRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl NewsRepository for SqlxNewsRepository {
    async fn create(&self, input: &CreateArticleInput) -> Result<Article> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_article_sqlite(self.pool.as_sqlite().unwrap(), input).await
            }
            DatabaseDriver::Mysql => {
                create_article_mysql(self.pool.as_mysql().unwrap(), input).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Article>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_article_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => {
                get_article_by_id_mysql(self.pool.as_mysql().unwrap(), id).await
            }
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Article>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_article_by_slug_sqlite(self.pool.as_sqlite().unwrap(), slug).await
            }
            DatabaseDriver::Mysql => {
                get_article_by_slug_mysql(self.pool.as_mysql().unwrap(), slug).await
            }
        }
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Article>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_articles_sqlite(self.pool.as_sqlite().unwrap(), offset, limit, false).await
            }
            DatabaseDriver::Mysql => {
                list_articles_mysql(self.pool.as_mysql().unwrap(), offset, limit, false).await
            }
        }
    }

    async fn count(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                count_articles_sqlite(self.pool.as_sqlite().unwrap(), false).await
            }
            DatabaseDriver::Mysql => count_articles_mysql(self.pool.as_mysql().unwrap(), false).await,
        }
    }

    async fn list_published(&self, offset: i64, limit: i64) -> Result<Vec<Article>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_articles_sqlite(self.pool.as_sqlite().unwrap(), offset, limit, true).await
            }
            DatabaseDriver::Mysql => {
                list_articles_mysql(self.pool.as_mysql().unwrap(), offset, limit, true).await
            }
        }
    }

    async fn count_published(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                count_articles_sqlite(self.pool.as_sqlite().unwrap(), true).await
            }
            DatabaseDriver::Mysql => count_articles_mysql(self.pool.as_mysql().unwrap(), true).await,
        }
    }

    async fn update(&self, id: i64, input: &UpdateArticleInput) -> Result<Article> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_article_sqlite(self.pool.as_sqlite().unwrap(), id, input).await
            }
            DatabaseDriver::Mysql => {
                update_article_mysql(self.pool.as_mysql().unwrap(), id, input).await
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                delete_article_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => delete_article_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                exists_by_slug_sqlite(self.pool.as_sqlite().unwrap(), slug, None).await
            }
            DatabaseDriver::Mysql => {
                exists_by_slug_mysql(self.pool.as_mysql().unwrap(), slug, None).await
            }
        }
    }

    async fn exists_by_slug_excluding(&self, slug: &str, exclude_id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                exists_by_slug_sqlite(self.pool.as_sqlite().unwrap(), slug, Some(exclude_id)).await
            }
            DatabaseDriver::Mysql => {
                exists_by_slug_mysql(self.pool.as_mysql().unwrap(), slug, Some(exclude_id)).await
            }
        }
    }

    async fn increment_view(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                increment_view_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => increment_view_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }
}

const ARTICLE_COLUMNS: &str = "id, slug, title, summary, content, content_html, cover_image, \
     author_id, status, published_at, created_at, updated_at, view_count";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_article_sqlite(pool: &SqlitePool, input: &CreateArticleInput) -> Result<Article> {
    let now = Utc::now();
    let status = input.status.unwrap_or_default();
    let published_at = if status == ArticleStatus::Published {
        Some(now)
    } else {
        None
    };
    let content_html = input.content_html.clone().unwrap_or_default();

    let result = sqlx::query(
        r#"
        INSERT INTO news_articles (slug, title, summary, content, content_html, cover_image, author_id, status, published_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.slug)
    .bind(&input.title)
    .bind(&input.summary)
    .bind(&input.content)
    .bind(&content_html)
    .bind(&input.cover_image)
    .bind(input.author_id)
    .bind(status.as_str())
    .bind(published_at)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create article")?;

    Ok(Article {
        id: result.last_insert_rowid(),
        slug: input.slug.clone(),
        title: input.title.clone(),
        summary: input.summary.clone(),
        content: input.content.clone(),
        content_html,
        cover_image: input.cover_image.clone(),
        author_id: input.author_id,
        status,
        published_at,
        created_at: now,
        updated_at: now,
        view_count: 0,
    })
}

async fn get_article_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Article>> {
    let query = format!("SELECT {} FROM news_articles WHERE id = ?", ARTICLE_COLUMNS);
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get article by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_article_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn get_article_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<Article>> {
    let query = format!(
        "SELECT {} FROM news_articles WHERE slug = ?",
        ARTICLE_COLUMNS
    );
    let row = sqlx::query(&query)
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get article by slug")?;

    match row {
        Some(row) => Ok(Some(row_to_article_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn list_articles_sqlite(
    pool: &SqlitePool,
    offset: i64,
    limit: i64,
    published_only: bool,
) -> Result<Vec<Article>> {
    let query = if published_only {
        format!(
            "SELECT {} FROM news_articles WHERE status = 'published' ORDER BY published_at DESC LIMIT ? OFFSET ?",
            ARTICLE_COLUMNS
        )
    } else {
        format!(
            "SELECT {} FROM news_articles ORDER BY created_at DESC LIMIT ? OFFSET ?",
            ARTICLE_COLUMNS
        )
    };

    let rows = sqlx::query(&query)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list articles")?;

    let mut articles = Vec::new();
    for row in rows {
        articles.push(row_to_article_sqlite(&row)?);
    }

    Ok(articles)
}

async fn count_articles_sqlite(pool: &SqlitePool, published_only: bool) -> Result<i64> {
    let query = if published_only {
        "SELECT COUNT(*) as count FROM news_articles WHERE status = 'published'"
    } else {
        "SELECT COUNT(*) as count FROM news_articles"
    };
    let row = sqlx::query(query)
        .fetch_one(pool)
        .await
        .context("Failed to count articles")?;
    Ok(row.get("count"))
}

async fn update_article_sqlite(
    pool: &SqlitePool,
    id: i64,
    input: &UpdateArticleInput,
) -> Result<Article> {
    let existing = get_article_by_id_sqlite(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Article not found"))?;

    let now = Utc::now();
    let new_slug = input.slug.as_ref().unwrap_or(&existing.slug);
    let new_title = input.title.as_ref().unwrap_or(&existing.title);
    let new_summary = input.summary.as_ref().unwrap_or(&existing.summary);
    let new_content = input.content.as_ref().unwrap_or(&existing.content);
    let new_content_html = input.content_html.as_ref().unwrap_or(&existing.content_html);
    let new_cover_image = input.cover_image.clone().or(existing.cover_image.clone());
    let new_status = input.status.unwrap_or(existing.status);

    // Stamp published_at on the first transition into Published
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
        UPDATE news_articles
        SET slug = ?, title = ?, summary = ?, content = ?, content_html = ?, cover_image = ?, status = ?, published_at = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(new_slug)
    .bind(new_title)
    .bind(new_summary)
    .bind(new_content)
    .bind(new_content_html)
    .bind(&new_cover_image)
    .bind(new_status.as_str())
    .bind(new_published_at)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update article")?;

    get_article_by_id_sqlite(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Article not found after update"))
}

async fn delete_article_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    // article_categories rows are removed via ON DELETE CASCADE
    sqlx::query("DELETE FROM news_articles WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete article")?;
    Ok(())
}

async fn exists_by_slug_sqlite(
    pool: &SqlitePool,
    slug: &str,
    exclude_id: Option<i64>,
) -> Result<bool> {
    let count: i64 = match exclude_id {
        Some(id) => {
            let row =
                sqlx::query("SELECT COUNT(*) as count FROM news_articles WHERE slug = ? AND id != ?")
                    .bind(slug)
                    .bind(id)
                    .fetch_one(pool)
                    .await
                    .context("Failed to check article slug existence")?;
            row.get("count")
        }
        None => {
            let row = sqlx::query("SELECT COUNT(*) as count FROM news_articles WHERE slug = ?")
                .bind(slug)
                .fetch_one(pool)
                .await
                .context("Failed to check article slug existence")?;
            row.get("count")
        }
    };
    Ok(count > 0)
}

async fn increment_view_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("UPDATE news_articles SET view_count = view_count + 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to increment view count")?;
    Ok(())
}

fn row_to_article_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Article> {
    let status_str: String = row.get("status");
    let status = ArticleStatus::from_str(&status_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid article status: {}", status_str))?;

    Ok(Article {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        summary: row.get("summary"),
        content: row.get("content"),
        content_html: row.get("content_html"),
        cover_image: row.try_get("cover_image").ok(),
        author_id: row.get("author_id"),
        status,
        published_at: row.get("published_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        view_count: row.try_get("view_count").unwrap_or(0),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_article_mysql(pool: &MySqlPool, input: &CreateArticleInput) -> Result<Article> {
    let now = Utc::now();
    let status = input.status.unwrap_or_default();
    let published_at = if status == ArticleStatus::Published {
        Some(now)
    } else {
        None
    };
    let content_html = input.content_html.clone().unwrap_or_default();

    let result = sqlx::query(
        r#"
        INSERT INTO news_articles (slug, title, summary, content, content_html, cover_image, author_id, status, published_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.slug)
    .bind(&input.title)
    .bind(&input.summary)
    .bind(&input.content)
    .bind(&content_html)
    .bind(&input.cover_image)
    .bind(input.author_id)
    .bind(status.as_str())
    .bind(published_at)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create article")?;

    Ok(Article {
        id: result.last_insert_id() as i64,
        slug: input.slug.clone(),
        title: input.title.clone(),
        summary: input.summary.clone(),
        content: input.content.clone(),
        content_html,
        cover_image: input.cover_image.clone(),
        author_id: input.author_id,
        status,
        published_at,
        created_at: now,
        updated_at: now,
        view_count: 0,
    })
}

async fn get_article_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Article>> {
    let query = format!("SELECT {} FROM news_articles WHERE id = ?", ARTICLE_COLUMNS);
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get article by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_article_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn get_article_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<Option<Article>> {
    let query = format!(
        "SELECT {} FROM news_articles WHERE slug = ?",
        ARTICLE_COLUMNS
    );
    let row = sqlx::query(&query)
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get article by slug")?;

    match row {
        Some(row) => Ok(Some(row_to_article_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn list_articles_mysql(
    pool: &MySqlPool,
    offset: i64,
    limit: i64,
    published_only: bool,
) -> Result<Vec<Article>> {
    let query = if published_only {
        format!(
            "SELECT {} FROM news_articles WHERE status = 'published' ORDER BY published_at DESC LIMIT ? OFFSET ?",
            ARTICLE_COLUMNS
        )
    } else {
        format!(
            "SELECT {} FROM news_articles ORDER BY created_at DESC LIMIT ? OFFSET ?",
            ARTICLE_COLUMNS
        )
    };

    let rows = sqlx::query(&query)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list articles")?;

    let mut articles = Vec::new();
    for row in rows {
        articles.push(row_to_article_mysql(&row)?);
    }

    Ok(articles)
}

async fn count_articles_mysql(pool: &MySqlPool, published_only: bool) -> Result<i64> {
    let query = if published_only {
        "SELECT COUNT(*) as count FROM news_articles WHERE status = 'published'"
    } else {
        "SELECT COUNT(*) as count FROM news_articles"
    };
    let row = sqlx::query(query)
        .fetch_one(pool)
        .await
        .context("Failed to count articles")?;
    Ok(row.get("count"))
}

async fn update_article_mysql(
    pool: &MySqlPool,
    id: i64,
    input: &UpdateArticleInput,
) -> Result<Article> {
    let existing = get_article_by_id_mysql(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Article not found"))?;

    let now = Utc::now();
    let new_slug = input.slug.as_ref().unwrap_or(&existing.slug);
    let new_title = input.title.as_ref().unwrap_or(&existing.title);
    let new_summary = input.summary.as_ref().unwrap_or(&existing.summary);
    let new_content = input.content.as_ref().unwrap_or(&existing.content);
    let new_content_html = input.content_html.as_ref().unwrap_or(&existing.content_html);
    let new_cover_image = input.cover_image.clone().or(existing.cover_image.clone());
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
        UPDATE news_articles
        SET slug = ?, title = ?, summary = ?, content = ?, content_html = ?, cover_image = ?, status = ?, published_at = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(new_slug)
    .bind(new_title)
    .bind(new_summary)
    .bind(new_content)
    .bind(new_content_html)
    .bind(&new_cover_image)
    .bind(new_status.as_str())
    .bind(new_published_at)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update article")?;

    get_article_by_id_mysql(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Article not found after update"))
}

async fn delete_article_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM news_articles WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete article")?;
    Ok(())
}

async fn exists_by_slug_mysql(
    pool: &MySqlPool,
    slug: &str,
    exclude_id: Option<i64>,
) -> Result<bool> {
    let count: i64 = match exclude_id {
        Some(id) => {
            let row =
                sqlx::query("SELECT COUNT(*) as count FROM news_articles WHERE slug = ? AND id != ?")
                    .bind(slug)
                    .bind(id)
                    .fetch_one(pool)
                    .await
                    .context("Failed to check article slug existence")?;
            row.get("count")
        }
        None => {
            let row = sqlx::query("SELECT COUNT(*) as count FROM news_articles WHERE slug = ?")
                .bind(slug)
                .fetch_one(pool)
                .await
                .context("Failed to check article slug existence")?;
            row.get("count")
        }
    };
    Ok(count > 0)
}

async fn increment_view_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("UPDATE news_articles SET view_count = view_count + 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to increment view count")?;
    Ok(())
}

fn row_to_article_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Article> {
    let status_str: String = row.get("status");
    let status = ArticleStatus::from_str(&status_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid article status: {}", status_str))?;

    Ok(Article {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        summary: row.get("summary"),
        content: row.get("content"),
        content_html: row.get("content_html"),
        cover_image: row.try_get("cover_image").ok(),
        author_id: row.get("author_id"),
        status,
        published_at: row.get("published_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        view_count: row.try_get("view_count").unwrap_or(0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> (DynDatabasePool, SqlxNewsRepository, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let result = sqlx::query(
            "INSERT INTO users (username, email, password_hash, role) VALUES (?, ?, ?, ?)",
        )
        .bind("editor")
        .bind("editor@example.com")
        .bind("hash")
        .bind("editor")
        .execute(pool.as_sqlite().unwrap())
        .await
        .expect("Failed to create test user");

        let repo = SqlxNewsRepository::new(pool.clone());
        (pool, repo, result.last_insert_rowid())
    }

    fn create_input(slug: &str, title: &str, author_id: i64) -> CreateArticleInput {
        CreateArticleInput {
            slug: slug.to_string(),
            title: title.to_string(),
            summary: format!("Summary for {}", title),
            content: format!("Content for {}", title),
            content_html: Some(format!("<p>Content for {}</p>", title)),
            cover_image: None,
            author_id,
            status: None,
        }
    }

    #[tokio::test]
    async fn test_create_article_defaults_to_draft() {
        let (_pool, repo, author_id) = setup_test_repo().await;

        let created = repo
            .create(&create_input("first", "First", author_id))
            .await
            .expect("Failed to create article");

        assert!(created.id > 0);
        assert_eq!(created.status, ArticleStatus::Draft);
        assert!(created.published_at.is_none());
    }

    #[tokio::test]
    async fn test_create_published_article_stamps_published_at() {
        let (_pool, repo, author_id) = setup_test_repo().await;

        let mut input = create_input("published", "Published", author_id);
        input.status = Some(ArticleStatus::Published);

        let created = repo.create(&input).await.unwrap();
        assert_eq!(created.status, ArticleStatus::Published);
        assert!(created.published_at.is_some());
    }

    #[tokio::test]
    async fn test_get_by_id_and_slug() {
        let (_pool, repo, author_id) = setup_test_repo().await;
        let created = repo
            .create(&create_input("lookup", "Lookup", author_id))
            .await
            .unwrap();

        let by_id = repo.get_by_id(created.id).await.unwrap();
        assert!(by_id.is_some());

        let by_slug = repo.get_by_slug("lookup").await.unwrap();
        assert_eq!(by_slug.unwrap().id, created.id);

        assert!(repo.get_by_id(99999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_published_excludes_drafts() {
        let (_pool, repo, author_id) = setup_test_repo().await;

        repo.create(&create_input("draft-1", "Draft 1", author_id))
            .await
            .unwrap();
        for i in 1..=2 {
            let mut input = create_input(&format!("pub-{}", i), &format!("Pub {}", i), author_id);
            input.status = Some(ArticleStatus::Published);
            repo.create(&input).await.unwrap();
        }

        let published = repo.list_published(0, 10).await.unwrap();
        assert_eq!(published.len(), 2);
        assert!(published.iter().all(|a| a.is_published()));

        assert_eq!(repo.count().await.unwrap(), 3);
        assert_eq!(repo.count_published().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_update_status_transition_stamps_published_at_once() {
        let (_pool, repo, author_id) = setup_test_repo().await;
        let created = repo
            .create(&create_input("transition", "Transition", author_id))
            .await
            .unwrap();

        let update = UpdateArticleInput {
            status: Some(ArticleStatus::Published),
            ..Default::default()
        };
        let published = repo.update(created.id, &update).await.unwrap();
        assert!(published.published_at.is_some());
        let first_stamp = published.published_at;

        // A second update that keeps Published must not restamp
        let update = UpdateArticleInput {
            title: Some("Renamed".into()),
            ..Default::default()
        };
        let renamed = repo.update(created.id, &update).await.unwrap();
        assert_eq!(renamed.published_at, first_stamp);
        assert_eq!(renamed.title, "Renamed");
    }

    #[tokio::test]
    async fn test_delete_article() {
        let (_pool, repo, author_id) = setup_test_repo().await;
        let created = repo
            .create(&create_input("doomed", "Doomed", author_id))
            .await
            .unwrap();

        repo.delete(created.id).await.unwrap();
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_exists_by_slug() {
        let (_pool, repo, author_id) = setup_test_repo().await;
        let first = repo
            .create(&create_input("taken", "Taken", author_id))
            .await
            .unwrap();
        let second = repo
            .create(&create_input("other", "Other", author_id))
            .await
            .unwrap();

        assert!(repo.exists_by_slug("taken").await.unwrap());
        assert!(!repo.exists_by_slug("free").await.unwrap());
        assert!(repo
            .exists_by_slug_excluding("taken", second.id)
            .await
            .unwrap());
        assert!(!repo
            .exists_by_slug_excluding("taken", first.id)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_increment_view() {
        let (_pool, repo, author_id) = setup_test_repo().await;
        let created = repo
            .create(&create_input("viewed", "Viewed", author_id))
            .await
            .unwrap();

        repo.increment_view(created.id).await.unwrap();
        repo.increment_view(created.id).await.unwrap();

        let reloaded = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(reloaded.view_count, 2);
    }
}
