//! Category repository
//!
//! Database operations for news categories and their junction tables with
//! articles and podcast episodes.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Category, CreateCategoryInput, UpdateCategoryInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Category repository trait
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Create a new category
    async fn create(&self, input: &CreateCategoryInput) -> Result<Category>;

    /// Get category by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Category>>;

    /// Get category by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>>;

    /// List all categories ordered by name
    async fn list(&self) -> Result<Vec<Category>>;

    /// Count categories
    async fn count(&self) -> Result<i64>;

    /// Update a category
    async fn update(&self, id: i64, input: &UpdateCategoryInput) -> Result<Category>;

    /// Delete a category
    async fn delete(&self, id: i64) -> Result<()>;

    /// Replace the categories attached to an article
    async fn set_for_article(&self, article_id: i64, category_ids: &[i64]) -> Result<()>;

    /// Get the categories attached to an article
    async fn get_for_article(&self, article_id: i64) -> Result<Vec<Category>>;

    /// Replace the categories attached to an episode
    async fn set_for_episode(&self, episode_id: i64, category_ids: &[i64]) -> Result<()>;

    /// Get the categories attached to an episode
    async fn get_for_episode(&self, episode_id: i64) -> Result<Vec<Category>>;
}

/// SQLx-based category repository implementation
pub struct SqlxCategoryRepository {
    pool: DynDatabasePool,
}

impl SqlxCategoryRepository {
    /// Create a new SQLx category repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CategoryRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CategoryRepository for SqlxCategoryRepository {
    async fn create(&self, input: &CreateCategoryInput) -> Result<Category> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_category_sqlite(self.pool.as_sqlite().unwrap(), input).await
            }
            DatabaseDriver::Mysql => {
                create_category_mysql(self.pool.as_mysql().unwrap(), input).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Category>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_category_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => {
                get_category_by_id_mysql(self.pool.as_mysql().unwrap(), id).await
            }
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_category_by_slug_sqlite(self.pool.as_sqlite().unwrap(), slug).await
            }
            DatabaseDriver::Mysql => {
                get_category_by_slug_mysql(self.pool.as_mysql().unwrap(), slug).await
            }
        }
    }

    async fn list(&self) -> Result<Vec<Category>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_categories_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => list_categories_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn count(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_categories_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => count_categories_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn update(&self, id: i64, input: &UpdateCategoryInput) -> Result<Category> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_category_sqlite(self.pool.as_sqlite().unwrap(), id, input).await
            }
            DatabaseDriver::Mysql => {
                update_category_mysql(self.pool.as_mysql().unwrap(), id, input).await
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                delete_category_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => delete_category_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn set_for_article(&self, article_id: i64, category_ids: &[i64]) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                set_junction_sqlite(
                    self.pool.as_sqlite().unwrap(),
                    "article_categories",
                    "article_id",
                    article_id,
                    category_ids,
                )
                .await
            }
            DatabaseDriver::Mysql => {
                set_junction_mysql(
                    self.pool.as_mysql().unwrap(),
                    "article_categories",
                    "article_id",
                    article_id,
                    category_ids,
                )
                .await
            }
        }
    }

    async fn get_for_article(&self, article_id: i64) -> Result<Vec<Category>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_junction_sqlite(
                    self.pool.as_sqlite().unwrap(),
                    "article_categories",
                    "article_id",
                    article_id,
                )
                .await
            }
            DatabaseDriver::Mysql => {
                get_junction_mysql(
                    self.pool.as_mysql().unwrap(),
                    "article_categories",
                    "article_id",
                    article_id,
                )
                .await
            }
        }
    }

    async fn set_for_episode(&self, episode_id: i64, category_ids: &[i64]) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                set_junction_sqlite(
                    self.pool.as_sqlite().unwrap(),
                    "episode_categories",
                    "episode_id",
                    episode_id,
                    category_ids,
                )
                .await
            }
            DatabaseDriver::Mysql => {
                set_junction_mysql(
                    self.pool.as_mysql().unwrap(),
                    "episode_categories",
                    "episode_id",
                    episode_id,
                    category_ids,
                )
                .await
            }
        }
    }

    async fn get_for_episode(&self, episode_id: i64) -> Result<Vec<Category>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_junction_sqlite(
                    self.pool.as_sqlite().unwrap(),
                    "episode_categories",
                    "episode_id",
                    episode_id,
                )
                .await
            }
            DatabaseDriver::Mysql => {
                get_junction_mysql(
                    self.pool.as_mysql().unwrap(),
                    "episode_categories",
                    "episode_id",
                    episode_id,
                )
                .await
            }
        }
    }
}

const CATEGORY_COLUMNS: &str = "id, slug, name, description, created_at";

// Junction table/column identifiers are fixed literals from the call sites
// above, never user input.

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_category_sqlite(pool: &SqlitePool, input: &CreateCategoryInput) -> Result<Category> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO news_categories (slug, name, description, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&input.slug)
    .bind(&input.name)
    .bind(&input.description)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create category")?;

    Ok(Category {
        id: result.last_insert_rowid(),
        slug: input.slug.clone(),
        name: input.name.clone(),
        description: input.description.clone(),
        created_at: now,
    })
}

async fn get_category_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Category>> {
    let query = format!("SELECT {} FROM news_categories WHERE id = ?", CATEGORY_COLUMNS);
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get category by ID")?;
    Ok(row.map(|row| row_to_category_sqlite(&row)))
}

async fn get_category_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<Category>> {
    let query = format!(
        "SELECT {} FROM news_categories WHERE slug = ?",
        CATEGORY_COLUMNS
    );
    let row = sqlx::query(&query)
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get category by slug")?;
    Ok(row.map(|row| row_to_category_sqlite(&row)))
}

async fn list_categories_sqlite(pool: &SqlitePool) -> Result<Vec<Category>> {
    let query = format!(
        "SELECT {} FROM news_categories ORDER BY name ASC",
        CATEGORY_COLUMNS
    );
    let rows = sqlx::query(&query)
        .fetch_all(pool)
        .await
        .context("Failed to list categories")?;
    Ok(rows.iter().map(row_to_category_sqlite).collect())
}

async fn count_categories_sqlite(pool: &SqlitePool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM news_categories")
        .fetch_one(pool)
        .await
        .context("Failed to count categories")?;
    Ok(row.get("count"))
}

async fn update_category_sqlite(
    pool: &SqlitePool,
    id: i64,
    input: &UpdateCategoryInput,
) -> Result<Category> {
    let existing = get_category_by_id_sqlite(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Category not found"))?;

    let new_slug = input.slug.as_ref().unwrap_or(&existing.slug);
    let new_name = input.name.as_ref().unwrap_or(&existing.name);
    let new_description = input.description.clone().or(existing.description.clone());

    sqlx::query("UPDATE news_categories SET slug = ?, name = ?, description = ? WHERE id = ?")
        .bind(new_slug)
        .bind(new_name)
        .bind(&new_description)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update category")?;

    get_category_by_id_sqlite(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Category not found after update"))
}

async fn delete_category_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM news_categories WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete category")?;
    Ok(())
}

async fn set_junction_sqlite(
    pool: &SqlitePool,
    table: &str,
    owner_column: &str,
    owner_id: i64,
    category_ids: &[i64],
) -> Result<()> {
    let delete = format!("DELETE FROM {} WHERE {} = ?", table, owner_column);
    sqlx::query(&delete)
        .bind(owner_id)
        .execute(pool)
        .await
        .context("Failed to clear category links")?;

    let insert = format!(
        "INSERT OR IGNORE INTO {} ({}, category_id) VALUES (?, ?)",
        table, owner_column
    );
    for category_id in category_ids {
        sqlx::query(&insert)
            .bind(owner_id)
            .bind(category_id)
            .execute(pool)
            .await
            .context("Failed to link category")?;
    }

    Ok(())
}

async fn get_junction_sqlite(
    pool: &SqlitePool,
    table: &str,
    owner_column: &str,
    owner_id: i64,
) -> Result<Vec<Category>> {
    let query = format!(
        "SELECT c.id, c.slug, c.name, c.description, c.created_at
         FROM news_categories c
         INNER JOIN {} j ON c.id = j.category_id
         WHERE j.{} = ?
         ORDER BY c.name ASC",
        table, owner_column
    );
    let rows = sqlx::query(&query)
        .bind(owner_id)
        .fetch_all(pool)
        .await
        .context("Failed to get linked categories")?;
    Ok(rows.iter().map(row_to_category_sqlite).collect())
}

fn row_to_category_sqlite(row: &sqlx::sqlite::SqliteRow) -> Category {
    Category {
        id: row.get("id"),
        slug: row.get("slug"),
        name: row.get("name"),
        description: row.try_get("description").ok(),
        created_at: row.get("created_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_category_mysql(pool: &MySqlPool, input: &CreateCategoryInput) -> Result<Category> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO news_categories (slug, name, description, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&input.slug)
    .bind(&input.name)
    .bind(&input.description)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create category")?;

    Ok(Category {
        id: result.last_insert_id() as i64,
        slug: input.slug.clone(),
        name: input.name.clone(),
        description: input.description.clone(),
        created_at: now,
    })
}

async fn get_category_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Category>> {
    let query = format!("SELECT {} FROM news_categories WHERE id = ?", CATEGORY_COLUMNS);
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get category by ID")?;
    Ok(row.map(|row| row_to_category_mysql(&row)))
}

async fn get_category_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<Option<Category>> {
    let query = format!(
        "SELECT {} FROM news_categories WHERE slug = ?",
        CATEGORY_COLUMNS
    );
    let row = sqlx::query(&query)
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get category by slug")?;
    Ok(row.map(|row| row_to_category_mysql(&row)))
}

async fn list_categories_mysql(pool: &MySqlPool) -> Result<Vec<Category>> {
    let query = format!(
        "SELECT {} FROM news_categories ORDER BY name ASC",
        CATEGORY_COLUMNS
    );
    let rows = sqlx::query(&query)
        .fetch_all(pool)
        .await
        .context("Failed to list categories")?;
    Ok(rows.iter().map(row_to_category_mysql).collect())
}

async fn count_categories_mysql(pool: &MySqlPool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM news_categories")
        .fetch_one(pool)
        .await
        .context("Failed to count categories")?;
    Ok(row.get("count"))
}

async fn update_category_mysql(
    pool: &MySqlPool,
    id: i64,
    input: &UpdateCategoryInput,
) -> Result<Category> {
    let existing = get_category_by_id_mysql(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Category not found"))?;

    let new_slug = input.slug.as_ref().unwrap_or(&existing.slug);
    let new_name = input.name.as_ref().unwrap_or(&existing.name);
    let new_description = input.description.clone().or(existing.description.clone());

    sqlx::query("UPDATE news_categories SET slug = ?, name = ?, description = ? WHERE id = ?")
        .bind(new_slug)
        .bind(new_name)
        .bind(&new_description)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update category")?;

    get_category_by_id_mysql(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Category not found after update"))
}

async fn delete_category_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM news_categories WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete category")?;
    Ok(())
}

async fn set_junction_mysql(
    pool: &MySqlPool,
    table: &str,
    owner_column: &str,
    owner_id: i64,
    category_ids: &[i64],
) -> Result<()> {
    let delete = format!("DELETE FROM {} WHERE {} = ?", table, owner_column);
    sqlx::query(&delete)
        .bind(owner_id)
        .execute(pool)
        .await
        .context("Failed to clear category links")?;

    let insert = format!(
        "INSERT IGNORE INTO {} ({}, category_id) VALUES (?, ?)",
        table, owner_column
    );
    for category_id in category_ids {
        sqlx::query(&insert)
            .bind(owner_id)
            .bind(category_id)
            .execute(pool)
            .await
            .context("Failed to link category")?;
    }

    Ok(())
}

async fn get_junction_mysql(
    pool: &MySqlPool,
    table: &str,
    owner_column: &str,
    owner_id: i64,
) -> Result<Vec<Category>> {
    let query = format!(
        "SELECT c.id, c.slug, c.name, c.description, c.created_at
         FROM news_categories c
         INNER JOIN {} j ON c.id = j.category_id
         WHERE j.{} = ?
         ORDER BY c.name ASC",
        table, owner_column
    );
    let rows = sqlx::query(&query)
        .bind(owner_id)
        .fetch_all(pool)
        .await
        .context("Failed to get linked categories")?;
    Ok(rows.iter().map(row_to_category_mysql).collect())
}

fn row_to_category_mysql(row: &sqlx::mysql::MySqlRow) -> Category {
    Category {
        id: row.get("id"),
        slug: row.get("slug"),
        name: row.get("name"),
        description: row.try_get("description").ok(),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::news::NewsRepository;
    use crate::db::{create_test_pool, migrations};
    use crate::models::CreateArticleInput;

    async fn setup() -> (DynDatabasePool, SqlxCategoryRepository) {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxCategoryRepository::new(pool.clone());
        (pool, repo)
    }

    fn input(slug: &str, name: &str) -> CreateCategoryInput {
        CreateCategoryInput {
            slug: slug.to_string(),
            name: name.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let (_pool, repo) = setup().await;

        let created = repo.create(&input("markets", "Markets")).await.unwrap();
        assert!(created.id > 0);

        let by_slug = repo.get_by_slug("markets").await.unwrap();
        assert_eq!(by_slug.unwrap().name, "Markets");
    }

    #[tokio::test]
    async fn test_list_includes_seeded_default() {
        let (_pool, repo) = setup().await;
        // Migration seeds the 'general' category
        let all = repo.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].slug, "general");
    }

    #[tokio::test]
    async fn test_update_category() {
        let (_pool, repo) = setup().await;
        let created = repo.create(&input("tax", "Tax")).await.unwrap();

        let update = UpdateCategoryInput {
            name: Some("Taxation".into()),
            ..Default::default()
        };
        let updated = repo.update(created.id, &update).await.unwrap();
        assert_eq!(updated.name, "Taxation");
        assert_eq!(updated.slug, "tax");
    }

    #[tokio::test]
    async fn test_article_junction_roundtrip() {
        let (pool, repo) = setup().await;
        let sqlite = pool.as_sqlite().unwrap();

        sqlx::query("INSERT INTO users (username, email, password_hash, role) VALUES ('e', 'e@x.com', 'h', 'editor')")
            .execute(sqlite)
            .await
            .unwrap();
        let news_repo = crate::db::repositories::SqlxNewsRepository::new(pool.clone());
        let article = news_repo
            .create(&CreateArticleInput {
                slug: "a".into(),
                title: "A".into(),
                summary: "s".into(),
                content: "c".into(),
                content_html: Some("<p>c</p>".into()),
                cover_image: None,
                author_id: 1,
                status: None,
            })
            .await
            .unwrap();

        let markets = repo.create(&input("markets", "Markets")).await.unwrap();
        let audit = repo.create(&input("audit", "Audit")).await.unwrap();

        repo.set_for_article(article.id, &[markets.id, audit.id])
            .await
            .unwrap();
        let linked = repo.get_for_article(article.id).await.unwrap();
        assert_eq!(linked.len(), 2);

        // Replacing the set removes stale links
        repo.set_for_article(article.id, &[audit.id]).await.unwrap();
        let linked = repo.get_for_article(article.id).await.unwrap();
        assert_eq!(linked.len(), 1);
        assert_eq!(linked[0].slug, "audit");
    }
}
