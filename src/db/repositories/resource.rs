//! Resource repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{CreateResourceInput, Resource, ResourceKind, UpdateResourceInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Resource repository trait
#[async_trait]
pub trait ResourceRepository: Send + Sync {
    /// Create a new resource
    async fn create(&self, input: &CreateResourceInput) -> Result<Resource>;

    /// Get resource by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Resource>>;

    /// List resources, newest first
    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Resource>>;

    /// Count resources
    async fn count(&self) -> Result<i64>;

    /// Update a resource
    async fn update(&self, id: i64, input: &UpdateResourceInput) -> Result<Resource>;

    /// Delete a resource
    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based resource repository implementation
pub struct SqlxResourceRepository {
    pool: DynDatabasePool,
}

impl SqlxResourceRepository {
    /// Create a new SQLx resource repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ResourceRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ResourceRepository for SqlxResourceRepository {
    async fn create(&self, input: &CreateResourceInput) -> Result<Resource> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_resource_sqlite(self.pool.as_sqlite().unwrap(), input).await
            }
            DatabaseDriver::Mysql => {
                create_resource_mysql(self.pool.as_mysql().unwrap(), input).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Resource>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_resource_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => get_resource_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Resource>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_resources_sqlite(self.pool.as_sqlite().unwrap(), offset, limit).await
            }
            DatabaseDriver::Mysql => {
                list_resources_mysql(self.pool.as_mysql().unwrap(), offset, limit).await
            }
        }
    }

    async fn count(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_resources_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => count_resources_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn update(&self, id: i64, input: &UpdateResourceInput) -> Result<Resource> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_resource_sqlite(self.pool.as_sqlite().unwrap(), id, input).await
            }
            DatabaseDriver::Mysql => {
                update_resource_mysql(self.pool.as_mysql().unwrap(), id, input).await
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                delete_resource_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => delete_resource_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }
}

const RESOURCE_COLUMNS: &str = "id, title, description, url, kind, created_at, updated_at";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_resource_sqlite(pool: &SqlitePool, input: &CreateResourceInput) -> Result<Resource> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO resources (title, description, url, kind, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.url)
    .bind(input.kind.as_str())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create resource")?;

    Ok(Resource {
        id: result.last_insert_rowid(),
        title: input.title.clone(),
        description: input.description.clone(),
        url: input.url.clone(),
        kind: input.kind,
        created_at: now,
        updated_at: now,
    })
}

async fn get_resource_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Resource>> {
    let query = format!("SELECT {} FROM resources WHERE id = ?", RESOURCE_COLUMNS);
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get resource")?;
    match row {
        Some(row) => Ok(Some(row_to_resource_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn list_resources_sqlite(pool: &SqlitePool, offset: i64, limit: i64) -> Result<Vec<Resource>> {
    let query = format!(
        "SELECT {} FROM resources ORDER BY created_at DESC LIMIT ? OFFSET ?",
        RESOURCE_COLUMNS
    );
    let rows = sqlx::query(&query)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list resources")?;

    let mut resources = Vec::new();
    for row in rows {
        resources.push(row_to_resource_sqlite(&row)?);
    }
    Ok(resources)
}

async fn count_resources_sqlite(pool: &SqlitePool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM resources")
        .fetch_one(pool)
        .await
        .context("Failed to count resources")?;
    Ok(row.get("count"))
}

async fn update_resource_sqlite(
    pool: &SqlitePool,
    id: i64,
    input: &UpdateResourceInput,
) -> Result<Resource> {
    let existing = get_resource_sqlite(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Resource not found"))?;

    let now = Utc::now();
    let new_title = input.title.as_ref().unwrap_or(&existing.title);
    let new_description = input.description.as_ref().unwrap_or(&existing.description);
    let new_url = input.url.as_ref().unwrap_or(&existing.url);
    let new_kind = input.kind.unwrap_or(existing.kind);

    sqlx::query(
        "UPDATE resources SET title = ?, description = ?, url = ?, kind = ?, updated_at = ? WHERE id = ?",
    )
    .bind(new_title)
    .bind(new_description)
    .bind(new_url)
    .bind(new_kind.as_str())
    .bind(now)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update resource")?;

    get_resource_sqlite(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Resource not found after update"))
}

async fn delete_resource_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM resources WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete resource")?;
    Ok(())
}

fn row_to_resource_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Resource> {
    let kind_str: String = row.get("kind");
    let kind = ResourceKind::from_str(&kind_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid resource kind: {}", kind_str))?;

    Ok(Resource {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        url: row.get("url"),
        kind,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_resource_mysql(pool: &MySqlPool, input: &CreateResourceInput) -> Result<Resource> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO resources (title, description, url, kind, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.url)
    .bind(input.kind.as_str())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create resource")?;

    Ok(Resource {
        id: result.last_insert_id() as i64,
        title: input.title.clone(),
        description: input.description.clone(),
        url: input.url.clone(),
        kind: input.kind,
        created_at: now,
        updated_at: now,
    })
}

async fn get_resource_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Resource>> {
    let query = format!("SELECT {} FROM resources WHERE id = ?", RESOURCE_COLUMNS);
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get resource")?;
    match row {
        Some(row) => Ok(Some(row_to_resource_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn list_resources_mysql(pool: &MySqlPool, offset: i64, limit: i64) -> Result<Vec<Resource>> {
    let query = format!(
        "SELECT {} FROM resources ORDER BY created_at DESC LIMIT ? OFFSET ?",
        RESOURCE_COLUMNS
    );
    let rows = sqlx::query(&query)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list resources")?;

    let mut resources = Vec::new();
    for row in rows {
        resources.push(row_to_resource_mysql(&row)?);
    }
    Ok(resources)
}

async fn count_resources_mysql(pool: &MySqlPool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM resources")
        .fetch_one(pool)
        .await
        .context("Failed to count resources")?;
    Ok(row.get("count"))
}

async fn update_resource_mysql(
    pool: &MySqlPool,
    id: i64,
    input: &UpdateResourceInput,
) -> Result<Resource> {
    let existing = get_resource_mysql(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Resource not found"))?;

    let now = Utc::now();
    let new_title = input.title.as_ref().unwrap_or(&existing.title);
    let new_description = input.description.as_ref().unwrap_or(&existing.description);
    let new_url = input.url.as_ref().unwrap_or(&existing.url);
    let new_kind = input.kind.unwrap_or(existing.kind);

    sqlx::query(
        "UPDATE resources SET title = ?, description = ?, url = ?, kind = ?, updated_at = ? WHERE id = ?",
    )
    .bind(new_title)
    .bind(new_description)
    .bind(new_url)
    .bind(new_kind.as_str())
    .bind(now)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update resource")?;

    get_resource_mysql(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Resource not found after update"))
}

async fn delete_resource_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM resources WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete resource")?;
    Ok(())
}

fn row_to_resource_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Resource> {
    let kind_str: String = row.get("kind");
    let kind = ResourceKind::from_str(&kind_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid resource kind: {}", kind_str))?;

    Ok(Resource {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        url: row.get("url"),
        kind,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SqlxResourceRepository {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxResourceRepository::new(pool)
    }

    #[tokio::test]
    async fn test_resource_crud() {
        let repo = setup().await;

        let created = repo
            .create(&CreateResourceInput {
                title: "VAT return template".into(),
                description: "Spreadsheet template for quarterly VAT returns".into(),
                url: "https://example.com/vat.xlsx".into(),
                kind: ResourceKind::Template,
            })
            .await
            .unwrap();
        assert!(created.id > 0);

        let update = UpdateResourceInput {
            kind: Some(ResourceKind::Tool),
            ..Default::default()
        };
        let updated = repo.update(created.id, &update).await.unwrap();
        assert_eq!(updated.kind, ResourceKind::Tool);
        assert_eq!(updated.title, "VAT return template");

        assert_eq!(repo.count().await.unwrap(), 1);
        repo.delete(created.id).await.unwrap();
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
    }
}
