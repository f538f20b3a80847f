//! Menu settings repository
//!
//! The menu key column is named `key` on SQLite and `menu_key` on MySQL
//! (KEY is reserved there), so the two drivers carry their own SQL.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::MenuSetting;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Menu repository trait
#[async_trait]
pub trait MenuRepository: Send + Sync {
    /// List all menu entries ordered by sort_order
    async fn list(&self) -> Result<Vec<MenuSetting>>;

    /// List only visible menu entries ordered by sort_order
    async fn list_visible(&self) -> Result<Vec<MenuSetting>>;

    /// Get a menu entry by key
    async fn get_by_key(&self, key: &str) -> Result<Option<MenuSetting>>;

    /// Update visibility and ordering of a menu entry
    async fn update(&self, key: &str, is_visible: bool, sort_order: i32) -> Result<()>;
}

/// SQLx-based menu repository implementation
pub struct SqlxMenuRepository {
    pool: DynDatabasePool,
}

impl SqlxMenuRepository {
    /// Create a new SQLx menu repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn MenuRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl MenuRepository for SqlxMenuRepository {
    async fn list(&self) -> Result<Vec<MenuSetting>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sqlite(self.pool.as_sqlite().unwrap(), false).await,
            DatabaseDriver::Mysql => list_mysql(self.pool.as_mysql().unwrap(), false).await,
        }
    }

    async fn list_visible(&self) -> Result<Vec<MenuSetting>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sqlite(self.pool.as_sqlite().unwrap(), true).await,
            DatabaseDriver::Mysql => list_mysql(self.pool.as_mysql().unwrap(), true).await,
        }
    }

    async fn get_by_key(&self, key: &str) -> Result<Option<MenuSetting>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_key_sqlite(self.pool.as_sqlite().unwrap(), key).await,
            DatabaseDriver::Mysql => get_by_key_mysql(self.pool.as_mysql().unwrap(), key).await,
        }
    }

    async fn update(&self, key: &str, is_visible: bool, sort_order: i32) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_sqlite(self.pool.as_sqlite().unwrap(), key, is_visible, sort_order).await
            }
            DatabaseDriver::Mysql => {
                update_mysql(self.pool.as_mysql().unwrap(), key, is_visible, sort_order).await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn list_sqlite(pool: &SqlitePool, visible_only: bool) -> Result<Vec<MenuSetting>> {
    let query = if visible_only {
        "SELECT id, key, label, is_visible, sort_order FROM menu_settings WHERE is_visible = 1 ORDER BY sort_order ASC"
    } else {
        "SELECT id, key, label, is_visible, sort_order FROM menu_settings ORDER BY sort_order ASC"
    };
    let rows = sqlx::query(query)
        .fetch_all(pool)
        .await
        .context("Failed to list menu settings")?;

    Ok(rows
        .iter()
        .map(|row| MenuSetting {
            id: row.get("id"),
            key: row.get("key"),
            label: row.get("label"),
            is_visible: row.get("is_visible"),
            sort_order: row.get("sort_order"),
        })
        .collect())
}

async fn get_by_key_sqlite(pool: &SqlitePool, key: &str) -> Result<Option<MenuSetting>> {
    let row = sqlx::query(
        "SELECT id, key, label, is_visible, sort_order FROM menu_settings WHERE key = ?",
    )
    .bind(key)
    .fetch_optional(pool)
    .await
    .context("Failed to get menu setting")?;

    Ok(row.map(|row| MenuSetting {
        id: row.get("id"),
        key: row.get("key"),
        label: row.get("label"),
        is_visible: row.get("is_visible"),
        sort_order: row.get("sort_order"),
    }))
}

async fn update_sqlite(pool: &SqlitePool, key: &str, is_visible: bool, sort_order: i32) -> Result<()> {
    sqlx::query("UPDATE menu_settings SET is_visible = ?, sort_order = ? WHERE key = ?")
        .bind(is_visible)
        .bind(sort_order)
        .bind(key)
        .execute(pool)
        .await
        .context("Failed to update menu setting")?;
    Ok(())
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn list_mysql(pool: &MySqlPool, visible_only: bool) -> Result<Vec<MenuSetting>> {
    let query = if visible_only {
        "SELECT id, menu_key, label, is_visible, sort_order FROM menu_settings WHERE is_visible = TRUE ORDER BY sort_order ASC"
    } else {
        "SELECT id, menu_key, label, is_visible, sort_order FROM menu_settings ORDER BY sort_order ASC"
    };
    let rows = sqlx::query(query)
        .fetch_all(pool)
        .await
        .context("Failed to list menu settings")?;

    Ok(rows
        .iter()
        .map(|row| MenuSetting {
            id: row.get("id"),
            key: row.get("menu_key"),
            label: row.get("label"),
            is_visible: row.get("is_visible"),
            sort_order: row.get("sort_order"),
        })
        .collect())
}

async fn get_by_key_mysql(pool: &MySqlPool, key: &str) -> Result<Option<MenuSetting>> {
    let row = sqlx::query(
        "SELECT id, menu_key, label, is_visible, sort_order FROM menu_settings WHERE menu_key = ?",
    )
    .bind(key)
    .fetch_optional(pool)
    .await
    .context("Failed to get menu setting")?;

    Ok(row.map(|row| MenuSetting {
        id: row.get("id"),
        key: row.get("menu_key"),
        label: row.get("label"),
        is_visible: row.get("is_visible"),
        sort_order: row.get("sort_order"),
    }))
}

async fn update_mysql(pool: &MySqlPool, key: &str, is_visible: bool, sort_order: i32) -> Result<()> {
    sqlx::query("UPDATE menu_settings SET is_visible = ?, sort_order = ? WHERE menu_key = ?")
        .bind(is_visible)
        .bind(sort_order)
        .bind(key)
        .execute(pool)
        .await
        .context("Failed to update menu setting")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SqlxMenuRepository {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxMenuRepository::new(pool)
    }

    #[tokio::test]
    async fn test_default_entries_seeded() {
        let repo = setup().await;
        let all = repo.list().await.unwrap();
        assert_eq!(all.len(), 5);
        assert_eq!(all[0].key, "news");
    }

    #[tokio::test]
    async fn test_hide_entry() {
        let repo = setup().await;
        repo.update("forum", false, 2).await.unwrap();

        let visible = repo.list_visible().await.unwrap();
        assert_eq!(visible.len(), 4);
        assert!(visible.iter().all(|m| m.key != "forum"));

        let forum = repo.get_by_key("forum").await.unwrap().unwrap();
        assert!(!forum.is_visible);
    }

    #[tokio::test]
    async fn test_reorder_entries() {
        let repo = setup().await;
        repo.update("polls", true, -1).await.unwrap();

        let all = repo.list().await.unwrap();
        assert_eq!(all[0].key, "polls");
    }
}
