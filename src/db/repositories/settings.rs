//! Settings repository
//!
//! Key-value site settings. The key column is named `key` on SQLite and
//! `setting_key` on MySQL (KEY is reserved there).

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Setting;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Settings repository trait
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Get a setting by key
    async fn get(&self, key: &str) -> Result<Option<Setting>>;

    /// Insert or update a setting
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// List all settings
    async fn list(&self) -> Result<Vec<Setting>>;

    /// Delete a setting
    async fn delete(&self, key: &str) -> Result<()>;
}

/// SQLx-based settings repository implementation
pub struct SqlxSettingsRepository {
    pool: DynDatabasePool,
}

impl SqlxSettingsRepository {
    /// Create a new SQLx settings repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SettingsRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SettingsRepository for SqlxSettingsRepository {
    async fn get(&self, key: &str) -> Result<Option<Setting>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_setting_sqlite(self.pool.as_sqlite().unwrap(), key).await,
            DatabaseDriver::Mysql => get_setting_mysql(self.pool.as_mysql().unwrap(), key).await,
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                set_setting_sqlite(self.pool.as_sqlite().unwrap(), key, value).await
            }
            DatabaseDriver::Mysql => {
                set_setting_mysql(self.pool.as_mysql().unwrap(), key, value).await
            }
        }
    }

    async fn list(&self) -> Result<Vec<Setting>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_settings_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => list_settings_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                delete_setting_sqlite(self.pool.as_sqlite().unwrap(), key).await
            }
            DatabaseDriver::Mysql => delete_setting_mysql(self.pool.as_mysql().unwrap(), key).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn get_setting_sqlite(pool: &SqlitePool, key: &str) -> Result<Option<Setting>> {
    let row = sqlx::query("SELECT key, value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await
        .context("Failed to get setting")?;

    Ok(row.map(|row| Setting {
        key: row.get("key"),
        value: row.get("value"),
    }))
}

async fn set_setting_sqlite(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await
    .context("Failed to set setting")?;
    Ok(())
}

async fn list_settings_sqlite(pool: &SqlitePool) -> Result<Vec<Setting>> {
    let rows = sqlx::query("SELECT key, value FROM settings ORDER BY key ASC")
        .fetch_all(pool)
        .await
        .context("Failed to list settings")?;

    Ok(rows
        .iter()
        .map(|row| Setting {
            key: row.get("key"),
            value: row.get("value"),
        })
        .collect())
}

async fn delete_setting_sqlite(pool: &SqlitePool, key: &str) -> Result<()> {
    sqlx::query("DELETE FROM settings WHERE key = ?")
        .bind(key)
        .execute(pool)
        .await
        .context("Failed to delete setting")?;
    Ok(())
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn get_setting_mysql(pool: &MySqlPool, key: &str) -> Result<Option<Setting>> {
    let row = sqlx::query("SELECT setting_key, value FROM settings WHERE setting_key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await
        .context("Failed to get setting")?;

    Ok(row.map(|row| Setting {
        key: row.get("setting_key"),
        value: row.get("value"),
    }))
}

async fn set_setting_mysql(pool: &MySqlPool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO settings (setting_key, value) VALUES (?, ?) ON DUPLICATE KEY UPDATE value = VALUES(value)",
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await
    .context("Failed to set setting")?;
    Ok(())
}

async fn list_settings_mysql(pool: &MySqlPool) -> Result<Vec<Setting>> {
    let rows = sqlx::query("SELECT setting_key, value FROM settings ORDER BY setting_key ASC")
        .fetch_all(pool)
        .await
        .context("Failed to list settings")?;

    Ok(rows
        .iter()
        .map(|row| Setting {
            key: row.get("setting_key"),
            value: row.get("value"),
        })
        .collect())
}

async fn delete_setting_mysql(pool: &MySqlPool, key: &str) -> Result<()> {
    sqlx::query("DELETE FROM settings WHERE setting_key = ?")
        .bind(key)
        .execute(pool)
        .await
        .context("Failed to delete setting")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SqlxSettingsRepository {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxSettingsRepository::new(pool)
    }

    #[tokio::test]
    async fn test_set_get_roundtrip() {
        let repo = setup().await;

        repo.set("site_name", "The Digital Ledger").await.unwrap();
        let setting = repo.get("site_name").await.unwrap().unwrap();
        assert_eq!(setting.value, "The Digital Ledger");

        assert!(repo.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let repo = setup().await;
        repo.set("site_name", "Old").await.unwrap();
        repo.set("site_name", "New").await.unwrap();

        let setting = repo.get("site_name").await.unwrap().unwrap();
        assert_eq!(setting.value, "New");
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = setup().await;
        repo.set("tmp", "x").await.unwrap();
        repo.delete("tmp").await.unwrap();
        assert!(repo.get("tmp").await.unwrap().is_none());
    }
}
