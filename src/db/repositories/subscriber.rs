//! Subscriber repository
//!
//! Database operations for newsletter subscribers.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Subscriber;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Subscriber repository trait
#[async_trait]
pub trait SubscriberRepository: Send + Sync {
    /// Create a new subscriber
    async fn create(&self, email: &str) -> Result<Subscriber>;

    /// Get subscriber by email
    async fn get_by_email(&self, email: &str) -> Result<Option<Subscriber>>;

    /// Mark a subscriber as confirmed
    async fn confirm(&self, email: &str) -> Result<()>;

    /// List subscribers, newest first
    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Subscriber>>;

    /// Count subscribers
    async fn count(&self) -> Result<i64>;

    /// Delete a subscriber by email (unsubscribe)
    async fn delete_by_email(&self, email: &str) -> Result<bool>;
}

/// SQLx-based subscriber repository implementation
pub struct SqlxSubscriberRepository {
    pool: DynDatabasePool,
}

impl SqlxSubscriberRepository {
    /// Create a new SQLx subscriber repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SubscriberRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SubscriberRepository for SqlxSubscriberRepository {
    async fn create(&self, email: &str) -> Result<Subscriber> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_subscriber_sqlite(self.pool.as_sqlite().unwrap(), email).await
            }
            DatabaseDriver::Mysql => {
                create_subscriber_mysql(self.pool.as_mysql().unwrap(), email).await
            }
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Subscriber>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_subscriber_sqlite(self.pool.as_sqlite().unwrap(), email).await
            }
            DatabaseDriver::Mysql => {
                get_subscriber_mysql(self.pool.as_mysql().unwrap(), email).await
            }
        }
    }

    async fn confirm(&self, email: &str) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                confirm_subscriber_sqlite(self.pool.as_sqlite().unwrap(), email).await
            }
            DatabaseDriver::Mysql => {
                confirm_subscriber_mysql(self.pool.as_mysql().unwrap(), email).await
            }
        }
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Subscriber>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_subscribers_sqlite(self.pool.as_sqlite().unwrap(), offset, limit).await
            }
            DatabaseDriver::Mysql => {
                list_subscribers_mysql(self.pool.as_mysql().unwrap(), offset, limit).await
            }
        }
    }

    async fn count(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                count_subscribers_sqlite(self.pool.as_sqlite().unwrap()).await
            }
            DatabaseDriver::Mysql => count_subscribers_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn delete_by_email(&self, email: &str) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                delete_subscriber_sqlite(self.pool.as_sqlite().unwrap(), email).await
            }
            DatabaseDriver::Mysql => {
                delete_subscriber_mysql(self.pool.as_mysql().unwrap(), email).await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_subscriber_sqlite(pool: &SqlitePool, email: &str) -> Result<Subscriber> {
    let now = Utc::now();
    let result =
        sqlx::query("INSERT INTO subscribers (email, confirmed, subscribed_at) VALUES (?, 0, ?)")
            .bind(email)
            .bind(now)
            .execute(pool)
            .await
            .context("Failed to create subscriber")?;

    Ok(Subscriber {
        id: result.last_insert_rowid(),
        email: email.to_string(),
        confirmed: false,
        subscribed_at: now,
    })
}

async fn get_subscriber_sqlite(pool: &SqlitePool, email: &str) -> Result<Option<Subscriber>> {
    let row = sqlx::query(
        "SELECT id, email, confirmed, subscribed_at FROM subscribers WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
    .context("Failed to get subscriber")?;

    Ok(row.map(|row| Subscriber {
        id: row.get("id"),
        email: row.get("email"),
        confirmed: row.get("confirmed"),
        subscribed_at: row.get("subscribed_at"),
    }))
}

async fn confirm_subscriber_sqlite(pool: &SqlitePool, email: &str) -> Result<()> {
    sqlx::query("UPDATE subscribers SET confirmed = 1 WHERE email = ?")
        .bind(email)
        .execute(pool)
        .await
        .context("Failed to confirm subscriber")?;
    Ok(())
}

async fn list_subscribers_sqlite(
    pool: &SqlitePool,
    offset: i64,
    limit: i64,
) -> Result<Vec<Subscriber>> {
    let rows = sqlx::query(
        "SELECT id, email, confirmed, subscribed_at FROM subscribers ORDER BY subscribed_at DESC LIMIT ? OFFSET ?",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .context("Failed to list subscribers")?;

    Ok(rows
        .iter()
        .map(|row| Subscriber {
            id: row.get("id"),
            email: row.get("email"),
            confirmed: row.get("confirmed"),
            subscribed_at: row.get("subscribed_at"),
        })
        .collect())
}

async fn count_subscribers_sqlite(pool: &SqlitePool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM subscribers")
        .fetch_one(pool)
        .await
        .context("Failed to count subscribers")?;
    Ok(row.get("count"))
}

async fn delete_subscriber_sqlite(pool: &SqlitePool, email: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM subscribers WHERE email = ?")
        .bind(email)
        .execute(pool)
        .await
        .context("Failed to delete subscriber")?;
    Ok(result.rows_affected() > 0)
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_subscriber_mysql(pool: &MySqlPool, email: &str) -> Result<Subscriber> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO subscribers (email, confirmed, subscribed_at) VALUES (?, FALSE, ?)",
    )
    .bind(email)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create subscriber")?;

    Ok(Subscriber {
        id: result.last_insert_id() as i64,
        email: email.to_string(),
        confirmed: false,
        subscribed_at: now,
    })
}

async fn get_subscriber_mysql(pool: &MySqlPool, email: &str) -> Result<Option<Subscriber>> {
    let row = sqlx::query(
        "SELECT id, email, confirmed, subscribed_at FROM subscribers WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
    .context("Failed to get subscriber")?;

    Ok(row.map(|row| Subscriber {
        id: row.get("id"),
        email: row.get("email"),
        confirmed: row.get("confirmed"),
        subscribed_at: row.get("subscribed_at"),
    }))
}

async fn confirm_subscriber_mysql(pool: &MySqlPool, email: &str) -> Result<()> {
    sqlx::query("UPDATE subscribers SET confirmed = TRUE WHERE email = ?")
        .bind(email)
        .execute(pool)
        .await
        .context("Failed to confirm subscriber")?;
    Ok(())
}

async fn list_subscribers_mysql(
    pool: &MySqlPool,
    offset: i64,
    limit: i64,
) -> Result<Vec<Subscriber>> {
    let rows = sqlx::query(
        "SELECT id, email, confirmed, subscribed_at FROM subscribers ORDER BY subscribed_at DESC LIMIT ? OFFSET ?",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .context("Failed to list subscribers")?;

    Ok(rows
        .iter()
        .map(|row| Subscriber {
            id: row.get("id"),
            email: row.get("email"),
            confirmed: row.get("confirmed"),
            subscribed_at: row.get("subscribed_at"),
        })
        .collect())
}

async fn count_subscribers_mysql(pool: &MySqlPool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM subscribers")
        .fetch_one(pool)
        .await
        .context("Failed to count subscribers")?;
    Ok(row.get("count"))
}

async fn delete_subscriber_mysql(pool: &MySqlPool, email: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM subscribers WHERE email = ?")
        .bind(email)
        .execute(pool)
        .await
        .context("Failed to delete subscriber")?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SqlxSubscriberRepository {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxSubscriberRepository::new(pool)
    }

    #[tokio::test]
    async fn test_subscribe_confirm_unsubscribe() {
        let repo = setup().await;

        let created = repo.create("reader@example.com").await.unwrap();
        assert!(!created.confirmed);

        repo.confirm("reader@example.com").await.unwrap();
        let confirmed = repo.get_by_email("reader@example.com").await.unwrap().unwrap();
        assert!(confirmed.confirmed);

        assert!(repo.delete_by_email("reader@example.com").await.unwrap());
        assert!(!repo.delete_by_email("reader@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let repo = setup().await;
        repo.create("dup@example.com").await.unwrap();
        assert!(repo.create("dup@example.com").await.is_err());
    }

    #[tokio::test]
    async fn test_list_and_count() {
        let repo = setup().await;
        for i in 0..3 {
            repo.create(&format!("s{}@example.com", i)).await.unwrap();
        }
        assert_eq!(repo.count().await.unwrap(), 3);
        assert_eq!(repo.list(0, 10).await.unwrap().len(), 3);
    }
}
