//! Invitation repository
//!
//! Database operations for user invitations.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Invitation, UserRole};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Invitation repository trait
#[async_trait]
pub trait InvitationRepository: Send + Sync {
    /// Persist a new invitation
    async fn create(&self, invitation: &Invitation) -> Result<Invitation>;

    /// Get invitation by token
    async fn get_by_token(&self, token: &str) -> Result<Option<Invitation>>;

    /// List invitations, newest first
    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Invitation>>;

    /// Count invitations
    async fn count(&self) -> Result<i64>;

    /// Mark an invitation as accepted
    async fn mark_accepted(&self, id: i64) -> Result<()>;

    /// Delete an invitation
    async fn delete(&self, id: i64) -> Result<()>;

    /// Delete expired, unaccepted invitations; returns the number removed
    async fn delete_expired(&self) -> Result<i64>;
}

/// SQLx-based invitation repository implementation
pub struct SqlxInvitationRepository {
    pool: DynDatabasePool,
}

impl SqlxInvitationRepository {
    /// Create a new SQLx invitation repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn InvitationRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl InvitationRepository for SqlxInvitationRepository {
    async fn create(&self, invitation: &Invitation) -> Result<Invitation> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_invitation_sqlite(self.pool.as_sqlite().unwrap(), invitation).await
            }
            DatabaseDriver::Mysql => {
                create_invitation_mysql(self.pool.as_mysql().unwrap(), invitation).await
            }
        }
    }

    async fn get_by_token(&self, token: &str) -> Result<Option<Invitation>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_by_token_sqlite(self.pool.as_sqlite().unwrap(), token).await
            }
            DatabaseDriver::Mysql => get_by_token_mysql(self.pool.as_mysql().unwrap(), token).await,
        }
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Invitation>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_invitations_sqlite(self.pool.as_sqlite().unwrap(), offset, limit).await
            }
            DatabaseDriver::Mysql => {
                list_invitations_mysql(self.pool.as_mysql().unwrap(), offset, limit).await
            }
        }
    }

    async fn count(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                count_invitations_sqlite(self.pool.as_sqlite().unwrap()).await
            }
            DatabaseDriver::Mysql => count_invitations_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn mark_accepted(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                mark_accepted_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => mark_accepted_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                delete_invitation_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => {
                delete_invitation_mysql(self.pool.as_mysql().unwrap(), id).await
            }
        }
    }

    async fn delete_expired(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_expired_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => delete_expired_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }
}

const INVITATION_COLUMNS: &str =
    "id, email, token, role, invited_by, expires_at, accepted_at, created_at";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_invitation_sqlite(pool: &SqlitePool, invitation: &Invitation) -> Result<Invitation> {
    let result = sqlx::query(
        r#"
        INSERT INTO user_invitations (email, token, role, invited_by, expires_at, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&invitation.email)
    .bind(&invitation.token)
    .bind(invitation.role.as_str())
    .bind(invitation.invited_by)
    .bind(invitation.expires_at)
    .bind(invitation.created_at)
    .execute(pool)
    .await
    .context("Failed to create invitation")?;

    Ok(Invitation {
        id: result.last_insert_rowid(),
        ..invitation.clone()
    })
}

async fn get_by_token_sqlite(pool: &SqlitePool, token: &str) -> Result<Option<Invitation>> {
    let query = format!(
        "SELECT {} FROM user_invitations WHERE token = ?",
        INVITATION_COLUMNS
    );
    let row = sqlx::query(&query)
        .bind(token)
        .fetch_optional(pool)
        .await
        .context("Failed to get invitation by token")?;

    match row {
        Some(row) => Ok(Some(row_to_invitation_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn list_invitations_sqlite(
    pool: &SqlitePool,
    offset: i64,
    limit: i64,
) -> Result<Vec<Invitation>> {
    let query = format!(
        "SELECT {} FROM user_invitations ORDER BY created_at DESC LIMIT ? OFFSET ?",
        INVITATION_COLUMNS
    );
    let rows = sqlx::query(&query)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list invitations")?;

    let mut invitations = Vec::new();
    for row in rows {
        invitations.push(row_to_invitation_sqlite(&row)?);
    }
    Ok(invitations)
}

async fn count_invitations_sqlite(pool: &SqlitePool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM user_invitations")
        .fetch_one(pool)
        .await
        .context("Failed to count invitations")?;
    Ok(row.get("count"))
}

async fn mark_accepted_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("UPDATE user_invitations SET accepted_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to mark invitation accepted")?;
    Ok(())
}

async fn delete_invitation_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM user_invitations WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete invitation")?;
    Ok(())
}

async fn delete_expired_sqlite(pool: &SqlitePool) -> Result<i64> {
    let result = sqlx::query(
        "DELETE FROM user_invitations WHERE accepted_at IS NULL AND expires_at < CURRENT_TIMESTAMP",
    )
    .execute(pool)
    .await
    .context("Failed to delete expired invitations")?;
    Ok(result.rows_affected() as i64)
}

fn row_to_invitation_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Invitation> {
    let role_str: String = row.get("role");
    let role = UserRole::from_str(&role_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid invitation role: {}", role_str))?;

    Ok(Invitation {
        id: row.get("id"),
        email: row.get("email"),
        token: row.get("token"),
        role,
        invited_by: row.get("invited_by"),
        expires_at: row.get("expires_at"),
        accepted_at: row.get("accepted_at"),
        created_at: row.get("created_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_invitation_mysql(pool: &MySqlPool, invitation: &Invitation) -> Result<Invitation> {
    let result = sqlx::query(
        r#"
        INSERT INTO user_invitations (email, token, role, invited_by, expires_at, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&invitation.email)
    .bind(&invitation.token)
    .bind(invitation.role.as_str())
    .bind(invitation.invited_by)
    .bind(invitation.expires_at)
    .bind(invitation.created_at)
    .execute(pool)
    .await
    .context("Failed to create invitation")?;

    Ok(Invitation {
        id: result.last_insert_id() as i64,
        ..invitation.clone()
    })
}

async fn get_by_token_mysql(pool: &MySqlPool, token: &str) -> Result<Option<Invitation>> {
    let query = format!(
        "SELECT {} FROM user_invitations WHERE token = ?",
        INVITATION_COLUMNS
    );
    let row = sqlx::query(&query)
        .bind(token)
        .fetch_optional(pool)
        .await
        .context("Failed to get invitation by token")?;

    match row {
        Some(row) => Ok(Some(row_to_invitation_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn list_invitations_mysql(
    pool: &MySqlPool,
    offset: i64,
    limit: i64,
) -> Result<Vec<Invitation>> {
    let query = format!(
        "SELECT {} FROM user_invitations ORDER BY created_at DESC LIMIT ? OFFSET ?",
        INVITATION_COLUMNS
    );
    let rows = sqlx::query(&query)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list invitations")?;

    let mut invitations = Vec::new();
    for row in rows {
        invitations.push(row_to_invitation_mysql(&row)?);
    }
    Ok(invitations)
}

async fn count_invitations_mysql(pool: &MySqlPool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM user_invitations")
        .fetch_one(pool)
        .await
        .context("Failed to count invitations")?;
    Ok(row.get("count"))
}

async fn mark_accepted_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("UPDATE user_invitations SET accepted_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to mark invitation accepted")?;
    Ok(())
}

async fn delete_invitation_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM user_invitations WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete invitation")?;
    Ok(())
}

async fn delete_expired_mysql(pool: &MySqlPool) -> Result<i64> {
    let result = sqlx::query(
        "DELETE FROM user_invitations WHERE accepted_at IS NULL AND expires_at < CURRENT_TIMESTAMP",
    )
    .execute(pool)
    .await
    .context("Failed to delete expired invitations")?;
    Ok(result.rows_affected() as i64)
}

fn row_to_invitation_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Invitation> {
    let role_str: String = row.get("role");
    let role = UserRole::from_str(&role_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid invitation role: {}", role_str))?;

    Ok(Invitation {
        id: row.get("id"),
        email: row.get("email"),
        token: row.get("token"),
        role,
        invited_by: row.get("invited_by"),
        expires_at: row.get("expires_at"),
        accepted_at: row.get("accepted_at"),
        created_at: row.get("created_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use chrono::Duration;

    async fn setup() -> (DynDatabasePool, SqlxInvitationRepository, i64) {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let result = sqlx::query(
            "INSERT INTO users (username, email, password_hash, role) VALUES ('admin', 'a@x.com', 'h', 'admin')",
        )
        .execute(pool.as_sqlite().unwrap())
        .await
        .unwrap();

        let repo = SqlxInvitationRepository::new(pool.clone());
        (pool, repo, result.last_insert_rowid())
    }

    fn invitation(email: &str, token: &str, admin_id: i64, ttl_hours: i64) -> Invitation {
        Invitation {
            id: 0,
            email: email.to_string(),
            token: token.to_string(),
            role: UserRole::Member,
            invited_by: admin_id,
            expires_at: Utc::now() + Duration::hours(ttl_hours),
            accepted_at: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup_by_token() {
        let (_pool, repo, admin_id) = setup().await;

        let created = repo
            .create(&invitation("new@example.com", "tok-1", admin_id, 72))
            .await
            .unwrap();
        assert!(created.id > 0);
        assert!(created.is_usable());

        let found = repo.get_by_token("tok-1").await.unwrap().unwrap();
        assert_eq!(found.email, "new@example.com");
        assert!(repo.get_by_token("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mark_accepted() {
        let (_pool, repo, admin_id) = setup().await;
        let created = repo
            .create(&invitation("a@example.com", "tok-2", admin_id, 72))
            .await
            .unwrap();

        repo.mark_accepted(created.id).await.unwrap();
        let reloaded = repo.get_by_token("tok-2").await.unwrap().unwrap();
        assert!(reloaded.accepted_at.is_some());
        assert!(!reloaded.is_usable());
    }

    #[tokio::test]
    async fn test_delete_expired_keeps_accepted() {
        let (_pool, repo, admin_id) = setup().await;
        let expired = repo
            .create(&invitation("old@example.com", "tok-old", admin_id, -1))
            .await
            .unwrap();
        let accepted = repo
            .create(&invitation("done@example.com", "tok-done", admin_id, -1))
            .await
            .unwrap();
        repo.mark_accepted(accepted.id).await.unwrap();

        let removed = repo.delete_expired().await.unwrap();
        assert_eq!(removed, 1);
        assert!(repo.get_by_token("tok-old").await.unwrap().is_none());
        assert!(repo.get_by_token("tok-done").await.unwrap().is_some());
        let _ = expired;
    }
}
