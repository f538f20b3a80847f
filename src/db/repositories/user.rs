//! User repository
//!
//! Database operations for user accounts.
//!
//! This module provides:
//! - `UserRepository` trait defining the interface for user data access
//! - `SqlxUserRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{User, UserRole, UserStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, user: &User) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by username
    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Get user by email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// List users with pagination
    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<User>>;

    /// Count total users
    async fn count(&self) -> Result<i64>;

    /// Update a user's role
    async fn update_role(&self, id: i64, role: UserRole) -> Result<()>;

    /// Update a user's status
    async fn update_status(&self, id: i64, status: UserStatus) -> Result<()>;

    /// Update a user's password hash
    async fn update_password(&self, id: i64, password_hash: &str) -> Result<()>;

    /// Delete a user
    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based user repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_user_sqlite(self.pool.as_sqlite().unwrap(), user).await,
            DatabaseDriver::Mysql => create_user_mysql(self.pool.as_mysql().unwrap(), user).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_user_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => get_user_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_user_sqlite(self.pool.as_sqlite().unwrap(), "username", username).await
            }
            DatabaseDriver::Mysql => {
                get_user_mysql(self.pool.as_mysql().unwrap(), "username", username).await
            }
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_user_sqlite(self.pool.as_sqlite().unwrap(), "email", email).await
            }
            DatabaseDriver::Mysql => {
                get_user_mysql(self.pool.as_mysql().unwrap(), "email", email).await
            }
        }
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_users_sqlite(self.pool.as_sqlite().unwrap(), offset, limit).await
            }
            DatabaseDriver::Mysql => {
                list_users_mysql(self.pool.as_mysql().unwrap(), offset, limit).await
            }
        }
    }

    async fn count(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_users_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => count_users_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn update_role(&self, id: i64, role: UserRole) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_field_sqlite(self.pool.as_sqlite().unwrap(), id, "role", role.as_str()).await
            }
            DatabaseDriver::Mysql => {
                update_field_mysql(self.pool.as_mysql().unwrap(), id, "role", role.as_str()).await
            }
        }
    }

    async fn update_status(&self, id: i64, status: UserStatus) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_field_sqlite(self.pool.as_sqlite().unwrap(), id, "status", status.as_str())
                    .await
            }
            DatabaseDriver::Mysql => {
                update_field_mysql(self.pool.as_mysql().unwrap(), id, "status", status.as_str())
                    .await
            }
        }
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_field_sqlite(
                    self.pool.as_sqlite().unwrap(),
                    id,
                    "password_hash",
                    password_hash,
                )
                .await
            }
            DatabaseDriver::Mysql => {
                update_field_mysql(
                    self.pool.as_mysql().unwrap(),
                    id,
                    "password_hash",
                    password_hash,
                )
                .await
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_user_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => delete_user_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }
}

const USER_COLUMNS: &str =
    "id, username, email, password_hash, role, status, created_at, updated_at";

// Allowed lookup/update columns; `field` is always one of these literals,
// never user input.
fn assert_known_column(field: &str) {
    debug_assert!(matches!(
        field,
        "username" | "email" | "role" | "status" | "password_hash"
    ));
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_user_sqlite(pool: &SqlitePool, user: &User) -> Result<User> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
        INSERT INTO users (username, email, password_hash, role, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role.as_str())
    .bind(user.status.as_str())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    Ok(User {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..user.clone()
    })
}

async fn get_user_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    let query = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_user_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn get_user_sqlite(pool: &SqlitePool, field: &str, value: &str) -> Result<Option<User>> {
    assert_known_column(field);
    let query = format!("SELECT {} FROM users WHERE {} = ?", USER_COLUMNS, field);
    let row = sqlx::query(&query)
        .bind(value)
        .fetch_optional(pool)
        .await
        .context("Failed to get user")?;

    match row {
        Some(row) => Ok(Some(row_to_user_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn list_users_sqlite(pool: &SqlitePool, offset: i64, limit: i64) -> Result<Vec<User>> {
    let query = format!(
        "SELECT {} FROM users ORDER BY created_at DESC LIMIT ? OFFSET ?",
        USER_COLUMNS
    );
    let rows = sqlx::query(&query)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list users")?;

    let mut users = Vec::new();
    for row in rows {
        users.push(row_to_user_sqlite(&row)?);
    }

    Ok(users)
}

async fn count_users_sqlite(pool: &SqlitePool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM users")
        .fetch_one(pool)
        .await
        .context("Failed to count users")?;
    Ok(row.get("count"))
}

async fn update_field_sqlite(pool: &SqlitePool, id: i64, field: &str, value: &str) -> Result<()> {
    assert_known_column(field);
    let query = format!("UPDATE users SET {} = ?, updated_at = ? WHERE id = ?", field);
    sqlx::query(&query)
        .bind(value)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update user")?;
    Ok(())
}

async fn delete_user_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete user")?;
    Ok(())
}

fn row_to_user_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    let role_str: String = row.get("role");
    let role = UserRole::from_str(&role_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid user role: {}", role_str))?;
    let status_str: String = row.get("status");
    let status = UserStatus::from_str(&status_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid user status: {}", status_str))?;

    Ok(User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role,
        status,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_user_mysql(pool: &MySqlPool, user: &User) -> Result<User> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
        INSERT INTO users (username, email, password_hash, role, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role.as_str())
    .bind(user.status.as_str())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    Ok(User {
        id: result.last_insert_id() as i64,
        created_at: now,
        updated_at: now,
        ..user.clone()
    })
}

async fn get_user_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<User>> {
    let query = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_user_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn get_user_mysql(pool: &MySqlPool, field: &str, value: &str) -> Result<Option<User>> {
    assert_known_column(field);
    let query = format!("SELECT {} FROM users WHERE {} = ?", USER_COLUMNS, field);
    let row = sqlx::query(&query)
        .bind(value)
        .fetch_optional(pool)
        .await
        .context("Failed to get user")?;

    match row {
        Some(row) => Ok(Some(row_to_user_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn list_users_mysql(pool: &MySqlPool, offset: i64, limit: i64) -> Result<Vec<User>> {
    let query = format!(
        "SELECT {} FROM users ORDER BY created_at DESC LIMIT ? OFFSET ?",
        USER_COLUMNS
    );
    let rows = sqlx::query(&query)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list users")?;

    let mut users = Vec::new();
    for row in rows {
        users.push(row_to_user_mysql(&row)?);
    }

    Ok(users)
}

async fn count_users_mysql(pool: &MySqlPool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM users")
        .fetch_one(pool)
        .await
        .context("Failed to count users")?;
    Ok(row.get("count"))
}

async fn update_field_mysql(pool: &MySqlPool, id: i64, field: &str, value: &str) -> Result<()> {
    assert_known_column(field);
    let query = format!("UPDATE users SET {} = ?, updated_at = ? WHERE id = ?", field);
    sqlx::query(&query)
        .bind(value)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update user")?;
    Ok(())
}

async fn delete_user_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete user")?;
    Ok(())
}

fn row_to_user_mysql(row: &sqlx::mysql::MySqlRow) -> Result<User> {
    let role_str: String = row.get("role");
    let role = UserRole::from_str(&role_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid user role: {}", role_str))?;
    let status_str: String = row.get("status");
    let status = UserStatus::from_str(&status_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid user status: {}", status_str))?;

    Ok(User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role,
        status,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> (DynDatabasePool, SqlxUserRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxUserRepository::new(pool.clone());
        (pool, repo)
    }

    fn test_user(username: &str, role: UserRole) -> User {
        User::new(
            username.to_string(),
            format!("{}@example.com", username),
            "$argon2id$test-hash".to_string(),
            role,
        )
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let (_pool, repo) = setup_test_repo().await;

        let created = repo
            .create(&test_user("alice", UserRole::Admin))
            .await
            .expect("Failed to create user");
        assert!(created.id > 0);

        let found = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get user")
            .expect("User not found");
        assert_eq!(found.username, "alice");
        assert_eq!(found.role, UserRole::Admin);
        assert_eq!(found.status, UserStatus::Active);
    }

    #[tokio::test]
    async fn test_get_by_username_and_email() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&test_user("bob", UserRole::Member))
            .await
            .expect("Failed to create user");

        let by_name = repo.get_by_username("bob").await.unwrap();
        assert!(by_name.is_some());

        let by_email = repo.get_by_email("bob@example.com").await.unwrap();
        assert!(by_email.is_some());

        let missing = repo.get_by_username("nobody").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_update_role_and_status() {
        let (_pool, repo) = setup_test_repo().await;
        let user = repo
            .create(&test_user("carol", UserRole::Member))
            .await
            .unwrap();

        repo.update_role(user.id, UserRole::Editor).await.unwrap();
        repo.update_status(user.id, UserStatus::Disabled)
            .await
            .unwrap();

        let updated = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(updated.role, UserRole::Editor);
        assert_eq!(updated.status, UserStatus::Disabled);
    }

    #[tokio::test]
    async fn test_list_and_count() {
        let (_pool, repo) = setup_test_repo().await;
        for name in ["u1", "u2", "u3"] {
            repo.create(&test_user(name, UserRole::Member))
                .await
                .unwrap();
        }

        assert_eq!(repo.count().await.unwrap(), 3);
        assert_eq!(repo.list(0, 2).await.unwrap().len(), 2);
        assert_eq!(repo.list(2, 2).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_user() {
        let (_pool, repo) = setup_test_repo().await;
        let user = repo
            .create(&test_user("dave", UserRole::Member))
            .await
            .unwrap();

        repo.delete(user.id).await.unwrap();
        assert!(repo.get_by_id(user.id).await.unwrap().is_none());
    }
}
