//! Poll repository
//!
//! Database operations for polls, their options and vote counters.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{CreatePollInput, Poll, PollOption, UpdatePollInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Poll repository trait
#[async_trait]
pub trait PollRepository: Send + Sync {
    /// Create a poll with its options
    async fn create(&self, input: &CreatePollInput) -> Result<Poll>;

    /// Get a poll with options by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Poll>>;

    /// Get the currently active poll, if any
    async fn get_active(&self) -> Result<Option<Poll>>;

    /// List all polls with options, newest first
    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Poll>>;

    /// Count polls
    async fn count(&self) -> Result<i64>;

    /// Update a poll's question or active flag
    async fn update(&self, id: i64, input: &UpdatePollInput) -> Result<Poll>;

    /// Deactivate every poll (used before activating another)
    async fn deactivate_all(&self) -> Result<()>;

    /// Delete a poll (options cascade)
    async fn delete(&self, id: i64) -> Result<()>;

    /// Record a vote for an option of the given poll.
    ///
    /// Returns false if the option does not belong to the poll.
    async fn vote(&self, poll_id: i64, option_id: i64) -> Result<bool>;
}

/// SQLx-based poll repository implementation
pub struct SqlxPollRepository {
    pool: DynDatabasePool,
}

impl SqlxPollRepository {
    /// Create a new SQLx poll repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PollRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PollRepository for SqlxPollRepository {
    async fn create(&self, input: &CreatePollInput) -> Result<Poll> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_poll_sqlite(self.pool.as_sqlite().unwrap(), input).await,
            DatabaseDriver::Mysql => create_poll_mysql(self.pool.as_mysql().unwrap(), input).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Poll>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_poll_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_poll_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_active(&self) -> Result<Option<Poll>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_active_poll_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => get_active_poll_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Poll>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_polls_sqlite(self.pool.as_sqlite().unwrap(), offset, limit).await
            }
            DatabaseDriver::Mysql => {
                list_polls_mysql(self.pool.as_mysql().unwrap(), offset, limit).await
            }
        }
    }

    async fn count(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_polls_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => count_polls_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn update(&self, id: i64, input: &UpdatePollInput) -> Result<Poll> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_poll_sqlite(self.pool.as_sqlite().unwrap(), id, input).await
            }
            DatabaseDriver::Mysql => {
                update_poll_mysql(self.pool.as_mysql().unwrap(), id, input).await
            }
        }
    }

    async fn deactivate_all(&self) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                deactivate_all_sqlite(self.pool.as_sqlite().unwrap()).await
            }
            DatabaseDriver::Mysql => deactivate_all_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_poll_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => delete_poll_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn vote(&self, poll_id: i64, option_id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                vote_sqlite(self.pool.as_sqlite().unwrap(), poll_id, option_id).await
            }
            DatabaseDriver::Mysql => {
                vote_mysql(self.pool.as_mysql().unwrap(), poll_id, option_id).await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_poll_sqlite(pool: &SqlitePool, input: &CreatePollInput) -> Result<Poll> {
    let now = Utc::now();
    let result = sqlx::query("INSERT INTO polls (question, is_active, created_at) VALUES (?, ?, ?)")
        .bind(&input.question)
        .bind(input.is_active)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create poll")?;

    let poll_id = result.last_insert_rowid();
    let mut options = Vec::new();
    for (position, label) in input.options.iter().enumerate() {
        let option_result = sqlx::query(
            "INSERT INTO poll_options (poll_id, label, position, vote_count) VALUES (?, ?, ?, 0)",
        )
        .bind(poll_id)
        .bind(label)
        .bind(position as i32)
        .execute(pool)
        .await
        .context("Failed to create poll option")?;

        options.push(PollOption {
            id: option_result.last_insert_rowid(),
            poll_id,
            label: label.clone(),
            position: position as i32,
            vote_count: 0,
        });
    }

    Ok(Poll {
        id: poll_id,
        question: input.question.clone(),
        is_active: input.is_active,
        created_at: now,
        options,
    })
}

async fn load_options_sqlite(pool: &SqlitePool, poll_id: i64) -> Result<Vec<PollOption>> {
    let rows = sqlx::query(
        "SELECT id, poll_id, label, position, vote_count FROM poll_options WHERE poll_id = ? ORDER BY position ASC",
    )
    .bind(poll_id)
    .fetch_all(pool)
    .await
    .context("Failed to load poll options")?;

    Ok(rows
        .iter()
        .map(|row| PollOption {
            id: row.get("id"),
            poll_id: row.get("poll_id"),
            label: row.get("label"),
            position: row.get("position"),
            vote_count: row.get("vote_count"),
        })
        .collect())
}

async fn get_poll_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Poll>> {
    let row = sqlx::query("SELECT id, question, is_active, created_at FROM polls WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get poll")?;

    match row {
        Some(row) => {
            let mut poll = row_to_poll_sqlite(&row);
            poll.options = load_options_sqlite(pool, poll.id).await?;
            Ok(Some(poll))
        }
        None => Ok(None),
    }
}

async fn get_active_poll_sqlite(pool: &SqlitePool) -> Result<Option<Poll>> {
    let row = sqlx::query(
        "SELECT id, question, is_active, created_at FROM polls WHERE is_active = 1 ORDER BY created_at DESC LIMIT 1",
    )
    .fetch_optional(pool)
    .await
    .context("Failed to get active poll")?;

    match row {
        Some(row) => {
            let mut poll = row_to_poll_sqlite(&row);
            poll.options = load_options_sqlite(pool, poll.id).await?;
            Ok(Some(poll))
        }
        None => Ok(None),
    }
}

async fn list_polls_sqlite(pool: &SqlitePool, offset: i64, limit: i64) -> Result<Vec<Poll>> {
    let rows = sqlx::query(
        "SELECT id, question, is_active, created_at FROM polls ORDER BY created_at DESC LIMIT ? OFFSET ?",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .context("Failed to list polls")?;

    let mut polls = Vec::new();
    for row in rows {
        let mut poll = row_to_poll_sqlite(&row);
        poll.options = load_options_sqlite(pool, poll.id).await?;
        polls.push(poll);
    }
    Ok(polls)
}

async fn count_polls_sqlite(pool: &SqlitePool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM polls")
        .fetch_one(pool)
        .await
        .context("Failed to count polls")?;
    Ok(row.get("count"))
}

async fn update_poll_sqlite(pool: &SqlitePool, id: i64, input: &UpdatePollInput) -> Result<Poll> {
    let existing = get_poll_sqlite(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Poll not found"))?;

    let new_question = input.question.as_ref().unwrap_or(&existing.question);
    let new_active = input.is_active.unwrap_or(existing.is_active);

    sqlx::query("UPDATE polls SET question = ?, is_active = ? WHERE id = ?")
        .bind(new_question)
        .bind(new_active)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update poll")?;

    get_poll_sqlite(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Poll not found after update"))
}

async fn deactivate_all_sqlite(pool: &SqlitePool) -> Result<()> {
    sqlx::query("UPDATE polls SET is_active = 0 WHERE is_active = 1")
        .execute(pool)
        .await
        .context("Failed to deactivate polls")?;
    Ok(())
}

async fn delete_poll_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM polls WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete poll")?;
    Ok(())
}

async fn vote_sqlite(pool: &SqlitePool, poll_id: i64, option_id: i64) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE poll_options SET vote_count = vote_count + 1 WHERE id = ? AND poll_id = ?",
    )
    .bind(option_id)
    .bind(poll_id)
    .execute(pool)
    .await
    .context("Failed to record vote")?;
    Ok(result.rows_affected() > 0)
}

fn row_to_poll_sqlite(row: &sqlx::sqlite::SqliteRow) -> Poll {
    Poll {
        id: row.get("id"),
        question: row.get("question"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        options: Vec::new(),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_poll_mysql(pool: &MySqlPool, input: &CreatePollInput) -> Result<Poll> {
    let now = Utc::now();
    let result = sqlx::query("INSERT INTO polls (question, is_active, created_at) VALUES (?, ?, ?)")
        .bind(&input.question)
        .bind(input.is_active)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create poll")?;

    let poll_id = result.last_insert_id() as i64;
    let mut options = Vec::new();
    for (position, label) in input.options.iter().enumerate() {
        let option_result = sqlx::query(
            "INSERT INTO poll_options (poll_id, label, position, vote_count) VALUES (?, ?, ?, 0)",
        )
        .bind(poll_id)
        .bind(label)
        .bind(position as i32)
        .execute(pool)
        .await
        .context("Failed to create poll option")?;

        options.push(PollOption {
            id: option_result.last_insert_id() as i64,
            poll_id,
            label: label.clone(),
            position: position as i32,
            vote_count: 0,
        });
    }

    Ok(Poll {
        id: poll_id,
        question: input.question.clone(),
        is_active: input.is_active,
        created_at: now,
        options,
    })
}

async fn load_options_mysql(pool: &MySqlPool, poll_id: i64) -> Result<Vec<PollOption>> {
    let rows = sqlx::query(
        "SELECT id, poll_id, label, position, vote_count FROM poll_options WHERE poll_id = ? ORDER BY position ASC",
    )
    .bind(poll_id)
    .fetch_all(pool)
    .await
    .context("Failed to load poll options")?;

    Ok(rows
        .iter()
        .map(|row| PollOption {
            id: row.get("id"),
            poll_id: row.get("poll_id"),
            label: row.get("label"),
            position: row.get("position"),
            vote_count: row.get("vote_count"),
        })
        .collect())
}

async fn get_poll_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Poll>> {
    let row = sqlx::query("SELECT id, question, is_active, created_at FROM polls WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get poll")?;

    match row {
        Some(row) => {
            let mut poll = row_to_poll_mysql(&row);
            poll.options = load_options_mysql(pool, poll.id).await?;
            Ok(Some(poll))
        }
        None => Ok(None),
    }
}

async fn get_active_poll_mysql(pool: &MySqlPool) -> Result<Option<Poll>> {
    let row = sqlx::query(
        "SELECT id, question, is_active, created_at FROM polls WHERE is_active = TRUE ORDER BY created_at DESC LIMIT 1",
    )
    .fetch_optional(pool)
    .await
    .context("Failed to get active poll")?;

    match row {
        Some(row) => {
            let mut poll = row_to_poll_mysql(&row);
            poll.options = load_options_mysql(pool, poll.id).await?;
            Ok(Some(poll))
        }
        None => Ok(None),
    }
}

async fn list_polls_mysql(pool: &MySqlPool, offset: i64, limit: i64) -> Result<Vec<Poll>> {
    let rows = sqlx::query(
        "SELECT id, question, is_active, created_at FROM polls ORDER BY created_at DESC LIMIT ? OFFSET ?",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .context("Failed to list polls")?;

    let mut polls = Vec::new();
    for row in rows {
        let mut poll = row_to_poll_mysql(&row);
        poll.options = load_options_mysql(pool, poll.id).await?;
        polls.push(poll);
    }
    Ok(polls)
}

async fn count_polls_mysql(pool: &MySqlPool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM polls")
        .fetch_one(pool)
        .await
        .context("Failed to count polls")?;
    Ok(row.get("count"))
}

async fn update_poll_mysql(pool: &MySqlPool, id: i64, input: &UpdatePollInput) -> Result<Poll> {
    let existing = get_poll_mysql(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Poll not found"))?;

    let new_question = input.question.as_ref().unwrap_or(&existing.question);
    let new_active = input.is_active.unwrap_or(existing.is_active);

    sqlx::query("UPDATE polls SET question = ?, is_active = ? WHERE id = ?")
        .bind(new_question)
        .bind(new_active)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update poll")?;

    get_poll_mysql(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Poll not found after update"))
}

async fn deactivate_all_mysql(pool: &MySqlPool) -> Result<()> {
    sqlx::query("UPDATE polls SET is_active = FALSE WHERE is_active = TRUE")
        .execute(pool)
        .await
        .context("Failed to deactivate polls")?;
    Ok(())
}

async fn delete_poll_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM polls WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete poll")?;
    Ok(())
}

async fn vote_mysql(pool: &MySqlPool, poll_id: i64, option_id: i64) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE poll_options SET vote_count = vote_count + 1 WHERE id = ? AND poll_id = ?",
    )
    .bind(option_id)
    .bind(poll_id)
    .execute(pool)
    .await
    .context("Failed to record vote")?;
    Ok(result.rows_affected() > 0)
}

fn row_to_poll_mysql(row: &sqlx::mysql::MySqlRow) -> Poll {
    Poll {
        id: row.get("id"),
        question: row.get("question"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        options: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SqlxPollRepository {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxPollRepository::new(pool)
    }

    fn input(question: &str, active: bool) -> CreatePollInput {
        CreatePollInput {
            question: question.to_string(),
            options: vec!["Yes".into(), "No".into(), "Undecided".into()],
            is_active: active,
        }
    }

    #[tokio::test]
    async fn test_create_poll_with_options() {
        let repo = setup().await;

        let poll = repo
            .create(&input("Will rates rise this quarter?", true))
            .await
            .unwrap();
        assert!(poll.id > 0);
        assert_eq!(poll.options.len(), 3);
        assert_eq!(poll.options[0].position, 0);
        assert_eq!(poll.total_votes(), 0);
    }

    #[tokio::test]
    async fn test_active_poll_lookup() {
        let repo = setup().await;
        repo.create(&input("Inactive", false)).await.unwrap();
        assert!(repo.get_active().await.unwrap().is_none());

        repo.create(&input("Active", true)).await.unwrap();
        let active = repo.get_active().await.unwrap().unwrap();
        assert_eq!(active.question, "Active");
    }

    #[tokio::test]
    async fn test_vote_counting() {
        let repo = setup().await;
        let poll = repo.create(&input("Vote test", true)).await.unwrap();
        let option = &poll.options[1];

        assert!(repo.vote(poll.id, option.id).await.unwrap());
        assert!(repo.vote(poll.id, option.id).await.unwrap());

        let reloaded = repo.get_by_id(poll.id).await.unwrap().unwrap();
        assert_eq!(reloaded.options[1].vote_count, 2);
        assert_eq!(reloaded.total_votes(), 2);
    }

    #[tokio::test]
    async fn test_vote_rejects_foreign_option() {
        let repo = setup().await;
        let first = repo.create(&input("First", true)).await.unwrap();
        let second = repo.create(&input("Second", false)).await.unwrap();

        // Option belongs to the second poll, vote targets the first
        let accepted = repo.vote(first.id, second.options[0].id).await.unwrap();
        assert!(!accepted);
    }

    #[tokio::test]
    async fn test_deactivate_all_and_delete() {
        let repo = setup().await;
        let poll = repo.create(&input("Active", true)).await.unwrap();

        repo.deactivate_all().await.unwrap();
        assert!(repo.get_active().await.unwrap().is_none());

        repo.delete(poll.id).await.unwrap();
        assert!(repo.get_by_id(poll.id).await.unwrap().is_none());
    }
}
