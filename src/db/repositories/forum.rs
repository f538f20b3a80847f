//! Forum repository
//!
//! Database operations for discussions and replies. Reply creation and
//! deletion keep the parent discussion's `reply_count` in sync.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{
    CreateDiscussionInput, CreateReplyInput, Discussion, Reply, UpdateDiscussionInput,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Forum repository trait
#[async_trait]
pub trait ForumRepository: Send + Sync {
    /// Create a new discussion
    async fn create_discussion(&self, input: &CreateDiscussionInput) -> Result<Discussion>;

    /// Get discussion by ID
    async fn get_discussion(&self, id: i64) -> Result<Option<Discussion>>;

    /// List discussions, pinned first, newest first
    async fn list_discussions(&self, offset: i64, limit: i64) -> Result<Vec<Discussion>>;

    /// Count discussions
    async fn count_discussions(&self) -> Result<i64>;

    /// Update/moderate a discussion
    async fn update_discussion(&self, id: i64, input: &UpdateDiscussionInput) -> Result<Discussion>;

    /// Delete a discussion (replies cascade)
    async fn delete_discussion(&self, id: i64) -> Result<()>;

    /// Create a reply and bump the discussion's reply count
    async fn create_reply(&self, input: &CreateReplyInput) -> Result<Reply>;

    /// List replies for a discussion, oldest first
    async fn list_replies(&self, discussion_id: i64) -> Result<Vec<Reply>>;

    /// Delete a reply and decrement the discussion's reply count
    async fn delete_reply(&self, id: i64) -> Result<()>;
}

/// SQLx-based forum repository implementation
pub struct SqlxForumRepository {
    pool: DynDatabasePool,
}

impl SqlxForumRepository {
    /// Create a new SQLx forum repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ForumRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ForumRepository for SqlxForumRepository {
    async fn create_discussion(&self, input: &CreateDiscussionInput) -> Result<Discussion> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_discussion_sqlite(self.pool.as_sqlite().unwrap(), input).await
            }
            DatabaseDriver::Mysql => {
                create_discussion_mysql(self.pool.as_mysql().unwrap(), input).await
            }
        }
    }

    async fn get_discussion(&self, id: i64) -> Result<Option<Discussion>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_discussion_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => get_discussion_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn list_discussions(&self, offset: i64, limit: i64) -> Result<Vec<Discussion>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_discussions_sqlite(self.pool.as_sqlite().unwrap(), offset, limit).await
            }
            DatabaseDriver::Mysql => {
                list_discussions_mysql(self.pool.as_mysql().unwrap(), offset, limit).await
            }
        }
    }

    async fn count_discussions(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                count_discussions_sqlite(self.pool.as_sqlite().unwrap()).await
            }
            DatabaseDriver::Mysql => count_discussions_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn update_discussion(&self, id: i64, input: &UpdateDiscussionInput) -> Result<Discussion> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_discussion_sqlite(self.pool.as_sqlite().unwrap(), id, input).await
            }
            DatabaseDriver::Mysql => {
                update_discussion_mysql(self.pool.as_mysql().unwrap(), id, input).await
            }
        }
    }

    async fn delete_discussion(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                delete_discussion_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => {
                delete_discussion_mysql(self.pool.as_mysql().unwrap(), id).await
            }
        }
    }

    async fn create_reply(&self, input: &CreateReplyInput) -> Result<Reply> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_reply_sqlite(self.pool.as_sqlite().unwrap(), input).await
            }
            DatabaseDriver::Mysql => create_reply_mysql(self.pool.as_mysql().unwrap(), input).await,
        }
    }

    async fn list_replies(&self, discussion_id: i64) -> Result<Vec<Reply>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_replies_sqlite(self.pool.as_sqlite().unwrap(), discussion_id).await
            }
            DatabaseDriver::Mysql => {
                list_replies_mysql(self.pool.as_mysql().unwrap(), discussion_id).await
            }
        }
    }

    async fn delete_reply(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_reply_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => delete_reply_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }
}

const DISCUSSION_COLUMNS: &str = "id, title, body, body_html, author_id, is_locked, is_pinned, \
     reply_count, created_at, updated_at";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_discussion_sqlite(
    pool: &SqlitePool,
    input: &CreateDiscussionInput,
) -> Result<Discussion> {
    let now = Utc::now();
    let body_html = input.body_html.clone().unwrap_or_default();
    let result = sqlx::query(
        r#"
        INSERT INTO forum_discussions (title, body, body_html, author_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.title)
    .bind(&input.body)
    .bind(&body_html)
    .bind(input.author_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create discussion")?;

    Ok(Discussion {
        id: result.last_insert_rowid(),
        title: input.title.clone(),
        body: input.body.clone(),
        body_html,
        author_id: input.author_id,
        is_locked: false,
        is_pinned: false,
        reply_count: 0,
        created_at: now,
        updated_at: now,
    })
}

async fn get_discussion_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Discussion>> {
    let query = format!(
        "SELECT {} FROM forum_discussions WHERE id = ?",
        DISCUSSION_COLUMNS
    );
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get discussion")?;
    Ok(row.map(|row| row_to_discussion_sqlite(&row)))
}

async fn list_discussions_sqlite(
    pool: &SqlitePool,
    offset: i64,
    limit: i64,
) -> Result<Vec<Discussion>> {
    let query = format!(
        "SELECT {} FROM forum_discussions ORDER BY is_pinned DESC, created_at DESC LIMIT ? OFFSET ?",
        DISCUSSION_COLUMNS
    );
    let rows = sqlx::query(&query)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list discussions")?;
    Ok(rows.iter().map(row_to_discussion_sqlite).collect())
}

async fn count_discussions_sqlite(pool: &SqlitePool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM forum_discussions")
        .fetch_one(pool)
        .await
        .context("Failed to count discussions")?;
    Ok(row.get("count"))
}

async fn update_discussion_sqlite(
    pool: &SqlitePool,
    id: i64,
    input: &UpdateDiscussionInput,
) -> Result<Discussion> {
    let existing = get_discussion_sqlite(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Discussion not found"))?;

    let now = Utc::now();
    let new_title = input.title.as_ref().unwrap_or(&existing.title);
    let new_body = input.body.as_ref().unwrap_or(&existing.body);
    let new_body_html = input.body_html.as_ref().unwrap_or(&existing.body_html);
    let new_locked = input.is_locked.unwrap_or(existing.is_locked);
    let new_pinned = input.is_pinned.unwrap_or(existing.is_pinned);

    sqlx::query(
        r#"
        UPDATE forum_discussions
        SET title = ?, body = ?, body_html = ?, is_locked = ?, is_pinned = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(new_title)
    .bind(new_body)
    .bind(new_body_html)
    .bind(new_locked)
    .bind(new_pinned)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update discussion")?;

    get_discussion_sqlite(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Discussion not found after update"))
}

async fn delete_discussion_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM forum_discussions WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete discussion")?;
    Ok(())
}

async fn create_reply_sqlite(pool: &SqlitePool, input: &CreateReplyInput) -> Result<Reply> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO forum_replies (discussion_id, body, author_id, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(input.discussion_id)
    .bind(&input.body)
    .bind(input.author_id)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create reply")?;

    sqlx::query("UPDATE forum_discussions SET reply_count = reply_count + 1, updated_at = ? WHERE id = ?")
        .bind(now)
        .bind(input.discussion_id)
        .execute(pool)
        .await
        .context("Failed to bump reply count")?;

    Ok(Reply {
        id: result.last_insert_rowid(),
        discussion_id: input.discussion_id,
        body: input.body.clone(),
        author_id: input.author_id,
        created_at: now,
    })
}

async fn list_replies_sqlite(pool: &SqlitePool, discussion_id: i64) -> Result<Vec<Reply>> {
    let rows = sqlx::query(
        "SELECT id, discussion_id, body, author_id, created_at FROM forum_replies WHERE discussion_id = ? ORDER BY created_at ASC",
    )
    .bind(discussion_id)
    .fetch_all(pool)
    .await
    .context("Failed to list replies")?;

    Ok(rows
        .iter()
        .map(|row| Reply {
            id: row.get("id"),
            discussion_id: row.get("discussion_id"),
            body: row.get("body"),
            author_id: row.get("author_id"),
            created_at: row.get("created_at"),
        })
        .collect())
}

async fn delete_reply_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    let row = sqlx::query("SELECT discussion_id FROM forum_replies WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to look up reply")?;

    if let Some(row) = row {
        let discussion_id: i64 = row.get("discussion_id");
        sqlx::query("DELETE FROM forum_replies WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .context("Failed to delete reply")?;
        sqlx::query(
            "UPDATE forum_discussions SET reply_count = MAX(reply_count - 1, 0) WHERE id = ?",
        )
        .bind(discussion_id)
        .execute(pool)
        .await
        .context("Failed to decrement reply count")?;
    }

    Ok(())
}

fn row_to_discussion_sqlite(row: &sqlx::sqlite::SqliteRow) -> Discussion {
    Discussion {
        id: row.get("id"),
        title: row.get("title"),
        body: row.get("body"),
        body_html: row.get("body_html"),
        author_id: row.get("author_id"),
        is_locked: row.get("is_locked"),
        is_pinned: row.get("is_pinned"),
        reply_count: row.get("reply_count"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_discussion_mysql(
    pool: &MySqlPool,
    input: &CreateDiscussionInput,
) -> Result<Discussion> {
    let now = Utc::now();
    let body_html = input.body_html.clone().unwrap_or_default();
    let result = sqlx::query(
        r#"
        INSERT INTO forum_discussions (title, body, body_html, author_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.title)
    .bind(&input.body)
    .bind(&body_html)
    .bind(input.author_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create discussion")?;

    Ok(Discussion {
        id: result.last_insert_id() as i64,
        title: input.title.clone(),
        body: input.body.clone(),
        body_html,
        author_id: input.author_id,
        is_locked: false,
        is_pinned: false,
        reply_count: 0,
        created_at: now,
        updated_at: now,
    })
}

async fn get_discussion_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Discussion>> {
    let query = format!(
        "SELECT {} FROM forum_discussions WHERE id = ?",
        DISCUSSION_COLUMNS
    );
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get discussion")?;
    Ok(row.map(|row| row_to_discussion_mysql(&row)))
}

async fn list_discussions_mysql(
    pool: &MySqlPool,
    offset: i64,
    limit: i64,
) -> Result<Vec<Discussion>> {
    let query = format!(
        "SELECT {} FROM forum_discussions ORDER BY is_pinned DESC, created_at DESC LIMIT ? OFFSET ?",
        DISCUSSION_COLUMNS
    );
    let rows = sqlx::query(&query)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list discussions")?;
    Ok(rows.iter().map(row_to_discussion_mysql).collect())
}

async fn count_discussions_mysql(pool: &MySqlPool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM forum_discussions")
        .fetch_one(pool)
        .await
        .context("Failed to count discussions")?;
    Ok(row.get("count"))
}

async fn update_discussion_mysql(
    pool: &MySqlPool,
    id: i64,
    input: &UpdateDiscussionInput,
) -> Result<Discussion> {
    let existing = get_discussion_mysql(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Discussion not found"))?;

    let now = Utc::now();
    let new_title = input.title.as_ref().unwrap_or(&existing.title);
    let new_body = input.body.as_ref().unwrap_or(&existing.body);
    let new_body_html = input.body_html.as_ref().unwrap_or(&existing.body_html);
    let new_locked = input.is_locked.unwrap_or(existing.is_locked);
    let new_pinned = input.is_pinned.unwrap_or(existing.is_pinned);

    sqlx::query(
        r#"
        UPDATE forum_discussions
        SET title = ?, body = ?, body_html = ?, is_locked = ?, is_pinned = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(new_title)
    .bind(new_body)
    .bind(new_body_html)
    .bind(new_locked)
    .bind(new_pinned)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update discussion")?;

    get_discussion_mysql(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Discussion not found after update"))
}

async fn delete_discussion_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM forum_discussions WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete discussion")?;
    Ok(())
}

async fn create_reply_mysql(pool: &MySqlPool, input: &CreateReplyInput) -> Result<Reply> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO forum_replies (discussion_id, body, author_id, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(input.discussion_id)
    .bind(&input.body)
    .bind(input.author_id)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create reply")?;

    sqlx::query("UPDATE forum_discussions SET reply_count = reply_count + 1, updated_at = ? WHERE id = ?")
        .bind(now)
        .bind(input.discussion_id)
        .execute(pool)
        .await
        .context("Failed to bump reply count")?;

    Ok(Reply {
        id: result.last_insert_id() as i64,
        discussion_id: input.discussion_id,
        body: input.body.clone(),
        author_id: input.author_id,
        created_at: now,
    })
}

async fn list_replies_mysql(pool: &MySqlPool, discussion_id: i64) -> Result<Vec<Reply>> {
    let rows = sqlx::query(
        "SELECT id, discussion_id, body, author_id, created_at FROM forum_replies WHERE discussion_id = ? ORDER BY created_at ASC",
    )
    .bind(discussion_id)
    .fetch_all(pool)
    .await
    .context("Failed to list replies")?;

    Ok(rows
        .iter()
        .map(|row| Reply {
            id: row.get("id"),
            discussion_id: row.get("discussion_id"),
            body: row.get("body"),
            author_id: row.get("author_id"),
            created_at: row.get("created_at"),
        })
        .collect())
}

async fn delete_reply_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    let row = sqlx::query("SELECT discussion_id FROM forum_replies WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to look up reply")?;

    if let Some(row) = row {
        let discussion_id: i64 = row.get("discussion_id");
        sqlx::query("DELETE FROM forum_replies WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .context("Failed to delete reply")?;
        sqlx::query(
            "UPDATE forum_discussions SET reply_count = GREATEST(reply_count - 1, 0) WHERE id = ?",
        )
        .bind(discussion_id)
        .execute(pool)
        .await
        .context("Failed to decrement reply count")?;
    }

    Ok(())
}

fn row_to_discussion_mysql(row: &sqlx::mysql::MySqlRow) -> Discussion {
    Discussion {
        id: row.get("id"),
        title: row.get("title"),
        body: row.get("body"),
        body_html: row.get("body_html"),
        author_id: row.get("author_id"),
        is_locked: row.get("is_locked"),
        is_pinned: row.get("is_pinned"),
        reply_count: row.get("reply_count"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> (DynDatabasePool, SqlxForumRepository, i64) {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let result = sqlx::query(
            "INSERT INTO users (username, email, password_hash, role) VALUES ('m', 'm@x.com', 'h', 'member')",
        )
        .execute(pool.as_sqlite().unwrap())
        .await
        .unwrap();

        let repo = SqlxForumRepository::new(pool.clone());
        (pool, repo, result.last_insert_rowid())
    }

    fn discussion_input(title: &str, author_id: i64) -> CreateDiscussionInput {
        CreateDiscussionInput {
            title: title.to_string(),
            body: "What does everyone think?".to_string(),
            body_html: Some("<p>What does everyone think?</p>".to_string()),
            author_id,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_discussion() {
        let (_pool, repo, author_id) = setup().await;

        let created = repo
            .create_discussion(&discussion_input("IFRS 17 impact", author_id))
            .await
            .unwrap();
        assert!(created.id > 0);
        assert!(!created.is_locked);
        assert_eq!(created.reply_count, 0);

        let found = repo.get_discussion(created.id).await.unwrap().unwrap();
        assert_eq!(found.title, "IFRS 17 impact");
    }

    #[tokio::test]
    async fn test_reply_count_tracking() {
        let (_pool, repo, author_id) = setup().await;
        let discussion = repo
            .create_discussion(&discussion_input("Replies", author_id))
            .await
            .unwrap();

        let reply = repo
            .create_reply(&CreateReplyInput {
                discussion_id: discussion.id,
                body: "First!".to_string(),
                author_id,
            })
            .await
            .unwrap();
        repo.create_reply(&CreateReplyInput {
            discussion_id: discussion.id,
            body: "Second".to_string(),
            author_id,
        })
        .await
        .unwrap();

        let reloaded = repo.get_discussion(discussion.id).await.unwrap().unwrap();
        assert_eq!(reloaded.reply_count, 2);
        assert_eq!(repo.list_replies(discussion.id).await.unwrap().len(), 2);

        repo.delete_reply(reply.id).await.unwrap();
        let reloaded = repo.get_discussion(discussion.id).await.unwrap().unwrap();
        assert_eq!(reloaded.reply_count, 1);
    }

    #[tokio::test]
    async fn test_pinned_discussions_sort_first() {
        let (_pool, repo, author_id) = setup().await;
        let first = repo
            .create_discussion(&discussion_input("Older", author_id))
            .await
            .unwrap();
        repo.create_discussion(&discussion_input("Newer", author_id))
            .await
            .unwrap();

        repo.update_discussion(
            first.id,
            &UpdateDiscussionInput {
                is_pinned: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let listed = repo.list_discussions(0, 10).await.unwrap();
        assert_eq!(listed[0].title, "Older");
    }

    #[tokio::test]
    async fn test_delete_discussion_cascades_replies() {
        let (pool, repo, author_id) = setup().await;
        let discussion = repo
            .create_discussion(&discussion_input("Doomed", author_id))
            .await
            .unwrap();
        repo.create_reply(&CreateReplyInput {
            discussion_id: discussion.id,
            body: "gone soon".to_string(),
            author_id,
        })
        .await
        .unwrap();

        repo.delete_discussion(discussion.id).await.unwrap();

        let row = sqlx::query("SELECT COUNT(*) as count FROM forum_replies")
            .fetch_one(pool.as_sqlite().unwrap())
            .await
            .unwrap();
        let count: i64 = row.get("count");
        assert_eq!(count, 0);
    }
}
