//! Forum service
//!
//! Discussion and reply management with moderation rules: locked
//! discussions reject new replies, pinned discussions sort first.

use anyhow::Context;
use std::sync::Arc;

use crate::db::repositories::ForumRepository;
use crate::models::{
    CreateDiscussionInput, CreateReplyInput, Discussion, ListParams, PagedResult, Reply,
    UpdateDiscussionInput,
};
use crate::services::markdown::MarkdownRenderer;

/// Error types for forum service operations
#[derive(Debug, thiserror::Error)]
pub enum ForumServiceError {
    #[error("Discussion not found: {0}")]
    NotFound(String),

    #[error("Discussion is locked")]
    Locked,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Forum service
pub struct ForumService {
    repo: Arc<dyn ForumRepository>,
    markdown_renderer: MarkdownRenderer,
}

impl ForumService {
    /// Create a new forum service
    pub fn new(repo: Arc<dyn ForumRepository>, markdown_renderer: MarkdownRenderer) -> Self {
        Self {
            repo,
            markdown_renderer,
        }
    }

    /// Start a new discussion, rendering its markdown body
    pub async fn create_discussion(
        &self,
        mut input: CreateDiscussionInput,
    ) -> Result<Discussion, ForumServiceError> {
        if input.title.trim().is_empty() {
            return Err(ForumServiceError::ValidationError(
                "Title cannot be empty".into(),
            ));
        }
        if input.body.trim().is_empty() {
            return Err(ForumServiceError::ValidationError(
                "Body cannot be empty".into(),
            ));
        }

        if input.body_html.is_none() {
            input.body_html = Some(self.markdown_renderer.render(&input.body));
        }

        Ok(self
            .repo
            .create_discussion(&input)
            .await
            .context("Discussion creation failed")?)
    }

    /// Get a discussion with its replies
    pub async fn get_discussion(
        &self,
        id: i64,
    ) -> Result<(Discussion, Vec<Reply>), ForumServiceError> {
        let discussion = self
            .repo
            .get_discussion(id)
            .await
            .context("Discussion lookup failed")?
            .ok_or_else(|| ForumServiceError::NotFound(id.to_string()))?;

        let replies = self
            .repo
            .list_replies(id)
            .await
            .context("Reply listing failed")?;

        Ok((discussion, replies))
    }

    /// List discussions with pagination
    pub async fn list(&self, params: &ListParams) -> anyhow::Result<PagedResult<Discussion>> {
        let items = self
            .repo
            .list_discussions(params.offset(), params.limit())
            .await?;
        let total = self.repo.count_discussions().await?;
        Ok(PagedResult::new(items, total, params))
    }

    /// Add a reply; locked discussions reject it
    pub async fn reply(&self, input: CreateReplyInput) -> Result<Reply, ForumServiceError> {
        if input.body.trim().is_empty() {
            return Err(ForumServiceError::ValidationError(
                "Reply cannot be empty".into(),
            ));
        }

        let discussion = self
            .repo
            .get_discussion(input.discussion_id)
            .await
            .context("Discussion lookup failed")?
            .ok_or_else(|| ForumServiceError::NotFound(input.discussion_id.to_string()))?;

        if discussion.is_locked {
            return Err(ForumServiceError::Locked);
        }

        Ok(self
            .repo
            .create_reply(&input)
            .await
            .context("Reply creation failed")?)
    }

    /// Moderate a discussion (lock, pin, edit)
    pub async fn moderate(
        &self,
        id: i64,
        mut input: UpdateDiscussionInput,
    ) -> Result<Discussion, ForumServiceError> {
        if let (Some(body), None) = (&input.body, &input.body_html) {
            input.body_html = Some(self.markdown_renderer.render(body));
        }

        self.repo.update_discussion(id, &input).await.map_err(|e| {
            if e.to_string().contains("not found") {
                ForumServiceError::NotFound(id.to_string())
            } else {
                ForumServiceError::InternalError(e)
            }
        })
    }

    /// Delete a discussion and its replies
    pub async fn delete_discussion(&self, id: i64) -> Result<(), ForumServiceError> {
        self.repo
            .get_discussion(id)
            .await
            .context("Discussion lookup failed")?
            .ok_or_else(|| ForumServiceError::NotFound(id.to_string()))?;
        self.repo
            .delete_discussion(id)
            .await
            .context("Discussion deletion failed")?;
        Ok(())
    }

    /// Delete a single reply
    pub async fn delete_reply(&self, id: i64) -> anyhow::Result<()> {
        self.repo.delete_reply(id).await
    }

    /// Discussion count (admin dashboard)
    pub async fn count(&self) -> anyhow::Result<i64> {
        self.repo.count_discussions().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxForumRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> ForumService {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        sqlx::query(
            "INSERT INTO users (username, email, password_hash, role) VALUES ('m', 'm@x.com', 'h', 'member')",
        )
        .execute(pool.as_sqlite().unwrap())
        .await
        .unwrap();

        ForumService::new(SqlxForumRepository::boxed(pool), MarkdownRenderer::new())
    }

    fn discussion(title: &str) -> CreateDiscussionInput {
        CreateDiscussionInput {
            title: title.to_string(),
            body: "Opening *post* body".to_string(),
            body_html: None,
            author_id: 1,
        }
    }

    #[tokio::test]
    async fn test_create_renders_markdown_body() {
        let service = setup().await;
        let created = service.create_discussion(discussion("Hello")).await.unwrap();
        assert!(created.body_html.contains("<em>post</em>"));
    }

    #[tokio::test]
    async fn test_locked_discussion_rejects_replies() {
        let service = setup().await;
        let created = service.create_discussion(discussion("Lockme")).await.unwrap();

        service
            .moderate(
                created.id,
                UpdateDiscussionInput {
                    is_locked: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let result = service
            .reply(CreateReplyInput {
                discussion_id: created.id,
                body: "too late".into(),
                author_id: 1,
            })
            .await;
        assert!(matches!(result, Err(ForumServiceError::Locked)));
    }

    #[tokio::test]
    async fn test_reply_to_missing_discussion() {
        let service = setup().await;
        let result = service
            .reply(CreateReplyInput {
                discussion_id: 999,
                body: "hello".into(),
                author_id: 1,
            })
            .await;
        assert!(matches!(result, Err(ForumServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_get_discussion_with_replies() {
        let service = setup().await;
        let created = service.create_discussion(discussion("Thread")).await.unwrap();
        service
            .reply(CreateReplyInput {
                discussion_id: created.id,
                body: "first".into(),
                author_id: 1,
            })
            .await
            .unwrap();

        let (discussion, replies) = service.get_discussion(created.id).await.unwrap();
        assert_eq!(discussion.reply_count, 1);
        assert_eq!(replies.len(), 1);
    }
}
