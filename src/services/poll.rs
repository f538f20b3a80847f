//! Poll service
//!
//! Poll lifecycle and vote recording. Activating a poll deactivates every
//! other poll so the public site shows at most one.

use anyhow::Context;
use std::sync::Arc;

use crate::db::repositories::PollRepository;
use crate::models::{CreatePollInput, ListParams, PagedResult, Poll, UpdatePollInput};

/// Error types for poll service operations
#[derive(Debug, thiserror::Error)]
pub enum PollServiceError {
    #[error("Poll not found: {0}")]
    NotFound(String),

    #[error("Poll option not found")]
    OptionNotFound,

    #[error("Poll is not accepting votes")]
    Inactive,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Poll service
pub struct PollService {
    repo: Arc<dyn PollRepository>,
}

impl PollService {
    /// Create a new poll service
    pub fn new(repo: Arc<dyn PollRepository>) -> Self {
        Self { repo }
    }

    /// Create a poll; activating it retires the current active poll
    pub async fn create(&self, input: CreatePollInput) -> Result<Poll, PollServiceError> {
        if input.question.trim().is_empty() {
            return Err(PollServiceError::ValidationError(
                "Question cannot be empty".into(),
            ));
        }
        if input.options.len() < 2 {
            return Err(PollServiceError::ValidationError(
                "A poll needs at least two options".into(),
            ));
        }
        if input.options.iter().any(|o| o.trim().is_empty()) {
            return Err(PollServiceError::ValidationError(
                "Options cannot be empty".into(),
            ));
        }

        if input.is_active {
            self.repo
                .deactivate_all()
                .await
                .context("Poll deactivation failed")?;
        }

        Ok(self.repo.create(&input).await.context("Poll creation failed")?)
    }

    /// Get the active poll for the public site
    pub async fn get_active(&self) -> anyhow::Result<Option<Poll>> {
        self.repo.get_active().await
    }

    /// Get a poll by ID
    pub async fn get_by_id(&self, id: i64) -> anyhow::Result<Option<Poll>> {
        self.repo.get_by_id(id).await
    }

    /// List polls with pagination
    pub async fn list(&self, params: &ListParams) -> anyhow::Result<PagedResult<Poll>> {
        let items = self.repo.list(params.offset(), params.limit()).await?;
        let total = self.repo.count().await?;
        Ok(PagedResult::new(items, total, params))
    }

    /// Update a poll; activation retires other active polls first
    pub async fn update(&self, id: i64, input: UpdatePollInput) -> Result<Poll, PollServiceError> {
        if input.is_active == Some(true) {
            self.repo
                .deactivate_all()
                .await
                .context("Poll deactivation failed")?;
        }

        self.repo.update(id, &input).await.map_err(|e| {
            if e.to_string().contains("not found") {
                PollServiceError::NotFound(id.to_string())
            } else {
                PollServiceError::InternalError(e)
            }
        })
    }

    /// Delete a poll
    pub async fn delete(&self, id: i64) -> Result<(), PollServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Poll lookup failed")?
            .ok_or_else(|| PollServiceError::NotFound(id.to_string()))?;
        self.repo.delete(id).await.context("Poll deletion failed")?;
        Ok(())
    }

    /// Record a vote on an active poll, returning the updated poll
    pub async fn vote(&self, poll_id: i64, option_id: i64) -> Result<Poll, PollServiceError> {
        let poll = self
            .repo
            .get_by_id(poll_id)
            .await
            .context("Poll lookup failed")?
            .ok_or_else(|| PollServiceError::NotFound(poll_id.to_string()))?;

        if !poll.is_active {
            return Err(PollServiceError::Inactive);
        }

        let accepted = self
            .repo
            .vote(poll_id, option_id)
            .await
            .context("Vote recording failed")?;
        if !accepted {
            return Err(PollServiceError::OptionNotFound);
        }

        self.repo
            .get_by_id(poll_id)
            .await
            .context("Poll reload failed")?
            .ok_or_else(|| PollServiceError::NotFound(poll_id.to_string()))
    }

    /// Poll count (admin dashboard)
    pub async fn count(&self) -> anyhow::Result<i64> {
        self.repo.count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxPollRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> PollService {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        PollService::new(SqlxPollRepository::boxed(pool))
    }

    fn input(question: &str, active: bool) -> CreatePollInput {
        CreatePollInput {
            question: question.to_string(),
            options: vec!["Yes".into(), "No".into()],
            is_active: active,
        }
    }

    #[tokio::test]
    async fn test_single_active_poll() {
        let service = setup().await;
        let first = service.create(input("First?", true)).await.unwrap();
        let second = service.create(input("Second?", true)).await.unwrap();

        let active = service.get_active().await.unwrap().unwrap();
        assert_eq!(active.id, second.id);

        let first_reloaded = service.get_by_id(first.id).await.unwrap().unwrap();
        assert!(!first_reloaded.is_active);
    }

    #[tokio::test]
    async fn test_needs_two_options() {
        let service = setup().await;
        let bad = CreatePollInput {
            question: "Only one?".into(),
            options: vec!["Yes".into()],
            is_active: false,
        };
        assert!(matches!(
            service.create(bad).await,
            Err(PollServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_vote_on_inactive_poll_rejected() {
        let service = setup().await;
        let poll = service.create(input("Inactive?", false)).await.unwrap();

        let result = service.vote(poll.id, poll.options[0].id).await;
        assert!(matches!(result, Err(PollServiceError::Inactive)));
    }

    #[tokio::test]
    async fn test_vote_updates_counts() {
        let service = setup().await;
        let poll = service.create(input("Voting?", true)).await.unwrap();

        let updated = service.vote(poll.id, poll.options[1].id).await.unwrap();
        assert_eq!(updated.options[1].vote_count, 1);
        assert_eq!(updated.total_votes(), 1);
    }

    #[tokio::test]
    async fn test_vote_with_wrong_option() {
        let service = setup().await;
        let poll = service.create(input("Wrong?", true)).await.unwrap();

        let result = service.vote(poll.id, 9999).await;
        assert!(matches!(result, Err(PollServiceError::OptionNotFound)));
    }
}
