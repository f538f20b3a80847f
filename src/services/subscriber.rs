//! Subscriber service
//!
//! Newsletter subscribe/unsubscribe. Confirmation email delivery is best
//! effort: a subscription succeeds even when SMTP is down or unset.

use anyhow::Context;
use std::sync::Arc;

use crate::db::repositories::SubscriberRepository;
use crate::models::{ListParams, PagedResult, Subscriber};
use crate::services::email::EmailService;

/// Error types for subscriber service operations
#[derive(Debug, thiserror::Error)]
pub enum SubscriberServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Email is already subscribed")]
    AlreadySubscribed,

    #[error("Email is not subscribed")]
    NotSubscribed,

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Newsletter subscriber service
pub struct SubscriberService {
    repo: Arc<dyn SubscriberRepository>,
    email_service: Arc<EmailService>,
}

impl SubscriberService {
    /// Create a new subscriber service
    pub fn new(repo: Arc<dyn SubscriberRepository>, email_service: Arc<EmailService>) -> Self {
        Self {
            repo,
            email_service,
        }
    }

    /// Subscribe an email address and send the confirmation email
    pub async fn subscribe(&self, email: &str) -> Result<Subscriber, SubscriberServiceError> {
        let email = email.trim().to_lowercase();
        if !is_plausible_email(&email) {
            return Err(SubscriberServiceError::ValidationError(
                "Invalid email address".into(),
            ));
        }

        if self
            .repo
            .get_by_email(&email)
            .await
            .context("Subscriber lookup failed")?
            .is_some()
        {
            return Err(SubscriberServiceError::AlreadySubscribed);
        }

        let subscriber = self
            .repo
            .create(&email)
            .await
            .context("Subscription failed")?;

        match self.email_service.send_subscription_confirmation(&email).await {
            Ok(()) => {
                self.repo
                    .confirm(&email)
                    .await
                    .context("Confirmation flag update failed")?;
            }
            Err(e) => {
                tracing::warn!("Confirmation email to {} failed: {}", email, e);
            }
        }

        Ok(subscriber)
    }

    /// Unsubscribe an email address
    pub async fn unsubscribe(&self, email: &str) -> Result<(), SubscriberServiceError> {
        let removed = self
            .repo
            .delete_by_email(&email.trim().to_lowercase())
            .await
            .context("Unsubscribe failed")?;
        if !removed {
            return Err(SubscriberServiceError::NotSubscribed);
        }
        Ok(())
    }

    /// List subscribers with pagination (admin)
    pub async fn list(&self, params: &ListParams) -> anyhow::Result<PagedResult<Subscriber>> {
        let items = self.repo.list(params.offset(), params.limit()).await?;
        let total = self.repo.count().await?;
        Ok(PagedResult::new(items, total, params))
    }

    /// Subscriber count (admin dashboard)
    pub async fn count(&self) -> anyhow::Result<i64> {
        self.repo.count().await
    }
}

/// Minimal shape check; real validation happens when mail bounces
fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxSettingsRepository, SqlxSubscriberRepository};
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SubscriberService {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        // SMTP unconfigured: confirmation emails fail softly in tests
        let email_service = Arc::new(EmailService::new(SqlxSettingsRepository::boxed(pool.clone())));
        SubscriberService::new(SqlxSubscriberRepository::boxed(pool), email_service)
    }

    #[tokio::test]
    async fn test_subscribe_without_smtp_still_succeeds() {
        let service = setup().await;
        let subscriber = service.subscribe("Reader@Example.com").await.unwrap();
        // Normalized to lowercase
        assert_eq!(subscriber.email, "reader@example.com");
    }

    #[tokio::test]
    async fn test_duplicate_subscription_rejected() {
        let service = setup().await;
        service.subscribe("a@example.com").await.unwrap();
        assert!(matches!(
            service.subscribe("a@example.com").await,
            Err(SubscriberServiceError::AlreadySubscribed)
        ));
    }

    #[tokio::test]
    async fn test_invalid_email_rejected() {
        let service = setup().await;
        for bad in ["", "no-at-sign", "a@nodot", "a@.com", "a@com."] {
            assert!(
                matches!(
                    service.subscribe(bad).await,
                    Err(SubscriberServiceError::ValidationError(_))
                ),
                "expected rejection for {:?}",
                bad
            );
        }
    }

    #[tokio::test]
    async fn test_unsubscribe() {
        let service = setup().await;
        service.subscribe("gone@example.com").await.unwrap();

        service.unsubscribe("gone@example.com").await.unwrap();
        assert!(matches!(
            service.unsubscribe("gone@example.com").await,
            Err(SubscriberServiceError::NotSubscribed)
        ));
    }
}
