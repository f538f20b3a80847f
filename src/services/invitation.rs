//! Invitation service
//!
//! Issues registration tokens and redeems them during sign-up. Invitation
//! email delivery is best effort; the admin can always copy the token out
//! of the dashboard instead.

use anyhow::Context;
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::repositories::InvitationRepository;
use crate::models::{CreateInvitationInput, Invitation, ListParams, PagedResult};
use crate::services::email::EmailService;

/// Invitation lifetime (7 days)
const INVITATION_TTL_DAYS: i64 = 7;

/// Error types for invitation service operations
#[derive(Debug, thiserror::Error)]
pub enum InvitationServiceError {
    #[error("Invitation not found")]
    NotFound,

    #[error("Invitation has expired or was already used")]
    NotUsable,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// User invitation service
pub struct InvitationService {
    repo: Arc<dyn InvitationRepository>,
    email_service: Arc<EmailService>,
}

impl InvitationService {
    /// Create a new invitation service
    pub fn new(repo: Arc<dyn InvitationRepository>, email_service: Arc<EmailService>) -> Self {
        Self {
            repo,
            email_service,
        }
    }

    /// Issue an invitation and email the token to the invitee
    pub async fn issue(
        &self,
        input: CreateInvitationInput,
    ) -> Result<Invitation, InvitationServiceError> {
        let email = input.email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(InvitationServiceError::ValidationError(
                "Invalid email address".into(),
            ));
        }

        let now = Utc::now();
        let invitation = Invitation {
            id: 0,
            email: email.clone(),
            token: Uuid::new_v4().simple().to_string(),
            role: input.role,
            invited_by: input.invited_by,
            expires_at: now + Duration::days(INVITATION_TTL_DAYS),
            accepted_at: None,
            created_at: now,
        };

        let invitation = self
            .repo
            .create(&invitation)
            .await
            .context("Invitation creation failed")?;

        if let Err(e) = self
            .email_service
            .send_invitation(&email, &invitation.token)
            .await
        {
            tracing::warn!("Invitation email to {} failed: {}", email, e);
        }

        Ok(invitation)
    }

    /// Look up a usable invitation by token.
    ///
    /// Returns `NotUsable` for expired or already-redeemed tokens.
    pub async fn get_usable(&self, token: &str) -> Result<Invitation, InvitationServiceError> {
        let invitation = self
            .repo
            .get_by_token(token)
            .await
            .context("Invitation lookup failed")?
            .ok_or(InvitationServiceError::NotFound)?;

        if !invitation.is_usable() {
            return Err(InvitationServiceError::NotUsable);
        }

        Ok(invitation)
    }

    /// Mark an invitation as redeemed
    pub async fn redeem(&self, id: i64) -> anyhow::Result<()> {
        self.repo.mark_accepted(id).await
    }

    /// List invitations with pagination (admin)
    pub async fn list(&self, params: &ListParams) -> anyhow::Result<PagedResult<Invitation>> {
        let items = self.repo.list(params.offset(), params.limit()).await?;
        let total = self.repo.count().await?;
        Ok(PagedResult::new(items, total, params))
    }

    /// Revoke an invitation
    pub async fn revoke(&self, id: i64) -> anyhow::Result<()> {
        self.repo.delete(id).await
    }

    /// Purge expired invitations; called from a background task
    pub async fn purge_expired(&self) -> anyhow::Result<i64> {
        self.repo.delete_expired().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxInvitationRepository, SqlxSettingsRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::UserRole;

    async fn setup() -> InvitationService {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        sqlx::query(
            "INSERT INTO users (username, email, password_hash, role) VALUES ('admin', 'a@x.com', 'h', 'admin')",
        )
        .execute(pool.as_sqlite().unwrap())
        .await
        .unwrap();

        let email_service = Arc::new(EmailService::new(SqlxSettingsRepository::boxed(pool.clone())));
        InvitationService::new(SqlxInvitationRepository::boxed(pool), email_service)
    }

    #[tokio::test]
    async fn test_issue_and_redeem() {
        let service = setup().await;
        let invitation = service
            .issue(CreateInvitationInput {
                email: "New@Example.com".into(),
                role: UserRole::Editor,
                invited_by: 1,
            })
            .await
            .unwrap();

        assert_eq!(invitation.email, "new@example.com");
        assert_eq!(invitation.token.len(), 32);

        let usable = service.get_usable(&invitation.token).await.unwrap();
        assert_eq!(usable.role, UserRole::Editor);

        service.redeem(usable.id).await.unwrap();
        assert!(matches!(
            service.get_usable(&invitation.token).await,
            Err(InvitationServiceError::NotUsable)
        ));
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let service = setup().await;
        assert!(matches!(
            service.get_usable("does-not-exist").await,
            Err(InvitationServiceError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_invalid_email_rejected() {
        let service = setup().await;
        assert!(matches!(
            service
                .issue(CreateInvitationInput {
                    email: "nope".into(),
                    role: UserRole::Member,
                    invited_by: 1,
                })
                .await,
            Err(InvitationServiceError::ValidationError(_))
        ));
    }
}
