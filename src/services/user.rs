//! User service
//!
//! Account management and session-token authentication.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{Session, User, UserRole, UserStatus};
use crate::services::password;

/// Session lifetime (7 days)
const SESSION_TTL_DAYS: i64 = 7;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Username or email already taken")]
    Duplicate,

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// User service for account and session management
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
}

impl UserService {
    /// Create a new user service
    pub fn new(user_repo: Arc<dyn UserRepository>, session_repo: Arc<dyn SessionRepository>) -> Self {
        Self {
            user_repo,
            session_repo,
        }
    }

    /// Create a new user account with a freshly hashed password.
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        plain_password: &str,
        role: UserRole,
    ) -> Result<User, UserServiceError> {
        let username = username.trim();
        let email = email.trim();

        if username.is_empty() || username.len() > 50 {
            return Err(UserServiceError::ValidationError(
                "Username must be between 1 and 50 characters".into(),
            ));
        }
        if !email.contains('@') {
            return Err(UserServiceError::ValidationError(
                "Invalid email address".into(),
            ));
        }
        if plain_password.len() < 8 {
            return Err(UserServiceError::ValidationError(
                "Password must be at least 8 characters".into(),
            ));
        }

        if self
            .user_repo
            .get_by_username(username)
            .await
            .context("Username lookup failed")?
            .is_some()
        {
            return Err(UserServiceError::Duplicate);
        }
        if self
            .user_repo
            .get_by_email(email)
            .await
            .context("Email lookup failed")?
            .is_some()
        {
            return Err(UserServiceError::Duplicate);
        }

        let hash = password::hash_password(plain_password).context("Password hashing failed")?;
        let user = User::new(username.to_string(), email.to_string(), hash, role);

        Ok(self
            .user_repo
            .create(&user)
            .await
            .context("User creation failed")?)
    }

    /// Verify credentials and open a session.
    ///
    /// Returns the user and the session token.
    pub async fn login(
        &self,
        username: &str,
        plain_password: &str,
    ) -> Result<(User, Session), UserServiceError> {
        let user = self
            .user_repo
            .get_by_username(username.trim())
            .await
            .context("User lookup failed")?
            .ok_or(UserServiceError::InvalidCredentials)?;

        if !password::verify_password(plain_password, &user.password_hash)
            .context("Password verification failed")?
        {
            return Err(UserServiceError::InvalidCredentials);
        }

        if !user.is_active() {
            return Err(UserServiceError::AccountDisabled);
        }

        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().simple().to_string(),
            user_id: user.id,
            expires_at: now + Duration::days(SESSION_TTL_DAYS),
            created_at: now,
        };

        let session = self
            .session_repo
            .create(&session)
            .await
            .context("Session creation failed")?;

        Ok((user, session))
    }

    /// Resolve a session token into its user.
    ///
    /// Expired sessions are deleted lazily here. Returns `None` for
    /// unknown, expired or disabled-account sessions.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>> {
        let session = match self.session_repo.get_by_id(token).await? {
            Some(session) => session,
            None => return Ok(None),
        };

        if session.is_expired() {
            self.session_repo.delete(token).await?;
            return Ok(None);
        }

        let user = self.user_repo.get_by_id(session.user_id).await?;
        Ok(user.filter(|u| u.is_active()))
    }

    /// Terminate a session
    pub async fn logout(&self, token: &str) -> Result<()> {
        self.session_repo.delete(token).await
    }

    /// Get a user by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        self.user_repo.get_by_id(id).await
    }

    /// List users with pagination
    pub async fn list(&self, offset: i64, limit: i64) -> Result<Vec<User>> {
        self.user_repo.list(offset, limit).await
    }

    /// Count users
    pub async fn count(&self) -> Result<i64> {
        self.user_repo.count().await
    }

    /// Change a user's role
    pub async fn set_role(&self, id: i64, role: UserRole) -> Result<(), UserServiceError> {
        self.ensure_exists(id).await?;
        self.user_repo
            .update_role(id, role)
            .await
            .context("Role update failed")?;
        Ok(())
    }

    /// Change a user's status; disabling also revokes all sessions
    pub async fn set_status(&self, id: i64, status: UserStatus) -> Result<(), UserServiceError> {
        self.ensure_exists(id).await?;
        self.user_repo
            .update_status(id, status)
            .await
            .context("Status update failed")?;
        if status == UserStatus::Disabled {
            self.session_repo
                .delete_by_user(id)
                .await
                .context("Session revocation failed")?;
        }
        Ok(())
    }

    /// Delete a user account and its sessions
    pub async fn delete(&self, id: i64) -> Result<(), UserServiceError> {
        self.ensure_exists(id).await?;
        self.session_repo
            .delete_by_user(id)
            .await
            .context("Session revocation failed")?;
        self.user_repo
            .delete(id)
            .await
            .context("User deletion failed")?;
        Ok(())
    }

    /// Purge expired sessions; called from a background task
    pub async fn purge_expired_sessions(&self) -> Result<i64> {
        self.session_repo.delete_expired().await
    }

    async fn ensure_exists(&self, id: i64) -> Result<(), UserServiceError> {
        self.user_repo
            .get_by_id(id)
            .await
            .context("User lookup failed")?
            .ok_or_else(|| UserServiceError::NotFound(id.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxSessionRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> UserService {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        UserService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool),
        )
    }

    #[tokio::test]
    async fn test_create_and_login() {
        let service = setup().await;

        let user = service
            .create_user("alice", "alice@example.com", "hunter2hunter2", UserRole::Admin)
            .await
            .unwrap();
        assert!(user.id > 0);

        let (logged_in, session) = service.login("alice", "hunter2hunter2").await.unwrap();
        assert_eq!(logged_in.id, user.id);
        assert!(!session.id.is_empty());

        let resolved = service.validate_session(&session.id).await.unwrap();
        assert_eq!(resolved.unwrap().username, "alice");
    }

    #[tokio::test]
    async fn test_login_rejects_bad_password() {
        let service = setup().await;
        service
            .create_user("bob", "bob@example.com", "correcthorse", UserRole::Member)
            .await
            .unwrap();

        let result = service.login("bob", "wrong-password").await;
        assert!(matches!(result, Err(UserServiceError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_disabled_account_cannot_login_or_keep_sessions() {
        let service = setup().await;
        let user = service
            .create_user("carol", "carol@example.com", "password123", UserRole::Member)
            .await
            .unwrap();
        let (_, session) = service.login("carol", "password123").await.unwrap();

        service
            .set_status(user.id, UserStatus::Disabled)
            .await
            .unwrap();

        assert!(service.validate_session(&session.id).await.unwrap().is_none());
        assert!(matches!(
            service.login("carol", "password123").await,
            Err(UserServiceError::AccountDisabled)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let service = setup().await;
        service
            .create_user("dave", "dave@example.com", "password123", UserRole::Member)
            .await
            .unwrap();

        let result = service
            .create_user("dave", "other@example.com", "password123", UserRole::Member)
            .await;
        assert!(matches!(result, Err(UserServiceError::Duplicate)));
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let service = setup().await;

        assert!(matches!(
            service
                .create_user("", "a@b.com", "password123", UserRole::Member)
                .await,
            Err(UserServiceError::ValidationError(_))
        ));
        assert!(matches!(
            service
                .create_user("x", "not-an-email", "password123", UserRole::Member)
                .await,
            Err(UserServiceError::ValidationError(_))
        ));
        assert!(matches!(
            service
                .create_user("x", "a@b.com", "short", UserRole::Member)
                .await,
            Err(UserServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_logout_invalidates_session() {
        let service = setup().await;
        service
            .create_user("erin", "erin@example.com", "password123", UserRole::Member)
            .await
            .unwrap();
        let (_, session) = service.login("erin", "password123").await.unwrap();

        service.logout(&session.id).await.unwrap();
        assert!(service.validate_session(&session.id).await.unwrap().is_none());
    }
}
