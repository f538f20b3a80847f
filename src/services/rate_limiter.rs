//! Rate limiter for login attempts
//!
//! Limits failed login attempts per username (5 attempts per 15 minutes)
//! to slow down brute force attacks.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

const MAX_ATTEMPTS: usize = 5;
const WINDOW_MINUTES: i64 = 15;

/// Login rate limiter
pub struct LoginRateLimiter {
    /// Failed login attempts by username
    attempts: Arc<RwLock<HashMap<String, Vec<DateTime<Utc>>>>>,
}

impl LoginRateLimiter {
    /// Create a new rate limiter
    pub fn new() -> Self {
        Self {
            attempts: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Check if a username is currently rate limited
    pub async fn is_limited(&self, username: &str) -> bool {
        let mut attempts = self.attempts.write().await;
        let cutoff = Utc::now() - Duration::minutes(WINDOW_MINUTES);

        let entry = attempts.entry(username.to_lowercase()).or_default();
        entry.retain(|time| *time > cutoff);

        entry.len() >= MAX_ATTEMPTS
    }

    /// Record a failed login attempt
    pub async fn record_failed_attempt(&self, username: &str) {
        let mut attempts = self.attempts.write().await;
        attempts
            .entry(username.to_lowercase())
            .or_default()
            .push(Utc::now());
    }

    /// Clear attempts after a successful login
    pub async fn clear_attempts(&self, username: &str) {
        let mut attempts = self.attempts.write().await;
        attempts.remove(&username.to_lowercase());
    }

    /// Drop stale entries; called periodically from a background task
    pub async fn cleanup(&self) {
        let mut attempts = self.attempts.write().await;
        let cutoff = Utc::now() - Duration::minutes(WINDOW_MINUTES);
        attempts.retain(|_, times| {
            times.retain(|time| *time > cutoff);
            !times.is_empty()
        });
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_limit_after_max_attempts() {
        let limiter = LoginRateLimiter::new();

        assert!(!limiter.is_limited("alice").await);
        for _ in 0..MAX_ATTEMPTS {
            limiter.record_failed_attempt("alice").await;
        }
        assert!(limiter.is_limited("alice").await);
        // Case-insensitive
        assert!(limiter.is_limited("ALICE").await);
        // Other users unaffected
        assert!(!limiter.is_limited("bob").await);
    }

    #[tokio::test]
    async fn test_clear_resets_limit() {
        let limiter = LoginRateLimiter::new();
        for _ in 0..MAX_ATTEMPTS {
            limiter.record_failed_attempt("carol").await;
        }
        limiter.clear_attempts("carol").await;
        assert!(!limiter.is_limited("carol").await);
    }

    #[tokio::test]
    async fn test_cleanup_drops_empty_entries() {
        let limiter = LoginRateLimiter::new();
        limiter.record_failed_attempt("dave").await;
        limiter.cleanup().await;
        // Entry still fresh, remains tracked
        assert!(!limiter.is_limited("dave").await);
    }
}
