//! Settings service
//!
//! Small wrapper over the settings repository with typed helpers for the
//! values the renderer and the SPA shell need.

use anyhow::Result;
use std::sync::Arc;

use crate::db::repositories::SettingsRepository;
use crate::models::settings::keys;
use crate::models::Setting;

/// Site settings service
pub struct SettingsService {
    repo: Arc<dyn SettingsRepository>,
}

impl SettingsService {
    pub fn new(repo: Arc<dyn SettingsRepository>) -> Self {
        Self { repo }
    }

    /// Get a raw setting value
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.repo.get(key).await?.map(|s| s.value))
    }

    /// Set a raw setting value
    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.repo.set(key, value).await
    }

    /// List all settings
    pub async fn list(&self) -> Result<Vec<Setting>> {
        self.repo.list().await
    }

    /// Site name with fallback
    pub async fn site_name(&self) -> String {
        self.get(keys::SITE_NAME)
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| "The Digital Ledger".to_string())
    }

    /// Site description with fallback
    pub async fn site_description(&self) -> String {
        self.get(keys::SITE_DESCRIPTION)
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| {
                "News, podcasts and discussion for the finance and accounting community"
                    .to_string()
            })
    }

    /// Absolute base URL of the public site, without a trailing slash
    pub async fn base_url(&self) -> String {
        let url = self
            .get(keys::SITE_BASE_URL)
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| "http://localhost:8080".to_string());
        url.trim_end_matches('/').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxSettingsRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SettingsService {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SettingsService::new(SqlxSettingsRepository::boxed(pool))
    }

    #[tokio::test]
    async fn test_fallbacks() {
        let service = setup().await;
        assert_eq!(service.site_name().await, "The Digital Ledger");
        assert_eq!(service.base_url().await, "http://localhost:8080");
    }

    #[tokio::test]
    async fn test_base_url_trailing_slash_stripped() {
        let service = setup().await;
        service
            .set(keys::SITE_BASE_URL, "https://ledger.example.com/")
            .await
            .unwrap();
        assert_eq!(service.base_url().await, "https://ledger.example.com");
    }
}
