//! Menu service

use anyhow::Context;
use std::sync::Arc;

use crate::db::repositories::MenuRepository;
use crate::models::MenuSetting;

/// Error types for menu service operations
#[derive(Debug, thiserror::Error)]
pub enum MenuServiceError {
    #[error("Menu entry not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Navigation menu service
pub struct MenuService {
    repo: Arc<dyn MenuRepository>,
}

impl MenuService {
    /// Create a new menu service
    pub fn new(repo: Arc<dyn MenuRepository>) -> Self {
        Self { repo }
    }

    /// All menu entries (admin)
    pub async fn list(&self) -> anyhow::Result<Vec<MenuSetting>> {
        self.repo.list().await
    }

    /// Visible menu entries (public SPA)
    pub async fn list_visible(&self) -> anyhow::Result<Vec<MenuSetting>> {
        self.repo.list_visible().await
    }

    /// Toggle visibility / reorder a menu entry
    pub async fn update(
        &self,
        key: &str,
        is_visible: bool,
        sort_order: i32,
    ) -> Result<MenuSetting, MenuServiceError> {
        self.repo
            .get_by_key(key)
            .await
            .context("Menu lookup failed")?
            .ok_or_else(|| MenuServiceError::NotFound(key.to_string()))?;

        self.repo
            .update(key, is_visible, sort_order)
            .await
            .context("Menu update failed")?;

        self.repo
            .get_by_key(key)
            .await
            .context("Menu reload failed")?
            .ok_or_else(|| MenuServiceError::NotFound(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxMenuRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> MenuService {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        MenuService::new(SqlxMenuRepository::boxed(pool))
    }

    #[tokio::test]
    async fn test_update_visibility() {
        let service = setup().await;
        let updated = service.update("podcasts", false, 1).await.unwrap();
        assert!(!updated.is_visible);

        let visible = service.list_visible().await.unwrap();
        assert!(visible.iter().all(|m| m.key != "podcasts"));
    }

    #[tokio::test]
    async fn test_unknown_key() {
        let service = setup().await;
        assert!(matches!(
            service.update("nonsense", true, 0).await,
            Err(MenuServiceError::NotFound(_))
        ));
    }
}
