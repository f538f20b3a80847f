//! Resource service

use anyhow::Context;
use std::sync::Arc;

use crate::db::repositories::ResourceRepository;
use crate::models::{CreateResourceInput, ListParams, PagedResult, Resource, UpdateResourceInput};

/// Error types for resource service operations
#[derive(Debug, thiserror::Error)]
pub enum ResourceServiceError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Resource library service
pub struct ResourceService {
    repo: Arc<dyn ResourceRepository>,
}

impl ResourceService {
    /// Create a new resource service
    pub fn new(repo: Arc<dyn ResourceRepository>) -> Self {
        Self { repo }
    }

    /// Create a resource
    pub async fn create(&self, input: CreateResourceInput) -> Result<Resource, ResourceServiceError> {
        if input.title.trim().is_empty() {
            return Err(ResourceServiceError::ValidationError(
                "Title cannot be empty".into(),
            ));
        }
        if !input.url.starts_with("http://") && !input.url.starts_with("https://") {
            return Err(ResourceServiceError::ValidationError(
                "URL must be absolute".into(),
            ));
        }

        Ok(self
            .repo
            .create(&input)
            .await
            .context("Resource creation failed")?)
    }

    /// Get a resource by ID
    pub async fn get_by_id(&self, id: i64) -> anyhow::Result<Option<Resource>> {
        self.repo.get_by_id(id).await
    }

    /// List resources with pagination
    pub async fn list(&self, params: &ListParams) -> anyhow::Result<PagedResult<Resource>> {
        let items = self.repo.list(params.offset(), params.limit()).await?;
        let total = self.repo.count().await?;
        Ok(PagedResult::new(items, total, params))
    }

    /// Update a resource
    pub async fn update(
        &self,
        id: i64,
        input: UpdateResourceInput,
    ) -> Result<Resource, ResourceServiceError> {
        if let Some(url) = &input.url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ResourceServiceError::ValidationError(
                    "URL must be absolute".into(),
                ));
            }
        }

        self.repo.update(id, &input).await.map_err(|e| {
            if e.to_string().contains("not found") {
                ResourceServiceError::NotFound(id.to_string())
            } else {
                ResourceServiceError::InternalError(e)
            }
        })
    }

    /// Delete a resource
    pub async fn delete(&self, id: i64) -> Result<(), ResourceServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Resource lookup failed")?
            .ok_or_else(|| ResourceServiceError::NotFound(id.to_string()))?;
        self.repo
            .delete(id)
            .await
            .context("Resource deletion failed")?;
        Ok(())
    }

    /// Resource count (admin dashboard)
    pub async fn count(&self) -> anyhow::Result<i64> {
        self.repo.count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxResourceRepository;
    use crate::db::{create_test_pool, migrations};
    use crate::models::ResourceKind;

    async fn setup() -> ResourceService {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        ResourceService::new(SqlxResourceRepository::boxed(pool))
    }

    #[tokio::test]
    async fn test_create_validates_url() {
        let service = setup().await;

        let bad = CreateResourceInput {
            title: "Bad".into(),
            description: String::new(),
            url: "ftp://example.com".into(),
            kind: ResourceKind::Link,
        };
        assert!(matches!(
            service.create(bad).await,
            Err(ResourceServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_crud_roundtrip() {
        let service = setup().await;
        let created = service
            .create(CreateResourceInput {
                title: "Depreciation guide".into(),
                description: "How to depreciate fixed assets".into(),
                url: "https://example.com/guide".into(),
                kind: ResourceKind::Guide,
            })
            .await
            .unwrap();

        let updated = service
            .update(
                created.id,
                UpdateResourceInput {
                    title: Some("Depreciation guide 2e".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Depreciation guide 2e");

        service.delete(created.id).await.unwrap();
        assert!(matches!(
            service.delete(created.id).await,
            Err(ResourceServiceError::NotFound(_))
        ));
    }
}
