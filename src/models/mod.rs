//! Domain models
//!
//! Plain data types shared between the storage layer, the services and the
//! API handlers. Each entity lives in its own module together with its
//! create/update input types.

pub mod category;
pub mod forum;
pub mod invitation;
pub mod menu;
pub mod news;
pub mod podcast;
pub mod poll;
pub mod resource;
pub mod session;
pub mod settings;
pub mod subscriber;
pub mod user;

pub use category::{Category, CreateCategoryInput, UpdateCategoryInput};
pub use forum::{
    CreateDiscussionInput, CreateReplyInput, Discussion, Reply, UpdateDiscussionInput,
};
pub use invitation::{CreateInvitationInput, Invitation};
pub use menu::MenuSetting;
pub use news::{Article, ArticleStatus, CreateArticleInput, UpdateArticleInput};
pub use podcast::{CreateEpisodeInput, Episode, UpdateEpisodeInput};
pub use poll::{CreatePollInput, Poll, PollOption, UpdatePollInput};
pub use resource::{CreateResourceInput, Resource, ResourceKind, UpdateResourceInput};
pub use session::Session;
pub use settings::Setting;
pub use subscriber::Subscriber;
pub use user::{User, UserRole, UserStatus};

use serde::{Deserialize, Serialize};

/// Pagination parameters for list queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListParams {
    /// Page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

impl ListParams {
    /// Create new pagination parameters, clamping to sane bounds
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, 100),
        }
    }

    /// Calculate the offset for database queries
    pub fn offset(&self) -> i64 {
        ((self.page.saturating_sub(1)) * self.per_page) as i64
    }

    /// Get the limit for database queries
    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

/// Paginated result container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    /// Items in the current page
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: i64,
    /// Current page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl<T> PagedResult<T> {
    /// Create a new paginated result
    pub fn new(items: Vec<T>, total: i64, params: &ListParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            per_page: params.per_page,
        }
    }

    /// Calculate the total number of pages
    pub fn total_pages(&self) -> u32 {
        if self.per_page == 0 {
            return 0;
        }
        ((self.total as u32) + self.per_page - 1) / self.per_page
    }

    /// Check if there is a next page
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    /// Check if there is a previous page
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Get the number of items in the current page
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the result is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_params_clamping() {
        let params = ListParams::new(0, 10);
        assert_eq!(params.page, 1);
        assert_eq!(params.offset(), 0);

        let params = ListParams::new(3, 5);
        assert_eq!(params.offset(), 10);
        assert_eq!(params.limit(), 5);

        let params = ListParams::new(1, 500);
        assert_eq!(params.per_page, 100);
    }

    #[test]
    fn test_paged_result_navigation() {
        let params = ListParams::new(2, 10);
        let result = PagedResult::new(vec![1, 2, 3], 25, &params);

        assert_eq!(result.total_pages(), 3);
        assert!(result.has_next());
        assert!(result.has_prev());
        assert_eq!(result.len(), 3);
    }
}
