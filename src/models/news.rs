//! News article model
//!
//! This module provides:
//! - `Article` entity representing a news article
//! - `ArticleStatus` enum for publication states
//! - Input types for creating and updating articles

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// News article entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// Unique identifier
    pub id: i64,
    /// URL-friendly slug
    pub slug: String,
    /// Article title
    pub title: String,
    /// Short summary shown in listings and crawler descriptions
    pub summary: String,
    /// Markdown content
    pub content: String,
    /// Rendered HTML content
    pub content_html: String,
    /// Cover image URL
    #[serde(default)]
    pub cover_image: Option<String>,
    /// Author user ID
    pub author_id: i64,
    /// Publication status
    pub status: ArticleStatus,
    /// Publication timestamp
    pub published_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
    /// View count
    #[serde(default)]
    pub view_count: i64,
}

impl Article {
    /// Check if the article is visible to the public (and to crawlers)
    pub fn is_published(&self) -> bool {
        self.status == ArticleStatus::Published
    }
}

/// Article publication status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    /// Draft - not visible to public
    Draft,
    /// Published - visible to public
    Published,
    /// Archived - hidden but not deleted
    Archived,
}

impl Default for ArticleStatus {
    fn default() -> Self {
        Self::Draft
    }
}

impl ArticleStatus {
    /// Convert status to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleStatus::Draft => "draft",
            ArticleStatus::Published => "published",
            ArticleStatus::Archived => "archived",
        }
    }

    /// Parse status from database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(ArticleStatus::Draft),
            "published" => Some(ArticleStatus::Published),
            "archived" => Some(ArticleStatus::Archived),
            _ => None,
        }
    }
}

impl std::fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Input for creating a new article
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateArticleInput {
    /// URL-friendly slug
    pub slug: String,
    /// Article title
    pub title: String,
    /// Short summary
    pub summary: String,
    /// Markdown content
    pub content: String,
    /// Rendered HTML content (generated by the service when absent)
    pub content_html: Option<String>,
    /// Cover image URL
    pub cover_image: Option<String>,
    /// Author user ID
    pub author_id: i64,
    /// Publication status (defaults to Draft)
    pub status: Option<ArticleStatus>,
}

/// Input for updating an existing article
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateArticleInput {
    /// New slug (optional)
    pub slug: Option<String>,
    /// New title (optional)
    pub title: Option<String>,
    /// New summary (optional)
    pub summary: Option<String>,
    /// New markdown content (optional)
    pub content: Option<String>,
    /// New rendered HTML content (optional)
    pub content_html: Option<String>,
    /// New cover image URL (optional)
    pub cover_image: Option<String>,
    /// New status (optional)
    pub status: Option<ArticleStatus>,
}

impl UpdateArticleInput {
    /// Check if any field is set
    pub fn has_changes(&self) -> bool {
        self.slug.is_some()
            || self.title.is_some()
            || self.summary.is_some()
            || self.content.is_some()
            || self.content_html.is_some()
            || self.cover_image.is_some()
            || self.status.is_some()
    }
}
