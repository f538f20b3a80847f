//! Forum models
//!
//! Discussions and their replies. A discussion's `reply_count` is kept in
//! sync by the repository whenever replies are added or removed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Forum discussion entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discussion {
    /// Unique identifier
    pub id: i64,
    /// Discussion title
    pub title: String,
    /// Markdown body
    pub body: String,
    /// Rendered HTML body
    pub body_html: String,
    /// Author user ID
    pub author_id: i64,
    /// Locked discussions reject new replies
    pub is_locked: bool,
    /// Pinned discussions sort first
    pub is_pinned: bool,
    /// Number of replies
    pub reply_count: i64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Forum reply entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    /// Unique identifier
    pub id: i64,
    /// Parent discussion ID
    pub discussion_id: i64,
    /// Reply body (plain text)
    pub body: String,
    /// Author user ID
    pub author_id: i64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Input for creating a discussion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDiscussionInput {
    pub title: String,
    pub body: String,
    pub body_html: Option<String>,
    pub author_id: i64,
}

/// Input for moderating/updating a discussion
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDiscussionInput {
    pub title: Option<String>,
    pub body: Option<String>,
    pub body_html: Option<String>,
    pub is_locked: Option<bool>,
    pub is_pinned: Option<bool>,
}

/// Input for creating a reply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReplyInput {
    pub discussion_id: i64,
    pub body: String,
    pub author_id: i64,
}
