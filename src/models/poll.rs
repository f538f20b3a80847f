//! Poll models
//!
//! A poll carries an ordered set of options; votes increment the
//! per-option counter. At most one poll is active at a time from the
//! public site's point of view, enforced by the service layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Poll entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poll {
    /// Unique identifier
    pub id: i64,
    /// Poll question
    pub question: String,
    /// Whether the poll accepts votes and shows on the site
    pub is_active: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Options, ordered by position
    #[serde(default)]
    pub options: Vec<PollOption>,
}

impl Poll {
    /// Total number of votes across all options
    pub fn total_votes(&self) -> i64 {
        self.options.iter().map(|o| o.vote_count).sum()
    }
}

/// Poll option entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollOption {
    /// Unique identifier
    pub id: i64,
    /// Parent poll ID
    pub poll_id: i64,
    /// Option label
    pub label: String,
    /// Display position
    pub position: i32,
    /// Number of votes received
    pub vote_count: i64,
}

/// Input for creating a poll with its options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePollInput {
    pub question: String,
    pub options: Vec<String>,
    #[serde(default)]
    pub is_active: bool,
}

/// Input for updating a poll
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePollInput {
    pub question: Option<String>,
    pub is_active: Option<bool>,
}
