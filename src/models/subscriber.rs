//! Newsletter subscriber model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Newsletter subscriber entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscriber {
    /// Unique identifier
    pub id: i64,
    /// Email address (unique)
    pub email: String,
    /// Whether the address was confirmed
    pub confirmed: bool,
    /// Subscription timestamp
    pub subscribed_at: DateTime<Utc>,
}
