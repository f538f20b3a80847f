//! Menu setting model

use serde::{Deserialize, Serialize};

/// A single navigation entry of the public site.
///
/// The SPA reads these to decide which sections to show; admins toggle
/// visibility and ordering without redeploying the front end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuSetting {
    /// Unique identifier
    pub id: i64,
    /// Stable key the front end matches on ("news", "podcasts", ...)
    pub key: String,
    /// Display label
    pub label: String,
    /// Whether the entry is shown
    pub is_visible: bool,
    /// Sort order (lower first)
    pub sort_order: i32,
}
