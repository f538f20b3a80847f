//! Resource library model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Resource entity - a curated link, template or tool for the community
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    /// Unique identifier
    pub id: i64,
    /// Resource title
    pub title: String,
    /// Short description
    pub description: String,
    /// Target URL
    pub url: String,
    /// Resource kind
    pub kind: ResourceKind,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Kind of resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Guide,
    Template,
    Tool,
    Link,
}

impl Default for ResourceKind {
    fn default() -> Self {
        Self::Link
    }
}

impl ResourceKind {
    /// Database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Guide => "guide",
            ResourceKind::Template => "template",
            ResourceKind::Tool => "tool",
            ResourceKind::Link => "link",
        }
    }

    /// Parse from the database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "guide" => Some(ResourceKind::Guide),
            "template" => Some(ResourceKind::Template),
            "tool" => Some(ResourceKind::Tool),
            "link" => Some(ResourceKind::Link),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Input for creating a resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateResourceInput {
    pub title: String,
    pub description: String,
    pub url: String,
    pub kind: ResourceKind,
}

/// Input for updating a resource
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateResourceInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub kind: Option<ResourceKind>,
}
