//! Podcast episode model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ArticleStatus;

/// Podcast episode entity.
///
/// Episodes share the draft/published/archived lifecycle with news
/// articles, so the same status enum is reused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    /// Unique identifier
    pub id: i64,
    /// URL-friendly slug
    pub slug: String,
    /// Episode title
    pub title: String,
    /// Episode description (plain text / light markdown)
    pub description: String,
    /// URL of the hosted audio file
    pub audio_url: String,
    /// Runtime in seconds
    pub duration_seconds: i64,
    /// Sequential episode number
    pub episode_number: i32,
    /// Display name of the host
    pub host_name: String,
    /// Publication status
    pub status: ArticleStatus,
    /// Publication timestamp
    pub published_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Episode {
    /// Check if the episode is visible to the public (and to crawlers)
    pub fn is_published(&self) -> bool {
        self.status == ArticleStatus::Published
    }

    /// Runtime formatted as ISO 8601 duration (PT#M#S), used in JSON-LD
    pub fn iso_duration(&self) -> String {
        let minutes = self.duration_seconds / 60;
        let seconds = self.duration_seconds % 60;
        format!("PT{}M{}S", minutes, seconds)
    }
}

/// Input for creating a new episode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEpisodeInput {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub audio_url: String,
    pub duration_seconds: i64,
    pub episode_number: i32,
    pub host_name: String,
    pub status: Option<ArticleStatus>,
}

/// Input for updating an existing episode
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEpisodeInput {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub audio_url: Option<String>,
    pub duration_seconds: Option<i64>,
    pub episode_number: Option<i32>,
    pub host_name: Option<String>,
    pub status: Option<ArticleStatus>,
}

impl UpdateEpisodeInput {
    /// Check if any field is set
    pub fn has_changes(&self) -> bool {
        self.slug.is_some()
            || self.title.is_some()
            || self.description.is_some()
            || self.audio_url.is_some()
            || self.duration_seconds.is_some()
            || self.episode_number.is_some()
            || self.host_name.is_some()
            || self.status.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_iso_duration() {
        let episode = Episode {
            id: 1,
            slug: "ep-1".into(),
            title: "Episode 1".into(),
            description: String::new(),
            audio_url: "https://cdn.example.com/ep1.mp3".into(),
            duration_seconds: 1935,
            episode_number: 1,
            host_name: "Host".into(),
            status: ArticleStatus::Published,
            published_at: Some(Utc::now()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(episode.iso_duration(), "PT32M15S");
    }
}
