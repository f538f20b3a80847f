//! Repository layer
//!
//! One repository per aggregate, each defined as a trait plus a SQLx
//! implementation that supports both SQLite and MySQL.

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

pub use category::{CategoryRepository, SqlxCategoryRepository};
pub use forum::{ForumRepository, SqlxForumRepository};
pub use invitation::{InvitationRepository, SqlxInvitationRepository};
pub use menu::{MenuRepository, SqlxMenuRepository};
pub use news::{NewsRepository, SqlxNewsRepository};
pub use podcast::{PodcastRepository, SqlxPodcastRepository};
pub use poll::{PollRepository, SqlxPollRepository};
pub use resource::{ResourceRepository, SqlxResourceRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use settings::{SettingsRepository, SqlxSettingsRepository};
pub use subscriber::{SqlxSubscriberRepository, SubscriberRepository};
pub use user::{SqlxUserRepository, UserRepository};
