//! Service layer
//!
//! Business logic between the API handlers and the repositories:
//! validation, markdown rendering, cache management, session handling and
//! email delivery.

pub mod email;
pub mod forum;
pub mod invitation;
pub mod markdown;
pub mod menu;
pub mod news;
pub mod password;
pub mod podcast;
pub mod poll;
pub mod rate_limiter;
pub mod resource;
pub mod settings;
pub mod subscriber;
pub mod user;

pub use email::EmailService;
pub use forum::ForumService;
pub use invitation::InvitationService;
pub use markdown::MarkdownRenderer;
pub use menu::MenuService;
pub use news::NewsService;
pub use podcast::PodcastService;
pub use poll::PollService;
pub use rate_limiter::LoginRateLimiter;
pub use resource::ResourceService;
pub use settings::SettingsService;
pub use subscriber::SubscriberService;
pub use user::UserService;
