//! Site setting model

use serde::{Deserialize, Serialize};

/// Key-value site setting.
///
/// Holds site metadata (name, base URL, description) and SMTP parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Setting {
    /// Setting key
    pub key: String,
    /// Setting value
    pub value: String,
}

/// Well-known setting keys
pub mod keys {
    pub const SITE_NAME: &str = "site_name";
    pub const SITE_DESCRIPTION: &str = "site_description";
    pub const SITE_BASE_URL: &str = "site_base_url";
    pub const SMTP_HOST: &str = "smtp_host";
    pub const SMTP_PORT: &str = "smtp_port";
    pub const SMTP_USERNAME: &str = "smtp_username";
    pub const SMTP_PASSWORD: &str = "smtp_password";
    pub const SMTP_FROM: &str = "smtp_from";
    pub const SMTP_FROM_NAME: &str = "smtp_from_name";
}
