//! Email service
//!
//! Sends invitation and newsletter emails over SMTP. Transport parameters
//! live in the settings table so admins can change them at runtime.

use anyhow::{anyhow, Result};
use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Arc;

use crate::db::repositories::SettingsRepository;
use crate::models::settings::keys;

/// Email service for outbound mail
pub struct EmailService {
    settings_repo: Arc<dyn SettingsRepository>,
}

impl EmailService {
    pub fn new(settings_repo: Arc<dyn SettingsRepository>) -> Self {
        Self { settings_repo }
    }

    /// Check whether SMTP is configured at all
    pub async fn is_configured(&self) -> bool {
        matches!(self.get_setting(keys::SMTP_HOST).await, Ok(host) if !host.is_empty())
    }

    /// Send an invitation email containing the registration token
    pub async fn send_invitation(&self, to_email: &str, token: &str) -> Result<()> {
        let site_name = self.site_name().await;
        let base_url = self
            .get_setting(keys::SITE_BASE_URL)
            .await
            .unwrap_or_else(|_| "http://localhost:8080".to_string());

        let subject = format!("[{}] You have been invited", site_name);
        let body = format!(
            "Hello,\n\nYou have been invited to join {}.\n\nRegister here: {}/register?token={}\n\nThe invitation expires in 7 days.\n\nThe {} team",
            site_name, base_url, token, site_name
        );

        self.send(to_email, &subject, &body).await
    }

    /// Send a newsletter subscription confirmation
    pub async fn send_subscription_confirmation(&self, to_email: &str) -> Result<()> {
        let site_name = self.site_name().await;

        let subject = format!("[{}] Subscription confirmed", site_name);
        let body = format!(
            "Hello,\n\nYour subscription to the {} newsletter is confirmed.\n\nIf this wasn't you, you can unsubscribe from any newsletter email.\n\nThe {} team",
            site_name, site_name
        );

        self.send(to_email, &subject, &body).await
    }

    async fn send(&self, to_email: &str, subject: &str, body: &str) -> Result<()> {
        let smtp_host = self
            .get_setting(keys::SMTP_HOST)
            .await
            .map_err(|_| anyhow!("SMTP host not configured"))?;
        if smtp_host.is_empty() {
            return Err(anyhow!("SMTP host not configured"));
        }

        let smtp_port: u16 = self
            .get_setting(keys::SMTP_PORT)
            .await
            .unwrap_or_else(|_| "587".to_string())
            .parse()
            .unwrap_or(587);
        let smtp_username = self
            .get_setting(keys::SMTP_USERNAME)
            .await
            .map_err(|_| anyhow!("SMTP username not configured"))?;
        let smtp_password = self
            .get_setting(keys::SMTP_PASSWORD)
            .await
            .map_err(|_| anyhow!("SMTP password not configured"))?;
        let smtp_from = self
            .get_setting(keys::SMTP_FROM)
            .await
            .map_err(|_| anyhow!("SMTP from address not configured"))?;
        let smtp_from_name = self
            .get_setting(keys::SMTP_FROM_NAME)
            .await
            .unwrap_or_else(|_| default_site_name());

        let from = format!("{} <{}>", smtp_from_name, smtp_from);
        let email = Message::builder()
            .from(from.parse().map_err(|e| anyhow!("Invalid from address: {}", e))?)
            .to(to_email
                .parse()
                .map_err(|e| anyhow!("Invalid to address: {}", e))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| anyhow!("Failed to build email: {}", e))?;

        let creds = Credentials::new(smtp_username, smtp_password);

        let mailer: AsyncSmtpTransport<Tokio1Executor> =
            AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp_host)
                .map_err(|e| anyhow!("Failed to create SMTP transport: {}", e))?
                .credentials(creds)
                .port(smtp_port)
                .build();

        mailer
            .send(email)
            .await
            .map_err(|e| anyhow!("Failed to send email: {}", e))?;

        Ok(())
    }

    async fn site_name(&self) -> String {
        self.get_setting(keys::SITE_NAME)
            .await
            .unwrap_or_else(|_| default_site_name())
    }

    async fn get_setting(&self, key: &str) -> Result<String> {
        self.settings_repo
            .get(key)
            .await?
            .map(|s| s.value)
            .ok_or_else(|| anyhow!("Setting '{}' not configured", key))
    }
}

fn default_site_name() -> String {
    "The Digital Ledger".to_string()
}
