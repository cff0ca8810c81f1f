use anyhow::Result;
use async_trait::async_trait;

use crate::domain::{repositories::mailer::Mailer, value_objects::emails::EmailTemplate};

pub mod log_only;
pub mod smtp;

pub use log_only::LogOnlyMailer;
pub use smtp::SmtpMailer;

#[derive(Debug, Clone)]
pub struct MailerConfig {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    /// STARTTLS when true, plaintext otherwise (local relays only).
    pub tls: bool,
    pub from: String,
}

/// Mailer picked at startup from configuration.
pub enum AppMailer {
    Smtp(SmtpMailer),
    LogOnly(LogOnlyMailer),
}

impl AppMailer {
    /// SMTP when configured, otherwise emails are only logged.
    pub fn from_config(config: Option<&MailerConfig>) -> Result<Self> {
        match config {
            Some(config) => Ok(Self::Smtp(SmtpMailer::new(config)?)),
            None => {
                tracing::warn!("mailer: SMTP_HOST is not set, emails will only be logged");
                Ok(Self::LogOnly(LogOnlyMailer))
            }
        }
    }
}

#[async_trait]
impl Mailer for AppMailer {
    async fn send(&self, to_email: &str, template: &EmailTemplate) -> Result<()> {
        match self {
            Self::Smtp(mailer) => mailer.send(to_email, template).await,
            Self::LogOnly(mailer) => mailer.send(to_email, template).await,
        }
    }
}
