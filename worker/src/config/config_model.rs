use chrono::FixedOffset;
use crates::infra::mailer::MailerConfig;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub database: Database,
    pub reminders: Reminders,
    pub reconcile: Reconcile,
    /// `None` when `SMTP_HOST` is unset; reminders are then only logged.
    pub mailer: Option<MailerConfig>,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Reminders {
    pub horizon_days: i64,
    /// Calendar days are counted in this offset.
    pub utc_offset: FixedOffset,
}

#[derive(Debug, Clone)]
pub struct Reconcile {
    pub enabled: bool,
}
