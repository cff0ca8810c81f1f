use anyhow::{Context, Result, bail};
use backend::config::config_loader::{load_mailer, parse_bool};
use chrono::FixedOffset;
use crates::domain::value_objects::subscription_lifecycle::DEFAULT_REMINDER_HORIZON_DAYS;

use super::config_model::{Database, DotEnvyConfig, Reconcile, Reminders};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let database = Database {
        url: std::env::var("DATABASE_URL").context("DATABASE_URL is invalid")?,
    };

    let horizon_days = match std::env::var("REMINDER_HORIZON_DAYS") {
        Ok(raw) => raw
            .trim()
            .parse::<i64>()
            .context("REMINDER_HORIZON_DAYS is invalid")?,
        Err(_) => DEFAULT_REMINDER_HORIZON_DAYS,
    };
    if horizon_days < 0 {
        bail!("REMINDER_HORIZON_DAYS must not be negative");
    }

    let offset_minutes = match std::env::var("REMINDER_UTC_OFFSET_MINUTES") {
        Ok(raw) => raw
            .trim()
            .parse::<i32>()
            .context("REMINDER_UTC_OFFSET_MINUTES is invalid")?,
        Err(_) => 0,
    };

    let reconcile = Reconcile {
        enabled: match std::env::var("EXPIRY_RECONCILE_ENABLED") {
            Ok(raw) => parse_bool(&raw).context("EXPIRY_RECONCILE_ENABLED is invalid")?,
            Err(_) => false,
        },
    };

    Ok(DotEnvyConfig {
        database,
        reminders: Reminders {
            horizon_days,
            utc_offset: utc_offset_from_minutes(offset_minutes)?,
        },
        reconcile,
        mailer: load_mailer()?,
    })
}

fn utc_offset_from_minutes(minutes: i32) -> Result<FixedOffset> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .with_context(|| format!("REMINDER_UTC_OFFSET_MINUTES {minutes} is out of range"))
}
