use anyhow::{Context, Result};
use crates::infra::mailer::MailerConfig;

use super::config_model::{AuthSecret, BackendServer, Cors, Database, DotEnvyConfig};

const DEFAULT_SMTP_PORT: u16 = 587;

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let backend_server = BackendServer {
        port: required("SERVER_PORT_BACKEND")?
            .parse()
            .context("SERVER_PORT_BACKEND is invalid")?,
        body_limit: required("SERVER_BODY_LIMIT")?
            .parse()
            .context("SERVER_BODY_LIMIT is invalid")?,
        timeout: required("SERVER_TIMEOUT")?
            .parse()
            .context("SERVER_TIMEOUT is invalid")?,
    };

    let database = Database {
        url: required("DATABASE_URL")?,
    };

    let cors = Cors {
        allowed_origins: parse_origins(&std::env::var("CORS_ALLOWED_ORIGINS").unwrap_or_default()),
    };

    Ok(DotEnvyConfig {
        backend_server,
        database,
        auth: get_auth_secret()?,
        cors,
        mailer: load_mailer()?,
    })
}

pub fn get_auth_secret() -> Result<AuthSecret> {
    dotenvy::dotenv().ok();

    Ok(AuthSecret {
        jwt_secret: required("JWT_SECRET")?,
    })
}

/// Shared with the worker, which sends the reminder emails.
pub fn load_mailer() -> Result<Option<MailerConfig>> {
    let Some(host) = optional("SMTP_HOST") else {
        return Ok(None);
    };

    let port = match optional("SMTP_PORT") {
        Some(raw) => raw.parse().context("SMTP_PORT is invalid")?,
        None => DEFAULT_SMTP_PORT,
    };
    let tls = match optional("SMTP_TLS") {
        Some(raw) => parse_bool(&raw).context("SMTP_TLS is invalid")?,
        None => true,
    };

    Ok(Some(MailerConfig {
        host,
        port,
        user: optional("SMTP_USER"),
        password: optional("SMTP_PASSWORD"),
        tls,
        from: required("MAIL_FROM")?,
    }))
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("{key} is invalid"))
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
