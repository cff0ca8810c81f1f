use crates::infra::mailer::MailerConfig;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub backend_server: BackendServer,
    pub database: Database,
    pub auth: AuthSecret,
    pub cors: Cors,
    /// `None` when `SMTP_HOST` is unset; mail is then only logged.
    pub mailer: Option<MailerConfig>,
}

#[derive(Debug, Clone)]
pub struct BackendServer {
    pub port: u16,
    pub body_limit: u64,
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct AuthSecret {
    pub jwt_secret: String,
}

#[derive(Debug, Clone)]
pub struct Cors {
    /// Empty means any origin.
    pub allowed_origins: Vec<String>,
}
