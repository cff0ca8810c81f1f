use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use tracing::info;

use crate::domain::{repositories::mailer::Mailer, value_objects::emails::EmailTemplate};

use super::MailerConfig;

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &MailerConfig) -> Result<Self> {
        let from: Mailbox = config
            .from
            .parse()
            .with_context(|| format!("invalid MAIL_FROM address: {}", config.from))?;

        let builder = if config.tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .with_context(|| format!("invalid SMTP relay: {}", config.host))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };
        let builder = builder.port(config.port);
        let builder = match (&config.user, &config.password) {
            (Some(user), Some(password)) => {
                builder.credentials(Credentials::new(user.clone(), password.clone()))
            }
            _ => builder,
        };

        info!(
            host = %config.host,
            port = config.port,
            tls = config.tls,
            "mailer: SMTP transport initialized"
        );

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to_email: &str, template: &EmailTemplate) -> Result<()> {
        let to: Mailbox = to_email
            .parse()
            .with_context(|| format!("invalid recipient address: {to_email}"))?;
        let rendered = template.render();

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(rendered.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(rendered.body)
            .context("failed to build email message")?;

        self.transport
            .send(message)
            .await
            .context("SMTP delivery failed")?;

        info!(template = template.name(), "mailer: email sent");
        Ok(())
    }
}
