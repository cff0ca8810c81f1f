use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::domain::{repositories::mailer::Mailer, value_objects::emails::EmailTemplate};

/// Stand-in used when no SMTP relay is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOnlyMailer;

#[async_trait]
impl Mailer for LogOnlyMailer {
    async fn send(&self, to_email: &str, template: &EmailTemplate) -> Result<()> {
        let rendered = template.render();
        info!(
            to = %to_email,
            template = template.name(),
            subject = %rendered.subject,
            "mailer: SMTP disabled, email not delivered"
        );
        Ok(())
    }
}
