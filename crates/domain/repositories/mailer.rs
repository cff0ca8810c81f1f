use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::value_objects::emails::EmailTemplate;

#[automock]
#[async_trait]
pub trait Mailer {
    async fn send(&self, to_email: &str, template: &EmailTemplate) -> Result<()>;
}
