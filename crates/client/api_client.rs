use anyhow::{Context, Result};
use async_trait::async_trait;
use mockall::automock;
use reqwest::header::AUTHORIZATION;
use tracing::error;
use url::Url;

use crate::domain::value_objects::subscriptions::MySubscriptionDto;

/// Where a signed-in session reads its own subscriptions from.
#[automock]
#[async_trait]
pub trait MySubscriptionsSource {
    async fn fetch_my_subscriptions(&self) -> Result<Vec<MySubscriptionDto>>;
}

/// Minimal back-office API client built on reqwest, scoped to one session token.
pub struct BackOfficeApiClient {
    http: reqwest::Client,
    base_url: Url,
    access_token: String,
}

impl BackOfficeApiClient {
    /// `base_url` is the API root, e.g. `https://gym.example/api/v1/`.
    pub fn new(base_url: Url, access_token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            access_token,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("invalid API path: {path}"))
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        error!(
            status = %status,
            response_body = %body,
            context = %context,
            "back office api request failed"
        );

        anyhow::bail!("back office API request failed: {context} (status {status})");
    }
}

#[async_trait]
impl MySubscriptionsSource for BackOfficeApiClient {
    async fn fetch_my_subscriptions(&self) -> Result<Vec<MySubscriptionDto>> {
        let resp = self
            .http
            .get(self.endpoint("subscriptions/my-subscriptions")?)
            .header(AUTHORIZATION, format!("Bearer {}", self.access_token))
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "list my subscriptions").await?;

        Ok(resp.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_is_resolved_under_api_root() {
        let client = BackOfficeApiClient::new(
            Url::parse("https://gym.example/api/v1/").unwrap(),
            "token".to_string(),
        );

        assert_eq!(
            client
                .endpoint("subscriptions/my-subscriptions")
                .unwrap()
                .as_str(),
            "https://gym.example/api/v1/subscriptions/my-subscriptions"
        );
    }
}
