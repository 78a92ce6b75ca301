use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::CapacityConfig;
use crate::core::{AppError, Result};

/// Notifies the event-capacity cache that an approval consumed seats
#[async_trait]
pub trait CapacityRevalidator: Send + Sync {
    async fn revalidate(&self, event_id: &str) -> Result<()>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RevalidateRequest<'a> {
    event_id: &'a str,
}

/// POSTs `{ "eventId": ... }` to the configured endpoint.
///
/// Transient failures (connect errors, 5xx, 429) are retried with
/// exponential backoff before the error is returned.
pub struct HttpCapacityRevalidator {
    client: ClientWithMiddleware,
    url: String,
    token: Option<String>,
}

impl HttpCapacityRevalidator {
    pub fn new(url: impl Into<String>, token: Option<String>, max_retries: u32) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Configuration(format!("Cannot build HTTP client: {}", e)))?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
        let client = ClientBuilder::new(http)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            url: url.into(),
            token,
        })
    }

    pub fn from_config(config: &CapacityConfig) -> Result<Option<Self>> {
        config
            .revalidate_url
            .as_ref()
            .map(|url| Self::new(url.clone(), config.revalidate_token.clone(), 3))
            .transpose()
    }
}

#[async_trait]
impl CapacityRevalidator for HttpCapacityRevalidator {
    async fn revalidate(&self, event_id: &str) -> Result<()> {
        let body = serde_json::to_vec(&RevalidateRequest { event_id })?;

        let mut request = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::internal(format!(
                "Capacity revalidation for event '{}' returned {}",
                event_id, status
            )));
        }

        debug!(event_id, "Event capacity revalidated");
        Ok(())
    }
}

/// Used when no revalidation endpoint is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingCapacityRevalidator;

#[async_trait]
impl CapacityRevalidator for LoggingCapacityRevalidator {
    async fn revalidate(&self, event_id: &str) -> Result<()> {
        info!(event_id, "Capacity revalidation requested (no endpoint configured)");
        Ok(())
    }
}
