//! Subscription transmitter: saves a push subscription on the backend.
//!
//! The descriptor is POSTed as JSON to the configured save endpoint and the
//! JSON response is returned as an opaque [`BackendConfirmation`].
//! [`send_with_retry`] wraps any [`Transmit`] implementation in the bounded
//! retry loop from [`crate::retry`].

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};

use crate::config::AgentConfig;
use crate::error::TransmissionError;
use crate::retry::{retry, RetryPolicy};
use crate::subscription::{BackendConfirmation, PushSubscription};

/// Longest response body kept in a `TransmissionError::Status`.
const MAX_ERROR_BODY: usize = 512;

/// Delivers a subscription descriptor to the backend.
#[async_trait]
pub trait Transmit: Send + Sync {
    /// Send `subscription` and return the parsed confirmation.
    ///
    /// # Errors
    ///
    /// Returns `TransmissionError` if the request cannot complete, the
    /// backend answers with a non-success status, or the body is not JSON.
    async fn send(&self, subscription: &PushSubscription) -> Result<BackendConfirmation, TransmissionError>;
}

/// HTTP transmitter backed by a shared `reqwest::Client`.
///
/// The client carries the request timeout, so a hung backend cannot keep
/// the agent alive indefinitely.
#[derive(Debug, Clone)]
pub struct HttpTransmitter {
    client: Client,
    endpoint: Url,
}

impl HttpTransmitter {
    /// Creates a transmitter posting to `endpoint` with `client`.
    pub fn new(client: Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    /// Build a client with the configured timeout and target the configured
    /// save endpoint.
    pub fn from_config(config: &AgentConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.transmit_timeout())
            .user_agent(concat!("ap-push-agent/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::new(client, config.save_url()?))
    }

    /// The save endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn request_error(&self, error: &reqwest::Error) -> TransmissionError {
        if error.is_timeout() {
            TransmissionError::Timeout {
                endpoint: self.endpoint.to_string(),
            }
        } else {
            TransmissionError::Network {
                endpoint: self.endpoint.to_string(),
                message: error.to_string(),
            }
        }
    }
}

#[async_trait]
impl Transmit for HttpTransmitter {
    async fn send(&self, subscription: &PushSubscription) -> Result<BackendConfirmation, TransmissionError> {
        let body = serde_json::to_vec(subscription)
            .map_err(|e| TransmissionError::Serialize(e.to_string()))?;

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| self.request_error(&e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.request_error(&e))?;

        if !status.is_success() {
            let mut body = text;
            if body.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY).rev().find(|&i| body.is_char_boundary(i)).unwrap_or(0);
                body.truncate(cut);
            }
            return Err(TransmissionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let value: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| TransmissionError::InvalidJson(e.to_string()))?;

        log::debug!(
            "[WebPush] Saved subscription {} (HTTP {})",
            subscription.endpoint_for_log(),
            status.as_u16()
        );
        Ok(BackendConfirmation(value))
    }
}

/// Send `subscription` through `transmitter`, retrying transient failures
/// according to `policy`.
pub async fn send_with_retry(
    transmitter: &dyn Transmit,
    policy: &RetryPolicy,
    subscription: &PushSubscription,
) -> Result<BackendConfirmation, TransmissionError> {
    retry(policy, "save-subscription", TransmissionError::is_transient, || {
        transmitter.send(subscription)
    })
    .await
}
