//! Error taxonomy for the push agent.
//!
//! Each stage of the subscription lifecycle has its own error type so the
//! top-level failure handler in [`crate::agent`] can decide between logging,
//! surfacing the failure to the user, or retrying. [`AgentError`] aggregates
//! them for handlers that span several stages.

use thiserror::Error;

/// The server key string is not valid base64url.
#[derive(Debug, Error)]
#[error("invalid base64url input: {0}")]
pub struct DecodeError(#[from] base64::DecodeError);

/// The platform refused or failed to create a push subscription.
#[derive(Debug, Error)]
pub enum SubscriptionError {
    /// The user (or the platform on their behalf) denied push permission.
    #[error("push permission denied")]
    PermissionDenied,
    /// The application server key is malformed.
    #[error("invalid application server key: {0}")]
    InvalidKey(String),
    /// Any other push service failure.
    #[error("push subscribe failed: {0}")]
    Platform(String),
}

/// Saving the subscription to the backend failed.
#[derive(Debug, Error)]
pub enum TransmissionError {
    /// The descriptor could not be encoded as JSON.
    #[error("failed to serialize subscription: {0}")]
    Serialize(String),
    /// The request never completed (DNS, TLS, connection reset, ...).
    #[error("request to {endpoint} failed: {message}")]
    Network {
        /// Save endpoint URL.
        endpoint: String,
        /// Underlying client error.
        message: String,
    },
    /// The request exceeded the configured transmit timeout.
    #[error("request to {endpoint} timed out")]
    Timeout {
        /// Save endpoint URL.
        endpoint: String,
    },
    /// The backend answered with a non-success status.
    #[error("backend returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },
    /// The response body is not parseable JSON.
    #[error("backend response is not valid JSON: {0}")]
    InvalidJson(String),
}

impl TransmissionError {
    /// Whether another attempt could succeed.
    ///
    /// Network failures, timeouts, 5xx and 429 are transient. Client errors
    /// and unparseable bodies are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } | Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status == 429 || (500..=599).contains(status),
            Self::Serialize(_) | Self::InvalidJson(_) => false,
        }
    }
}

/// A push event arrived without a payload.
#[derive(Debug, Error)]
#[error("push event carries no data")]
pub struct PayloadError;

/// The host could not register the background agent.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The host environment has no background agent support.
    #[error("background agents are not supported by this host")]
    Unsupported,
    /// The agent script could not be fetched or parsed.
    #[error("agent script {script_url} could not be loaded: {reason}")]
    ScriptUnavailable {
        /// Script URL passed to `register`.
        script_url: String,
        /// Host-provided failure reason.
        reason: String,
    },
}

/// The host refused to display a notification.
#[derive(Debug, Error)]
#[error("failed to show notification: {0}")]
pub struct NotificationError(pub String);

/// Any failure raised while handling an agent event.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Server key decoding failed.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// Push subscription failed.
    #[error(transparent)]
    Subscription(#[from] SubscriptionError),
    /// Saving the subscription failed (after retries).
    #[error(transparent)]
    Transmission(#[from] TransmissionError),
    /// Push event had no payload.
    #[error(transparent)]
    Payload(#[from] PayloadError),
    /// Agent registration failed.
    #[error(transparent)]
    Registration(#[from] RegistrationError),
    /// Notification display failed.
    #[error(transparent)]
    Notification(#[from] NotificationError),
}
