//! Host platform capabilities consumed by the agent.
//!
//! The agent never talks to a browser directly. Everything it needs from the
//! host (push subscriptions, notification display, agent registration) is
//! reached through these traits, so the lifecycle logic runs unchanged under
//! the native console host in [`crate::native`] and under test doubles.

use async_trait::async_trait;

use crate::error::{NotificationError, PayloadError, RegistrationError, SubscriptionError};
use crate::subscription::{PushSubscription, SubscribeOptions};

/// The platform push service (`registration.pushManager`).
#[async_trait]
pub trait PushManager: Send + Sync {
    /// Create a push subscription, or return the active one.
    ///
    /// Subscribing again while subscribed with the same key is idempotent on
    /// every platform: it resolves to the existing descriptor.
    ///
    /// # Errors
    ///
    /// Returns `SubscriptionError::PermissionDenied` when the user refused
    /// notifications, `InvalidKey` when the platform rejects the key.
    async fn subscribe(&self, options: &SubscribeOptions) -> Result<PushSubscription, SubscriptionError>;

    /// The currently active subscription, if any.
    async fn get_subscription(&self) -> Result<Option<PushSubscription>, SubscriptionError> {
        Ok(None)
    }
}

/// Options for a displayed notification.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NotificationOptions {
    /// Body text.
    pub body: String,
}

/// The host's notification surface (`registration.showNotification`).
#[async_trait]
pub trait NotificationHost: Send + Sync {
    /// Display a notification. Resolves once the host has shown it.
    async fn show_notification(
        &self,
        title: &str,
        options: &NotificationOptions,
    ) -> Result<(), NotificationError>;
}

/// Handle returned by a successful agent registration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistrationHandle {
    /// Script the agent runs.
    pub script_url: String,
    /// Scope the agent controls.
    pub scope: String,
}

/// The host page's agent container (`navigator.serviceWorker`).
#[async_trait]
pub trait AgentContainer: Send + Sync {
    /// Whether this host can run background agents at all.
    fn is_supported(&self) -> bool {
        true
    }

    /// Register the agent script.
    async fn register(&self, script_url: &str) -> Result<RegistrationHandle, RegistrationError>;
}

/// An inbound push message.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PushEvent {
    data: Option<Vec<u8>>,
}

impl PushEvent {
    /// A push carrying `data` as its payload.
    pub fn with_data(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: Some(data.into()),
        }
    }

    /// A push without payload.
    pub fn empty() -> Self {
        Self { data: None }
    }

    /// Raw payload bytes.
    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    /// Payload decoded as UTF-8 text.
    ///
    /// Invalid sequences become U+FFFD, as with the platform's `text()`.
    pub fn text(&self) -> Result<String, PayloadError> {
        self.data()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .ok_or(PayloadError)
    }
}
