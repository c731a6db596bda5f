//! Access point push agent.
//!
//! A background agent that subscribes a device to web push with the access
//! point backend's server key, saves the subscription on the backend, and
//! turns every inbound push into a user-visible notification.
//!
//! # Architecture
//!
//! ```text
//! Bootstrap::register ──► host activates agent
//!                              │
//!         activate ──► PushSubscriber ──► PushManager::subscribe(userVisibleOnly, key)
//!                              │                 │
//!                              │                 ▼
//!                              └──────► send_with_retry ──► HttpTransmitter ──► POST /save-subscription
//!
//!         push ──► NotificationDispatcher ──► NotificationHost::show_notification
//! ```
//!
//! # Modules
//!
//! - [`base64url`] - Server key decoding
//! - [`key`] - Validated application server key
//! - [`subscription`] - Push subscription descriptor
//! - [`platform`] - Host capabilities (push manager, notifications, registration)
//! - [`subscriber`] - Activation handler
//! - [`transmitter`] - Saving subscriptions on the backend
//! - [`retry`] - Exponential backoff around the save request
//! - [`dispatcher`] - Push handler
//! - [`lifetime`] - Event lifetime extension
//! - [`agent`] - Event routing and failure handling
//! - [`host`] - Event loop
//! - [`bootstrap`] - Agent registration
//! - [`native`] - Terminal host adapters
//! - [`config`] - Configuration loading/saving

pub mod agent;
pub mod base64url;
pub mod bootstrap;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod host;
pub mod key;
pub mod lifetime;
pub mod native;
pub mod platform;
pub mod retry;
pub mod subscriber;
pub mod subscription;
pub mod transmitter;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use agent::{AgentEvent, BackgroundAgent, FailureAction};
pub use config::AgentConfig;
pub use error::{
    AgentError, DecodeError, NotificationError, PayloadError, RegistrationError, SubscriptionError,
    TransmissionError,
};
pub use host::AgentHost;
pub use key::ApplicationServerKey;
pub use platform::{AgentContainer, NotificationHost, PushEvent, PushManager};
pub use subscription::{BackendConfirmation, PushSubscription};
pub use transmitter::{HttpTransmitter, Transmit};
