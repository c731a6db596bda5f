//! Push subscriber: turns an agent activation into a saved subscription.

use std::sync::Arc;

use crate::error::{AgentError, SubscriptionError};
use crate::key::ApplicationServerKey;
use crate::platform::PushManager;
use crate::retry::RetryPolicy;
use crate::subscription::{BackendConfirmation, PushSubscription, SubscribeOptions};
use crate::transmitter::{send_with_retry, Transmit};

/// Subscribes the device with the server key and saves the result.
pub struct PushSubscriber {
    push_manager: Arc<dyn PushManager>,
    transmitter: Arc<dyn Transmit>,
    key: ApplicationServerKey,
    retry: RetryPolicy,
}

impl std::fmt::Debug for PushSubscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushSubscriber")
            .field("key", &self.key.as_base64url())
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl PushSubscriber {
    /// Creates a subscriber for `key`, saving through `transmitter`.
    pub fn new(
        push_manager: Arc<dyn PushManager>,
        transmitter: Arc<dyn Transmit>,
        key: ApplicationServerKey,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            push_manager,
            transmitter,
            key,
            retry,
        }
    }

    /// Request a user-visible push subscription from the platform.
    ///
    /// An already active subscription is only logged: subscribing again with
    /// the same key returns it, so the call is made unconditionally.
    pub async fn subscribe(&self) -> Result<PushSubscription, SubscriptionError> {
        match self.push_manager.get_subscription().await {
            Ok(Some(existing)) => log::info!(
                "[WebPush] Already subscribed at {}, re-subscribing",
                existing.endpoint_for_log()
            ),
            Ok(None) => {}
            Err(e) => log::debug!("[WebPush] Could not look up active subscription: {}", e),
        }

        let options = SubscribeOptions::user_visible(&self.key);
        let subscription = self.push_manager.subscribe(&options).await?;

        log::info!("[WebPush] Subscribed: {}", subscription.endpoint_for_log());
        Ok(subscription)
    }

    /// Activation handler: subscribe, then save the subscription.
    ///
    /// The save is only attempted once the platform produced a descriptor,
    /// and this future resolves only after the backend answered (or retries
    /// ran out). The subscription is saved on every activation.
    pub async fn on_activate(&self) -> Result<BackendConfirmation, AgentError> {
        let subscription = self.subscribe().await?;

        let confirmation =
            send_with_retry(self.transmitter.as_ref(), &self.retry, &subscription).await?;

        log::info!("[WebPush] Backend confirmation: {}", confirmation);
        Ok(confirmation)
    }
}
