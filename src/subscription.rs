//! Push subscription descriptor and the values exchanged around it.
//!
//! The descriptor mirrors the platform's `PushSubscription.toJSON()` shape,
//! which is also the body the backend's save endpoint expects:
//!
//! ```json
//! {
//!   "endpoint": "https://fcm.googleapis.com/fcm/send/...",
//!   "expirationTime": null,
//!   "keys": { "p256dh": "BNc...", "auth": "tBH..." }
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::base64url;
use crate::error::SubscriptionError;
use crate::key::ApplicationServerKey;

/// Length of the client's P-256 ECDH public key (uncompressed point).
const P256DH_LEN: usize = 65;
/// Length of the shared authentication secret (RFC 8291).
const AUTH_SECRET_LEN: usize = 16;

/// Client key material of a push subscription.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    /// Browser's P-256 ECDH public key (base64url).
    pub p256dh: String,
    /// Shared auth secret (base64url).
    pub auth: String,
}

/// A platform-issued push subscription.
///
/// Obtained from [`crate::platform::PushManager::subscribe`], handed by value
/// to the transmitter and then dropped. Nothing caches it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscription {
    /// Push service endpoint URL.
    pub endpoint: String,
    /// Expiry as milliseconds since the Unix epoch, if the push service set one.
    #[serde(default)]
    pub expiration_time: Option<u64>,
    /// Client key material.
    pub keys: SubscriptionKeys,
}

impl PushSubscription {
    /// Check that the descriptor looks like something a push service issued.
    ///
    /// Used on descriptors that come from outside the platform API (recorded
    /// files); the platform's own output is trusted.
    pub fn validate(&self) -> Result<(), SubscriptionError> {
        let endpoint = reqwest::Url::parse(&self.endpoint)
            .map_err(|e| SubscriptionError::Platform(format!("invalid endpoint: {e}")))?;
        if endpoint.scheme() != "https" {
            return Err(SubscriptionError::Platform(format!(
                "endpoint must use https, got {}",
                endpoint.scheme()
            )));
        }

        check_key_len("p256dh", &self.keys.p256dh, P256DH_LEN)?;
        check_key_len("auth", &self.keys.auth, AUTH_SECRET_LEN)?;
        Ok(())
    }

    /// Endpoint shortened for log lines (push endpoints embed long tokens).
    pub fn endpoint_for_log(&self) -> &str {
        let end = self
            .endpoint
            .char_indices()
            .nth(48)
            .map_or(self.endpoint.len(), |(i, _)| i);
        &self.endpoint[..end]
    }
}

fn check_key_len(name: &str, value: &str, expected: usize) -> Result<(), SubscriptionError> {
    let bytes = base64url::decode(value)
        .map_err(|e| SubscriptionError::Platform(format!("{name}: {e}")))?;
    if bytes.len() == expected {
        Ok(())
    } else {
        Err(SubscriptionError::Platform(format!(
            "{name} must be {expected} bytes, got {}",
            bytes.len()
        )))
    }
}

/// Options passed to the platform's `subscribe` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscribeOptions {
    /// Every push must surface a visible notification. Always `true`:
    /// browsers reject silent push subscriptions.
    pub user_visible_only: bool,
    /// Decoded application server key bytes.
    pub application_server_key: Vec<u8>,
}

impl SubscribeOptions {
    /// Options for a user-visible subscription bound to `key`.
    pub fn user_visible(key: &ApplicationServerKey) -> Self {
        Self {
            user_visible_only: true,
            application_server_key: key.as_bytes().to_vec(),
        }
    }
}

/// Parsed JSON body returned by the save endpoint.
///
/// The backend's response shape is not part of any contract, so it is kept
/// as an arbitrary value and only logged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackendConfirmation(pub serde_json::Value);

impl std::fmt::Display for BackendConfirmation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// A descriptor shaped like Chrome's (FCM) output.
    pub fn descriptor(endpoint: &str) -> PushSubscription {
        PushSubscription {
            endpoint: endpoint.to_string(),
            expiration_time: None,
            keys: SubscriptionKeys {
                p256dh: "BCl1nRIpzter17Vhu8_O73GUJ-9zGm5oUxlO8twXnh55atinGUX6quUm-8Hrq__szDuawfG7WGHcU38J-he-QOs"
                    .to_string(),
                auth: base64url::encode(&[9u8; 16]),
            },
        }
    }
}
