//! Application server key (VAPID public key, RFC 8292).
//!
//! The backend signs its pushes with a P-256 keypair; the browser needs the
//! public half as `applicationServerKey` when subscribing. The key is decoded
//! and validated once at startup and then shared read-only.

use std::sync::Arc;

use p256::PublicKey;

use crate::base64url;
use crate::error::SubscriptionError;

/// Decoded, validated application server public key.
///
/// Holds the uncompressed SEC1 point (65 bytes: `0x04 || x || y`) alongside
/// the base64url string it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApplicationServerKey {
    encoded: String,
    bytes: Arc<[u8]>,
}

impl ApplicationServerKey {
    /// Length of an uncompressed P-256 point.
    pub const LEN: usize = 65;

    /// Decode and validate a base64url-encoded public key.
    ///
    /// Rejects anything that is not a 65-byte uncompressed point on P-256, so
    /// a bad key fails at startup instead of inside the push service.
    pub fn from_base64url(encoded: &str) -> Result<Self, SubscriptionError> {
        let bytes = base64url::decode(encoded)
            .map_err(|e| SubscriptionError::InvalidKey(e.to_string()))?;

        if bytes.len() != Self::LEN || bytes[0] != 0x04 {
            return Err(SubscriptionError::InvalidKey(format!(
                "expected {}-byte uncompressed P-256 point, got {} bytes",
                Self::LEN,
                bytes.len()
            )));
        }

        PublicKey::from_sec1_bytes(&bytes)
            .map_err(|e| SubscriptionError::InvalidKey(format!("not a P-256 point: {e}")))?;

        Ok(Self {
            encoded: encoded.to_string(),
            bytes: bytes.into(),
        })
    }

    /// Raw key bytes, as passed to the push manager.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The base64url form this key was parsed from.
    pub fn as_base64url(&self) -> &str {
        &self.encoded
    }
}
