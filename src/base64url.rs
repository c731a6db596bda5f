//! Base64url decoding for server-issued keys.
//!
//! Push services hand out keys as URL-safe base64 without padding. The
//! decoder restores the padding (`(4 - len % 4) % 4` `=` characters), maps
//! `-`/`_` back to `+`/`/` and runs a standard-alphabet decode, so inputs
//! that already use the standard alphabet are accepted as well.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, URL_SAFE_NO_PAD as BASE64URL};
use base64::engine::DecodePaddingMode;
use base64::Engine;

use crate::error::DecodeError;

/// Standard alphabet, canonical padding, non-zero trailing bits tolerated
/// (browsers' `atob` ignores them too).
const STANDARD_PADDED: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::RequireCanonical)
        .with_decode_allow_trailing_bits(true),
);

/// Number of `=` characters needed to pad `len` characters to a multiple of 4.
fn padding_len(len: usize) -> usize {
    (4 - len % 4) % 4
}

/// Decode an unpadded base64url string into raw bytes.
pub fn decode(input: &str) -> Result<Vec<u8>, DecodeError> {
    let padding = padding_len(input.len());

    let mut standard = String::with_capacity(input.len() + padding);
    standard.extend(input.chars().map(|c| match c {
        '-' => '+',
        '_' => '/',
        other => other,
    }));
    standard.extend(std::iter::repeat('=').take(padding));

    Ok(STANDARD_PADDED.decode(standard)?)
}

/// Encode bytes as unpadded base64url (the platform's key field format).
pub fn encode(bytes: &[u8]) -> String {
    BASE64URL.encode(bytes)
}
