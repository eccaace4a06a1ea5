//! Best-effort peek at an access token's expiry.
//!
//! Access tokens are JWTs: `header.payload.signature`, each part
//! base64url-encoded. We decode the payload and read its `exp` claim
//! (seconds since the Unix epoch) without verifying the signature.
//!
//! The result is only a scheduling hint: "refresh now rather than wait for
//! a 401". The server remains the one that decides whether a token is
//! valid. Every decoding failure yields `None` ("expiry unknown") and the
//! caller falls back to reacting to 401 responses.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde::Deserialize;

/// base64url that accepts the payload with or without `=` padding.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Deserialize)]
struct ExpiryClaim {
    exp: Option<f64>,
}

/// Returns the instant encoded in the token's `exp` claim.
///
/// `None` if the token is not three dot-separated parts, the payload is not
/// base64url JSON, or `exp` is missing or not a number.
pub fn expiry(token: &str) -> Option<SystemTime> {
    let mut parts = token.split('.');
    let (Some(_), Some(payload), Some(_), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return None;
    };

    let bytes = PAYLOAD_ENGINE.decode(payload).ok()?;
    let claim: ExpiryClaim = serde_json::from_slice(&bytes).ok()?;
    let exp = Duration::try_from_secs_f64(claim.exp?).ok()?;
    UNIX_EPOCH.checked_add(exp)
}

/// `true` if the token's expiry is known and falls at or before
/// `now + margin`.
///
/// Unknown expiry is never a reason to refresh.
pub fn needs_refresh(token: &str, now: SystemTime, margin: Duration) -> bool {
    match expiry(token) {
        Some(exp) => exp <= now + margin,
        None => false,
    }
}
