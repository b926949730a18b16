//! Password token derivation for the identity provider.
//!
//! The platform's login page derives the `pwd` form field client-side as
//! `base64("{ts}*{hex(password)}")`. This must match byte-for-byte or the
//! identity provider rejects the login.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Derive the obfuscated password token for a login attempt.
///
/// `timestamp_millis` must be the same value sent in the `ts` form field.
pub fn encode(password: &str, timestamp_millis: i64) -> String {
    let raw = format!("{timestamp_millis}*{}", hex::encode(password.as_bytes()));
    STANDARD.encode(raw.as_bytes())
}
