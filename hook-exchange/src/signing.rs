//! Webhook body signing.
//!
//! Both directions of the exchange sign the raw body bytes with HMAC-SHA256
//! and transport the lowercase hex digest in the `WebHook-Signature` header.

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Shared HMAC key.
///
/// Loaded once at startup and handed to the verifier and the dispatcher.
/// `Debug` and `Display` never print the key material.
pub struct Secret {
    inner: Vec<u8>,
}

impl Secret {
    pub fn new(value: impl Into<Vec<u8>>) -> Self {
        Self {
            inner: value.into(),
        }
    }

    /// Raw key bytes. Never log the returned value.
    pub fn expose_secret(&self) -> &[u8] {
        &self.inner
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Compute the signature of `body`: HMAC-SHA256 keyed by `secret`, lowercase hex.
pub fn sign(secret: &Secret, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.expose_secret())
        .expect("HMAC can accept keys of any size");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Check `signature` against the signature of `body`.
///
/// The comparison goes through `subtle::ConstantTimeEq`, so the time taken
/// does not depend on where the first differing byte sits.
pub fn verify(signature: &str, body: &[u8], secret: &Secret) -> bool {
    let expected = sign(secret, body);
    expected.as_bytes().ct_eq(signature.as_bytes()).into()
}
