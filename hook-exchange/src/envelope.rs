//! Outbound webhook envelope.
//!
//! An envelope is built per dispatch and dropped once the call completes.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::error::Result;
use crate::signing::{sign, Secret};

/// Header carrying the per-dispatch identifier.
pub const HEADER_ID: &str = "WebHook-ID";

/// Header carrying the hex HMAC-SHA256 of the raw body.
pub const HEADER_SIGNATURE: &str = "WebHook-Signature";

/// Header carrying the send time as float epoch seconds (UTC).
pub const HEADER_TIMESTAMP: &str = "WebHook-Timestamp";

/// A signed outbound webhook.
///
/// `body` holds the exact bytes that were signed. They are sent as-is so the
/// receiver verifies the same bytes the signature was computed over.
#[derive(Debug, Clone)]
pub struct WebhookEnvelope {
    pub id: String,
    pub timestamp: f64,
    pub signature: String,
    pub body: Vec<u8>,
}

impl WebhookEnvelope {
    /// Serialize `body` once, sign the bytes and stamp the current time.
    pub fn seal<T: Serialize + ?Sized>(secret: &Secret, id: impl Into<String>, body: &T) -> Result<Self> {
        let body = serde_json::to_vec(body)?;
        let signature = sign(secret, &body);

        Ok(Self {
            id: id.into(),
            timestamp: epoch_seconds(),
            signature,
            body,
        })
    }

    /// Metadata headers to attach to the outbound request.
    pub fn headers(&self) -> [(&'static str, String); 3] {
        [
            (HEADER_ID, self.id.clone()),
            (HEADER_SIGNATURE, self.signature.clone()),
            (HEADER_TIMESTAMP, format_timestamp(self.timestamp)),
        ]
    }
}

/// Fresh random webhook id: 128 random bits, hex encoded.
pub fn new_webhook_id() -> String {
    let bytes: [u8; 16] = rand::random();
    hex::encode(bytes)
}

/// Render epoch seconds as a float, keeping `.0` on whole seconds.
pub fn format_timestamp(seconds: f64) -> String {
    let rendered = seconds.to_string();
    if rendered.contains('.') {
        rendered
    } else {
        format!("{rendered}.0")
    }
}

/// Current UTC time in seconds since the Unix epoch, with sub-second precision.
pub fn epoch_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
