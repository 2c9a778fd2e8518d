//! Inbound webhook verification.
//!
//! A request is accepted only when the peer address is allow-listed and the
//! `WebHook-Signature` header matches the raw body. The checks run in that
//! order and the first failure decides the verdict.

use std::net::IpAddr;

use axum::http::HeaderMap;
use serde_json::Value;
use tracing::{info, warn};

use crate::envelope::HEADER_SIGNATURE;
use crate::error::MalformedPayload;
use crate::signing::{verify, Secret};

/// Outcome of checking an inbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    ForbiddenOrigin,
    InvalidSignature,
}

/// Whether `peer` appears in the allow-list.
///
/// IPv4-mapped IPv6 peers are compared in their IPv4 form.
pub fn verify_origin(allowed: &[String], peer: IpAddr) -> bool {
    let peer = peer.to_canonical().to_string();
    allowed.iter().any(|a| *a == peer)
}

/// Run the origin and signature checks for one request.
pub fn verify_request(
    allowed: &[String],
    secret: &Secret,
    peer: IpAddr,
    headers: &HeaderMap,
    body: &[u8],
) -> Verdict {
    if !verify_origin(allowed, peer) {
        warn!(peer = %peer, "webhook_invalid_origin");
        return Verdict::ForbiddenOrigin;
    }

    let signature = headers
        .get(HEADER_SIGNATURE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if !verify(signature, body, secret) {
        warn!(
            peer = %peer,
            has_signature = !signature.is_empty(),
            signature_length = signature.len(),
            "webhook_signature_invalid"
        );
        return Verdict::InvalidSignature;
    }

    Verdict::Accepted
}

/// Decode an accepted body and hand it on.
///
/// A body that is not JSON yields [`MalformedPayload`], which is logged here
/// and does not change the response the caller gets.
pub fn process_payload(body: &[u8]) -> Result<Value, MalformedPayload> {
    match serde_json::from_slice::<Value>(body) {
        Ok(payload) => {
            info!(payload = %payload, "webhook_payload_received");
            Ok(payload)
        }
        Err(e) => {
            let err = MalformedPayload::from(e);
            warn!(error = %err, body_length = body.len(), "webhook_payload_invalid_json");
            Err(err)
        }
    }
}
