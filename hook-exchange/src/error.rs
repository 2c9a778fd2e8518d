//! Webhook errors.
//!
//! Inbound origin and signature rejections are not errors; see
//! [`crate::web::Verdict`].

use thiserror::Error;

/// Why a single dispatch attempt failed.
///
/// Only ever observed in logs: the dispatch runs detached from the request
/// that triggered it.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("failed to serialize webhook body: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("webhook request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("webhook rejected by receiver with status {status}")]
    Status { status: u16 },
}

impl DeliveryError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, DeliveryError::Network(e) if e.is_timeout())
    }

    /// Status code returned by the receiver, if it answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            DeliveryError::Status { status } => Some(*status),
            _ => None,
        }
    }
}

/// An accepted inbound body that is not JSON.
///
/// Logged only: the caller still receives `{"message":"ok"}`.
#[derive(Debug, Error)]
#[error("malformed webhook payload: {0}")]
pub struct MalformedPayload(#[from] serde_json::Error);

pub type Result<T> = std::result::Result<T, DeliveryError>;
