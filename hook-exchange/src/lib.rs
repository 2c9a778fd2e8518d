//! Hook Exchange - signed webhook sender and receiver.
//!
//! ## Architecture
//!
//! ```text
//! caller → /webhook → origin check → signature check → payload log
//! caller → /trigger → detached task → Dispatcher → remote receiver
//! ```
//!
//! Both directions sign the raw body with HMAC-SHA256 under one shared secret.

pub mod config;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod signing;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use dispatch::{is_delivery_failure, DispatchOutcome, Dispatcher, ResponseBody};
pub use envelope::{new_webhook_id, WebhookEnvelope};
pub use error::{DeliveryError, MalformedPayload};
pub use signing::{sign, verify, Secret};
pub use web::{router, AppState, Verdict};
