//! Web server module.
//!
//! This module provides:
//! - `/webhook`: verified inbound webhooks (origin allow-list + HMAC signature)
//! - `/trigger`: fires one signed outbound webhook in the background
//! - `/healthz`: liveness check
//! - `/ws`: ping/pong websocket

pub mod handlers;
pub mod verify;
pub mod ws;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

pub use handlers::{
    health, incoming_webhook, trigger, AppState, HealthResponse, MessageResponse,
};
pub use verify::{process_payload, verify_origin, verify_request, Verdict};
pub use ws::ws_endpoint;

/// Build the application router.
///
/// Serve with `into_make_service_with_connect_info::<SocketAddr>()` so the
/// webhook handler can see the peer address.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/trigger", get(trigger))
        .route("/webhook", get(incoming_webhook).post(incoming_webhook))
        .route("/ws", get(ws_endpoint))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
