//! Streaming ping endpoint.
//!
//! Sends `"ping"`, logs whatever text comes back, waits and repeats until the
//! peer goes away. Nothing here touches signing or verification.

use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use tokio::time::sleep;
use tracing::{debug, info};

use crate::web::AppState;

/// Upgrade to a websocket and run the ping loop.
pub async fn ws_endpoint(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let interval = Duration::from_millis(state.config.ws_ping_interval_ms);
    ws.on_upgrade(move |socket| ping_loop(socket, interval))
}

async fn ping_loop(mut socket: WebSocket, interval: Duration) {
    info!("ws_opened");

    loop {
        if let Err(e) = socket.send(Message::Text("ping".to_string())).await {
            debug!(error = %e, "ws_send_failed");
            break;
        }

        match socket.recv().await {
            Some(Ok(Message::Text(text))) => info!(text = %text, "ws_message_received"),
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                debug!(error = %e, "ws_receive_failed");
                break;
            }
        }

        sleep(interval).await;
    }

    info!("ws_closed");
    // The peer may already be gone
    let _ = socket.send(Message::Close(None)).await;
}
