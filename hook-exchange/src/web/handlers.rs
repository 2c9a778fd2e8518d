//! HTTP endpoint handlers.
//!
//! Inbound rejections all answer 403 with the same `{"message":"ko"}` body;
//! which check failed is only visible in the logs.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::dispatch::Dispatcher;
use crate::envelope::new_webhook_id;
use crate::error::Result;
use crate::web::verify::{process_payload, verify_request, Verdict};
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let timeout = config
            .dispatch_timeout_ms
            .map(std::time::Duration::from_millis);
        let dispatcher = Dispatcher::new(Arc::clone(&config.webhook_secret), timeout)?;

        Ok(Self {
            config: Arc::new(config),
            dispatcher,
        })
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "OK" })
}

// =============================================================================
// Trigger
// =============================================================================

/// Body shape shared by the trigger and webhook endpoints.
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Schedule one outbound webhook and answer straight away.
///
/// The dispatch outcome never reaches this response.
pub async fn trigger(State(state): State<AppState>) -> Json<MessageResponse> {
    let id = new_webhook_id();
    let url = state.config.trigger_target_url.clone();

    info!(webhook_id = %id, url = %url, "trigger_received");

    state
        .dispatcher
        .spawn(json!({"data": "Some data"}), id, url);

    Json(MessageResponse {
        message: "triggering webhook",
    })
}

// =============================================================================
// Inbound Webhook
// =============================================================================

/// Inbound webhook endpoint.
///
/// This endpoint:
/// 1. Checks the peer address against the allow-list
/// 2. Verifies `WebHook-Signature` over the raw body
/// 3. Decodes and logs the JSON payload
///
/// A body that fails to decode still answers 200.
pub async fn incoming_webhook(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    info!(peer = %peer, body_length = body.len(), "webhook_received");

    let verdict = verify_request(
        &state.config.allowed_origins,
        &state.config.webhook_secret,
        peer.ip(),
        &headers,
        &body,
    );

    match verdict {
        Verdict::Accepted => {
            // Malformed bodies are already logged and still answer ok
            let _ = process_payload(&body);
            (StatusCode::OK, Json(MessageResponse { message: "ok" }))
        }
        Verdict::ForbiddenOrigin | Verdict::InvalidSignature => {
            (StatusCode::FORBIDDEN, Json(MessageResponse { message: "ko" }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::{sign, verify, Secret};
    use crate::web::router;
    use axum::{body::Body, http::Request, Router};
    use serde_json::Value;
    use std::time::Duration;
    use tower::ServiceExt;
    use wiremock::{matchers::method, Mock, MockServer, ResponseTemplate};

    const SECRET: &str = "SUPER-SECRET";

    fn test_config(target: &str) -> Config {
        Config {
            port: 0,
            webhook_secret: Arc::new(Secret::new(SECRET)),
            allowed_origins: vec!["localhost".to_string(), "127.0.0.1".to_string()],
            trigger_target_url: target.to_string(),
            dispatch_timeout_ms: None,
            ws_ping_interval_ms: 1000,
        }
    }

    fn app(target: &str) -> Router {
        router(AppState::new(test_config(target)).unwrap())
    }

    fn webhook_request(peer: [u8; 4], signature: Option<&str>, body: &'static [u8]) -> Request<Body> {
        let mut builder = Request::builder().method("POST").uri("/webhook");
        if let Some(signature) = signature {
            builder = builder.header("WebHook-Signature", signature);
        }
        let mut request = builder.body(Body::from(body)).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from((peer, 40000))));
        request
    }

    async fn read_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder()
            .uri("/healthz")
            .body(Body::empty())
            .unwrap();

        let response = app("http://127.0.0.1:9/webhook").oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await, json!({"status": "OK"}));
    }

    #[tokio::test]
    async fn test_webhook_accepts_signed_json() {
        let body = br#"{"data":"Some data"}"#;
        let signature = sign(&Secret::new(SECRET), body);

        let response = app("http://127.0.0.1:9/webhook")
            .oneshot(webhook_request([127, 0, 0, 1], Some(signature.as_str()), body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await, json!({"message": "ok"}));
    }

    #[tokio::test]
    async fn test_webhook_accepts_signed_non_json() {
        let body = b"this is not json";
        let signature = sign(&Secret::new(SECRET), body);

        let response = app("http://127.0.0.1:9/webhook")
            .oneshot(webhook_request([127, 0, 0, 1], Some(signature.as_str()), body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await, json!({"message": "ok"}));
    }

    #[tokio::test]
    async fn test_webhook_rejects_foreign_origin_with_valid_signature() {
        let body = br#"{"data":"Some data"}"#;
        let signature = sign(&Secret::new(SECRET), body);

        let response = app("http://127.0.0.1:9/webhook")
            .oneshot(webhook_request([203, 0, 113, 5], Some(signature.as_str()), body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(read_json(response).await, json!({"message": "ko"}));
    }

    #[tokio::test]
    async fn test_webhook_rejects_missing_signature() {
        let response = app("http://127.0.0.1:9/webhook")
            .oneshot(webhook_request([127, 0, 0, 1], None, b"{}"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(read_json(response).await, json!({"message": "ko"}));
    }

    #[tokio::test]
    async fn test_webhook_rejects_wrong_signature() {
        let body = br#"{"data":"Some data"}"#;
        let signature = sign(&Secret::new("not-the-secret"), body);

        let response = app("http://127.0.0.1:9/webhook")
            .oneshot(webhook_request([127, 0, 0, 1], Some(signature.as_str()), body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(read_json(response).await, json!({"message": "ko"}));
    }

    #[tokio::test]
    async fn test_webhook_accepts_get() {
        let signature = sign(&Secret::new(SECRET), b"");
        let mut request = Request::builder()
            .method("GET")
            .uri("/webhook")
            .header("WebHook-Signature", signature)
            .body(Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));

        let response = app("http://127.0.0.1:9/webhook").oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_trigger_does_not_wait_for_dispatch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_delay(Duration::from_secs(30)))
            .mount(&server)
            .await;

        let request = Request::builder()
            .uri("/trigger")
            .body(Body::empty())
            .unwrap();

        let response = tokio::time::timeout(
            Duration::from_secs(2),
            app(&format!("{}/webhook", server.uri())).oneshot(request),
        )
        .await
        .expect("trigger blocked on the outbound call")
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            read_json(response).await,
            json!({"message": "triggering webhook"})
        );
    }

    #[tokio::test]
    async fn test_trigger_dispatches_signed_sample_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
            .mount(&server)
            .await;

        let request = Request::builder()
            .uri("/trigger")
            .body(Body::empty())
            .unwrap();
        let response = app(&format!("{}/webhook", server.uri()))
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let mut received = Vec::new();
        for _ in 0..100 {
            received = server.received_requests().await.unwrap_or_default();
            if !received.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        assert_eq!(received.len(), 1);
        let request = &received[0];
        assert_eq!(request.url.path(), "/webhook");

        let body: Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(body, json!({"data": "Some data"}));

        let signature = request
            .headers
            .get("webhook-signature")
            .and_then(|v| v.to_str().ok())
            .unwrap();
        assert!(verify(signature, &request.body, &Secret::new(SECRET)));

        let id = request
            .headers
            .get("webhook-id")
            .and_then(|v| v.to_str().ok())
            .unwrap();
        assert_eq!(id.len(), 32);
    }
}
