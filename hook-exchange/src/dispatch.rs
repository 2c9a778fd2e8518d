//! Outbound webhook dispatch.
//!
//! A dispatch signs a JSON body, POSTs it to the receiver and classifies the
//! answer. It is a single attempt: nothing is retried or persisted.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header::CONTENT_TYPE, redirect, Client};
use serde_json::Value;
use tracing::{error, info, info_span, Instrument};

use crate::envelope::WebhookEnvelope;
use crate::error::{DeliveryError, Result};
use crate::signing::Secret;

/// Decoded body of the receiver's response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
}

impl ResponseBody {
    fn from_bytes(bytes: &[u8]) -> Self {
        match serde_json::from_slice(bytes) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Text(String::from_utf8_lossy(bytes).into_owned()),
        }
    }
}

/// Result of a successful dispatch.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub status: u16,
    pub body: ResponseBody,
}

/// `true` when the status class is above 3xx.
pub fn is_delivery_failure(status: u16) -> bool {
    status / 100 > 3
}

/// Sends signed webhooks to remote receivers.
///
/// Cheap to clone: the HTTP client and the secret are shared.
#[derive(Clone)]
pub struct Dispatcher {
    client: Client,
    secret: Arc<Secret>,
}

impl Dispatcher {
    /// Build a dispatcher. `timeout` of `None` leaves outbound calls unbounded.
    pub fn new(secret: Arc<Secret>, timeout: Option<Duration>) -> Result<Self> {
        // 3xx answers are classified, not followed
        let mut builder = Client::builder().redirect(redirect::Policy::none());
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            secret,
        })
    }

    /// Deliver `body` to `url` once and classify the response.
    pub async fn dispatch(&self, body: &Value, id: &str, url: &str) -> Result<DispatchOutcome> {
        let envelope = WebhookEnvelope::seal(&self.secret, id, body)?;

        info!(
            url = url,
            body_length = envelope.body.len(),
            timestamp = envelope.timestamp,
            "dispatch_starting"
        );

        let mut request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json");

        for (name, value) in envelope.headers() {
            request = request.header(name, value);
        }

        let response = request.body(envelope.body).send().await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;
        let body = ResponseBody::from_bytes(&bytes);

        match &body {
            ResponseBody::Json(value) => {
                info!(status_code = status, response = %value, "dispatch_response")
            }
            ResponseBody::Text(text) => {
                info!(status_code = status, response = %text, "dispatch_response")
            }
        }

        if is_delivery_failure(status) {
            return Err(DeliveryError::Status { status });
        }

        Ok(DispatchOutcome { status, body })
    }

    /// Run [`dispatch`](Self::dispatch) as a detached task.
    ///
    /// The caller gets no handle; the outcome is only reported through logs.
    pub fn spawn(&self, body: Value, id: String, url: String) {
        let dispatcher = self.clone();
        let span = info_span!("webhook_dispatch", webhook_id = %id, url = %url);

        tokio::spawn(
            async move {
                match dispatcher.dispatch(&body, &id, &url).await {
                    Ok(outcome) => {
                        info!(status_code = outcome.status, "dispatch_delivered");
                    }
                    Err(e) => {
                        error!(
                            error = %e,
                            status_code = e.status(),
                            timeout = e.is_timeout(),
                            "dispatch_failed"
                        );
                    }
                }
            }
            .instrument(span),
        );
    }
}
