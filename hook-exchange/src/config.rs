//! Configuration module for environment variable parsing.

use std::env;
use std::sync::Arc;

use tracing::warn;
use url::Url;

use crate::signing::Secret;

const DEFAULT_SECRET: &str = "SUPER-SECRET";
const DEFAULT_ALLOWED_ORIGINS: &[&str] = &["localhost", "127.0.0.1"];
const DEFAULT_TRIGGER_TARGET_URL: &str = "http://localhost:8000/webhook";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Shared HMAC key for inbound verification and outbound signing
    pub webhook_secret: Arc<Secret>,

    /// Peer addresses allowed to call the inbound webhook endpoint
    pub allowed_origins: Vec<String>,

    /// Receiver URL used by the trigger endpoint
    pub trigger_target_url: String,

    /// Outbound request timeout in milliseconds. `None` means no timeout.
    pub dispatch_timeout_ms: Option<u64>,

    /// Delay between pings on the streaming endpoint
    pub ws_ping_interval_ms: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let webhook_secret = match env::var("WEBHOOK_SECRET") {
            Ok(v) if !v.is_empty() => v,
            _ => {
                warn!("webhook_secret_not_configured_using_default");
                DEFAULT_SECRET.to_string()
            }
        };

        Config {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),

            webhook_secret: Arc::new(Secret::new(webhook_secret)),

            allowed_origins: parse_csv("ALLOWED_ORIGINS")
                .filter(|list| !list.is_empty())
                .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.iter().map(|s| s.to_string()).collect()),

            trigger_target_url: parse_url("TRIGGER_TARGET_URL", DEFAULT_TRIGGER_TARGET_URL),

            dispatch_timeout_ms: env::var("DISPATCH_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&ms| ms > 0),

            ws_ping_interval_ms: env::var("WS_PING_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1000),
        }
    }
}

/// Parse a comma-separated list of strings.
fn parse_csv(name: &str) -> Option<Vec<String>> {
    env::var(name).ok().map(|raw| {
        raw.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}

/// Read an absolute http(s) URL, falling back to `default` when unset or invalid.
fn parse_url(name: &str, default: &str) -> String {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default.to_string(),
    };

    match Url::parse(raw.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => url.to_string(),
        _ => {
            warn!(env_var = name, value = %raw, "Invalid URL, using default");
            default.to_string()
        }
    }
}
