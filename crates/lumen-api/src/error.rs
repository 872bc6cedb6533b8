use std::time::Duration;

use thiserror::Error;

/// Top-level error type for the `lumen-api` crate.
///
/// Covers the HTTP state endpoints, endpoint derivation, and the WebSocket
/// transport. The live channel never returns these to its owner; they are
/// logged and folded into the reconnect cycle. `lumen-core` maps them into
/// user-facing variants.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The server origin cannot be turned into a live-channel address.
    #[error("Invalid server origin {origin}: {reason}")]
    InvalidOrigin { origin: String, reason: String },

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// A request or live-channel connect attempt did not finish in time.
    #[error("Timed out after {after:?}")]
    Timeout { after: Duration },

    // ── HTTP API ────────────────────────────────────────────────────
    /// Non-success status from a state endpoint.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── WebSocket ───────────────────────────────────────────────────
    /// WebSocket connection could not be established.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    /// The open WebSocket broke while reading.
    #[error("WebSocket read failed: {0}")]
    WebSocketRead(String),

    /// Writing a frame to the WebSocket failed.
    #[error("WebSocket send failed: {0}")]
    WebSocketSend(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status >= 500,
            Self::Timeout { .. }
            | Self::WebSocketConnect(_)
            | Self::WebSocketRead(_)
            | Self::WebSocketSend(_) => true,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            _ => false,
        }
    }
}
