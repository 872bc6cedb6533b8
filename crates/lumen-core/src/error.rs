// ── Core error types ──
//
// User-facing errors from lumen-core. Consumers never see raw HTTP status
// codes or JSON parse failures; the `From<lumen_api::Error>` impl translates
// transport-layer errors into domain variants.

use std::time::Duration;

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach lighting server at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out after {after:?}")]
    Timeout { after: Duration },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Fixture not found: {id}")]
    FixtureNotFound { id: i64 },

    #[error("Group not found: {id}")]
    GroupNotFound { id: i64 },

    #[error("Unexpected response from server: {message}")]
    InvalidResponse { message: String },

    // ── Session errors ───────────────────────────────────────────────
    #[error("Live channel is already running")]
    AlreadyLive,

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<lumen_api::Error> for CoreError {
    fn from(err: lumen_api::Error) -> Self {
        match err {
            lumen_api::Error::Transport(ref e) => {
                if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e.url().map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            lumen_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            lumen_api::Error::InvalidOrigin { origin, reason } => CoreError::Config {
                message: format!("Invalid server origin {origin}: {reason}"),
            },
            lumen_api::Error::HttpClient(message) => CoreError::Config { message },
            lumen_api::Error::Timeout { after } => CoreError::Timeout { after },
            lumen_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            lumen_api::Error::WebSocketConnect(reason)
            | lumen_api::Error::WebSocketRead(reason)
            | lumen_api::Error::WebSocketSend(reason) => CoreError::ConnectionFailed {
                url: "live channel".into(),
                reason,
            },
            lumen_api::Error::Deserialization { message, .. } => {
                CoreError::InvalidResponse { message }
            }
        }
    }
}

impl CoreError {
    /// Map a not-found API error for `fixture_id` to the fixture variant.
    pub(crate) fn for_fixture(err: lumen_api::Error, fixture_id: i64) -> Self {
        if err.is_not_found() {
            Self::FixtureNotFound { id: fixture_id }
        } else {
            err.into()
        }
    }

    pub(crate) fn for_group(err: lumen_api::Error, group_id: i64) -> Self {
        if err.is_not_found() {
            Self::GroupNotFound { id: group_id }
        } else {
            err.into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_not_found_maps_to_fixture() {
        let err = lumen_api::Error::Api {
            status: 404,
            message: "missing".into(),
        };
        assert!(matches!(
            CoreError::for_fixture(err, 12),
            CoreError::FixtureNotFound { id: 12 }
        ));
    }

    #[test]
    fn timeout_keeps_the_configured_limit() {
        let err = lumen_api::Error::Timeout {
            after: Duration::from_secs(5),
        };
        let core: CoreError = err.into();
        assert!(matches!(core, CoreError::Timeout { after } if after == Duration::from_secs(5)));
        assert_eq!(core.to_string(), "Request timed out after 5s");
    }

    #[test]
    fn origin_errors_are_config_errors() {
        let err = lumen_api::Error::InvalidOrigin {
            origin: "ftp://x".into(),
            reason: "unsupported scheme 'ftp'".into(),
        };
        let core: CoreError = err.into();
        assert!(matches!(core, CoreError::Config { .. }));
    }
}
