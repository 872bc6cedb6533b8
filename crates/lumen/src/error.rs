//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with help text
//! and a stable process exit code.

use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;

use lumen_config::ConfigError;
use lumen_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach lighting server at {url}")]
    #[diagnostic(
        code(lumen::connection_failed),
        help(
            "Check that the server is running and reachable.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out after {after:?}")]
    #[diagnostic(
        code(lumen::timeout),
        help("Increase the timeout with --timeout or check server responsiveness.")
    )]
    Timeout { after: Duration },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{kind} {id} not found")]
    #[diagnostic(
        code(lumen::not_found),
        help("Check the {kind} ID against the server's configuration.")
    )]
    NotFound { kind: &'static str, id: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(lumen::api_error))]
    Api { message: String, status: Option<u16> },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(lumen::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(lumen::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: lumen config init <SERVER> --name {name}"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No lighting server configured")]
    #[diagnostic(
        code(lumen::no_config),
        help(
            "Pass --server (or set LUMEN_SERVER), or create a profile with:\n\
             lumen config init <SERVER>\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(lumen::config))]
    Config(ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(lumen::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(lumen::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to render TOML: {0}")]
    #[diagnostic(code(lumen::toml))]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::NotFound { .. }
            | Self::Api {
                status: Some(404), ..
            } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::ProfileNotFound { .. } | Self::NoConfig { .. } => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::Timeout { after } => Self::Timeout { after },
            CoreError::FixtureNotFound { id } => Self::NotFound {
                kind: "fixture",
                id: id.to_string(),
            },
            CoreError::GroupNotFound { id } => Self::NotFound {
                kind: "group",
                id: id.to_string(),
            },
            CoreError::Api { message, status } => Self::Api { message, status },
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
            other @ (CoreError::InvalidResponse { .. } | CoreError::AlreadyLive) => Self::Api {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(other),
        }
    }
}
