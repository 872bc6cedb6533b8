// HTTP transport configuration for the state endpoints.
//
// The live channel has its own transport abstraction in `live::transport`;
// this module only builds the `reqwest::Client` used by `StateClient`.

use std::time::Duration;

use crate::error::Error;

const USER_AGENT: &str = concat!("lumen/", env!("CARGO_PKG_VERSION"));

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

impl HttpConfig {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::HttpClient(format!("failed to build HTTP client: {e}")))
    }
}
