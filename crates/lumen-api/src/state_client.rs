// HTTP client for the backend's state endpoints
//
// Wraps `reqwest::Client` with URL construction and status/body handling.
// These endpoints seed the view before the live channel delivers updates;
// the live channel itself never goes through this client.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::event::check_levels;
use crate::models::{FixtureState, GroupState, MockModeStatus};
use crate::transport::HttpConfig;

/// Raw HTTP client for fixture/group state and system status queries.
pub struct StateClient {
    http: reqwest::Client,
    base_url: Url,
    /// Request timeout the client was built with, when known.
    timeout: Option<Duration>,
}

impl StateClient {
    /// Create a new client for the server at `base_url`.
    pub fn new(base_url: Url, transport: &HttpConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            timeout: Some(transport.timeout),
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Url::parse(base_url)?;
        Ok(Self {
            http,
            base_url,
            timeout: None,
        })
    }

    /// The server base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// `GET /api/fixtures/{id}/state`
    pub async fn fixture_state(&self, fixture_id: i64) -> Result<FixtureState, Error> {
        let url = self.api_url(&format!("fixtures/{fixture_id}/state"))?;
        let state: FixtureState = self.get(url).await?;
        validate_levels(state.brightness, state.color_temp)?;
        Ok(state)
    }

    /// `GET /api/groups/{id}/state`
    pub async fn group_state(&self, group_id: i64) -> Result<GroupState, Error> {
        let url = self.api_url(&format!("groups/{group_id}/state"))?;
        let state: GroupState = self.get(url).await?;
        validate_levels(state.brightness, state.color_temp)?;
        Ok(state)
    }

    /// `GET /api/system/mock-mode`
    pub async fn mock_mode(&self) -> Result<MockModeStatus, Error> {
        let url = self.api_url("system/mock-mode")?;
        self.get(url).await
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Build `{base}/api/{path}`, keeping any path prefix on the base.
    fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/api/{path}"))?)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: error_message(&body)
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").into()),
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        match self.timeout {
            Some(after) if err.is_timeout() => Error::Timeout { after },
            _ => Error::Transport(err),
        }
    }
}

fn validate_levels(brightness: f64, color_temp: Option<u32>) -> Result<(), Error> {
    check_levels(brightness, color_temp).map_err(|reason| Error::Deserialization {
        message: reason.into(),
        body: String::new(),
    })
}

/// Pull a human-readable message out of an error body (`{"detail": ...}`
/// or `{"message": ...}`), if there is one.
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("detail")
        .or_else(|| value.get("message"))
        .and_then(serde_json::Value::as_str)
        .map(String::from)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn api_url_keeps_base_prefix() {
        let client =
            StateClient::from_reqwest("http://pi.local:8000/lights/", reqwest::Client::new())
                .unwrap();
        let url = client.api_url("fixtures/4/state").unwrap();
        assert_eq!(url.as_str(), "http://pi.local:8000/lights/api/fixtures/4/state");
    }

    #[test]
    fn error_message_prefers_detail() {
        assert_eq!(
            error_message(r#"{"detail":"Fixture not found"}"#).as_deref(),
            Some("Fixture not found")
        );
        assert_eq!(
            error_message(r#"{"message":"boom"}"#).as_deref(),
            Some("boom")
        );
        assert_eq!(error_message("<html>"), None);
    }
}
