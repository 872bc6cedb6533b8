// ── Runtime server configuration ──
//
// Describes *where* the lighting backend lives and how the live channel
// should behave. Never touches disk; the CLI builds one from a profile
// and hands it in.

use std::time::Duration;

use url::Url;

use lumen_api::endpoint::{DEFAULT_LIVE_PATH, live_url};
use lumen_api::{HttpConfig, LiveConfig};

use crate::error::CoreError;

/// Configuration for talking to one lighting backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// HTTP origin of the backend (e.g., `http://lights.local:8000`).
    pub origin: Url,
    /// Path of the live event stream on that origin.
    pub live_path: String,
    /// Live-channel ping period.
    pub keepalive_interval: Duration,
    /// Live-channel reconnect delay.
    pub retry_delay: Duration,
    /// HTTP request timeout. Also bounds each live-channel connect attempt.
    pub timeout: Duration,
}

impl ServerConfig {
    pub fn new(origin: Url) -> Self {
        Self {
            origin,
            live_path: DEFAULT_LIVE_PATH.into(),
            keepalive_interval: LiveConfig::DEFAULT_KEEPALIVE_INTERVAL,
            retry_delay: LiveConfig::DEFAULT_RETRY_DELAY,
            timeout: Duration::from_secs(30),
        }
    }

    /// Live-channel settings derived from this server.
    pub fn live_config(&self) -> Result<LiveConfig, CoreError> {
        let url = live_url(&self.origin, &self.live_path)?;
        Ok(LiveConfig::new(url)
            .with_connect_timeout(self.timeout)
            .with_keepalive_interval(self.keepalive_interval)
            .with_retry_delay(self.retry_delay))
    }

    pub fn http_config(&self) -> HttpConfig {
        HttpConfig::with_timeout(self.timeout)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_live_channel() {
        let config = ServerConfig::new(Url::parse("http://pi:8000").unwrap());
        assert_eq!(config.live_path, "/ws");
        assert_eq!(config.keepalive_interval, Duration::from_secs(30));
        assert_eq!(config.retry_delay, Duration::from_secs(3));
    }

    #[test]
    fn live_config_uses_custom_path_and_timing() {
        let mut config = ServerConfig::new(Url::parse("https://lights.example").unwrap());
        config.live_path = "/api/live".into();
        config.retry_delay = Duration::from_secs(5);
        config.timeout = Duration::from_secs(12);

        let live = config.live_config().unwrap();
        assert_eq!(live.url.as_str(), "wss://lights.example/api/live");
        assert_eq!(live.retry_delay, Duration::from_secs(5));
        assert_eq!(live.connect_timeout, Duration::from_secs(12));
        assert_eq!(live.keepalive_interval, Duration::from_secs(30));
    }

    #[test]
    fn unsupported_origin_is_a_config_error() {
        let config = ServerConfig::new(Url::parse("ftp://lights.example").unwrap());
        assert!(matches!(
            config.live_config(),
            Err(CoreError::Config { .. })
        ));
    }
}
