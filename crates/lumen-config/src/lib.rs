//! Configuration for the lumen CLI.
//!
//! TOML profiles, figment loading (defaults → file → `LUMEN_` environment),
//! and translation to `lumen_core::ServerConfig`. The CLI layers its own
//! flag overrides on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use lumen_core::ServerConfig;

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "LUMEN_CONFIG";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named on the command line.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named server profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use: the explicit one, else the configured
    /// default, else `"default"`.
    pub fn active_profile_name(&self, explicit: Option<&str>) -> String {
        explicit
            .map(String::from)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound { name: name.into() })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// HTTP timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named lighting-server profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Server origin (e.g., "http://lights.local:8000").
    pub server: String,

    /// Live event stream path. Defaults to "/ws".
    pub live_path: Option<String>,

    /// Ping period on the live channel, in seconds.
    pub keepalive_secs: Option<u64>,

    /// Delay before each live-channel reconnect, in seconds.
    pub retry_delay_secs: Option<u64>,

    /// Override the default HTTP timeout.
    pub timeout: Option<u64>,
}

impl Profile {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            live_path: None,
            keepalive_secs: None,
            retry_delay_secs: None,
            timeout: None,
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `$LUMEN_CONFIG`, else the platform
/// config directory.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("com", "lumen", "lumen").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("lumen");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + environment. A missing file is not an error.
///
/// Environment keys nest with a double underscore, e.g.
/// `LUMEN_DEFAULTS__TIMEOUT=10` or `LUMEN_PROFILES__HOME__SERVER=...`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("LUMEN_").split("__"));

    Ok(figment.extract()?)
}

/// Load the canonical file alone, without environment overrides.
pub fn load_config_file() -> Result<Config, ConfigError> {
    load_file_from(&config_path())
}

/// Load `path` over the built-in defaults, ignoring the environment. This
/// is what gets edited and saved back. A missing file is not an error.
pub fn load_file_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path));

    Ok(figment.extract()?)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to the canonical path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Profile → runtime config ────────────────────────────────────────

/// Build a `ServerConfig` from a profile and the global defaults.
pub fn profile_to_server_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<ServerConfig, ConfigError> {
    let origin: url::Url = profile
        .server
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "server".into(),
            reason: format!("invalid URL: {}", profile.server),
        })?;

    let mut config = ServerConfig::new(origin);

    if let Some(ref path) = profile.live_path {
        if !path.starts_with('/') {
            return Err(ConfigError::Validation {
                field: "live_path".into(),
                reason: format!("must start with '/', got '{path}'"),
            });
        }
        config.live_path.clone_from(path);
    }
    if let Some(secs) = profile.keepalive_secs {
        config.keepalive_interval = positive_secs("keepalive_secs", secs)?;
    }
    if let Some(secs) = profile.retry_delay_secs {
        config.retry_delay = positive_secs("retry_delay_secs", secs)?;
    }
    config.timeout = positive_secs("timeout", profile.timeout.unwrap_or(defaults.timeout))?;

    Ok(config)
}

fn positive_secs(field: &str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: "must be at least 1 second".into(),
        });
    }
    Ok(Duration::from_secs(secs))
}
