//! CLI configuration: profile resolution with `GlobalOpts` flag overrides
//! (--server, --live-path, --timeout) layered over `lumen_config`, and the
//! `[defaults]` output/color settings for flags left unset.

use clap::ValueEnum;
use lumen_config::{Config, Defaults, Profile};
use lumen_core::ServerConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Fill `--output` and `--color` from `[defaults]` when not given.
pub fn apply_display_defaults(global: &mut GlobalOpts, defaults: &Defaults) -> Result<(), CliError> {
    if global.output.is_none() {
        global.output = Some(parse_setting("defaults.output", &defaults.output)?);
    }
    if global.color.is_none() {
        global.color = Some(parse_setting("defaults.color", &defaults.color)?);
    }
    Ok(())
}

fn parse_setting<T: ValueEnum>(field: &str, raw: &str) -> Result<T, CliError> {
    <T as ValueEnum>::from_str(raw, true).map_err(|reason| CliError::Validation {
        field: field.into(),
        reason,
    })
}

/// Resolve the server to talk to from the loaded config and CLI flags.
///
/// Flag values win over profile values. `--server` alone is enough to run
/// without a config file.
pub fn resolve_server_config(global: &GlobalOpts, cfg: &Config) -> Result<ServerConfig, CliError> {
    let name = cfg.active_profile_name(global.profile.as_deref());

    // A named profile must exist, even when --server is also given.
    if global.profile.is_some() && !cfg.profiles.contains_key(&name) {
        return Err(profile_not_found(name, cfg));
    }

    let mut profile = match (cfg.profiles.get(&name), &global.server) {
        (Some(profile), _) => profile.clone(),
        (None, Some(server)) => Profile::new(server.clone()),
        (None, None) => {
            return Err(CliError::NoConfig {
                path: lumen_config::config_path().display().to_string(),
            });
        }
    };

    apply_overrides(&mut profile, global);
    Ok(lumen_config::profile_to_server_config(
        &profile,
        &cfg.defaults,
    )?)
}

fn apply_overrides(profile: &mut Profile, global: &GlobalOpts) {
    if let Some(ref server) = global.server {
        profile.server.clone_from(server);
    }
    if let Some(ref path) = global.live_path {
        profile.live_path = Some(path.clone());
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
}

fn profile_not_found(name: String, cfg: &Config) -> CliError {
    let available = if cfg.profiles.is_empty() {
        "(none)".to_string()
    } else {
        cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    };
    CliError::ProfileNotFound { name, available }
}
