//! Config subcommand handlers.

use lumen_config::{Config, Profile};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let cfg = lumen_config::load_config()?;
            let mut global = global.clone();
            config::apply_display_defaults(&mut global, &cfg.defaults)?;
            let out = match global.output_format() {
                OutputFormat::Table | OutputFormat::Plain => toml::to_string_pretty(&cfg)?,
                format => output::render_single(format, &cfg, |_| String::new(), |_| String::new())?,
            };
            output::print_output(out.trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&lumen_config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Init {
            server,
            name,
            force,
        } => {
            // File only: LUMEN_* overrides must not be written back.
            let mut cfg = lumen_config::load_config_file()?;
            add_profile(&mut cfg, &name, Profile::new(server), force)?;

            // Fail before writing anything the CLI couldn't use.
            lumen_config::profile_to_server_config(cfg.profile(&name)?, &cfg.defaults)?;

            let path = lumen_config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("Saved profile '{name}' to {}", path.display());
            }
            Ok(())
        }
    }
}

/// Insert `profile` under `name`. The first profile added becomes the default.
fn add_profile(cfg: &mut Config, name: &str, profile: Profile, force: bool) -> Result<(), CliError> {
    if cfg.profiles.contains_key(name) && !force {
        return Err(CliError::Validation {
            field: "name".into(),
            reason: format!("profile '{name}' already exists (use --force to replace it)"),
        });
    }
    if cfg.profiles.is_empty() {
        cfg.default_profile = Some(name.to_string());
    }
    cfg.profiles.insert(name.to_string(), profile);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn first_profile_becomes_default() {
        let mut cfg = Config {
            default_profile: None,
            ..Config::default()
        };
        add_profile(&mut cfg, "studio", Profile::new("http://studio"), false).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("studio"));

        add_profile(&mut cfg, "home", Profile::new("http://home"), false).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("studio"));
        assert_eq!(cfg.profiles.len(), 2);
    }

    #[test]
    fn existing_profile_needs_force() {
        let mut cfg = Config::default();
        add_profile(&mut cfg, "home", Profile::new("http://a"), false).unwrap();

        let err = add_profile(&mut cfg, "home", Profile::new("http://b"), false).unwrap_err();
        assert!(matches!(err, CliError::Validation { .. }));
        assert_eq!(cfg.profiles["home"].server, "http://a");

        add_profile(&mut cfg, "home", Profile::new("http://b"), true).unwrap();
        assert_eq!(cfg.profiles["home"].server, "http://b");
    }
}
