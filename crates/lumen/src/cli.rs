//! Clap derive structures for the `lumen` CLI.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// lumen -- watch fixture and group state on a lighting server
#[derive(Debug, Parser)]
#[command(
    name = "lumen",
    version,
    about = "Watch live lighting state from the command line",
    long_about = "Streams fixture and group state changes from a lighting server.\n\n\
        The live channel reconnects on its own; HTTP endpoints are used for\n\
        one-shot reads and to seed state before streaming.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Clone, Args)]
pub struct GlobalOpts {
    /// Server profile to use
    #[arg(long, short = 'p', env = "LUMEN_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Server origin, e.g. http://lights.local:8000 (overrides profile)
    #[arg(long, short = 's', env = "LUMEN_SERVER", global = true)]
    pub server: Option<String>,

    /// Live event stream path (overrides profile)
    #[arg(long, global = true)]
    pub live_path: Option<String>,

    /// Output format [default: config `defaults.output`, else table]
    #[arg(long, short = 'o', env = "LUMEN_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output [default: config `defaults.color`, else auto]
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// HTTP timeout in seconds (overrides profile)
    #[arg(long, env = "LUMEN_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

impl GlobalOpts {
    pub fn output_format(&self) -> OutputFormat {
        self.output.unwrap_or(OutputFormat::Table)
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color.unwrap_or(ColorMode::Auto)
    }
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Stream live state changes until interrupted
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Fetch current state over HTTP
    State(StateArgs),

    /// Show whether the server is running against mocked hardware
    MockMode,

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Targets ──────────────────────────────────────────────────────────

/// Fixture and group IDs named on the command line.
#[derive(Debug, Clone, Default, Args)]
pub struct Targets {
    /// Fixture ID (repeatable)
    #[arg(long = "fixture", short = 'f', value_name = "ID")]
    pub fixtures: Vec<i64>,

    /// Group ID (repeatable)
    #[arg(long = "group", short = 'g', value_name = "ID")]
    pub groups: Vec<i64>,
}

impl Targets {
    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty() && self.groups.is_empty()
    }
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    // Filters the stream; named targets are seeded first.
    #[command(flatten)]
    pub targets: Targets,

    /// Skip the initial HTTP fetch of the named targets
    #[arg(long)]
    pub no_seed: bool,
}

#[derive(Debug, Args)]
pub struct StateArgs {
    #[command(flatten)]
    pub targets: Targets,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current resolved configuration
    Show,

    /// Print the config file location
    Path,

    /// Add a server profile to the config file
    Init {
        /// Server origin, e.g. http://lights.local:8000
        server: String,

        /// Profile name
        #[arg(long, default_value = "default")]
        name: String,

        /// Replace an existing profile of the same name
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
