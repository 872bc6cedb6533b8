//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one line per item.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use lumen_core::{ChannelState, LightState};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled for `stream`.
pub fn should_color(mode: ColorMode, stream: &impl IsTerminal) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => stream.is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact`: serializes the original data via serde
/// - `yaml`: serializes via serde_yaml
/// - `plain`: calls `line_fn` on each item to emit one line per item
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    line_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    Ok(match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => render_json(data, false)?,
        OutputFormat::JsonCompact => render_json(data, true)?,
        OutputFormat::Yaml => render_yaml(data)?,
        OutputFormat::Plain => data.iter().map(&line_fn).collect::<Vec<_>>().join("\n"),
    })
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`, since single-item views don't use the
/// `Tabled` derive.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    line_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    Ok(match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false)?,
        OutputFormat::JsonCompact => render_json(data, true)?,
        OutputFormat::Yaml => render_yaml(data)?,
        OutputFormat::Plain => line_fn(data),
    })
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Light states ─────────────────────────────────────────────────────

#[derive(Tabled)]
pub struct LightRow {
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Brightness")]
    brightness: String,
    #[tabled(rename = "Color Temp")]
    color_temp: String,
    #[tabled(rename = "Updated")]
    updated: String,
    #[tabled(rename = "Source")]
    source: String,
}

pub fn light_row(s: &LightState) -> LightRow {
    LightRow {
        target: s.target.to_string(),
        brightness: format!("{}%", s.brightness),
        color_temp: kelvin(s.color_temp),
        updated: s
            .updated_at
            .map_or_else(|| "-".into(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
        source: s.source.to_string(),
    }
}

/// `fixture:7 42 3000` (color temp `-` when absent).
pub fn light_line(s: &LightState) -> String {
    let color_temp = s
        .color_temp
        .map_or_else(|| "-".into(), |t| t.to_string());
    format!(
        "{}:{} {} {color_temp}",
        target_kind(s),
        s.target.id(),
        s.brightness
    )
}

/// One streamed state change, formatted for `lumen watch`.
///
/// JSON is always compact here so each event stays on one line.
pub fn render_event(format: OutputFormat, s: &LightState, color: bool) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::Table => {
            let time = s
                .updated_at
                .map_or_else(|| "--:--:--".into(), |t| t.format("%H:%M:%S").to_string());
            let target = format!("{:<12}", s.target.to_string());
            let level = format!("{:>4}%", s.brightness);
            let temp = kelvin(s.color_temp);
            if color {
                format!("{}  {}  {}  {}", time.dimmed(), target.cyan(), level.bold(), temp)
            } else {
                format!("{time}  {target}  {level}  {temp}")
            }
        }
        OutputFormat::Json | OutputFormat::JsonCompact => render_json(s, true)?,
        OutputFormat::Yaml => format!("---\n{}", render_yaml(s)?.trim_end()),
        OutputFormat::Plain => light_line(s),
    })
}

/// Short status line for a live-channel transition, if it is worth reporting.
pub fn connection_notice(state: ChannelState, color: bool) -> Option<String> {
    let text = match state {
        ChannelState::Open => "live",
        ChannelState::Closed => "reconnecting",
        ChannelState::Idle | ChannelState::Connecting | ChannelState::Stopped => return None,
    };
    Some(match (state, color) {
        (ChannelState::Open, true) => format!("● {}", text.green()),
        (_, true) => format!("● {}", text.yellow()),
        (_, false) => format!("● {text}"),
    })
}

fn target_kind(s: &LightState) -> &'static str {
    match s.target {
        lumen_core::LightTarget::Fixture(_) => "fixture",
        lumen_core::LightTarget::Group(_) => "group",
    }
}

fn kelvin(color_temp: Option<u32>) -> String {
    color_temp.map_or_else(|| "-".into(), |k| format!("{k}K"))
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    Ok(if compact {
        serde_json::to_string(data)?
    } else {
        serde_json::to_string_pretty(data)?
    })
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    Ok(serde_yaml::to_string(data)?)
}
