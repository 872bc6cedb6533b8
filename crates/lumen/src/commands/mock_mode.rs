//! Hardware mock-mode status.

use lumen_core::{MockModeStatus, Session};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

fn detail(status: &MockModeStatus) -> String {
    let headline = if status.enabled {
        "Mock mode: enabled (no hardware is being driven)"
    } else {
        "Mock mode: disabled"
    };
    match status.message {
        Some(ref message) => format!("{headline}\n{message}"),
        None => headline.to_string(),
    }
}

pub async fn handle(session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    let status = session.mock_mode().await?;
    let out = output::render_single(global.output_format(), &status, detail, |s| {
        if s.enabled { "enabled" } else { "disabled" }.to_string()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
