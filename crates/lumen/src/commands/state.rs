//! One-shot state fetch.

use lumen_core::Session;

use crate::cli::{GlobalOpts, StateArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(session: &Session, args: StateArgs, global: &GlobalOpts) -> Result<(), CliError> {
    if args.targets.is_empty() {
        return Err(CliError::Validation {
            field: "targets".into(),
            reason: "name at least one --fixture or --group".into(),
        });
    }

    let states = session
        .seed(&args.targets.fixtures, &args.targets.groups)
        .await?;
    let out = output::render_list(global.output_format(), &states, output::light_row, output::light_line)?;
    output::print_output(&out, global.quiet);
    Ok(())
}
