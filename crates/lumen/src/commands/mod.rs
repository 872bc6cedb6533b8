//! Command dispatch: bridges CLI args -> session calls -> output formatting.

pub mod config_cmd;
pub mod mock_mode;
pub mod state;
pub mod watch;

use lumen_core::Session;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a server-bound command to the appropriate handler.
///
/// `config` and `completions` never reach a session; `main` handles them.
pub async fn dispatch(cmd: Command, session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Watch(args) => watch::handle(session, args, global).await,
        Command::State(args) => state::handle(session, args, global).await,
        Command::MockMode => mock_mode::handle(session, global).await,
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
