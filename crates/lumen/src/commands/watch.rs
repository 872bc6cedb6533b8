//! Live state streaming.
//!
//! Seeds the named targets over HTTP, then prints every live state change
//! until Ctrl-C. Connection transitions go to stderr so stdout stays
//! pipeable.

use std::future::Future;
use std::io::{self, Write};
use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tracing::{debug, warn};

use lumen_core::{ChannelState, LightState, LightTarget, LiveEvent, Session};

use crate::cli::{GlobalOpts, OutputFormat, Targets, WatchArgs};
use crate::error::CliError;
use crate::output;

/// Rendering choices for one watch run.
struct View {
    format: OutputFormat,
    color: bool,
    notice_color: bool,
    quiet: bool,
}

impl View {
    fn emit(&self, out: &mut impl Write, state: &LightState) -> Result<(), CliError> {
        if !self.quiet {
            let line = output::render_event(self.format, state, self.color)?;
            let _ = writeln!(out, "{line}");
        }
        Ok(())
    }
}

pub async fn handle(session: &Session, args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let view = View {
        format: global.output_format(),
        color: output::should_color(global.color_mode(), &io::stdout()),
        notice_color: output::should_color(global.color_mode(), &io::stderr()),
        quiet: global.quiet,
    };
    let mut stdout = io::stdout();

    if !args.targets.is_empty() && !args.no_seed {
        let states = session
            .seed(&args.targets.fixtures, &args.targets.groups)
            .await?;
        for state in &states {
            view.emit(&mut stdout, state)?;
        }
    }

    // Subscribe before starting so the first event can't be missed.
    let events = session.subscribe_events();
    session.start_live().await?;
    let Some(connection) = session.watch_connection().await else {
        return Ok(());
    };

    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C");
        }
    };
    let result = follow(events, connection, &args.targets, &view, ctrl_c, &mut stdout).await;

    session.shutdown().await;
    result
}

/// Print matching events until `stop` resolves or the session goes away.
async fn follow(
    mut events: broadcast::Receiver<Arc<LiveEvent>>,
    mut connection: watch::Receiver<ChannelState>,
    targets: &Targets,
    view: &View,
    stop: impl Future<Output = ()> + Send,
    out: &mut (impl Write + Send),
) -> Result<(), CliError> {
    tokio::pin!(stop);

    loop {
        tokio::select! {
            () = &mut stop => return Ok(()),
            changed = connection.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let state = *connection.borrow_and_update();
                debug!(%state, "live channel transition");
                if let Some(notice) =
                    output::connection_notice(state, view.notice_color).filter(|_| !view.quiet)
                {
                    eprintln!("{notice}");
                }
            }
            event = events.recv() => match event {
                Ok(event) => {
                    let state = LightState::from(event.as_ref());
                    if wants(targets, state.target) {
                        view.emit(out, &state)?;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "output fell behind; events dropped");
                }
                Err(RecvError::Closed) => return Ok(()),
            },
        }
    }
}

/// Whether an event for `target` should be printed. No filter means all.
fn wants(filter: &Targets, target: LightTarget) -> bool {
    if filter.is_empty() {
        return true;
    }
    match target {
        LightTarget::Fixture(id) => filter.fixtures.contains(&id),
        LightTarget::Group(id) => filter.groups.contains(&id),
    }
}
