//! Reactive light-state layer between `lumen-api` and the CLI.
//!
//! - **[`Session`]**: facade over one lighting backend: seeds state over
//!   HTTP, runs the live channel, and writes every event into the store.
//!
//! - **[`LightStore`]**: concurrent store of fixture and group states
//!   (`DashMap` + `tokio::sync::watch`), ordered per target by timestamp.
//!
//! - **[`StateStream`]**: subscription handle vended by the store, with
//!   `current()` / `latest()` / `changed()` and a `Stream` adapter.

pub mod config;
pub mod error;
pub mod model;
pub mod session;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::ServerConfig;
pub use error::CoreError;
pub use model::{LightState, LightTarget, StateSource};
pub use session::Session;
pub use store::LightStore;
pub use stream::{StateStream, StateWatchStream};

pub use lumen_api::{ChannelState, LiveEvent, MockModeStatus};
