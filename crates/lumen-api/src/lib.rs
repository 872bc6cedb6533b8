// lumen-api: Async client for the lumen lighting backend (live channel + HTTP state)

pub mod endpoint;
pub mod error;
pub mod event;
pub mod live;
pub mod models;
pub mod state_client;
pub mod transport;

pub use error::Error;
pub use event::{ControlMessage, EventType, FixtureStateChanged, GroupStateChanged, LiveEvent};
pub use live::{
    ChannelState, Connector, EventHandlers, LiveChannel, LiveConfig, LiveHandle, Transport,
    WsConnector, WsTransport,
};
pub use models::{FixtureState, GroupState, MockModeStatus};
pub use state_client::StateClient;
pub use transport::HttpConfig;
