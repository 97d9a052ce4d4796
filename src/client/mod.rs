//! Client subscription manager.
//!
//! The counterpart of the gateway for consumers of realtime events:
//!
//! - [`SubscriptionManager`] - connect, join project rooms, register handlers
//! - [`Connector`] - how a connection is opened
//!   - [`WsConnector`] - a real WebSocket via tokio-tungstenite
//!   - [`LocalConnector`] - an in-process gateway (tests, embedded use)

mod connector;
mod error;
mod local;
mod manager;
mod ws;

pub use connector::{ClientLink, Connector, LINK_BUFFER};
pub use error::ClientError;
pub use local::LocalConnector;
pub use manager::{
    ConnectionStatus, EventHandler, HandlerId, SubscriptionManager, DEFAULT_JOIN_TIMEOUT,
    EVENTS_DROPPED,
};
pub use ws::WsConnector;
