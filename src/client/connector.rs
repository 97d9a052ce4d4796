//! Connector port - how the subscription manager reaches a gateway.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::adapters::websocket::{ClientMessage, ServerMessage};

use super::error::ClientError;

/// Buffer between a connector's transport pumps and the manager.
pub const LINK_BUFFER: usize = 64;

/// An open connection, as typed message channels.
///
/// Dropping `outgoing` closes the connection.
pub struct ClientLink {
    pub outgoing: mpsc::Sender<ClientMessage>,
    pub incoming: mpsc::Receiver<ServerMessage>,
}

/// Opens authenticated connections to a gateway.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a connection presenting `token` as the handshake credential.
    async fn connect(&self, token: &str) -> Result<ClientLink, ClientError>;
}
