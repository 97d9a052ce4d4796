//! Connection session - the lifecycle of one authenticated connection.
//!
//! The session is independent of the transport. It writes JSON text frames
//! to any `Sink<String>` and reads [`ClientFrame`]s from any `Stream`, so the
//! axum WebSocket handler and the in-process connector drive the same code:
//!
//! 1. Register with the room manager (automatic rooms joined)
//! 2. Send `connected`
//! 3. Forward room events and answer client frames until either side closes
//! 4. Leave all rooms

use std::fmt::Display;
use std::sync::Arc;

use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::broadcast::error::RecvError;

use crate::domain::foundation::{AuthenticatedUser, ProjectId};
use crate::domain::realtime::Room;

use super::messages::{
    ClientMessage, ConnectedMessage, EventFrame, EventsDroppedMessage, JoinAckMessage,
    ServerMessage,
};
use super::rooms::{ConnectionHandle, ConnectionId, RoomManager};

/// A frame received from the client, already stripped of transport details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientFrame {
    /// A JSON text frame.
    Text(String),
    /// A frame type the protocol doesn't use (e.g. binary).
    Unsupported,
    /// The client is closing the connection.
    Close,
}

/// One registered connection and its outbound buffer.
pub struct ConnectionSession {
    rooms: Arc<RoomManager>,
    handle: ConnectionHandle,
}

impl ConnectionSession {
    /// Register `identity` with the room manager.
    ///
    /// Automatic rooms are joined immediately, so events for them are
    /// buffered even before [`run`](Self::run) starts.
    pub fn open(rooms: Arc<RoomManager>, identity: AuthenticatedUser) -> Self {
        let handle = rooms.register_connection(identity);
        Self { rooms, handle }
    }

    pub fn id(&self) -> ConnectionId {
        self.handle.id
    }

    /// Drive the connection until the client closes or the transport fails.
    ///
    /// Membership is always cleaned up before returning.
    pub async fn run<Tx, Rx>(self, tx: Tx, rx: Rx)
    where
        Tx: Sink<String>,
        Tx::Error: Display,
        Rx: Stream<Item = ClientFrame>,
    {
        let ConnectionSession { rooms, handle } = self;
        let connection_id = handle.id;

        let tx = std::pin::pin!(tx);
        let rx = std::pin::pin!(rx);
        match drive(&rooms, handle, tx, rx).await {
            Ok(()) => tracing::debug!(connection_id = %connection_id, "Connection closed"),
            Err(e) => tracing::debug!(
                connection_id = %connection_id,
                "Send error, closing connection: {}",
                e
            ),
        }

        rooms.leave_all(&connection_id);
    }
}

async fn drive<Tx, Rx>(
    rooms: &RoomManager,
    handle: ConnectionHandle,
    mut tx: Tx,
    mut rx: Rx,
) -> Result<(), String>
where
    Tx: Sink<String> + Unpin,
    Tx::Error: Display,
    Rx: Stream<Item = ClientFrame> + Unpin,
{
    let ConnectionHandle {
        id,
        identity,
        automatic_rooms,
        mut receiver,
    } = handle;

    let connected = ServerMessage::Connected(ConnectedMessage {
        connection_id: id.to_string(),
        user_id: identity.id.to_string(),
        tenant_id: identity.tenant_id.as_ref().map(|t| t.to_string()),
        rooms: automatic_rooms.iter().map(|r| r.to_string()).collect(),
    });
    send_message(&mut tx, &connected).await?;

    loop {
        tokio::select! {
            frame = receiver.recv() => match frame {
                Ok(event) => {
                    let msg = ServerMessage::Event(EventFrame::from(event.as_ref()));
                    send_message(&mut tx, &msg).await?;
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        connection_id = %id,
                        skipped,
                        "Slow connection, dropped oldest events"
                    );
                    let msg = ServerMessage::EventsDropped(EventsDroppedMessage { skipped });
                    send_message(&mut tx, &msg).await?;
                }
                Err(RecvError::Closed) => return Ok(()),
            },
            inbound = rx.next() => match inbound {
                Some(ClientFrame::Text(text)) => {
                    let reply = handle_client_text(rooms, &id, &text).await;
                    send_message(&mut tx, &reply).await?;
                }
                Some(ClientFrame::Unsupported) => {
                    tracing::warn!(connection_id = %id, "Received unsupported frame");
                    let reply = ServerMessage::error("UNSUPPORTED_FRAME", "Only text frames are accepted");
                    send_message(&mut tx, &reply).await?;
                }
                Some(ClientFrame::Close) | None => return Ok(()),
            },
        }
    }
}

async fn handle_client_text(rooms: &RoomManager, id: &ConnectionId, text: &str) -> ServerMessage {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Ping) => {
            tracing::trace!(connection_id = %id, "Received ping");
            ServerMessage::pong()
        }
        Ok(ClientMessage::JoinRoom {
            request_id,
            project_id,
        }) => {
            let success = match ProjectId::new(project_id.clone()) {
                Ok(project) => rooms.join_room(id, Room::project(&project)).await.success,
                Err(_) => false,
            };
            ServerMessage::JoinAck(JoinAckMessage {
                request_id,
                project_id,
                success,
            })
        }
        Err(e) => {
            tracing::debug!(connection_id = %id, "Malformed client message: {}", e);
            ServerMessage::error("INVALID_MESSAGE", format!("Unrecognized message: {}", e))
        }
    }
}

async fn send_message<Tx>(tx: &mut Tx, msg: &ServerMessage) -> Result<(), String>
where
    Tx: Sink<String> + Unpin,
    Tx::Error: Display,
{
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    tx.send(json).await.map_err(|e| e.to_string())
}
