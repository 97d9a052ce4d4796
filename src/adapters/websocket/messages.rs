//! WebSocket message types for the realtime gateway.
//!
//! Defines the JSON protocol between the gateway and connected clients:
//! - Server → Client: connection status, join acks, events, drop notices, pongs, errors
//! - Client → Server: room joins, pings
//!
//! Both directions derive `Serialize` and `Deserialize` so the same types
//! serve the gateway and the subscription manager.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::Timestamp;
use crate::domain::realtime::RealtimeEvent;

// ============================================
// Server → Client Messages
// ============================================

/// All message types that can be sent from server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Handshake accepted; automatic rooms are already joined.
    #[serde(rename = "connected")]
    Connected(ConnectedMessage),

    /// Acknowledgment of a `room.join` request.
    #[serde(rename = "room.join.ack")]
    JoinAck(JoinAckMessage),

    /// A realtime event for one of the connection's rooms.
    #[serde(rename = "event")]
    Event(EventFrame),

    /// The connection fell behind and its oldest frames were dropped.
    #[serde(rename = "events.dropped")]
    EventsDropped(EventsDroppedMessage),

    /// Heartbeat response.
    #[serde(rename = "pong")]
    Pong(PongMessage),

    /// A client frame could not be processed. The connection stays open.
    #[serde(rename = "error")]
    Error(ErrorMessage),
}

/// Sent once when the connection is registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedMessage {
    pub connection_id: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    /// Rooms joined automatically from the identity.
    pub rooms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinAckMessage {
    pub request_id: String,
    pub project_id: String,
    pub success: bool,
}

/// Named event delivered to a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFrame {
    /// `<entityKind>.<operation>`, e.g. `task.created`.
    pub event: String,
    pub room: String,
    pub payload: Value,
    pub occurred_at: String,
}

impl From<&RealtimeEvent> for EventFrame {
    fn from(event: &RealtimeEvent) -> Self {
        Self {
            event: event.name.to_string(),
            room: event.room.to_string(),
            payload: event.payload.clone(),
            occurred_at: event.occurred_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventsDroppedMessage {
    pub skipped: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PongMessage {
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub code: String,
    pub message: String,
    pub timestamp: String,
}

impl ServerMessage {
    pub fn pong() -> Self {
        ServerMessage::Pong(PongMessage {
            timestamp: Timestamp::now().to_rfc3339(),
        })
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        ServerMessage::Error(ErrorMessage {
            code: code.into(),
            message: message.into(),
            timestamp: Timestamp::now().to_rfc3339(),
        })
    }
}

// ============================================
// Client → Server Messages
// ============================================

/// All message types that can be received from client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Heartbeat request.
    #[serde(rename = "ping")]
    Ping,

    /// Join the room of the project the client is viewing.
    #[serde(rename = "room.join", rename_all = "camelCase")]
    JoinRoom {
        request_id: String,
        project_id: String,
    },
}
