//! WebSocket adapters for the realtime gateway.
//!
//! This module pushes realtime events to connected clients, grouped into
//! rooms.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       EmitDispatcher                                 │
//! │   FIFO queue of EmitEffects from committed writes                    │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ broadcasts
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      RoomManager                                     │
//! │   Room: project:p1     Room: user:u1        Room: tenant:t1          │
//! │   ├── conn-a           └── conn-a           ├── conn-a               │
//! │   └── conn-b                                └── conn-b               │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ bounded per-connection buffers
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                   ConnectionSession (per socket)                     │
//! │   connected → events / join acks / pongs → leave_all                 │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`messages`] - WebSocket message protocol types
//! - [`rooms`] - Room membership and broadcast
//! - [`session`] - Transport-agnostic connection lifecycle
//! - [`handler`] - Axum WebSocket upgrade handler

pub mod handler;
pub mod messages;
pub mod rooms;
pub mod session;

pub use handler::{health_handler, websocket_router, ws_handler, ConnectParams, WebSocketState};
pub use messages::{
    ClientMessage, ConnectedMessage, ErrorMessage, EventFrame, EventsDroppedMessage,
    JoinAckMessage, PongMessage, ServerMessage,
};
pub use rooms::{
    ConnectionHandle, ConnectionId, JoinAck, Outbound, RoomManager, DEFAULT_OUTBOUND_CAPACITY,
};
pub use session::{ClientFrame, ConnectionSession};
