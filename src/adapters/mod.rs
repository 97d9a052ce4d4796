//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the realtime layer to external systems:
//! - `access` - Project room authorization (PostgreSQL, in-memory)
//! - `auth` - Handshake token validation (JWT, mock)
//! - `events` - Emit dispatch to the gateway
//! - `storage` - URL signing and the in-memory record store
//! - `websocket` - The broadcast gateway and its axum endpoint

pub mod access;
pub mod auth;
pub mod events;
pub mod storage;
pub mod websocket;

pub use access::{InMemoryProjectAccess, PostgresProjectAccess};
pub use auth::{JwtConfig, JwtSessionValidator, MockSessionValidator};
pub use events::EmitDispatcher;
pub use storage::{HmacUrlSigner, InMemoryRecordStore};
pub use websocket::{RoomManager, WebSocketState};
