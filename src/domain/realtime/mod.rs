//! Realtime distribution domain.
//!
//! Pure types and functions describing *what* is broadcast and *to whom*:
//!
//! - [`room`] - scoped audiences (`project:`, `user:`, `tenant:`)
//! - [`entity`] - the closed set of entity kinds and operations
//! - [`context`] - per-call emit context
//! - [`record`] - the written record as seen by this layer
//! - [`resolver`] - write → rooms
//! - [`payload`] - write → event name + payload
//! - [`event`] - realtime events and the effect value handed to the dispatcher

pub mod context;
pub mod entity;
pub mod event;
pub mod payload;
pub mod record;
pub mod resolver;
pub mod room;

pub use context::EmitContext;
pub use entity::{EntityKind, Operation, UnknownEntityKind, WriteKind};
pub use event::{EmitEffect, EventName, RealtimeEvent};
pub use payload::{BuildError, PayloadBuilder, STORAGE_KEY_ATTRIBUTE};
pub use record::{MutatedRecord, RecordDraft};
pub use resolver::RoomResolver;
pub use room::{Room, RoomParseError, RoomScope};
