//! Realtime events and the effect value handed to the dispatcher.

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::domain::foundation::Timestamp;

use super::entity::{EntityKind, Operation};
use super::room::Room;

/// `<entityKind>.<operation>`, e.g. `task.created`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventName {
    pub kind: EntityKind,
    pub operation: Operation,
}

impl EventName {
    pub fn new(kind: EntityKind, operation: Operation) -> Self {
        Self { kind, operation }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.kind.as_str(), self.operation.as_str())
    }
}

impl Serialize for EventName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One event addressed to one room. Transient: never stored or replayed.
#[derive(Debug, Clone, PartialEq)]
pub struct RealtimeEvent {
    pub name: EventName,
    pub room: Room,
    pub payload: Value,
    pub occurred_at: Timestamp,
}

/// Events to dispatch after a committed write.
///
/// Returned from the write path instead of being sent from it, so writes
/// stay testable without a live gateway. An empty effect dispatches nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmitEffect {
    events: Vec<RealtimeEvent>,
}

impl EmitEffect {
    /// An effect that dispatches nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// One event per room, sharing name and payload.
    pub fn fan_out(name: EventName, rooms: Vec<Room>, payload: Value) -> Self {
        let occurred_at = Timestamp::now();
        let events = rooms
            .into_iter()
            .map(|room| RealtimeEvent {
                name,
                room,
                payload: payload.clone(),
                occurred_at,
            })
            .collect();
        Self { events }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn events(&self) -> &[RealtimeEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<RealtimeEvent> {
        self.events
    }
}
