//! Broadcaster port - fan-out of realtime events to a room.
//!
//! The dispatcher publishes through this port without knowing how the
//! gateway tracks connections. The in-process `RoomManager` is the only
//! production implementation; tests substitute recorders.

use async_trait::async_trait;

use crate::domain::realtime::RealtimeEvent;

/// Port for delivering an event to every connection joined to its room.
///
/// Implementations must:
/// - Deliver to connections joined at the instant of the call (no buffering
///   for late joiners)
/// - Isolate per-connection failures from the rest of the fan-out
/// - Never fail the caller; delivery problems are logged
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Deliver `event` to `event.room`, returning how many connections got it.
    async fn broadcast(&self, event: &RealtimeEvent) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcaster_is_object_safe() {
        fn _assert(_: &dyn Broadcaster) {}
    }
}
