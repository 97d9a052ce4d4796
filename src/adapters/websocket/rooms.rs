//! WebSocket room management - the broadcast gateway.
//!
//! Connections are grouped into rooms; an event is delivered to every
//! connection joined to its room at the instant of broadcast.
//!
//! # Architecture
//!
//! ```text
//! rooms (sharded)                     connections (sharded)
//! project:p1 → {conn-a, conn-b}       conn-a → identity, joined rooms, outbound tx
//! user:u1    → {conn-a}               conn-b → identity, joined rooms, outbound tx
//! tenant:t1  → {conn-a, conn-b}
//! ```
//!
//! Both tables are `DashMap`s, so joins and broadcasts on different rooms
//! contend only when their keys share a shard. At most one shard guard is
//! held at a time.
//!
//! # Backpressure
//!
//! Each connection has a bounded outbound buffer (a single-receiver
//! `tokio::sync::broadcast` channel). When a slow connection falls behind,
//! its **oldest** frames are dropped and its writer learns how many were
//! skipped. Other connections are unaffected.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::domain::foundation::AuthenticatedUser;
use crate::domain::realtime::{RealtimeEvent, Room};
use crate::ports::{Broadcaster, ProjectAccessChecker};

/// Default per-connection outbound buffer.
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 128;

/// Frame queued for a connection's writer.
pub type Outbound = Arc<RealtimeEvent>;

/// Unique identifier for a realtime connection.
///
/// Generated server-side when a client completes the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Create a new random connection ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of a join request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinAck {
    pub success: bool,
}

impl JoinAck {
    fn accepted() -> Self {
        Self { success: true }
    }

    fn rejected() -> Self {
        Self { success: false }
    }
}

/// A freshly registered connection.
///
/// The receiver is the connection's outbound buffer; dropping it makes
/// further sends to this connection no-ops.
pub struct ConnectionHandle {
    pub id: ConnectionId,
    pub identity: AuthenticatedUser,
    pub automatic_rooms: Vec<Room>,
    pub receiver: broadcast::Receiver<Outbound>,
}

struct ConnectionEntry {
    identity: AuthenticatedUser,
    joined: HashSet<Room>,
    outbound: broadcast::Sender<Outbound>,
}

/// Tracks live connections and room membership.
pub struct RoomManager {
    /// Room → members and their outbound senders.
    rooms: DashMap<Room, HashMap<ConnectionId, broadcast::Sender<Outbound>>>,

    /// Connection → identity and joined rooms, for authorization and cleanup.
    connections: DashMap<ConnectionId, ConnectionEntry>,

    access: Arc<dyn ProjectAccessChecker>,

    /// Per-connection outbound buffer size.
    outbound_capacity: usize,
}

impl RoomManager {
    /// Create a room manager.
    ///
    /// # Arguments
    ///
    /// * `access` - Authorizes explicit project room joins
    /// * `outbound_capacity` - Frames buffered per connection before the
    ///   oldest are dropped. Clamped to at least 1.
    pub fn new(access: Arc<dyn ProjectAccessChecker>, outbound_capacity: usize) -> Self {
        Self {
            rooms: DashMap::new(),
            connections: DashMap::new(),
            access,
            outbound_capacity: outbound_capacity.max(1),
        }
    }

    /// Create with the default outbound capacity.
    pub fn with_default_capacity(access: Arc<dyn ProjectAccessChecker>) -> Self {
        Self::new(access, DEFAULT_OUTBOUND_CAPACITY)
    }

    /// Register an authenticated connection.
    ///
    /// Joins `user:<id>` and, for tenant-scoped identities, `tenant:<id>`.
    /// These automatic rooms are fixed for the connection's lifetime.
    pub fn register_connection(&self, identity: AuthenticatedUser) -> ConnectionHandle {
        let id = ConnectionId::new();
        let (outbound, receiver) = broadcast::channel(self.outbound_capacity);

        let mut automatic_rooms = vec![Room::user(&identity.id)];
        if let Some(tenant_id) = &identity.tenant_id {
            automatic_rooms.push(Room::tenant(tenant_id));
        }

        self.connections.insert(
            id,
            ConnectionEntry {
                identity: identity.clone(),
                joined: automatic_rooms.iter().cloned().collect(),
                outbound: outbound.clone(),
            },
        );
        for room in &automatic_rooms {
            self.rooms
                .entry(room.clone())
                .or_default()
                .insert(id, outbound.clone());
        }

        tracing::debug!(
            connection_id = %id,
            user_id = %identity.id,
            rooms = automatic_rooms.len(),
            "Connection registered"
        );

        ConnectionHandle {
            id,
            identity,
            automatic_rooms,
            receiver,
        }
    }

    /// Join a connection to a room.
    ///
    /// Idempotent: joining an already-joined room succeeds without side
    /// effects. Fails closed when the identity may not see the room, when the
    /// access check errors, or when the connection is unknown.
    pub async fn join_room(&self, connection_id: &ConnectionId, room: Room) -> JoinAck {
        let identity = match self.connections.get(connection_id) {
            Some(entry) if entry.joined.contains(&room) => return JoinAck::accepted(),
            Some(entry) => entry.identity.clone(),
            None => {
                tracing::debug!(connection_id = %connection_id, room = %room, "Join from unknown connection");
                return JoinAck::rejected();
            }
        };

        if !self.authorize(&identity, &room).await {
            tracing::info!(
                connection_id = %connection_id,
                user_id = %identity.id,
                room = %room,
                "Room join denied"
            );
            return JoinAck::rejected();
        }

        let outbound = {
            let Some(mut entry) = self.connections.get_mut(connection_id) else {
                return JoinAck::rejected();
            };
            if !entry.joined.insert(room.clone()) {
                return JoinAck::accepted();
            }
            entry.outbound.clone()
        };

        self.rooms
            .entry(room.clone())
            .or_default()
            .insert(*connection_id, outbound);

        // The connection may have disconnected while we were authorizing.
        if !self.connections.contains_key(connection_id) {
            self.remove_member(&room, connection_id);
            return JoinAck::rejected();
        }

        tracing::debug!(connection_id = %connection_id, room = %room, "Room joined");
        JoinAck::accepted()
    }

    /// Remove a connection from every room it held.
    ///
    /// Rooms left empty are dropped.
    pub fn leave_all(&self, connection_id: &ConnectionId) {
        let Some((_, entry)) = self.connections.remove(connection_id) else {
            return;
        };

        for room in &entry.joined {
            self.remove_member(room, connection_id);
        }

        tracing::debug!(
            connection_id = %connection_id,
            rooms = entry.joined.len(),
            "Connection left all rooms"
        );
    }

    /// Deliver an event to every connection currently joined to its room.
    ///
    /// Returns the number of connections the event was queued for. A room
    /// with no members is a no-op.
    pub fn broadcast_event(&self, event: &RealtimeEvent) -> usize {
        let targets: Vec<(ConnectionId, broadcast::Sender<Outbound>)> =
            match self.rooms.get(&event.room) {
                Some(members) => members
                    .iter()
                    .map(|(id, tx)| (*id, tx.clone()))
                    .collect(),
                None => return 0,
            };

        let frame: Outbound = Arc::new(event.clone());
        let mut delivered = 0;
        for (connection_id, tx) in targets {
            match tx.send(frame.clone()) {
                Ok(_) => delivered += 1,
                Err(_) => {
                    // Writer already gone; cleanup happens on leave_all.
                    tracing::debug!(
                        connection_id = %connection_id,
                        event = %event.name,
                        "Skipping closed connection"
                    );
                }
            }
        }

        tracing::trace!(room = %event.room, event = %event.name, delivered, "Broadcast");
        delivered
    }

    /// Number of live connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Number of connections joined to `room` (0 if the room doesn't exist).
    pub fn room_member_count(&self, room: &Room) -> usize {
        self.rooms.get(room).map(|m| m.len()).unwrap_or(0)
    }

    /// All rooms with at least one member (for monitoring/debugging).
    pub fn active_rooms(&self) -> Vec<Room> {
        self.rooms.iter().map(|r| r.key().clone()).collect()
    }

    /// Rooms a connection is joined to, or `None` for unknown connections.
    pub fn joined_rooms(&self, connection_id: &ConnectionId) -> Option<Vec<Room>> {
        self.connections
            .get(connection_id)
            .map(|entry| entry.joined.iter().cloned().collect())
    }

    async fn authorize(&self, identity: &AuthenticatedUser, room: &Room) -> bool {
        match room {
            Room::User(user_id) => *user_id == identity.id,
            Room::Tenant(tenant_id) => identity.tenant_id.as_ref() == Some(tenant_id),
            Room::Project(project_id) => {
                match self.access.can_access_project(identity, project_id).await {
                    Ok(allowed) => allowed,
                    Err(e) => {
                        tracing::warn!(
                            user_id = %identity.id,
                            project_id = %project_id,
                            error = %e,
                            "Project access check failed, denying join"
                        );
                        false
                    }
                }
            }
        }
    }

    fn remove_member(&self, room: &Room, connection_id: &ConnectionId) {
        if let Some(mut members) = self.rooms.get_mut(room) {
            members.remove(connection_id);
        }
        self.rooms.remove_if(room, |_, members| members.is_empty());
    }
}

#[async_trait]
impl Broadcaster for RoomManager {
    async fn broadcast(&self, event: &RealtimeEvent) -> usize {
        self.broadcast_event(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::access::InMemoryProjectAccess;
    use crate::domain::foundation::{ProjectId, TenantId, UserId};
    use crate::domain::realtime::{EmitEffect, EntityKind, EventName, Operation};
    use serde_json::json;
    use tokio::sync::broadcast::error::{RecvError, TryRecvError};

    fn user(id: &str) -> AuthenticatedUser {
        AuthenticatedUser::new(UserId::new(id).unwrap())
    }

    fn tenant_user(id: &str, tenant: &str) -> AuthenticatedUser {
        user(id).with_tenant(TenantId::new(tenant).unwrap())
    }

    fn project_room(id: &str) -> Room {
        Room::project(&ProjectId::new(id).unwrap())
    }

    fn event(kind: EntityKind, op: Operation, room: Room) -> RealtimeEvent {
        EmitEffect::fan_out(EventName::new(kind, op), vec![room], json!({"id": "x"}))
            .into_events()
            .remove(0)
    }

    fn manager_with(access: InMemoryProjectAccess) -> RoomManager {
        RoomManager::with_default_capacity(Arc::new(access))
    }

    #[tokio::test]
    async fn register_joins_user_and_tenant_rooms() {
        let manager = manager_with(InMemoryProjectAccess::new());
        let handle = manager.register_connection(tenant_user("u1", "t1"));

        let mut rooms = manager.joined_rooms(&handle.id).unwrap();
        rooms.sort();
        assert_eq!(
            rooms,
            vec![
                Room::user(&UserId::new("u1").unwrap()),
                Room::tenant(&TenantId::new("t1").unwrap()),
            ]
        );
        assert_eq!(handle.automatic_rooms.len(), 2);
    }

    #[tokio::test]
    async fn register_without_tenant_joins_only_user_room() {
        let manager = manager_with(InMemoryProjectAccess::new());
        let handle = manager.register_connection(user("u1"));
        assert_eq!(
            manager.joined_rooms(&handle.id).unwrap(),
            vec![Room::user(&UserId::new("u1").unwrap())]
        );
    }

    #[tokio::test]
    async fn user_room_receives_notification_without_explicit_join() {
        let manager = manager_with(InMemoryProjectAccess::new());
        let mut handle = manager.register_connection(user("u1"));

        let delivered = manager.broadcast_event(&event(
            EntityKind::Notification,
            Operation::Created,
            Room::user(&UserId::new("u1").unwrap()),
        ));

        assert_eq!(delivered, 1);
        let received = handle.receiver.recv().await.unwrap();
        assert_eq!(received.name.to_string(), "notification.created");
    }

    #[tokio::test]
    async fn granted_project_join_succeeds() {
        let manager = manager_with(InMemoryProjectAccess::new().with_grant("u1", "p1"));
        let handle = manager.register_connection(user("u1"));

        let ack = manager.join_room(&handle.id, project_room("p1")).await;
        assert!(ack.success);
        assert_eq!(manager.room_member_count(&project_room("p1")), 1);
    }

    #[tokio::test]
    async fn ungranted_project_join_fails_closed() {
        let manager = manager_with(InMemoryProjectAccess::new());
        let handle = manager.register_connection(user("u1"));

        let ack = manager.join_room(&handle.id, project_room("p1")).await;
        assert!(!ack.success);
        assert_eq!(manager.room_member_count(&project_room("p1")), 0);
        // The connection itself survives a denied join.
        assert_eq!(manager.connection_count(), 1);
    }

    #[tokio::test]
    async fn access_check_error_fails_closed() {
        let access = InMemoryProjectAccess::new().with_grant("u1", "p1");
        access.set_unavailable(true);
        let manager = manager_with(access);
        let handle = manager.register_connection(user("u1"));

        assert!(!manager.join_room(&handle.id, project_room("p1")).await.success);
    }

    #[tokio::test]
    async fn joining_another_users_room_is_denied() {
        let manager = manager_with(InMemoryProjectAccess::new());
        let handle = manager.register_connection(tenant_user("u1", "t1"));

        let other_user = Room::user(&UserId::new("u2").unwrap());
        let other_tenant = Room::tenant(&TenantId::new("t2").unwrap());
        assert!(!manager.join_room(&handle.id, other_user).await.success);
        assert!(!manager.join_room(&handle.id, other_tenant).await.success);
    }

    #[tokio::test]
    async fn join_is_idempotent_and_does_not_duplicate_delivery() {
        let manager = manager_with(InMemoryProjectAccess::new().with_grant("u1", "p1"));
        let mut handle = manager.register_connection(user("u1"));

        assert!(manager.join_room(&handle.id, project_room("p1")).await.success);
        assert!(manager.join_room(&handle.id, project_room("p1")).await.success);

        let delivered =
            manager.broadcast_event(&event(EntityKind::Task, Operation::Updated, project_room("p1")));
        assert_eq!(delivered, 1);
        assert!(handle.receiver.recv().await.is_ok());
        assert!(matches!(handle.receiver.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn broadcast_reaches_only_members_of_the_room() {
        let manager = manager_with(
            InMemoryProjectAccess::new()
                .with_grant("u1", "p1")
                .with_grant("u2", "p2"),
        );
        let mut a = manager.register_connection(user("u1"));
        let mut b = manager.register_connection(user("u2"));
        manager.join_room(&a.id, project_room("p1")).await;
        manager.join_room(&b.id, project_room("p2")).await;

        manager.broadcast_event(&event(EntityKind::Task, Operation::Created, project_room("p1")));

        assert!(a.receiver.recv().await.is_ok());
        assert!(matches!(b.receiver.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn overlapping_rooms_deliver_one_copy_per_room() {
        let manager = manager_with(InMemoryProjectAccess::new().with_grant("u1", "p1"));
        let mut handle = manager.register_connection(tenant_user("u1", "t1"));
        manager.join_room(&handle.id, project_room("p1")).await;

        manager.broadcast_event(&event(EntityKind::Task, Operation::Created, project_room("p1")));
        manager.broadcast_event(&event(
            EntityKind::Project,
            Operation::Updated,
            Room::tenant(&TenantId::new("t1").unwrap()),
        ));

        let first = handle.receiver.recv().await.unwrap();
        let second = handle.receiver.recv().await.unwrap();
        assert_eq!(first.room, project_room("p1"));
        assert_eq!(second.room.to_string(), "tenant:t1");
    }

    #[tokio::test]
    async fn leave_all_removes_connection_and_empty_rooms() {
        let manager = manager_with(InMemoryProjectAccess::new().with_grant("u1", "p1"));
        let handle = manager.register_connection(tenant_user("u1", "t1"));
        manager.join_room(&handle.id, project_room("p1")).await;
        assert_eq!(manager.active_rooms().len(), 3);

        manager.leave_all(&handle.id);

        assert_eq!(manager.connection_count(), 0);
        assert!(manager.active_rooms().is_empty());
        assert!(manager.joined_rooms(&handle.id).is_none());
    }

    #[tokio::test]
    async fn leave_all_keeps_rooms_with_remaining_members() {
        let manager = manager_with(InMemoryProjectAccess::new());
        let a = manager.register_connection(user("u1"));
        let _b = manager.register_connection(user("u1"));

        manager.leave_all(&a.id);

        assert_eq!(manager.room_member_count(&Room::user(&UserId::new("u1").unwrap())), 1);
    }

    #[tokio::test]
    async fn join_after_leave_all_is_rejected() {
        let manager = manager_with(InMemoryProjectAccess::new().with_grant("u1", "p1"));
        let handle = manager.register_connection(user("u1"));
        manager.leave_all(&handle.id);

        assert!(!manager.join_room(&handle.id, project_room("p1")).await.success);
        assert_eq!(manager.room_member_count(&project_room("p1")), 0);
    }

    #[tokio::test]
    async fn closed_connection_does_not_affect_other_members() {
        let manager = manager_with(
            InMemoryProjectAccess::new()
                .with_grant("u1", "p1")
                .with_grant("u2", "p1"),
        );
        let a = manager.register_connection(user("u1"));
        let mut b = manager.register_connection(user("u2"));
        manager.join_room(&a.id, project_room("p1")).await;
        manager.join_room(&b.id, project_room("p1")).await;

        drop(a.receiver);

        let delivered =
            manager.broadcast_event(&event(EntityKind::Comment, Operation::Created, project_room("p1")));
        assert_eq!(delivered, 1);
        assert!(b.receiver.recv().await.is_ok());
    }

    #[tokio::test]
    async fn slow_connection_drops_oldest_frames() {
        let manager = RoomManager::new(Arc::new(InMemoryProjectAccess::new()), 2);
        let mut handle = manager.register_connection(user("u1"));
        let room = Room::user(&UserId::new("u1").unwrap());

        for i in 0..3 {
            let mut e = event(EntityKind::Notification, Operation::Created, room.clone());
            e.payload = json!({"seq": i});
            manager.broadcast_event(&e);
        }

        assert!(matches!(handle.receiver.recv().await, Err(RecvError::Lagged(1))));
        assert_eq!(handle.receiver.recv().await.unwrap().payload["seq"], 1);
        assert_eq!(handle.receiver.recv().await.unwrap().payload["seq"], 2);
    }

    #[tokio::test]
    async fn broadcast_to_empty_room_is_noop() {
        let manager = manager_with(InMemoryProjectAccess::new());
        let delivered =
            manager.broadcast_event(&event(EntityKind::Task, Operation::Deleted, project_room("p9")));
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn room_manager_is_a_broadcaster() {
        let manager = manager_with(InMemoryProjectAccess::new());
        let mut handle = manager.register_connection(user("u1"));
        let broadcaster: &dyn Broadcaster = &manager;

        let delivered = broadcaster
            .broadcast(&event(
                EntityKind::Notification,
                Operation::Updated,
                Room::user(&UserId::new("u1").unwrap()),
            ))
            .await;

        assert_eq!(delivered, 1);
        assert!(handle.receiver.recv().await.is_ok());
    }

    #[test]
    fn connection_id_display_is_uuid() {
        assert_eq!(ConnectionId::new().to_string().len(), 36);
    }
}
