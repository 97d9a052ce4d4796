//! Room resolution - which audiences must hear about a write.
//!
//! | Entity kind                                  | Room(s)                                          |
//! |----------------------------------------------|--------------------------------------------------|
//! | Task, Comment, TimeEntry                     | `project:<record.projectId>`                     |
//! | File, Note                                   | project room if project-scoped, else `user:<actor>` |
//! | Notification                                 | `user:<record.userId>`                           |
//! | NoteCategory, Project, Invitation, Membership| `tenant:<record.tenantId or ctx.tenantId>`       |
//!
//! A missing identifier omits the room. It is never an error.

use crate::domain::realtime::context::EmitContext;
use crate::domain::realtime::entity::EntityKind;
use crate::domain::realtime::record::MutatedRecord;
use crate::domain::realtime::room::Room;

/// Pure mapping from a committed write to its target rooms.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoomResolver;

impl RoomResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve the rooms that must receive an event for this write.
    pub fn resolve(&self, kind: EntityKind, record: &MutatedRecord, ctx: &EmitContext) -> Vec<Room> {
        let room = match kind {
            EntityKind::Task | EntityKind::Comment | EntityKind::TimeEntry => {
                record.project_id.as_ref().map(Room::project)
            }
            EntityKind::File | EntityKind::Note => match &record.project_id {
                Some(project_id) => Some(Room::project(project_id)),
                None => ctx.actor_user_id.as_ref().map(Room::user),
            },
            EntityKind::Notification => record.user_id.as_ref().map(Room::user),
            EntityKind::NoteCategory
            | EntityKind::Project
            | EntityKind::Invitation
            | EntityKind::Membership => record
                .tenant_id
                .as_ref()
                .or(ctx.tenant_id.as_ref())
                .map(Room::tenant),
        };

        room.into_iter().collect()
    }
}
