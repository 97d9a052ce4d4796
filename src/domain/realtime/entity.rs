//! Entity kinds and mutation operations on the auto-emit path.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Business entity kinds whose writes are broadcast.
///
/// This is a closed set: adding a kind forces every exhaustive match in the
/// resolver and payload builder to handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Task,
    Comment,
    TimeEntry,
    File,
    Note,
    Notification,
    NoteCategory,
    Project,
    Invitation,
    Membership,
}

impl EntityKind {
    /// Every supported kind, in declaration order.
    pub const ALL: [EntityKind; 10] = [
        EntityKind::Task,
        EntityKind::Comment,
        EntityKind::TimeEntry,
        EntityKind::File,
        EntityKind::Note,
        EntityKind::Notification,
        EntityKind::NoteCategory,
        EntityKind::Project,
        EntityKind::Invitation,
        EntityKind::Membership,
    ];

    /// Stable wire name, used as the event name prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Task => "task",
            EntityKind::Comment => "comment",
            EntityKind::TimeEntry => "time_entry",
            EntityKind::File => "file",
            EntityKind::Note => "note",
            EntityKind::Notification => "notification",
            EntityKind::NoteCategory => "note_category",
            EntityKind::Project => "project",
            EntityKind::Invitation => "invitation",
            EntityKind::Membership => "membership",
        }
    }

    /// Payload key carrying the entity's own id (e.g. `taskId`).
    pub fn id_key(&self) -> &'static str {
        match self {
            EntityKind::Task => "taskId",
            EntityKind::Comment => "commentId",
            EntityKind::TimeEntry => "timeEntryId",
            EntityKind::File => "fileId",
            EntityKind::Note => "noteId",
            EntityKind::Notification => "notificationId",
            EntityKind::NoteCategory => "noteCategoryId",
            EntityKind::Project => "projectId",
            EntityKind::Invitation => "invitationId",
            EntityKind::Membership => "membershipId",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a caller names an entity kind that is not wired in.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown entity kind '{0}'")]
pub struct UnknownEntityKind(pub String);

impl FromStr for EntityKind {
    type Err = UnknownEntityKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownEntityKind(s.to_string()))
    }
}

/// Outcome of a committed write, as seen by subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Created,
    Updated,
    Deleted,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Created => "created",
            Operation::Updated => "updated",
            Operation::Deleted => "deleted",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Write performed through the scoped data-access façade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Create,
    Update,
    Delete,
    Upsert,
}

impl WriteKind {
    /// Maps a write to the operation subscribers see.
    ///
    /// `inserted` only matters for upserts.
    pub fn operation(&self, inserted: bool) -> Operation {
        match self {
            WriteKind::Create => Operation::Created,
            WriteKind::Update => Operation::Updated,
            WriteKind::Delete => Operation::Deleted,
            WriteKind::Upsert if inserted => Operation::Created,
            WriteKind::Upsert => Operation::Updated,
        }
    }
}
