//! Rooms - scoped audiences for realtime events.
//!
//! A room is addressed by a scope prefix and an identifier:
//!
//! ```text
//! project:<projectId>   joined explicitly by the client
//! user:<userId>         joined automatically at connect time
//! tenant:<tenantId>     joined automatically at connect time (tenant-scoped identities)
//! ```
//!
//! Rooms have no lifecycle of their own; the gateway creates a membership
//! entry on first join and drops it when the last connection leaves.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::domain::foundation::{ProjectId, TenantId, UserId};

/// An opaque scope identifier used to address a set of connections.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Room {
    Project(ProjectId),
    User(UserId),
    Tenant(TenantId),
}

/// Scope of a room, without its identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomScope {
    Project,
    User,
    Tenant,
}

impl RoomScope {
    /// Wire prefix for the scope.
    pub fn prefix(&self) -> &'static str {
        match self {
            RoomScope::Project => "project",
            RoomScope::User => "user",
            RoomScope::Tenant => "tenant",
        }
    }
}

impl Room {
    pub fn project(id: &ProjectId) -> Self {
        Room::Project(id.clone())
    }

    pub fn user(id: &UserId) -> Self {
        Room::User(id.clone())
    }

    pub fn tenant(id: &TenantId) -> Self {
        Room::Tenant(id.clone())
    }

    pub fn scope(&self) -> RoomScope {
        match self {
            Room::Project(_) => RoomScope::Project,
            Room::User(_) => RoomScope::User,
            Room::Tenant(_) => RoomScope::Tenant,
        }
    }

    fn id_str(&self) -> &str {
        match self {
            Room::Project(id) => id.as_str(),
            Room::User(id) => id.as_str(),
            Room::Tenant(id) => id.as_str(),
        }
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scope().prefix(), self.id_str())
    }
}

/// Errors raised when parsing a room from its wire form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomParseError {
    #[error("room '{0}' has no scope separator")]
    MissingSeparator(String),

    #[error("unknown room scope '{0}'")]
    UnknownScope(String),

    #[error("room '{0}' has an empty identifier")]
    EmptyId(String),
}

impl FromStr for Room {
    type Err = RoomParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scope, id) = s
            .split_once(':')
            .ok_or_else(|| RoomParseError::MissingSeparator(s.to_string()))?;

        let empty = || RoomParseError::EmptyId(s.to_string());
        match scope {
            "project" => ProjectId::new(id).map(Room::Project).map_err(|_| empty()),
            "user" => UserId::new(id).map(Room::User).map_err(|_| empty()),
            "tenant" => TenantId::new(id).map(Room::Tenant).map_err(|_| empty()),
            other => Err(RoomParseError::UnknownScope(other.to_string())),
        }
    }
}

impl Serialize for Room {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Room {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
