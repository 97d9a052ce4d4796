//! In-memory project access table for development and testing.
//!
//! Grants are explicit `(user, project)` pairs. Anything not granted is
//! denied, so the adapter preserves the gateway's fail-closed behavior.
//!
//! # Usage
//!
//! ```ignore
//! use project_pulse::adapters::access::InMemoryProjectAccess;
//!
//! let access = InMemoryProjectAccess::new().with_grant("u1", "p1");
//! ```

use std::collections::HashSet;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::foundation::{AuthenticatedUser, DomainError, ErrorCode, ProjectId};
use crate::ports::ProjectAccessChecker;

/// Grant table keyed by `(user_id, project_id)`.
#[derive(Debug, Default)]
pub struct InMemoryProjectAccess {
    grants: RwLock<HashSet<(String, String)>>,
    /// Simulates a backing-store outage (for fail-closed tests).
    unavailable: RwLock<bool>,
}

impl InMemoryProjectAccess {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style grant.
    pub fn with_grant(self, user_id: impl Into<String>, project_id: impl Into<String>) -> Self {
        self.grant(user_id, project_id);
        self
    }

    /// Grants `user_id` access to `project_id` at runtime.
    pub fn grant(&self, user_id: impl Into<String>, project_id: impl Into<String>) {
        if let Ok(mut grants) = self.grants.write() {
            grants.insert((user_id.into(), project_id.into()));
        }
    }

    /// Revokes a grant. Existing room memberships are not affected.
    pub fn revoke(&self, user_id: &str, project_id: &str) {
        if let Ok(mut grants) = self.grants.write() {
            grants.remove(&(user_id.to_string(), project_id.to_string()));
        }
    }

    /// Makes every check fail with an error until cleared.
    pub fn set_unavailable(&self, unavailable: bool) {
        if let Ok(mut flag) = self.unavailable.write() {
            *flag = unavailable;
        }
    }
}

#[async_trait]
impl ProjectAccessChecker for InMemoryProjectAccess {
    async fn can_access_project(
        &self,
        user: &AuthenticatedUser,
        project_id: &ProjectId,
    ) -> Result<bool, DomainError> {
        let lock_error = || DomainError::new(ErrorCode::InternalError, "access table lock poisoned");

        if *self.unavailable.read().map_err(|_| lock_error())? {
            return Err(DomainError::new(
                ErrorCode::DatabaseError,
                "project access store unavailable",
            ));
        }

        let grants = self.grants.read().map_err(|_| lock_error())?;
        Ok(grants.contains(&(user.id.as_str().to_string(), project_id.as_str().to_string())))
    }
}
