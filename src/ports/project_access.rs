//! Project access port for explicit room joins.
//!
//! Joining `project:<id>` requires that the connection's identity may see
//! that project. The check follows a **fail-closed** design: the gateway
//! treats any error from this port as a denial.

use async_trait::async_trait;

use crate::domain::foundation::{AuthenticatedUser, DomainError, ProjectId};

/// Port for deciding whether an identity may subscribe to a project room.
#[async_trait]
pub trait ProjectAccessChecker: Send + Sync {
    /// Returns `Ok(true)` if `user` may receive events for `project_id`.
    async fn can_access_project(
        &self,
        user: &AuthenticatedUser,
        project_id: &ProjectId,
    ) -> Result<bool, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_access_checker_is_object_safe() {
        fn _assert(_: &dyn ProjectAccessChecker) {}
    }
}
