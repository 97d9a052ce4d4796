//! PostgreSQL implementation of ProjectAccessChecker.
//!
//! A user may join a project room when they are a member of the project
//! and, for tenant-scoped identities, the project belongs to their tenant.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{AuthenticatedUser, DomainError, ErrorCode, ProjectId};
use crate::ports::ProjectAccessChecker;

/// PostgreSQL implementation of the ProjectAccessChecker port.
pub struct PostgresProjectAccess {
    pool: PgPool,
}

impl PostgresProjectAccess {
    /// Creates a new PostgresProjectAccess with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectAccessChecker for PostgresProjectAccess {
    async fn can_access_project(
        &self,
        user: &AuthenticatedUser,
        project_id: &ProjectId,
    ) -> Result<bool, DomainError> {
        let tenant_id = user.tenant_id.as_ref().map(|t| t.as_str());

        let allowed: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM project_members pm
                JOIN projects p ON p.id = pm.project_id
                WHERE pm.project_id = $1
                  AND pm.user_id = $2
                  AND ($3::text IS NULL OR p.tenant_id = $3)
            )
            "#,
        )
        .bind(project_id.as_str())
        .bind(user.id.as_str())
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to check project membership: {}", e),
            )
            .with_detail("project_id", project_id.as_str())
        })?;

        Ok(allowed)
    }
}
