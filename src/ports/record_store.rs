//! RecordStore port - the persistence behind the scoped data-access façade.
//!
//! The business CRUD layer owns the real storage. This port is the narrow
//! contract the façade needs: perform a tenant-scoped write and hand back
//! the record as committed.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, TenantId};
use crate::domain::realtime::{EntityKind, MutatedRecord, RecordDraft};

/// Result of an upsert: the committed record and whether it was inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertOutcome {
    pub record: MutatedRecord,
    pub inserted: bool,
}

/// Port for tenant-scoped writes.
///
/// Implementations must:
/// - Return the record exactly as committed
/// - Return `ErrorCode::RecordNotFound` for update/delete of a missing id
/// - Never return a record from another tenant
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn create(
        &self,
        kind: EntityKind,
        tenant_id: &TenantId,
        draft: RecordDraft,
    ) -> Result<MutatedRecord, DomainError>;

    async fn update(
        &self,
        kind: EntityKind,
        tenant_id: &TenantId,
        draft: RecordDraft,
    ) -> Result<MutatedRecord, DomainError>;

    /// Deletes by id and returns the record as it was before deletion.
    async fn delete(
        &self,
        kind: EntityKind,
        tenant_id: &TenantId,
        id: &str,
    ) -> Result<MutatedRecord, DomainError>;

    async fn upsert(
        &self,
        kind: EntityKind,
        tenant_id: &TenantId,
        draft: RecordDraft,
    ) -> Result<UpsertOutcome, DomainError>;
}
