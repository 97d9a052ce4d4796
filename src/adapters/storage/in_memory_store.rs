//! In-Memory Record Store Adapter
//!
//! Tenant-partitioned record storage in memory.
//! Useful for testing and for the development binary.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, TenantId};
use crate::domain::realtime::{EntityKind, MutatedRecord, RecordDraft};
use crate::ports::{RecordStore, UpsertOutcome};

type RecordKey = (EntityKind, TenantId, String);

/// In-memory storage for business records
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordStore {
    records: Arc<RwLock<HashMap<RecordKey, MutatedRecord>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every write fail with `DatabaseError` until cleared.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Look up a stored record
    pub async fn get(&self, kind: EntityKind, tenant_id: &TenantId, id: &str) -> Option<MutatedRecord> {
        self.records
            .read()
            .await
            .get(&(kind, tenant_id.clone(), id.to_string()))
            .cloned()
    }

    /// Get the number of stored records
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }

    fn check_available(&self) -> Result<(), DomainError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DomainError::new(
                ErrorCode::DatabaseError,
                "record store unavailable",
            ));
        }
        Ok(())
    }
}

/// The scope always wins over whatever tenant the draft carried.
fn stamp(mut draft: RecordDraft, tenant_id: &TenantId) -> MutatedRecord {
    draft.tenant_id = Some(tenant_id.clone());
    draft
}

fn not_found(kind: EntityKind, id: &str) -> DomainError {
    DomainError::new(ErrorCode::RecordNotFound, format!("{} not found", kind))
        .with_detail("id", id)
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn create(
        &self,
        kind: EntityKind,
        tenant_id: &TenantId,
        draft: RecordDraft,
    ) -> Result<MutatedRecord, DomainError> {
        self.check_available()?;

        let mut record = stamp(draft, tenant_id);
        if record.id.is_empty() {
            record.id = Uuid::new_v4().to_string();
        }

        let mut records = self.records.write().await;
        let key = (kind, tenant_id.clone(), record.id.clone());
        if records.contains_key(&key) {
            return Err(
                DomainError::validation("id", format!("{} already exists", kind))
                    .with_detail("id", record.id.as_str()),
            );
        }
        records.insert(key, record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        kind: EntityKind,
        tenant_id: &TenantId,
        draft: RecordDraft,
    ) -> Result<MutatedRecord, DomainError> {
        self.check_available()?;

        let record = stamp(draft, tenant_id);
        let mut records = self.records.write().await;
        match records.get_mut(&(kind, tenant_id.clone(), record.id.clone())) {
            Some(existing) => {
                *existing = record.clone();
                Ok(record)
            }
            None => Err(not_found(kind, &record.id)),
        }
    }

    async fn delete(
        &self,
        kind: EntityKind,
        tenant_id: &TenantId,
        id: &str,
    ) -> Result<MutatedRecord, DomainError> {
        self.check_available()?;

        self.records
            .write()
            .await
            .remove(&(kind, tenant_id.clone(), id.to_string()))
            .ok_or_else(|| not_found(kind, id))
    }

    async fn upsert(
        &self,
        kind: EntityKind,
        tenant_id: &TenantId,
        draft: RecordDraft,
    ) -> Result<UpsertOutcome, DomainError> {
        self.check_available()?;

        if draft.id.is_empty() {
            return Err(DomainError::validation("id", "upsert requires an id"));
        }

        let record = stamp(draft, tenant_id);
        let previous = self
            .records
            .write()
            .await
            .insert((kind, tenant_id.clone(), record.id.clone()), record.clone());

        Ok(UpsertOutcome {
            record,
            inserted: previous.is_none(),
        })
    }
}
