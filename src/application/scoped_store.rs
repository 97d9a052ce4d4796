//! Scoped data-access façade.
//!
//! Business code writes through a store bound to one tenant. Every
//! committed write is passed to the [`MutationInterceptor`]:
//!
//! - [`ScopedStore`] returns the effect alongside the record, so callers
//!   (and tests) decide when to dispatch it.
//! - [`AutoEmitStore`] dispatches the effect itself and returns only the
//!   record.
//!
//! A failed write returns the store's error and produces no effect.

use std::sync::Arc;

use crate::adapters::events::EmitDispatcher;
use crate::domain::foundation::{DomainError, TenantId};
use crate::domain::realtime::{
    EmitContext, EmitEffect, EntityKind, MutatedRecord, Operation, RecordDraft, WriteKind,
};
use crate::ports::RecordStore;

use super::interceptor::MutationInterceptor;

/// A committed record plus the events it should produce.
#[derive(Debug, Clone, PartialEq)]
pub struct Written {
    pub record: MutatedRecord,
    pub effect: EmitEffect,
}

/// Tenant-scoped writes that compute, but do not perform, their emission.
#[derive(Clone)]
pub struct ScopedStore {
    store: Arc<dyn RecordStore>,
    tenant_id: TenantId,
    interceptor: MutationInterceptor,
}

impl ScopedStore {
    pub fn new(
        store: Arc<dyn RecordStore>,
        tenant_id: TenantId,
        interceptor: MutationInterceptor,
    ) -> Self {
        Self {
            store,
            tenant_id,
            interceptor,
        }
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    pub async fn create(
        &self,
        kind: EntityKind,
        draft: RecordDraft,
        ctx: Option<EmitContext>,
    ) -> Result<Written, DomainError> {
        self.apply(kind, WriteKind::Create, draft, ctx).await
    }

    pub async fn update(
        &self,
        kind: EntityKind,
        draft: RecordDraft,
        ctx: Option<EmitContext>,
    ) -> Result<Written, DomainError> {
        self.apply(kind, WriteKind::Update, draft, ctx).await
    }

    /// Delete by id. The event carries the record as it was before deletion.
    pub async fn delete(
        &self,
        kind: EntityKind,
        id: &str,
        ctx: Option<EmitContext>,
    ) -> Result<Written, DomainError> {
        self.apply(kind, WriteKind::Delete, MutatedRecord::new(id), ctx)
            .await
    }

    /// Insert or update. Emits `created` on insert and `updated` otherwise.
    pub async fn upsert(
        &self,
        kind: EntityKind,
        draft: RecordDraft,
        ctx: Option<EmitContext>,
    ) -> Result<Written, DomainError> {
        self.apply(kind, WriteKind::Upsert, draft, ctx).await
    }

    /// Like [`apply`](Self::apply) for callers that name the kind at runtime.
    ///
    /// An unknown kind is rejected before anything is written.
    pub async fn apply_named(
        &self,
        kind: &str,
        write: WriteKind,
        draft: RecordDraft,
        ctx: Option<EmitContext>,
    ) -> Result<Written, DomainError> {
        let kind = kind.parse::<EntityKind>().map_err(|e| {
            tracing::warn!(kind = %e.0, "Rejected write for unknown entity kind");
            DomainError::validation("entity_kind", e.to_string())
        })?;
        self.apply(kind, write, draft, ctx).await
    }

    /// Perform `write` and compute its effect.
    pub async fn apply(
        &self,
        kind: EntityKind,
        write: WriteKind,
        mut draft: RecordDraft,
        ctx: Option<EmitContext>,
    ) -> Result<Written, DomainError> {
        if draft.tenant_id.is_none() {
            draft.tenant_id = Some(self.tenant_id.clone());
        }
        let ctx = ctx.map(|c| c.scoped_to(&self.tenant_id));

        let (record, operation) = match write {
            WriteKind::Create => (
                self.store.create(kind, &self.tenant_id, draft).await?,
                Operation::Created,
            ),
            WriteKind::Update => (
                self.store.update(kind, &self.tenant_id, draft).await?,
                Operation::Updated,
            ),
            WriteKind::Delete => (
                self.store.delete(kind, &self.tenant_id, &draft.id).await?,
                Operation::Deleted,
            ),
            WriteKind::Upsert => {
                let outcome = self.store.upsert(kind, &self.tenant_id, draft).await?;
                (outcome.record, write.operation(outcome.inserted))
            }
        };

        let effect = self
            .interceptor
            .intercept(kind, operation, &record, ctx.as_ref());
        Ok(Written { record, effect })
    }
}

/// Tenant-scoped writes that dispatch their own effects.
#[derive(Clone)]
pub struct AutoEmitStore {
    scoped: ScopedStore,
    dispatcher: Option<Arc<EmitDispatcher>>,
}

impl AutoEmitStore {
    /// `dispatcher` is `None` where no gateway runs (scripts, build steps);
    /// writes then succeed without broadcasting.
    pub fn new(scoped: ScopedStore, dispatcher: Option<Arc<EmitDispatcher>>) -> Self {
        Self { scoped, dispatcher }
    }

    pub fn tenant_id(&self) -> &TenantId {
        self.scoped.tenant_id()
    }

    pub async fn create(
        &self,
        kind: EntityKind,
        draft: RecordDraft,
        ctx: Option<EmitContext>,
    ) -> Result<MutatedRecord, DomainError> {
        self.finish(self.scoped.create(kind, draft, ctx).await?)
    }

    pub async fn update(
        &self,
        kind: EntityKind,
        draft: RecordDraft,
        ctx: Option<EmitContext>,
    ) -> Result<MutatedRecord, DomainError> {
        self.finish(self.scoped.update(kind, draft, ctx).await?)
    }

    pub async fn delete(
        &self,
        kind: EntityKind,
        id: &str,
        ctx: Option<EmitContext>,
    ) -> Result<MutatedRecord, DomainError> {
        self.finish(self.scoped.delete(kind, id, ctx).await?)
    }

    pub async fn upsert(
        &self,
        kind: EntityKind,
        draft: RecordDraft,
        ctx: Option<EmitContext>,
    ) -> Result<MutatedRecord, DomainError> {
        self.finish(self.scoped.upsert(kind, draft, ctx).await?)
    }

    /// Named-kind write; see [`ScopedStore::apply_named`].
    pub async fn apply_named(
        &self,
        kind: &str,
        write: WriteKind,
        draft: RecordDraft,
        ctx: Option<EmitContext>,
    ) -> Result<MutatedRecord, DomainError> {
        self.finish(self.scoped.apply_named(kind, write, draft, ctx).await?)
    }

    fn finish(&self, written: Written) -> Result<MutatedRecord, DomainError> {
        match &self.dispatcher {
            Some(dispatcher) => {
                dispatcher.dispatch(written.effect);
            }
            None if !written.effect.is_empty() => {
                tracing::debug!(events = written.effect.len(), "No gateway, skipping emit");
            }
            None => {}
        }
        Ok(written.record)
    }
}
