//! Payload building - what subscribers receive for a write.
//!
//! Every payload carries enough identifiers for a client to decide whether
//! it cares without a round trip:
//!
//! - `id` and the kind-specific id key (`taskId`, `noteId`, ...)
//! - `actorUserId`
//! - `tenantId` / `projectId` / `userId` when known
//! - every foreign key in `record.references`
//! - `operation`
//!
//! Display-only fields that are not on the raw record (e.g. a presigned
//! download URL) are added here and nowhere else.

use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::realtime::context::EmitContext;
use crate::domain::realtime::entity::{EntityKind, Operation};
use crate::domain::realtime::event::EventName;
use crate::domain::realtime::record::MutatedRecord;
use crate::ports::DownloadUrlSigner;

/// Attribute holding the object-storage key of a file record.
pub const STORAGE_KEY_ATTRIBUTE: &str = "storageKey";

/// Errors that prevent a payload from being built at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("{kind} record has no id")]
    MissingEntityId { kind: EntityKind },
}

/// Builds the event name and payload for a committed write.
#[derive(Clone, Default)]
pub struct PayloadBuilder {
    signer: Option<Arc<dyn DownloadUrlSigner>>,
}

impl PayloadBuilder {
    /// Builder without download URL enrichment.
    pub fn new() -> Self {
        Self { signer: None }
    }

    /// Builder that presigns download URLs for file payloads.
    pub fn with_signer(signer: Arc<dyn DownloadUrlSigner>) -> Self {
        Self {
            signer: Some(signer),
        }
    }

    pub fn build(
        &self,
        kind: EntityKind,
        operation: Operation,
        record: &MutatedRecord,
        ctx: &EmitContext,
    ) -> Result<(EventName, Value), BuildError> {
        if record.id.is_empty() {
            return Err(BuildError::MissingEntityId { kind });
        }

        let mut payload = Map::new();
        payload.insert("id".into(), record.id.clone().into());
        payload.insert(kind.id_key().into(), record.id.clone().into());
        payload.insert("operation".into(), operation.as_str().into());

        if let Some(actor) = &ctx.actor_user_id {
            payload.insert("actorUserId".into(), actor.as_str().into());
        }
        if let Some(tenant) = record.tenant_id.as_ref().or(ctx.tenant_id.as_ref()) {
            payload.insert("tenantId".into(), tenant.as_str().into());
        }
        // A project record's own id already sits under `projectId`.
        if kind != EntityKind::Project {
            if let Some(project) = record.project_id.as_ref().or(ctx.project_id.as_ref()) {
                payload.insert("projectId".into(), project.as_str().into());
            }
        }
        if let Some(user) = &record.user_id {
            payload.insert("userId".into(), user.as_str().into());
        }
        for (key, id) in &record.references {
            payload
                .entry(key.clone())
                .or_insert_with(|| Value::from(id.as_str()));
        }

        self.enrich(kind, operation, record, &mut payload);

        Ok((EventName::new(kind, operation), Value::Object(payload)))
    }

    fn enrich(
        &self,
        kind: EntityKind,
        operation: Operation,
        record: &MutatedRecord,
        payload: &mut Map<String, Value>,
    ) {
        match kind {
            EntityKind::File => {
                if let Some(name) = record.attribute_str("fileName") {
                    payload.insert("fileName".into(), name.into());
                }
                if operation != Operation::Deleted {
                    self.attach_download_url(record, payload);
                }
            }
            EntityKind::Task | EntityKind::Note => {
                if let Some(title) = record.attribute_str("title") {
                    payload.insert("title".into(), title.into());
                }
            }
            EntityKind::Comment
            | EntityKind::TimeEntry
            | EntityKind::Notification
            | EntityKind::NoteCategory
            | EntityKind::Project
            | EntityKind::Invitation
            | EntityKind::Membership => {}
        }
    }

    fn attach_download_url(&self, record: &MutatedRecord, payload: &mut Map<String, Value>) {
        let (Some(signer), Some(key)) = (&self.signer, record.attribute_str(STORAGE_KEY_ATTRIBUTE))
        else {
            return;
        };

        match signer.sign_download(key) {
            Ok(signed) => {
                payload.insert("downloadUrl".into(), signed.url.into());
                payload.insert(
                    "downloadUrlExpiresAt".into(),
                    signed.expires_at.to_rfc3339().into(),
                );
            }
            Err(e) => {
                tracing::warn!(
                    file_id = %record.id,
                    error = %e,
                    "Failed to presign download URL, emitting without it"
                );
            }
        }
    }
}

impl std::fmt::Debug for PayloadBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadBuilder")
            .field("signer", &self.signer.is_some())
            .finish()
    }
}
