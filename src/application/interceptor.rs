//! MutationInterceptor - turns a committed write into an emit effect.
//!
//! Runs after the write has committed. It never fails: anything that goes
//! wrong while resolving rooms or building the payload is logged and the
//! write is simply not broadcast.

use std::sync::Arc;

use crate::domain::realtime::{
    EmitContext, EmitEffect, EntityKind, MutatedRecord, Operation, PayloadBuilder, RoomResolver,
};
use crate::ports::DownloadUrlSigner;

/// Computes the events for a committed write.
#[derive(Clone, Default)]
pub struct MutationInterceptor {
    resolver: RoomResolver,
    payloads: PayloadBuilder,
}

impl MutationInterceptor {
    /// Interceptor without download URL enrichment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Interceptor that presigns download URLs for file events.
    pub fn with_signer(signer: Arc<dyn DownloadUrlSigner>) -> Self {
        Self {
            resolver: RoomResolver::new(),
            payloads: PayloadBuilder::with_signer(signer),
        }
    }

    /// Build the effect for `record` after a `kind`/`operation` write.
    ///
    /// Returns an empty effect when there is no context, no actor, emission
    /// is suppressed, no room applies, or the payload can't be built.
    pub fn intercept(
        &self,
        kind: EntityKind,
        operation: Operation,
        record: &MutatedRecord,
        ctx: Option<&EmitContext>,
    ) -> EmitEffect {
        let Some(ctx) = ctx.filter(|c| c.should_emit()) else {
            return EmitEffect::none();
        };

        let rooms = self.resolver.resolve(kind, record, ctx);
        if rooms.is_empty() {
            tracing::debug!(
                kind = %kind,
                record_id = %record.id,
                "No room applies to write, not broadcasting"
            );
            return EmitEffect::none();
        }

        match self.payloads.build(kind, operation, record, ctx) {
            Ok((name, payload)) => EmitEffect::fan_out(name, rooms, payload),
            Err(e) => {
                tracing::warn!(kind = %kind, error = %e, "Failed to build realtime payload");
                EmitEffect::none()
            }
        }
    }

    /// Like [`intercept`](Self::intercept) for callers that name the kind
    /// at runtime. Unknown kinds are logged and produce no events.
    pub fn intercept_named(
        &self,
        kind: &str,
        operation: Operation,
        record: &MutatedRecord,
        ctx: Option<&EmitContext>,
    ) -> EmitEffect {
        match kind.parse::<EntityKind>() {
            Ok(kind) => self.intercept(kind, operation, record, ctx),
            Err(e) => {
                tracing::warn!(error = %e, record_id = %record.id, "Not broadcasting write");
                EmitEffect::none()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{DomainError, ErrorCode, ProjectId, TenantId, UserId};
    use crate::domain::realtime::{Room, STORAGE_KEY_ATTRIBUTE};
    use crate::ports::SignedUrl;

    fn actor_ctx() -> EmitContext {
        EmitContext::for_actor(UserId::new("u1").unwrap())
    }

    fn task() -> MutatedRecord {
        MutatedRecord::new("t1")
            .with_project(ProjectId::new("p1").unwrap())
            .with_attribute("title", "Ship it")
    }

    #[test]
    fn emits_one_event_per_room() {
        let effect = MutationInterceptor::new().intercept(
            EntityKind::Task,
            Operation::Created,
            &task(),
            Some(&actor_ctx()),
        );

        assert_eq!(effect.len(), 1);
        let event = &effect.events()[0];
        assert_eq!(event.name.to_string(), "task.created");
        assert_eq!(event.room, Room::project(&ProjectId::new("p1").unwrap()));
        assert_eq!(event.payload["taskId"], "t1");
        assert_eq!(event.payload["actorUserId"], "u1");
    }

    #[test]
    fn missing_context_emits_nothing() {
        let effect =
            MutationInterceptor::new().intercept(EntityKind::Task, Operation::Created, &task(), None);
        assert!(effect.is_empty());
    }

    #[test]
    fn context_without_actor_emits_nothing() {
        let ctx = EmitContext::default().with_tenant(TenantId::new("t1").unwrap());
        let effect = MutationInterceptor::new().intercept(
            EntityKind::Task,
            Operation::Updated,
            &task(),
            Some(&ctx),
        );
        assert!(effect.is_empty());
    }

    #[test]
    fn skip_emit_suppresses_everything() {
        let ctx = actor_ctx().skipping_emit();
        let effect = MutationInterceptor::new().intercept(
            EntityKind::Task,
            Operation::Deleted,
            &task(),
            Some(&ctx),
        );
        assert!(effect.is_empty());
    }

    #[test]
    fn unresolvable_room_emits_nothing() {
        let effect = MutationInterceptor::new().intercept(
            EntityKind::Comment,
            Operation::Created,
            &MutatedRecord::new("c1"),
            Some(&actor_ctx()),
        );
        assert!(effect.is_empty());
    }

    #[test]
    fn build_failure_is_swallowed() {
        let record = MutatedRecord::new("").with_project(ProjectId::new("p1").unwrap());
        let effect = MutationInterceptor::new().intercept(
            EntityKind::Task,
            Operation::Created,
            &record,
            Some(&actor_ctx()),
        );
        assert!(effect.is_empty());
    }

    #[test]
    fn unknown_named_kind_emits_nothing() {
        let interceptor = MutationInterceptor::new();
        assert!(interceptor
            .intercept_named("invoice", Operation::Created, &task(), Some(&actor_ctx()))
            .is_empty());
        assert_eq!(
            interceptor
                .intercept_named("task", Operation::Created, &task(), Some(&actor_ctx()))
                .len(),
            1
        );
    }

    struct BrokenSigner;

    impl DownloadUrlSigner for BrokenSigner {
        fn sign_download(&self, _storage_key: &str) -> Result<SignedUrl, DomainError> {
            Err(DomainError::new(ErrorCode::SigningError, "no credentials"))
        }
    }

    #[test]
    fn signing_failure_still_emits_without_url() {
        let record = MutatedRecord::new("f1")
            .with_project(ProjectId::new("p1").unwrap())
            .with_attribute(STORAGE_KEY_ATTRIBUTE, "k/report.pdf");
        let effect = MutationInterceptor::with_signer(Arc::new(BrokenSigner)).intercept(
            EntityKind::File,
            Operation::Created,
            &record,
            Some(&actor_ctx()),
        );

        assert_eq!(effect.len(), 1);
        assert!(effect.events()[0].payload.get("downloadUrl").is_none());
    }
}
