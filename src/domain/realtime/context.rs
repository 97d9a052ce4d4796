//! Emit context carried alongside a mutation call.

use crate::domain::foundation::{ProjectId, TenantId, UserId};

/// Metadata accompanying a write that decides whether and where it is broadcast.
///
/// Constructed per call and never persisted. A write without a context, or
/// with a context lacking an actor, is silently not broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmitContext {
    /// Acting user. Required for any emission to happen.
    pub actor_user_id: Option<UserId>,

    /// Tenant scope; the scoped façade fills it in when omitted.
    pub tenant_id: Option<TenantId>,

    /// Project the caller is working in, if any.
    pub project_id: Option<ProjectId>,

    /// Forces zero emission (bulk imports, seeds, migrations).
    pub skip_emit: bool,
}

impl EmitContext {
    /// Context for a write performed by `actor`.
    pub fn for_actor(actor: UserId) -> Self {
        Self {
            actor_user_id: Some(actor),
            ..Self::default()
        }
    }

    pub fn with_tenant(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    pub fn with_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    /// Marks the write as silent.
    pub fn skipping_emit(mut self) -> Self {
        self.skip_emit = true;
        self
    }

    /// True when an actor is present and emission is not suppressed.
    pub fn should_emit(&self) -> bool {
        self.actor_user_id.is_some() && !self.skip_emit
    }

    /// Fills the tenant from the façade scope unless the caller set one.
    pub fn scoped_to(mut self, tenant_id: &TenantId) -> Self {
        if self.tenant_id.is_none() {
            self.tenant_id = Some(tenant_id.clone());
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor() -> UserId {
        UserId::new("u1").unwrap()
    }

    #[test]
    fn default_context_does_not_emit() {
        assert!(!EmitContext::default().should_emit());
    }

    #[test]
    fn actor_context_emits() {
        assert!(EmitContext::for_actor(actor()).should_emit());
    }

    #[test]
    fn skip_emit_wins_over_actor() {
        let ctx = EmitContext::for_actor(actor()).skipping_emit();
        assert!(!ctx.should_emit());
    }

    #[test]
    fn scoped_to_fills_missing_tenant_only() {
        let scope = TenantId::new("scope").unwrap();
        let explicit = TenantId::new("explicit").unwrap();

        let filled = EmitContext::for_actor(actor()).scoped_to(&scope);
        assert_eq!(filled.tenant_id, Some(scope.clone()));

        let kept = EmitContext::for_actor(actor())
            .with_tenant(explicit.clone())
            .scoped_to(&scope);
        assert_eq!(kept.tenant_id, Some(explicit));
    }
}
