//! The written business record as seen by the distribution layer.
//!
//! The CRUD domain owns the real record types. The realtime layer only needs
//! identifiers (for room resolution and relevance checks on the client) and a
//! handful of display attributes (for payload enrichment), so records are
//! projected into this shape by the persistence adapter.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::domain::foundation::{ProjectId, TenantId, UserId};

/// A record after a committed write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutatedRecord {
    /// The entity's own id.
    pub id: String,

    pub tenant_id: Option<TenantId>,

    pub project_id: Option<ProjectId>,

    /// Owner or recipient (notifications, personal notes/files).
    pub user_id: Option<UserId>,

    /// Other foreign keys, keyed by their camelCase payload name (e.g. `taskId`).
    pub references: BTreeMap<String, String>,

    /// Display attributes (e.g. `title`, `storageKey`).
    pub attributes: Map<String, Value>,
}

impl MutatedRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
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

    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_reference(mut self, key: impl Into<String>, id: impl Into<String>) -> Self {
        self.references.insert(key.into(), id.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Returns a string attribute, if present.
    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }
}

/// Input to a write through the scoped façade.
///
/// The id is optional on create (the store assigns one); the façade stamps
/// the tenant from its scope when the draft leaves it empty.
pub type RecordDraft = MutatedRecord;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_identifiers_and_attributes() {
        let record = MutatedRecord::new("task-1")
            .with_project(ProjectId::new("p1").unwrap())
            .with_reference("parentTaskId", "task-0")
            .with_attribute("title", "Write docs");

        assert_eq!(record.id, "task-1");
        assert_eq!(record.project_id.as_ref().map(|p| p.as_str()), Some("p1"));
        assert_eq!(record.references.get("parentTaskId").map(String::as_str), Some("task-0"));
        assert_eq!(record.attribute_str("title"), Some("Write docs"));
    }

    #[test]
    fn attribute_str_ignores_non_strings() {
        let record = MutatedRecord::new("f1").with_attribute("size", 42);
        assert_eq!(record.attribute_str("size"), None);
    }
}
