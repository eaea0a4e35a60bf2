//! Label and replication-policy data model.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::LabelError;

/// Identifier assigned to a label at creation.
pub type LabelId = i64;
/// Identifier of a registry project.
pub type ProjectId = i64;
/// Identifier of a replication policy.
pub type PolicyId = i64;
/// Identifier of a registry user.
pub type UserId = i64;

/// Filter item kind that points at a label.
pub const FILTER_KIND_LABEL: &str = "label";

/// Default page returned when a query does not specify one.
pub const DEFAULT_PAGE: u32 = 1;
/// Default page size for label listings.
pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// Upper bound accepted for `page_size`.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Where a label applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LabelScope {
    /// Platform-wide label.
    #[serde(rename = "g")]
    Global,
    /// Label owned by a single project.
    #[serde(rename = "p")]
    Project,
}

impl LabelScope {
    /// Wire representation (`g` or `p`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Global => "g",
            Self::Project => "p",
        }
    }
}

impl Display for LabelScope {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for LabelScope {
    type Err = LabelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "g" => Ok(Self::Global),
            "p" => Ok(Self::Project),
            "" => Err(LabelError::invalid("scope", "required")),
            _ => Err(LabelError::invalid("scope", "unknown_scope")),
        }
    }
}

/// Persisted label record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Identifier assigned by the store.
    pub id: LabelId,
    /// Display name, unique within its scope.
    pub name: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Optional display color.
    pub color: Option<String>,
    /// Global or project scope.
    pub scope: LabelScope,
    /// Owning project; zero for global labels.
    pub project_id: ProjectId,
    /// Creation timestamp.
    pub creation_time: DateTime<Utc>,
    /// Last modification timestamp.
    pub update_time: DateTime<Utc>,
}

/// Payload accepted when creating a label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLabel {
    /// Requested name.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Optional display color.
    #[serde(default)]
    pub color: Option<String>,
    /// Requested scope.
    pub scope: LabelScope,
    /// Owning project for project labels.
    #[serde(default)]
    pub project_id: Option<ProjectId>,
}

impl NewLabel {
    /// Build a global label payload.
    #[must_use]
    pub fn global(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            color: None,
            scope: LabelScope::Global,
            project_id: None,
        }
    }

    /// Build a project label payload.
    #[must_use]
    pub fn project(name: impl Into<String>, project_id: ProjectId) -> Self {
        Self {
            name: name.into(),
            description: None,
            color: None,
            scope: LabelScope::Project,
            project_id: Some(project_id),
        }
    }

    /// Attach a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach a display color.
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Project id as stored (zero when absent).
    #[must_use]
    pub fn effective_project_id(&self) -> ProjectId {
        self.project_id.unwrap_or(0)
    }
}

/// Filter and pagination parameters for listing labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelQuery {
    /// Mandatory scope filter.
    pub scope: LabelScope,
    /// Project filter, mandatory for project scope.
    pub project_id: Option<ProjectId>,
    /// Case-sensitive substring match on the name.
    pub name: Option<String>,
    /// One-based page index.
    pub page: u32,
    /// Number of items per page.
    pub page_size: u32,
}

impl LabelQuery {
    /// Query all global labels.
    #[must_use]
    pub const fn global() -> Self {
        Self {
            scope: LabelScope::Global,
            project_id: None,
            name: None,
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Query the labels of one project.
    #[must_use]
    pub const fn project(project_id: ProjectId) -> Self {
        Self {
            scope: LabelScope::Project,
            project_id: Some(project_id),
            name: None,
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Restrict results to names containing `fragment`.
    #[must_use]
    pub fn with_name(mut self, fragment: impl Into<String>) -> Self {
        self.name = Some(fragment.into());
        self
    }

    /// Select a page.
    #[must_use]
    pub const fn with_page(mut self, page: u32, page_size: u32) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }

    /// Number of records skipped before the requested page.
    #[must_use]
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize).saturating_mul(self.page_size as usize)
    }

    /// Whether `label` satisfies the scope, project and name filters.
    #[must_use]
    pub fn matches(&self, label: &Label) -> bool {
        if label.scope != self.scope {
            return false;
        }
        if self.scope == LabelScope::Project && Some(label.project_id) != self.project_id {
            return false;
        }
        self.name
            .as_deref()
            .is_none_or(|fragment| label.name.contains(fragment))
    }
}

/// One page of a label listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelPage {
    /// Labels on this page, in id order.
    pub items: Vec<Label>,
    /// Number of matches before pagination.
    pub total: u64,
}

/// Mutable fields applied by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelPatch {
    /// Normalized replacement name.
    pub name: String,
    /// Replacement description.
    pub description: Option<String>,
    /// Replacement color.
    pub color: Option<String>,
}

/// Update payload as received from callers.
///
/// `scope` and `project_id` are accepted only when they match the stored
/// values; a label never moves between scopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelUpdate {
    /// Replacement name.
    pub name: String,
    /// Replacement description; `None` keeps the current one.
    #[serde(default)]
    pub description: Option<String>,
    /// Replacement color; `None` keeps the current one.
    #[serde(default)]
    pub color: Option<String>,
    /// Scope echoed by the caller.
    #[serde(default)]
    pub scope: Option<LabelScope>,
    /// Project echoed by the caller.
    #[serde(default)]
    pub project_id: Option<ProjectId>,
}

impl LabelUpdate {
    /// Rename-only update.
    #[must_use]
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            color: None,
            scope: None,
            project_id: None,
        }
    }
}

/// One clause of a policy filter expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterItem {
    /// Clause kind (`label`, `name`, `tag`, ...).
    #[serde(rename = "kind")]
    pub kind: String,
    /// Clause value, shape depends on the kind.
    #[serde(default)]
    pub value: Value,
}

impl FilterItem {
    /// Whether this item is a label clause pointing at `label_id`.
    ///
    /// Values may be JSON integers or strings holding a base-10 integer.
    #[must_use]
    pub fn references_label(&self, label_id: LabelId) -> bool {
        if self.kind != FILTER_KIND_LABEL {
            return false;
        }
        match &self.value {
            Value::Number(number) => number.as_i64() == Some(label_id),
            Value::String(raw) => raw.trim().parse::<LabelId>().ok() == Some(label_id),
            _ => false,
        }
    }
}

/// Replication policy row as provided by the policy source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRecord {
    /// Policy identifier.
    pub id: PolicyId,
    /// Policy name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Owning project.
    pub project_id: ProjectId,
    /// Replication target.
    pub target_id: i64,
    /// Whether the policy is active.
    pub enabled: bool,
    /// Raw filter expression.
    pub filters: String,
    /// Raw trigger expression.
    pub trigger: String,
    /// Creation timestamp.
    pub creation_time: DateTime<Utc>,
    /// Last modification timestamp.
    pub update_time: DateTime<Utc>,
}

/// Replication policy with its filter expression decoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplicationPolicy {
    /// Policy identifier.
    pub id: PolicyId,
    /// Policy name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Owning project.
    pub project_id: ProjectId,
    /// Replication target.
    pub target_id: i64,
    /// Whether the policy is active.
    pub enabled: bool,
    /// Decoded filter items.
    pub filters: Vec<FilterItem>,
    /// Trigger, decoded when it is JSON and kept verbatim otherwise.
    pub trigger: Value,
    /// Creation timestamp.
    pub creation_time: DateTime<Utc>,
    /// Last modification timestamp.
    pub update_time: DateTime<Utc>,
}

impl ReplicationPolicy {
    /// Combine a policy row with its decoded filters.
    #[must_use]
    pub fn from_record(record: PolicyRecord, filters: Vec<FilterItem>) -> Self {
        let trigger = if record.trigger.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&record.trigger)
                .unwrap_or_else(|_| Value::String(record.trigger.clone()))
        };
        Self {
            id: record.id,
            name: record.name,
            description: record.description,
            project_id: record.project_id,
            target_id: record.target_id,
            enabled: record.enabled,
            filters,
            trigger,
            creation_time: record.creation_time,
            update_time: record.update_time,
        }
    }
}

/// Resources that reference a label, keyed by resource kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LabelResources {
    /// Replication policies whose filters reference the label.
    pub replication_policies: Vec<ReplicationPolicy>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn label(id: LabelId, name: &str, scope: LabelScope, project_id: ProjectId) -> Label {
        let now = Utc::now();
        Label {
            id,
            name: name.to_string(),
            description: None,
            color: None,
            scope,
            project_id,
            creation_time: now,
            update_time: now,
        }
    }

    #[test]
    fn scope_parses_wire_values() {
        assert_eq!("g".parse::<LabelScope>().ok(), Some(LabelScope::Global));
        assert_eq!(" p ".parse::<LabelScope>().ok(), Some(LabelScope::Project));
        let err = "x".parse::<LabelScope>().unwrap_err();
        assert_eq!(err.detail(), "scope: unknown_scope");
        let err = "".parse::<LabelScope>().unwrap_err();
        assert_eq!(err.detail(), "scope: required");
        assert_eq!(LabelScope::Project.to_string(), "p");
    }

    #[test]
    fn new_label_deserializes_from_wire_shape() {
        let payload: NewLabel =
            serde_json::from_value(json!({"name": "dev", "scope": "p", "project_id": 3}))
                .expect("payload should decode");
        assert_eq!(payload, NewLabel::project("dev", 3));
        assert_eq!(NewLabel::global("sec").effective_project_id(), 0);
    }

    #[test]
    fn filter_item_accepts_integer_and_string_values() {
        let number = FilterItem {
            kind: FILTER_KIND_LABEL.to_string(),
            value: json!(5),
        };
        let text = FilterItem {
            kind: FILTER_KIND_LABEL.to_string(),
            value: json!("5"),
        };
        let other_kind = FilterItem {
            kind: "tag".to_string(),
            value: json!(5),
        };
        let garbage = FilterItem {
            kind: FILTER_KIND_LABEL.to_string(),
            value: json!("five"),
        };
        assert!(number.references_label(5));
        assert!(text.references_label(5));
        assert!(!number.references_label(6));
        assert!(!other_kind.references_label(5));
        assert!(!garbage.references_label(5));
    }

    #[test]
    fn query_matches_scope_project_and_name_fragment() {
        let global = label(1, "test", LabelScope::Global, 0);
        let project = label(2, "test", LabelScope::Project, 4);

        assert!(LabelQuery::global().matches(&global));
        assert!(!LabelQuery::global().matches(&project));
        assert!(LabelQuery::project(4).matches(&project));
        assert!(!LabelQuery::project(5).matches(&project));
        assert!(LabelQuery::global().with_name("tes").matches(&global));
        assert!(!LabelQuery::global().with_name("dev").matches(&global));
        assert!(!LabelQuery::global().with_name("Tes").matches(&global));
        assert_eq!(LabelQuery::global().with_page(3, 20).offset(), 40);
    }

    #[test]
    fn policy_trigger_falls_back_to_raw_text() {
        let now = Utc::now();
        let record = PolicyRecord {
            id: 9,
            name: "nightly".to_string(),
            description: None,
            project_id: 1,
            target_id: 2,
            enabled: true,
            filters: String::new(),
            trigger: "manual".to_string(),
            creation_time: now,
            update_time: now,
        };
        let policy = ReplicationPolicy::from_record(record.clone(), Vec::new());
        assert_eq!(policy.trigger, json!("manual"));

        let structured = PolicyRecord {
            trigger: r#"{"kind":"scheduled"}"#.to_string(),
            ..record
        };
        let policy = ReplicationPolicy::from_record(structured, Vec::new());
        assert_eq!(policy.trigger, json!({"kind": "scheduled"}));
    }
}
