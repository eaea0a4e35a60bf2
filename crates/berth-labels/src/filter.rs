//! Reverse lookup from a label to the replication policies whose filter
//! expressions reference it.
//!
//! Policy filters are opaque JSON documents owned by the replication engine.
//! Each policy is decoded on its own; one malformed filter never hides the
//! rest of the scan.

use std::collections::HashSet;
use std::error::Error;
use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use crate::directory::SharedPolicySource;
use crate::error::LabelResult;
use crate::model::{FilterItem, Label, LabelScope, PolicyId, ReplicationPolicy};

/// Failure to decode one policy's filter expression.
#[derive(Debug, Error)]
#[error("failed to decode filter expression")]
pub struct FilterParseError {
    /// Underlying decoder failure.
    #[source]
    pub source: Box<dyn Error + Send + Sync>,
}

/// Decodes raw filter expressions into items.
pub trait FilterParser: Send + Sync {
    /// Decode `raw` into an ordered list of filter items.
    ///
    /// # Errors
    ///
    /// Returns `FilterParseError` when the expression is malformed.
    fn parse(&self, raw: &str) -> Result<Vec<FilterItem>, FilterParseError>;
}

/// Parser for JSON arrays of `{"kind": ..., "value": ...}` objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFilterParser;

impl FilterParser for JsonFilterParser {
    fn parse(&self, raw: &str) -> Result<Vec<FilterItem>, FilterParseError> {
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(raw).map_err(|err| FilterParseError {
            source: Box::new(err),
        })
    }
}

/// Finds policies whose filters reference a label.
#[derive(Clone)]
pub struct PolicyFilterIndex {
    policies: SharedPolicySource,
    parser: Arc<dyn FilterParser>,
}

impl PolicyFilterIndex {
    /// Index over `policies` using the JSON filter parser.
    #[must_use]
    pub fn new(policies: SharedPolicySource) -> Self {
        Self::with_parser(policies, Arc::new(JsonFilterParser))
    }

    /// Index over `policies` using a custom parser.
    #[must_use]
    pub fn with_parser(policies: SharedPolicySource, parser: Arc<dyn FilterParser>) -> Self {
        Self { policies, parser }
    }

    /// Policies visible to the label's scope that reference it.
    ///
    /// Global labels are matched against every project; project labels only
    /// against their own project. Results keep the source order and are
    /// deduplicated by policy id.
    ///
    /// # Errors
    ///
    /// Propagates failures of the policy source. Per-policy parse failures
    /// are logged and skipped.
    pub async fn find_policies_referencing_label(
        &self,
        label: &Label,
    ) -> LabelResult<Vec<ReplicationPolicy>> {
        let project = match label.scope {
            LabelScope::Global => None,
            LabelScope::Project => Some(label.project_id),
        };
        let records = self.policies.list_policies(project).await?;

        let mut seen: HashSet<PolicyId> = HashSet::new();
        let mut matches = Vec::new();
        for record in records {
            let filters = match self.parser.parse(&record.filters) {
                Ok(filters) => filters,
                Err(err) => {
                    warn!(
                        policy_id = record.id,
                        label_id = label.id,
                        error = %err,
                        "skipping policy with undecodable filters"
                    );
                    continue;
                }
            };
            if !filters.iter().any(|item| item.references_label(label.id)) {
                continue;
            }
            if seen.insert(record.id) {
                matches.push(ReplicationPolicy::from_record(record, filters));
            }
        }
        Ok(matches)
    }
}
