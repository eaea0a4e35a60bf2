//! Label persistence contract and the in-memory implementation.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::directory::SharedProjectDirectory;
use crate::error::{LabelError, LabelResult};
use crate::model::{Label, LabelId, LabelPage, LabelPatch, LabelQuery, LabelScope, NewLabel, ProjectId};
use crate::validate::{check_id, check_query, normalize_name, normalize_new_label};

#[async_trait]
/// Row-level persistence for labels.
///
/// Implementations own the uniqueness of `(scope, project_id, name)` and must
/// serialize conflicting writes so concurrent duplicates yield one `Conflict`.
pub trait LabelStore: Send + Sync {
    /// Persist a new label and return its identifier.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty name or inconsistent scope, `NotFound`
    /// for an unknown project, `Conflict` for a duplicate name in scope.
    async fn create(&self, label: NewLabel) -> LabelResult<LabelId>;

    /// Fetch a label by id.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a non-positive id, `NotFound` when absent.
    async fn get(&self, id: LabelId) -> LabelResult<Label>;

    /// List labels matching `query` in id order.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an inconsistent scope or out-of-range pagination.
    async fn list(&self, query: &LabelQuery) -> LabelResult<LabelPage>;

    /// Apply `patch` to an existing label and return the stored result.
    ///
    /// # Errors
    ///
    /// `NotFound` when absent, `InvalidArgument` for an empty name,
    /// `Conflict` when the new name is taken in the same scope.
    async fn update(&self, id: LabelId, patch: LabelPatch) -> LabelResult<Label>;

    /// Remove a label.
    ///
    /// # Errors
    ///
    /// `NotFound` when absent.
    async fn delete(&self, id: LabelId) -> LabelResult<()>;
}

/// Shared label store handle.
pub type SharedLabelStore = Arc<dyn LabelStore>;

#[derive(Debug, Default)]
struct MemoryState {
    next_id: LabelId,
    labels: BTreeMap<LabelId, Label>,
}

impl MemoryState {
    fn name_taken(
        &self,
        scope: LabelScope,
        project_id: ProjectId,
        name: &str,
        except: Option<LabelId>,
    ) -> bool {
        self.labels.values().any(|label| {
            Some(label.id) != except
                && label.scope == scope
                && label.project_id == project_id
                && label.name == name
        })
    }
}

/// Label store backed by a `BTreeMap` behind a single write lock.
pub struct MemoryLabelStore {
    projects: SharedProjectDirectory,
    state: RwLock<MemoryState>,
}

impl MemoryLabelStore {
    /// Create an empty store that checks project existence against `projects`.
    #[must_use]
    pub fn new(projects: SharedProjectDirectory) -> Self {
        Self {
            projects,
            state: RwLock::new(MemoryState::default()),
        }
    }
}

#[async_trait]
impl LabelStore for MemoryLabelStore {
    async fn create(&self, label: NewLabel) -> LabelResult<LabelId> {
        let label = normalize_new_label(label)?;
        let project_id = label.effective_project_id();
        if label.scope == LabelScope::Project && self.projects.project(project_id).await?.is_none() {
            return Err(LabelError::project_not_found(project_id));
        }

        let mut state = self.state.write().await;
        if state.name_taken(label.scope, project_id, &label.name, None) {
            return Err(LabelError::Conflict {
                scope: label.scope,
                project_id,
                name: label.name,
            });
        }
        state.next_id += 1;
        let id = state.next_id;
        let now = Utc::now();
        state.labels.insert(
            id,
            Label {
                id,
                name: label.name,
                description: label.description,
                color: label.color,
                scope: label.scope,
                project_id,
                creation_time: now,
                update_time: now,
            },
        );
        debug!(label_id = id, "label stored");
        Ok(id)
    }

    async fn get(&self, id: LabelId) -> LabelResult<Label> {
        check_id(id)?;
        self.state
            .read()
            .await
            .labels
            .get(&id)
            .cloned()
            .ok_or(LabelError::label_not_found(id))
    }

    async fn list(&self, query: &LabelQuery) -> LabelResult<LabelPage> {
        check_query(query)?;
        let state = self.state.read().await;
        let matching: Vec<&Label> = state
            .labels
            .values()
            .filter(|label| query.matches(label))
            .collect();
        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(query.offset())
            .take(query.page_size as usize)
            .cloned()
            .collect();
        Ok(LabelPage { items, total })
    }

    async fn update(&self, id: LabelId, patch: LabelPatch) -> LabelResult<Label> {
        check_id(id)?;
        let name = normalize_name(&patch.name)?;
        let mut state = self.state.write().await;
        let (scope, project_id) = state
            .labels
            .get(&id)
            .map(|label| (label.scope, label.project_id))
            .ok_or(LabelError::label_not_found(id))?;
        if state.name_taken(scope, project_id, &name, Some(id)) {
            return Err(LabelError::Conflict {
                scope,
                project_id,
                name,
            });
        }
        let label = state
            .labels
            .get_mut(&id)
            .ok_or(LabelError::label_not_found(id))?;
        label.name = name;
        label.description = patch.description;
        label.color = patch.color;
        label.update_time = Utc::now();
        Ok(label.clone())
    }

    async fn delete(&self, id: LabelId) -> LabelResult<()> {
        check_id(id)?;
        self.state
            .write()
            .await
            .labels
            .remove(&id)
            .map(|_| ())
            .ok_or(LabelError::label_not_found(id))
    }
}
