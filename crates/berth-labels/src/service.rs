//! Label service facade.
//!
//! # Design
//! - Each call authenticates, validates, authorizes, then touches the store.
//! - Validation and authorization failures return before any write.
//! - Update and delete reject callers that administer nothing before reading
//!   the target label.
//! - Every call ends with one structured `tracing` event carrying the outcome.

use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use crate::authz::{AuthorizationGate, Operation, ScopeRef};
use crate::directory::{
    Credential, Principal, SharedIdentityProvider, SharedPolicySource, SharedProjectDirectory,
};
use crate::error::{ErrorKind, LabelError, LabelResult};
use crate::filter::{FilterParser, PolicyFilterIndex};
use crate::model::{
    Label, LabelId, LabelPage, LabelPatch, LabelQuery, LabelResources, LabelScope, LabelUpdate,
    NewLabel,
};
use crate::store::SharedLabelStore;
use crate::validate::{check_id, check_query, normalize_name, normalize_new_label};

/// Entry point for label operations.
#[derive(Clone)]
pub struct LabelService {
    store: SharedLabelStore,
    identity: SharedIdentityProvider,
    directory: SharedProjectDirectory,
    policies: SharedPolicySource,
    gate: AuthorizationGate,
    index: PolicyFilterIndex,
}

impl LabelService {
    /// Wire the service over its collaborators.
    #[must_use]
    pub fn new(
        store: SharedLabelStore,
        identity: SharedIdentityProvider,
        directory: SharedProjectDirectory,
        policies: SharedPolicySource,
    ) -> Self {
        Self {
            store,
            identity,
            gate: AuthorizationGate::new(Arc::clone(&directory)),
            directory,
            index: PolicyFilterIndex::new(Arc::clone(&policies)),
            policies,
        }
    }

    /// Replace the filter parser used for resource lookups.
    #[must_use]
    pub fn with_filter_parser(mut self, parser: Arc<dyn FilterParser>) -> Self {
        self.index = PolicyFilterIndex::with_parser(Arc::clone(&self.policies), parser);
        self
    }

    /// Create a label and return its id.
    ///
    /// # Errors
    ///
    /// `Unauthenticated`, `InvalidArgument`, `Forbidden`, `NotFound` (project),
    /// `Conflict`, or `Backend`.
    #[instrument(name = "label_service.create", skip_all)]
    pub async fn create_label(
        &self,
        credential: &Credential,
        label: NewLabel,
    ) -> LabelResult<LabelId> {
        let result: LabelResult<LabelId> = async {
            let principal = self.authenticated(credential).await?;
            let label = normalize_new_label(label)?;
            let scope = match label.scope {
                LabelScope::Global => ScopeRef::Global,
                LabelScope::Project => ScopeRef::Project(label.effective_project_id()),
            };
            self.gate.authorize_create(&principal, scope).await?;
            self.store.create(label).await
        }
        .await;
        observe(Operation::Create, result.as_ref().ok().copied(), &result);
        result
    }

    /// Fetch a label visible to the caller.
    ///
    /// # Errors
    ///
    /// `InvalidArgument`, `NotFound`, `Unauthenticated`, `Forbidden`, or `Backend`.
    #[instrument(name = "label_service.get", skip(self, credential))]
    pub async fn get_label(&self, credential: &Credential, id: LabelId) -> LabelResult<Label> {
        let result: LabelResult<Label> = async {
            check_id(id)?;
            let principal = self.identity.authenticate(credential).await?;
            let label = self.store.get(id).await?;
            self.gate
                .authorize(&principal, Operation::Read, ScopeRef::of(&label))
                .await?;
            Ok(label)
        }
        .await;
        observe(Operation::Read, Some(id), &result);
        result
    }

    /// List labels in a scope.
    ///
    /// # Errors
    ///
    /// `InvalidArgument`, `NotFound` (project), `Unauthenticated`, `Forbidden`,
    /// or `Backend`.
    #[instrument(
        name = "label_service.list",
        skip(self, credential, query),
        fields(scope = %query.scope)
    )]
    pub async fn list_labels(
        &self,
        credential: &Credential,
        query: LabelQuery,
    ) -> LabelResult<LabelPage> {
        let result: LabelResult<LabelPage> = async {
            let project_id = check_query(&query)?;
            let principal = self.identity.authenticate(credential).await?;
            let scope = match query.scope {
                LabelScope::Global => ScopeRef::Global,
                LabelScope::Project => {
                    if self.directory.project(project_id).await?.is_none() {
                        return Err(LabelError::project_not_found(project_id));
                    }
                    ScopeRef::Project(project_id)
                }
            };
            self.gate.authorize(&principal, Operation::List, scope).await?;
            self.store.list(&query).await
        }
        .await;
        observe(Operation::List, None, &result);
        result
    }

    /// Rename a label or change its display metadata.
    ///
    /// `description` and `color` left as `None` keep their stored values.
    ///
    /// # Errors
    ///
    /// `Unauthenticated`, `InvalidArgument`, `Forbidden`, `NotFound`,
    /// `Conflict`, or `Backend`.
    #[instrument(name = "label_service.update", skip(self, credential, update))]
    pub async fn update_label(
        &self,
        credential: &Credential,
        id: LabelId,
        update: LabelUpdate,
    ) -> LabelResult<Label> {
        let result: LabelResult<Label> = async {
            let principal = self.authenticated(credential).await?;
            check_id(id)?;
            let name = normalize_name(&update.name)?;
            self.gate
                .require_mutation_capability(&principal, Operation::Update)
                .await?;
            let current = self.load_optional(id).await?;
            self.gate
                .authorize_label_mutation(&principal, Operation::Update, id, current.as_ref())
                .await?;
            let current = current.ok_or(LabelError::label_not_found(id))?;
            if update.scope.is_some_and(|scope| scope != current.scope) {
                return Err(LabelError::invalid("scope", "immutable"));
            }
            if update
                .project_id
                .is_some_and(|project_id| project_id != current.project_id)
            {
                return Err(LabelError::invalid("project_id", "immutable"));
            }
            let patch = LabelPatch {
                name,
                description: update.description.or(current.description),
                color: update.color.or(current.color),
            };
            self.store.update(id, patch).await
        }
        .await;
        observe(Operation::Update, Some(id), &result);
        result
    }

    /// Delete a label.
    ///
    /// # Errors
    ///
    /// `Unauthenticated`, `InvalidArgument`, `Forbidden`, `NotFound`, or `Backend`.
    #[instrument(name = "label_service.delete", skip(self, credential))]
    pub async fn delete_label(&self, credential: &Credential, id: LabelId) -> LabelResult<()> {
        let result: LabelResult<()> = async {
            let principal = self.authenticated(credential).await?;
            check_id(id)?;
            self.gate
                .require_mutation_capability(&principal, Operation::Delete)
                .await?;
            let current = self.load_optional(id).await?;
            self.gate
                .authorize_label_mutation(&principal, Operation::Delete, id, current.as_ref())
                .await?;
            self.store.delete(id).await
        }
        .await;
        observe(Operation::Delete, Some(id), &result);
        result
    }

    /// Resources whose definitions reference label `id`.
    ///
    /// # Errors
    ///
    /// `Unauthenticated`, `InvalidArgument`, `NotFound`, `Forbidden`, or `Backend`.
    #[instrument(name = "label_service.list_resources", skip(self, credential))]
    pub async fn list_label_resources(
        &self,
        credential: &Credential,
        id: LabelId,
    ) -> LabelResult<LabelResources> {
        let result: LabelResult<LabelResources> = async {
            let principal = self.authenticated(credential).await?;
            check_id(id)?;
            let label = self.store.get(id).await?;
            self.gate
                .authorize(&principal, Operation::ListResources, ScopeRef::of(&label))
                .await?;
            let replication_policies = self.index.find_policies_referencing_label(&label).await?;
            Ok(LabelResources {
                replication_policies,
            })
        }
        .await;
        observe(Operation::ListResources, Some(id), &result);
        result
    }

    async fn authenticated(&self, credential: &Credential) -> LabelResult<Principal> {
        let principal = self.identity.authenticate(credential).await?;
        AuthorizationGate::require_authenticated(&principal)?;
        Ok(principal)
    }

    async fn load_optional(&self, id: LabelId) -> LabelResult<Option<Label>> {
        match self.store.get(id).await {
            Ok(label) => Ok(Some(label)),
            Err(LabelError::NotFound { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

fn observe<T>(operation: Operation, label_id: Option<LabelId>, result: &LabelResult<T>) {
    match result {
        Ok(_) => info!(
            operation = operation.as_str(),
            label_id = ?label_id,
            outcome = "success",
            "label operation completed"
        ),
        Err(err) if err.kind() == ErrorKind::Internal => error!(
            operation = operation.as_str(),
            label_id = ?label_id,
            outcome = err.kind().as_str(),
            error = %err,
            "label operation failed"
        ),
        Err(err) => warn!(
            operation = operation.as_str(),
            label_id = ?label_id,
            outcome = err.kind().as_str(),
            detail = %err.detail(),
            "label operation rejected"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::directory::ProjectRole;
    use crate::memory::{MemoryDirectory, MemoryPolicySource};
    use crate::store::{LabelStore, MemoryLabelStore};

    /// Store wrapper that counts reads.
    struct CountingStore {
        inner: MemoryLabelStore,
        gets: AtomicUsize,
    }

    #[async_trait]
    impl LabelStore for CountingStore {
        async fn create(&self, label: NewLabel) -> LabelResult<LabelId> {
            self.inner.create(label).await
        }

        async fn get(&self, id: LabelId) -> LabelResult<Label> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            self.inner.get(id).await
        }

        async fn list(&self, query: &LabelQuery) -> LabelResult<LabelPage> {
            self.inner.list(query).await
        }

        async fn update(&self, id: LabelId, patch: LabelPatch) -> LabelResult<Label> {
            self.inner.update(id, patch).await
        }

        async fn delete(&self, id: LabelId) -> LabelResult<()> {
            self.inner.delete(id).await
        }
    }

    fn directory() -> Arc<MemoryDirectory> {
        Arc::new(
            MemoryDirectory::new()
                .with_project(1, "library", false)
                .with_user(1, "admin", true)
                .with_user(2, "owner", false)
                .with_user(3, "dev", false)
                .with_api_key("admin", "pw", 1)
                .with_api_key("owner", "pw", 2)
                .with_api_key("dev", "pw", 3)
                .with_member(2, 1, ProjectRole::Admin)
                .with_member(3, 1, ProjectRole::Developer),
        )
    }

    fn service_over(store: SharedLabelStore, directory: Arc<MemoryDirectory>) -> LabelService {
        LabelService::new(
            store,
            directory.clone(),
            directory,
            Arc::new(MemoryPolicySource::new()),
        )
    }

    fn service() -> LabelService {
        let directory = directory();
        let store = Arc::new(MemoryLabelStore::new(directory.clone()));
        service_over(store, directory)
    }

    fn admin() -> Credential {
        Credential::api_key("admin", "pw")
    }

    fn owner() -> Credential {
        Credential::api_key("owner", "pw")
    }

    #[tokio::test]
    async fn update_keeps_metadata_when_omitted() {
        let service = service();
        let id = service
            .create_label(&owner(), NewLabel::project("dev", 1).with_color("#00ff00"))
            .await
            .expect("create");
        let updated = service
            .update_label(&owner(), id, LabelUpdate::rename("qa"))
            .await
            .expect("update");
        assert_eq!(updated.name, "qa");
        assert_eq!(updated.color.as_deref(), Some("#00ff00"));
    }

    #[tokio::test]
    async fn update_rejects_scope_changes() {
        let service = service();
        let id = service
            .create_label(&admin(), NewLabel::global("sec"))
            .await
            .expect("create");
        let mut update = LabelUpdate::rename("sec");
        update.scope = Some(LabelScope::Project);
        update.project_id = Some(1);
        let err = service.update_label(&admin(), id, update).await.unwrap_err();
        assert!(matches!(err, LabelError::InvalidArgument { field: "scope", .. }));

        let mut update = LabelUpdate::rename("sec");
        update.scope = Some(LabelScope::Global);
        update.project_id = Some(0);
        service
            .update_label(&admin(), id, update)
            .await
            .expect("echoing current scope is accepted");
    }

    #[tokio::test]
    async fn invalid_credentials_are_rejected_everywhere() {
        let service = service();
        let bad = Credential::api_key("admin", "wrong");
        let err = service.get_label(&bad, 1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthenticated);
        let err = service.list_labels(&bad, LabelQuery::global()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthenticated);
    }

    #[tokio::test]
    async fn mutations_by_non_admins_never_read_the_store() {
        let directory = directory();
        let store = Arc::new(CountingStore {
            inner: MemoryLabelStore::new(directory.clone()),
            gets: AtomicUsize::new(0),
        });
        let service = service_over(store.clone(), directory);
        let id = service
            .create_label(&owner(), NewLabel::project("dev", 1))
            .await
            .expect("create");
        let developer = Credential::api_key("dev", "pw");

        for target in [id, 999] {
            let err = service
                .update_label(&developer, target, LabelUpdate::rename("x"))
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Forbidden);
            let err = service.delete_label(&developer, target).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Forbidden);
        }
        assert_eq!(store.gets.load(Ordering::SeqCst), 0);

        let err = service.delete_label(&owner(), 999).await.unwrap_err();
        assert!(matches!(err, LabelError::NotFound { id: 999, .. }));
        assert_eq!(store.gets.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn list_for_unknown_project_is_not_found() {
        let service = service();
        let err = service
            .list_labels(&admin(), LabelQuery::project(77))
            .await
            .unwrap_err();
        assert!(matches!(err, LabelError::NotFound { id: 77, .. }));
    }
}
