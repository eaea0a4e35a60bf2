//! Authorization gate for label operations.
//!
//! # Design
//! - `decide` is a pure function over `(Role, Operation, LabelScope, Visibility)`.
//! - Role resolution and project lookups go through the `ProjectDirectory`.
//! - Mutations branch on capability before revealing whether a target exists.

use std::fmt::{self, Display, Formatter};

use tracing::debug;

use crate::directory::{Principal, ProjectRole, SharedProjectDirectory};
use crate::error::{LabelError, LabelResult};
use crate::model::{Label, LabelId, LabelScope, ProjectId};

/// Effective privilege level of a caller for one scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Platform administrator.
    SystemAdmin,
    /// Administrator of the project in scope.
    ProjectAdmin,
    /// Developer in the project in scope.
    ProjectDeveloper,
    /// Guest in the project in scope.
    ProjectGuest,
    /// Authenticated user without membership.
    NonMember,
    /// Anonymous caller.
    None,
}

impl Role {
    /// Map a project membership onto the role scale.
    #[must_use]
    pub const fn from_membership(membership: Option<ProjectRole>) -> Self {
        match membership {
            Some(ProjectRole::Admin) => Self::ProjectAdmin,
            Some(ProjectRole::Developer) => Self::ProjectDeveloper,
            Some(ProjectRole::Guest) => Self::ProjectGuest,
            None => Self::NonMember,
        }
    }
}

/// Label operations subject to authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Create a label.
    Create,
    /// Fetch one label.
    Read,
    /// List labels.
    List,
    /// Modify a label.
    Update,
    /// Remove a label.
    Delete,
    /// List resources referencing a label.
    ListResources,
}

impl Operation {
    /// Stable identifier for logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::List => "list",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::ListResources => "list_resources",
        }
    }
}

impl Display for Operation {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Whether a scope is readable without membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Readable by anyone.
    Public,
    /// Readable by members only.
    Private,
}

/// Outcome of the permission matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Operation permitted.
    Allow,
    /// Operation refused.
    Deny,
}

/// Concrete scope an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeRef {
    /// Global labels.
    Global,
    /// Labels of one project.
    Project(ProjectId),
}

impl ScopeRef {
    /// Scope a stored label belongs to.
    #[must_use]
    pub const fn of(label: &Label) -> Self {
        match label.scope {
            LabelScope::Global => Self::Global,
            LabelScope::Project => Self::Project(label.project_id),
        }
    }

    /// Scope kind without the project id.
    #[must_use]
    pub const fn scope(self) -> LabelScope {
        match self {
            Self::Global => LabelScope::Global,
            Self::Project(_) => LabelScope::Project,
        }
    }
}

/// Permission matrix.
#[must_use]
pub const fn decide(
    role: Role,
    operation: Operation,
    scope: LabelScope,
    visibility: Visibility,
) -> Decision {
    let allowed = match role {
        Role::SystemAdmin => true,
        Role::ProjectAdmin => match operation {
            Operation::Read | Operation::List => true,
            Operation::Create | Operation::Update | Operation::Delete | Operation::ListResources => {
                matches!(scope, LabelScope::Project)
            }
        },
        Role::ProjectDeveloper | Role::ProjectGuest => {
            matches!(operation, Operation::Read | Operation::List)
        }
        Role::NonMember | Role::None => {
            matches!(operation, Operation::Read | Operation::List)
                && matches!(visibility, Visibility::Public)
        }
    };
    if allowed { Decision::Allow } else { Decision::Deny }
}

const fn denial(role: Role, operation: Operation) -> LabelError {
    match role {
        Role::None => LabelError::Unauthenticated,
        _ => LabelError::Forbidden { operation },
    }
}

/// Resolves roles and applies the permission matrix.
#[derive(Clone)]
pub struct AuthorizationGate {
    directory: SharedProjectDirectory,
}

impl AuthorizationGate {
    /// Gate backed by `directory` for membership and project lookups.
    #[must_use]
    pub fn new(directory: SharedProjectDirectory) -> Self {
        Self { directory }
    }

    /// Effective role of `principal` for `scope`.
    ///
    /// # Errors
    ///
    /// Propagates directory failures.
    pub async fn effective_role(
        &self,
        principal: &Principal,
        scope: ScopeRef,
    ) -> LabelResult<Role> {
        let Some(user) = principal.user() else {
            return Ok(Role::None);
        };
        if user.sys_admin {
            return Ok(Role::SystemAdmin);
        }
        match scope {
            ScopeRef::Global => Ok(Role::NonMember),
            ScopeRef::Project(project_id) => {
                let membership = self.directory.membership(user.user_id, project_id).await?;
                Ok(Role::from_membership(membership))
            }
        }
    }

    /// Visibility of `scope`. Global labels are public; unknown projects are private.
    ///
    /// # Errors
    ///
    /// Propagates directory failures.
    pub async fn visibility(&self, scope: ScopeRef) -> LabelResult<Visibility> {
        match scope {
            ScopeRef::Global => Ok(Visibility::Public),
            ScopeRef::Project(project_id) => Ok(match self.directory.project(project_id).await? {
                Some(project) if project.public => Visibility::Public,
                _ => Visibility::Private,
            }),
        }
    }

    /// Whether `principal` could mutate some label: system administrators and
    /// administrators of at least one project.
    ///
    /// # Errors
    ///
    /// Propagates directory failures.
    pub async fn capable_in_principle(&self, principal: &Principal) -> LabelResult<bool> {
        match principal.user() {
            None => Ok(false),
            Some(user) if user.sys_admin => Ok(true),
            Some(user) => self.directory.administers_any_project(user.user_id).await,
        }
    }

    /// Apply the matrix to `operation` on `scope`.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` for anonymous denials, `Forbidden` otherwise.
    pub async fn authorize(
        &self,
        principal: &Principal,
        operation: Operation,
        scope: ScopeRef,
    ) -> LabelResult<()> {
        let role = self.effective_role(principal, scope).await?;
        let visibility = match operation {
            Operation::Read | Operation::List => self.visibility(scope).await?,
            _ => Visibility::Private,
        };
        let decision = decide(role, operation, scope.scope(), visibility);
        debug!(
            operation = operation.as_str(),
            role = ?role,
            decision = ?decision,
            "label authorization evaluated"
        );
        match decision {
            Decision::Allow => Ok(()),
            Decision::Deny => Err(denial(role, operation)),
        }
    }

    /// Authorize label creation in `scope`.
    ///
    /// An unknown project yields `NotFound` only for callers capable in
    /// principle; everyone else sees `Forbidden`.
    ///
    /// # Errors
    ///
    /// `Unauthenticated`, `Forbidden`, or `NotFound` for the project.
    pub async fn authorize_create(
        &self,
        principal: &Principal,
        scope: ScopeRef,
    ) -> LabelResult<()> {
        Self::require_authenticated(principal)?;
        if let ScopeRef::Project(project_id) = scope {
            if self.directory.project(project_id).await?.is_none() {
                let not_found = LabelError::project_not_found(project_id);
                return Err(self
                    .missing_target(principal, Operation::Create, not_found)
                    .await);
            }
        }
        self.authorize(principal, Operation::Create, scope).await
    }

    /// Authorize an update or delete of label `id`, loaded as `label`.
    ///
    /// # Errors
    ///
    /// `Unauthenticated`, `Forbidden`, or `NotFound` for the label.
    pub async fn authorize_label_mutation(
        &self,
        principal: &Principal,
        operation: Operation,
        id: LabelId,
        label: Option<&Label>,
    ) -> LabelResult<()> {
        Self::require_authenticated(principal)?;
        match label {
            Some(label) => self.authorize(principal, operation, ScopeRef::of(label)).await,
            None => Err(self
                .missing_target(principal, operation, LabelError::label_not_found(id))
                .await),
        }
    }

    /// Reject update or delete attempts from callers that cannot mutate any
    /// label, before the target is loaded.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` for anonymous callers, `Forbidden` for callers that
    /// administer nothing.
    pub async fn require_mutation_capability(
        &self,
        principal: &Principal,
        operation: Operation,
    ) -> LabelResult<()> {
        Self::require_authenticated(principal)?;
        if self.capable_in_principle(principal).await? {
            Ok(())
        } else {
            Err(LabelError::Forbidden { operation })
        }
    }

    /// Reject anonymous callers.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` for `Principal::Anonymous`.
    pub const fn require_authenticated(principal: &Principal) -> LabelResult<()> {
        if principal.is_authenticated() {
            Ok(())
        } else {
            Err(LabelError::Unauthenticated)
        }
    }

    async fn missing_target(
        &self,
        principal: &Principal,
        operation: Operation,
        not_found: LabelError,
    ) -> LabelError {
        match self.capable_in_principle(principal).await {
            Ok(true) => not_found,
            Ok(false) => LabelError::Forbidden { operation },
            Err(err) => err,
        }
    }
}
