//! Collaborators the label core consumes: identity, projects, and policies.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::LabelResult;
use crate::model::{PolicyRecord, ProjectId, UserId};

/// Credential presented by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Credential {
    /// No credential supplied.
    #[default]
    Anonymous,
    /// API key split into its public identifier and secret.
    ApiKey {
        /// Public key identifier.
        key_id: String,
        /// Secret half, verified by the identity provider.
        secret: String,
    },
}

impl Credential {
    /// Convenience constructor for API-key credentials.
    #[must_use]
    pub fn api_key(key_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self::ApiKey {
            key_id: key_id.into(),
            secret: secret.into(),
        }
    }
}

/// Authenticated user details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    /// User identifier.
    pub user_id: UserId,
    /// Login name.
    pub username: String,
    /// Whether the user is a system administrator.
    pub sys_admin: bool,
}

/// Caller identity resolved from a credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// Unauthenticated caller.
    Anonymous,
    /// Authenticated user.
    User(UserIdentity),
}

impl Principal {
    /// Whether the caller is authenticated.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::User(_))
    }

    /// Authenticated user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&UserIdentity> {
        match self {
            Self::Anonymous => None,
            Self::User(user) => Some(user),
        }
    }
}

/// Membership role a user holds inside a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectRole {
    /// Project administrator.
    Admin,
    /// Developer (push/pull).
    Developer,
    /// Guest (pull only).
    Guest,
}

impl ProjectRole {
    /// Stable identifier used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Developer => "developer",
            Self::Guest => "guest",
        }
    }

    /// Parse the storage identifier.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(Self::Admin),
            "developer" => Some(Self::Developer),
            "guest" => Some(Self::Guest),
            _ => None,
        }
    }
}

/// Project record as seen by the label core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    /// Project identifier.
    pub id: ProjectId,
    /// Project name.
    pub name: String,
    /// Whether anonymous and non-member callers may read the project.
    pub public: bool,
}

#[async_trait]
/// Resolves credentials to principals.
pub trait IdentityProvider: Send + Sync {
    /// Resolve a credential. `Anonymous` maps to `Principal::Anonymous`.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` for unknown or invalid credentials.
    async fn authenticate(&self, credential: &Credential) -> LabelResult<Principal>;
}

#[async_trait]
/// Project lookup and membership resolution.
pub trait ProjectDirectory: Send + Sync {
    /// Look up a project by id.
    async fn project(&self, project_id: ProjectId) -> LabelResult<Option<Project>>;
    /// Membership role of `user_id` in `project_id`, if any.
    async fn membership(
        &self,
        user_id: UserId,
        project_id: ProjectId,
    ) -> LabelResult<Option<ProjectRole>>;
    /// Whether `user_id` administers at least one project.
    async fn administers_any_project(&self, user_id: UserId) -> LabelResult<bool>;
}

#[async_trait]
/// Read-only view of replication policies.
pub trait PolicySource: Send + Sync {
    /// List policies in id order, optionally restricted to a project.
    async fn list_policies(&self, project_id: Option<ProjectId>) -> LabelResult<Vec<PolicyRecord>>;
}

/// Shared identity provider handle.
pub type SharedIdentityProvider = Arc<dyn IdentityProvider>;
/// Shared project directory handle.
pub type SharedProjectDirectory = Arc<dyn ProjectDirectory>;
/// Shared policy source handle.
pub type SharedPolicySource = Arc<dyn PolicySource>;
