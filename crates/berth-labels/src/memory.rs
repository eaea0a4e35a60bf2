//! In-memory collaborators used by tests and local wiring.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::directory::{
    Credential, IdentityProvider, PolicySource, Principal, Project, ProjectDirectory, ProjectRole,
    UserIdentity,
};
use crate::error::{LabelError, LabelResult};
use crate::model::{PolicyRecord, ProjectId, UserId};

/// Fixed set of users, API keys, projects and memberships.
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    users: HashMap<UserId, UserIdentity>,
    keys: HashMap<String, (String, UserId)>,
    projects: HashMap<ProjectId, Project>,
    members: HashMap<(UserId, ProjectId), ProjectRole>,
}

impl MemoryDirectory {
    /// Empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a project.
    #[must_use]
    pub fn with_project(mut self, id: ProjectId, name: impl Into<String>, public: bool) -> Self {
        self.projects.insert(
            id,
            Project {
                id,
                name: name.into(),
                public,
            },
        );
        self
    }

    /// Register a user.
    #[must_use]
    pub fn with_user(mut self, user_id: UserId, username: impl Into<String>, sys_admin: bool) -> Self {
        self.users.insert(
            user_id,
            UserIdentity {
                user_id,
                username: username.into(),
                sys_admin,
            },
        );
        self
    }

    /// Register an API key owned by `user_id`.
    #[must_use]
    pub fn with_api_key(
        mut self,
        key_id: impl Into<String>,
        secret: impl Into<String>,
        user_id: UserId,
    ) -> Self {
        self.keys.insert(key_id.into(), (secret.into(), user_id));
        self
    }

    /// Grant `role` in `project_id` to `user_id`.
    #[must_use]
    pub fn with_member(mut self, user_id: UserId, project_id: ProjectId, role: ProjectRole) -> Self {
        self.members.insert((user_id, project_id), role);
        self
    }
}

#[async_trait]
impl IdentityProvider for MemoryDirectory {
    async fn authenticate(&self, credential: &Credential) -> LabelResult<Principal> {
        match credential {
            Credential::Anonymous => Ok(Principal::Anonymous),
            Credential::ApiKey { key_id, secret } => {
                let (expected, user_id) = self.keys.get(key_id).ok_or(LabelError::Unauthenticated)?;
                if expected != secret {
                    return Err(LabelError::Unauthenticated);
                }
                let user = self
                    .users
                    .get(user_id)
                    .cloned()
                    .ok_or(LabelError::Unauthenticated)?;
                Ok(Principal::User(user))
            }
        }
    }
}

#[async_trait]
impl ProjectDirectory for MemoryDirectory {
    async fn project(&self, project_id: ProjectId) -> LabelResult<Option<Project>> {
        Ok(self.projects.get(&project_id).cloned())
    }

    async fn membership(
        &self,
        user_id: UserId,
        project_id: ProjectId,
    ) -> LabelResult<Option<ProjectRole>> {
        Ok(self.members.get(&(user_id, project_id)).copied())
    }

    async fn administers_any_project(&self, user_id: UserId) -> LabelResult<bool> {
        Ok(self
            .members
            .iter()
            .any(|((member, _), role)| *member == user_id && *role == ProjectRole::Admin))
    }
}

/// Mutable list of policy rows.
#[derive(Debug, Default)]
pub struct MemoryPolicySource {
    policies: RwLock<Vec<PolicyRecord>>,
}

impl MemoryPolicySource {
    /// Empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a policy row.
    pub async fn insert(&self, record: PolicyRecord) {
        let mut guard = self.policies.write().await;
        guard.retain(|existing| existing.id != record.id);
        guard.push(record);
        guard.sort_by_key(|existing| existing.id);
    }
}

#[async_trait]
impl PolicySource for MemoryPolicySource {
    async fn list_policies(&self, project_id: Option<ProjectId>) -> LabelResult<Vec<PolicyRecord>> {
        let guard = self.policies.read().await;
        Ok(guard
            .iter()
            .filter(|record| project_id.is_none_or(|id| record.project_id == id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn directory() -> MemoryDirectory {
        MemoryDirectory::new()
            .with_project(1, "library", false)
            .with_user(10, "alice", false)
            .with_api_key("alice", "s3cret", 10)
            .with_member(10, 1, ProjectRole::Admin)
    }

    fn policy(id: i64, project_id: ProjectId) -> PolicyRecord {
        let now = Utc::now();
        PolicyRecord {
            id,
            name: format!("policy-{id}"),
            description: None,
            project_id,
            target_id: 1,
            enabled: true,
            filters: "[]".to_string(),
            trigger: String::new(),
            creation_time: now,
            update_time: now,
        }
    }

    #[tokio::test]
    async fn authenticate_resolves_keys() {
        let dir = directory();
        let principal = dir
            .authenticate(&Credential::api_key("alice", "s3cret"))
            .await
            .expect("valid key");
        assert_eq!(principal.user().map(|u| u.username.as_str()), Some("alice"));

        let wrong = dir.authenticate(&Credential::api_key("alice", "nope")).await;
        assert!(matches!(wrong, Err(LabelError::Unauthenticated)));
        let unknown = dir.authenticate(&Credential::api_key("bob", "s3cret")).await;
        assert!(matches!(unknown, Err(LabelError::Unauthenticated)));
        assert_eq!(
            dir.authenticate(&Credential::Anonymous).await.ok(),
            Some(Principal::Anonymous)
        );
    }

    #[tokio::test]
    async fn membership_and_admin_lookup() {
        let dir = directory();
        assert_eq!(dir.membership(10, 1).await.ok().flatten(), Some(ProjectRole::Admin));
        assert_eq!(dir.membership(10, 2).await.ok().flatten(), None);
        assert!(dir.administers_any_project(10).await.unwrap_or(false));
        assert!(!dir.administers_any_project(11).await.unwrap_or(true));
        assert!(dir.project(2).await.ok().flatten().is_none());
    }

    #[tokio::test]
    async fn policy_source_filters_by_project() {
        let source = MemoryPolicySource::new();
        source.insert(policy(2, 1)).await;
        source.insert(policy(1, 2)).await;
        source.insert(policy(3, 1)).await;

        let all = source.list_policies(None).await.expect("list");
        assert_eq!(all.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 2, 3]);
        let scoped = source.list_policies(Some(1)).await.expect("list");
        assert_eq!(scoped.iter().map(|p| p.id).collect::<Vec<_>>(), vec![2, 3]);
    }
}
