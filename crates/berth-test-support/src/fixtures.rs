//! Standard actors, projects, and policy rows shared by test suites.

use berth_labels::{Credential, MemoryDirectory, PolicyRecord, ProjectId, ProjectRole, UserId};
use chrono::Utc;

/// Private project every member actor belongs to.
pub const PRIVATE_PROJECT: ProjectId = 1;
/// Public project administered by the project admin.
pub const PUBLIC_PROJECT: ProjectId = 2;

/// A user with an API key and an optional membership in `PRIVATE_PROJECT`.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    /// User identifier.
    pub user_id: UserId,
    /// Login name, also used as the API key id.
    pub username: &'static str,
    /// API key secret.
    pub secret: &'static str,
    /// Whether the user is a system administrator.
    pub sys_admin: bool,
    /// Role in `PRIVATE_PROJECT`, if any.
    pub role: Option<ProjectRole>,
}

impl Actor {
    /// Credential presented by this actor.
    #[must_use]
    pub fn credential(&self) -> Credential {
        Credential::api_key(self.username, self.secret)
    }

    /// Value for the `x-berth-api-key` header.
    #[must_use]
    pub fn header_value(&self) -> String {
        format!("{}:{}", self.username, self.secret)
    }
}

/// System administrator.
pub const SYSADMIN: Actor = Actor {
    user_id: 1,
    username: "sysadmin",
    secret: "sysadmin-secret",
    sys_admin: true,
    role: None,
};
/// Administrator of both fixture projects.
pub const PROJECT_ADMIN: Actor = Actor {
    user_id: 2,
    username: "owner",
    secret: "owner-secret",
    sys_admin: false,
    role: Some(ProjectRole::Admin),
};
/// Developer in the private project.
pub const DEVELOPER: Actor = Actor {
    user_id: 3,
    username: "dev",
    secret: "dev-secret",
    sys_admin: false,
    role: Some(ProjectRole::Developer),
};
/// Guest in the private project.
pub const GUEST: Actor = Actor {
    user_id: 4,
    username: "guest",
    secret: "guest-secret",
    sys_admin: false,
    role: Some(ProjectRole::Guest),
};
/// Authenticated user without memberships.
pub const OUTSIDER: Actor = Actor {
    user_id: 5,
    username: "outsider",
    secret: "outsider-secret",
    sys_admin: false,
    role: None,
};

/// Every fixture actor.
pub const ACTORS: [Actor; 5] = [SYSADMIN, PROJECT_ADMIN, DEVELOPER, GUEST, OUTSIDER];

/// In-memory directory holding the fixture projects and actors.
#[must_use]
pub fn memory_directory() -> MemoryDirectory {
    let mut directory = MemoryDirectory::new()
        .with_project(PRIVATE_PROJECT, "library", false)
        .with_project(PUBLIC_PROJECT, "public", true)
        .with_member(PROJECT_ADMIN.user_id, PUBLIC_PROJECT, ProjectRole::Admin);
    for actor in ACTORS {
        directory = directory
            .with_user(actor.user_id, actor.username, actor.sys_admin)
            .with_api_key(actor.username, actor.secret, actor.user_id);
        if let Some(role) = actor.role {
            directory = directory.with_member(actor.user_id, PRIVATE_PROJECT, role);
        }
    }
    directory
}

/// Policy row with the given filter expression.
#[must_use]
pub fn policy_record(id: i64, project_id: ProjectId, filters: &str) -> PolicyRecord {
    let now = Utc::now();
    PolicyRecord {
        id,
        name: format!("replicate-{id}"),
        description: None,
        project_id,
        target_id: 1,
        enabled: true,
        filters: filters.to_string(),
        trigger: r#"{"kind":"manual"}"#.to_string(),
        creation_time: now,
        update_time: now,
    }
}

/// Filter expression referencing the given label ids.
#[must_use]
pub fn label_filters(label_ids: &[i64]) -> String {
    let items: Vec<String> = label_ids
        .iter()
        .map(|id| format!(r#"{{"kind":"label","value":{id}}}"#))
        .collect();
    format!("[{}]", items.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_values_join_key_and_secret() {
        assert_eq!(DEVELOPER.header_value(), "dev:dev-secret");
        assert_eq!(
            OUTSIDER.credential(),
            Credential::api_key("outsider", "outsider-secret")
        );
    }

    #[test]
    fn label_filters_render_json_array() {
        assert_eq!(label_filters(&[]), "[]");
        assert_eq!(
            label_filters(&[3, 4]),
            r#"[{"kind":"label","value":3},{"kind":"label","value":4}]"#
        );
    }
}
