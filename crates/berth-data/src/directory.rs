//! Users, API keys, projects, and memberships stored in `PostgreSQL`.
//!
//! # Design
//! - API-key secrets are stored as argon2 hashes and verified on each call.
//! - Provisioning helpers exist for bootstrap seeding and tests.

use async_trait::async_trait;
use berth_labels::{
    Credential, IdentityProvider, LabelError, LabelResult, Principal, Project, ProjectDirectory,
    ProjectId, ProjectRole, UserId, UserIdentity,
};
use sqlx::{FromRow, PgPool};
use tracing::{debug, warn};

use crate::error::{DataError, Result};
use crate::secrets::{hash_secret, verify_secret};

const SELECT_API_KEY: &str = r"
    SELECT k.secret_hash, u.id AS user_id, u.username, u.sys_admin
    FROM api_keys k
    JOIN users u ON u.id = k.user_id
    WHERE k.key_id = $1
";

const SELECT_PROJECT: &str = r"SELECT id, name, public FROM projects WHERE id = $1";

const SELECT_MEMBERSHIP: &str = r"
    SELECT role FROM project_members WHERE user_id = $1 AND project_id = $2
";

const SELECT_ADMINISTERS_ANY: &str = r"
    SELECT EXISTS (
        SELECT 1 FROM project_members WHERE user_id = $1 AND role = 'admin'
    )
";

const INSERT_USER: &str = r"
    INSERT INTO users (username, sys_admin) VALUES ($1, $2) RETURNING id
";

const INSERT_PROJECT: &str = r"
    INSERT INTO projects (name, public) VALUES ($1, $2) RETURNING id
";

const UPSERT_MEMBER: &str = r"
    INSERT INTO project_members (project_id, user_id, role)
    VALUES ($1, $2, $3)
    ON CONFLICT (project_id, user_id) DO UPDATE SET role = EXCLUDED.role
";

const UPSERT_API_KEY: &str = r"
    INSERT INTO api_keys (key_id, user_id, secret_hash)
    VALUES ($1, $2, $3)
    ON CONFLICT (key_id) DO UPDATE SET user_id = EXCLUDED.user_id, secret_hash = EXCLUDED.secret_hash
";

#[derive(Debug, FromRow)]
struct ApiKeyRow {
    secret_hash: String,
    user_id: i64,
    username: String,
    sys_admin: bool,
}

#[derive(Debug, FromRow)]
struct ProjectRow {
    id: i64,
    name: String,
    public: bool,
}

/// Identity provider and project directory over the registry tables.
#[derive(Clone)]
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    /// Directory over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a user and return its id.
    ///
    /// # Errors
    ///
    /// Returns `QueryFailed` if the insert fails.
    pub async fn create_user(&self, username: &str, sys_admin: bool) -> Result<UserId> {
        let (id,): (i64,) = sqlx::query_as(INSERT_USER)
            .bind(username)
            .bind(sys_admin)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| DataError::query("users.insert", err))?;
        Ok(id)
    }

    /// Insert a project and return its id.
    ///
    /// # Errors
    ///
    /// Returns `QueryFailed` if the insert fails.
    pub async fn create_project(&self, name: &str, public: bool) -> Result<ProjectId> {
        let (id,): (i64,) = sqlx::query_as(INSERT_PROJECT)
            .bind(name)
            .bind(public)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| DataError::query("projects.insert", err))?;
        Ok(id)
    }

    /// Grant or change a membership.
    ///
    /// # Errors
    ///
    /// Returns `QueryFailed` if the upsert fails.
    pub async fn add_member(
        &self,
        project_id: ProjectId,
        user_id: UserId,
        role: ProjectRole,
    ) -> Result<()> {
        sqlx::query(UPSERT_MEMBER)
            .bind(project_id)
            .bind(user_id)
            .bind(role.as_str())
            .execute(&self.pool)
            .await
            .map_err(|err| DataError::query("project_members.upsert", err))?;
        Ok(())
    }

    /// Store an API key for `user_id`, hashing the secret.
    ///
    /// # Errors
    ///
    /// Returns `SecretHash` if hashing fails or `QueryFailed` if the upsert fails.
    pub async fn issue_api_key(&self, user_id: UserId, key_id: &str, secret: &str) -> Result<()> {
        let secret_hash = hash_secret(secret)?;
        sqlx::query(UPSERT_API_KEY)
            .bind(key_id)
            .bind(user_id)
            .bind(secret_hash)
            .execute(&self.pool)
            .await
            .map_err(|err| DataError::query("api_keys.upsert", err))?;
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for PgDirectory {
    async fn authenticate(&self, credential: &Credential) -> LabelResult<Principal> {
        let (key_id, secret) = match credential {
            Credential::Anonymous => return Ok(Principal::Anonymous),
            Credential::ApiKey { key_id, secret } => (key_id, secret),
        };
        let row: Option<ApiKeyRow> = sqlx::query_as(SELECT_API_KEY)
            .bind(key_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| DataError::query("api_keys.lookup", err))?;
        let Some(row) = row else {
            debug!(key_id = %key_id, "unknown api key");
            return Err(LabelError::Unauthenticated);
        };
        if !verify_secret(&row.secret_hash, secret)? {
            warn!(key_id = %key_id, "api key secret mismatch");
            return Err(LabelError::Unauthenticated);
        }
        Ok(Principal::User(UserIdentity {
            user_id: row.user_id,
            username: row.username,
            sys_admin: row.sys_admin,
        }))
    }
}

#[async_trait]
impl ProjectDirectory for PgDirectory {
    async fn project(&self, project_id: ProjectId) -> LabelResult<Option<Project>> {
        let row: Option<ProjectRow> = sqlx::query_as(SELECT_PROJECT)
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| DataError::query("projects.get", err))?;
        Ok(row.map(|row| Project {
            id: row.id,
            name: row.name,
            public: row.public,
        }))
    }

    async fn membership(
        &self,
        user_id: UserId,
        project_id: ProjectId,
    ) -> LabelResult<Option<ProjectRole>> {
        let role: Option<(String,)> = sqlx::query_as(SELECT_MEMBERSHIP)
            .bind(user_id)
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| DataError::query("project_members.get", err))?;
        match role {
            None => Ok(None),
            Some((value,)) => ProjectRole::parse(&value).map(Some).ok_or_else(|| {
                DataError::InvalidStoredValue {
                    field: "project_members.role",
                    value,
                }
                .into()
            }),
        }
    }

    async fn administers_any_project(&self, user_id: UserId) -> LabelResult<bool> {
        let (exists,): (bool,) = sqlx::query_as(SELECT_ADMINISTERS_ANY)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| DataError::query("project_members.any_admin", err))?;
        Ok(exists)
    }
}
