//! Read access to replication policies stored by the replication engine.

use async_trait::async_trait;
use berth_labels::{LabelResult, PolicyId, PolicyRecord, PolicySource, ProjectId};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::error::{DataError, Result};

const LIST_POLICIES: &str = r"
    SELECT id, name, description, project_id, target_id, enabled, filters, trigger,
           creation_time, update_time
    FROM replication_policies
    WHERE ($1::BIGINT IS NULL OR project_id = $1)
    ORDER BY id
";

const INSERT_POLICY: &str = r"
    INSERT INTO replication_policies
        (name, description, project_id, target_id, enabled, filters, trigger)
    VALUES ($1, $2, $3, $4, $5, $6, $7)
    RETURNING id
";

#[derive(Debug, FromRow)]
struct PolicyRow {
    id: i64,
    name: String,
    description: Option<String>,
    project_id: i64,
    target_id: i64,
    enabled: bool,
    filters: String,
    trigger: String,
    creation_time: DateTime<Utc>,
    update_time: DateTime<Utc>,
}

impl From<PolicyRow> for PolicyRecord {
    fn from(row: PolicyRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            project_id: row.project_id,
            target_id: row.target_id,
            enabled: row.enabled,
            filters: row.filters,
            trigger: row.trigger,
            creation_time: row.creation_time,
            update_time: row.update_time,
        }
    }
}

/// Policy row to insert when provisioning fixtures.
#[derive(Debug, Clone)]
pub struct NewPolicy {
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
}

/// Policy source backed by the `replication_policies` table.
#[derive(Clone)]
pub struct PgPolicySource {
    pool: PgPool,
}

impl PgPolicySource {
    /// Source over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a policy row.
    ///
    /// # Errors
    ///
    /// Returns `QueryFailed` if the insert fails.
    pub async fn insert_policy(&self, policy: &NewPolicy) -> Result<PolicyId> {
        let (id,): (i64,) = sqlx::query_as(INSERT_POLICY)
            .bind(&policy.name)
            .bind(policy.description.as_deref())
            .bind(policy.project_id)
            .bind(policy.target_id)
            .bind(policy.enabled)
            .bind(&policy.filters)
            .bind(&policy.trigger)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| DataError::query("policies.insert", err))?;
        Ok(id)
    }
}

#[async_trait]
impl PolicySource for PgPolicySource {
    async fn list_policies(&self, project_id: Option<ProjectId>) -> LabelResult<Vec<PolicyRecord>> {
        let rows: Vec<PolicyRow> = sqlx::query_as(LIST_POLICIES)
            .bind(project_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|err| DataError::query("policies.list", err))?;
        Ok(rows.into_iter().map(PolicyRecord::from).collect())
    }
}
