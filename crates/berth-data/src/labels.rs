//! `PostgreSQL` implementation of the label store.

use async_trait::async_trait;
use berth_labels::validate::{check_id, check_query, normalize_name, normalize_new_label};
use berth_labels::{
    Label, LabelError, LabelId, LabelPage, LabelPatch, LabelQuery, LabelResult, LabelScope,
    LabelStore, NewLabel, ProjectId,
};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::debug;

use crate::error::{DataError, Result};
use crate::migrate::apply_migrations;

const UNIQUE_VIOLATION: &str = "23505";

const INSERT_LABEL: &str = r"
    INSERT INTO labels (name, description, color, scope, project_id)
    SELECT $1, $2, $3, $4, $5
    WHERE $4 = 'g' OR EXISTS (SELECT 1 FROM projects WHERE id = $5)
    RETURNING id
";

const SELECT_LABEL: &str = r"
    SELECT id, name, description, color, scope, project_id, creation_time, update_time
    FROM labels
    WHERE id = $1
";

const COUNT_LABELS: &str = r"
    SELECT COUNT(*)
    FROM labels
    WHERE scope = $1
      AND project_id = $2
      AND ($3::TEXT IS NULL OR strpos(name, $3) > 0)
";

const LIST_LABELS: &str = r"
    SELECT id, name, description, color, scope, project_id, creation_time, update_time
    FROM labels
    WHERE scope = $1
      AND project_id = $2
      AND ($3::TEXT IS NULL OR strpos(name, $3) > 0)
    ORDER BY id
    LIMIT $4 OFFSET $5
";

const UPDATE_LABEL: &str = r"
    UPDATE labels
    SET name = $2, description = $3, color = $4, update_time = now()
    WHERE id = $1
    RETURNING id, name, description, color, scope, project_id, creation_time, update_time
";

const DELETE_LABEL: &str = r"DELETE FROM labels WHERE id = $1";

#[derive(Debug, FromRow)]
struct LabelRow {
    id: i64,
    name: String,
    description: Option<String>,
    color: Option<String>,
    scope: String,
    project_id: i64,
    creation_time: DateTime<Utc>,
    update_time: DateTime<Utc>,
}

impl TryFrom<LabelRow> for Label {
    type Error = DataError;

    fn try_from(row: LabelRow) -> Result<Self> {
        let scope = row
            .scope
            .parse::<LabelScope>()
            .map_err(|_| DataError::InvalidStoredValue {
                field: "labels.scope",
                value: row.scope.clone(),
            })?;
        Ok(Self {
            id: row.id,
            name: row.name,
            description: row.description,
            color: row.color,
            scope,
            project_id: row.project_id,
            creation_time: row.creation_time,
            update_time: row.update_time,
        })
    }
}

/// Label store backed by the `labels` table.
///
/// Uniqueness of `(scope, project_id, name)` is enforced by a unique
/// constraint; violations surface as `Conflict`.
#[derive(Clone)]
pub struct PgLabelStore {
    pool: PgPool,
}

impl PgLabelStore {
    /// Initialise the store, applying pending migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if migrations fail or the database is unreachable.
    pub async fn new(pool: PgPool) -> Result<Self> {
        apply_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Access the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == UNIQUE_VIOLATION)
}

fn conflict_or(
    err: sqlx::Error,
    operation: &'static str,
    scope: LabelScope,
    project_id: ProjectId,
    name: String,
) -> LabelError {
    if is_unique_violation(&err) {
        LabelError::Conflict {
            scope,
            project_id,
            name,
        }
    } else {
        DataError::query(operation, err).into()
    }
}

#[async_trait]
impl LabelStore for PgLabelStore {
    async fn create(&self, label: NewLabel) -> LabelResult<LabelId> {
        let label = normalize_new_label(label)?;
        let project_id = label.effective_project_id();
        let inserted: Option<(i64,)> = sqlx::query_as(INSERT_LABEL)
            .bind(&label.name)
            .bind(label.description.as_deref())
            .bind(label.color.as_deref())
            .bind(label.scope.as_str())
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| {
                conflict_or(err, "labels.insert", label.scope, project_id, label.name.clone())
            })?;
        let (id,) = inserted.ok_or(LabelError::project_not_found(project_id))?;
        debug!(label_id = id, scope = %label.scope, project_id, "label inserted");
        Ok(id)
    }

    async fn get(&self, id: LabelId) -> LabelResult<Label> {
        check_id(id)?;
        let row: Option<LabelRow> = sqlx::query_as(SELECT_LABEL)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| DataError::query("labels.get", err))?;
        let row = row.ok_or(LabelError::label_not_found(id))?;
        Ok(Label::try_from(row)?)
    }

    async fn list(&self, query: &LabelQuery) -> LabelResult<LabelPage> {
        let project_id = check_query(query)?;
        let name = query.name.as_deref();
        let (total,): (i64,) = sqlx::query_as(COUNT_LABELS)
            .bind(query.scope.as_str())
            .bind(project_id)
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| DataError::query("labels.count", err))?;
        let offset = i64::try_from(query.offset()).unwrap_or(i64::MAX);
        let rows: Vec<LabelRow> = sqlx::query_as(LIST_LABELS)
            .bind(query.scope.as_str())
            .bind(project_id)
            .bind(name)
            .bind(i64::from(query.page_size))
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|err| DataError::query("labels.list", err))?;
        let items = rows
            .into_iter()
            .map(Label::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(LabelPage {
            items,
            total: u64::try_from(total).unwrap_or_default(),
        })
    }

    async fn update(&self, id: LabelId, patch: LabelPatch) -> LabelResult<Label> {
        let current = self.get(id).await?;
        let name = normalize_name(&patch.name)?;
        let row: Option<LabelRow> = sqlx::query_as(UPDATE_LABEL)
            .bind(id)
            .bind(&name)
            .bind(patch.description.as_deref())
            .bind(patch.color.as_deref())
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| {
                conflict_or(
                    err,
                    "labels.update",
                    current.scope,
                    current.project_id,
                    name.clone(),
                )
            })?;
        let row = row.ok_or(LabelError::label_not_found(id))?;
        Ok(Label::try_from(row)?)
    }

    async fn delete(&self, id: LabelId) -> LabelResult<()> {
        check_id(id)?;
        let result = sqlx::query(DELETE_LABEL)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|err| DataError::query("labels.delete", err))?;
        if result.rows_affected() == 0 {
            return Err(LabelError::label_not_found(id));
        }
        Ok(())
    }
}
