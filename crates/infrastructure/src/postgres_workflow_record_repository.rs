use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use tallyflow_application::{RecordListQuery, StateDistributionRow, WorkflowRecordRepository};
use tallyflow_core::{AppError, AppResult, TenantId};
use tallyflow_domain::{TransitionEntry, TransitionPlan, WorkflowRecord};

mod rows;

#[cfg(test)]
mod tests;

use rows::{DistributionRow, RecordRow, TransitionRow, to_storage_version};

/// PostgreSQL-backed record store with version-guarded commits.
#[derive(Clone)]
pub struct PostgresWorkflowRecordRepository {
    pool: PgPool,
}

impl PostgresWorkflowRecordRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> AppResult<Transaction<'_, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|error| AppError::Internal(format!("failed to begin transaction: {error}")))
    }
}

const RECORD_COLUMNS: &str = r#"
    id,
    kind,
    amount,
    currency,
    requested_by,
    department,
    priority,
    branch,
    description,
    state,
    gl_account,
    cost_center,
    fulfillment,
    payment_method,
    version,
    created_at,
    last_transition_at
"#;

#[async_trait]
impl WorkflowRecordRepository for PostgresWorkflowRecordRepository {
    async fn insert_record(&self, tenant_id: TenantId, record: WorkflowRecord) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO workflow_records (
                tenant_id,
                id,
                kind,
                amount,
                currency,
                requested_by,
                department,
                priority,
                branch,
                description,
                state,
                gl_account,
                cost_center,
                fulfillment,
                payment_method,
                version,
                created_at,
                last_transition_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(record.record_id().as_str())
        .bind(record.kind().as_str())
        .bind(record.amount())
        .bind(record.currency().as_str())
        .bind(record.requested_by())
        .bind(record.department())
        .bind(record.priority().as_str())
        .bind(record.branch())
        .bind(record.description())
        .bind(record.state().as_str())
        .bind(record.gl_account().map(|value| value.as_str()))
        .bind(record.cost_center().map(|value| value.as_str()))
        .bind(record.fulfillment().map(|value| value.as_str()))
        .bind(record.payment_method().map(|value| value.as_str()))
        .bind(to_storage_version(record.version())?)
        .bind(record.created_at())
        .bind(record.last_transition_at())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            if let sqlx::Error::Database(database_error) = &error
                && database_error.code().as_deref() == Some("23505")
            {
                return AppError::Conflict(format!(
                    "record '{}' already exists",
                    record.record_id()
                ));
            }

            AppError::Internal(format!("failed to insert workflow record: {error}"))
        })?;

        Ok(())
    }

    async fn find_record(
        &self,
        tenant_id: TenantId,
        record_id: &str,
    ) -> AppResult<Option<WorkflowRecord>> {
        let row = sqlx::query_as::<_, RecordRow>(&format!(
            "SELECT {RECORD_COLUMNS} FROM workflow_records WHERE tenant_id = $1 AND id = $2"
        ))
        .bind(tenant_id.as_uuid())
        .bind(record_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find workflow record: {error}")))?;

        row.map(WorkflowRecord::try_from).transpose()
    }

    async fn commit_transition(
        &self,
        tenant_id: TenantId,
        expected_version: u64,
        plan: TransitionPlan,
    ) -> AppResult<()> {
        let mut transaction = self.begin().await?;

        write_snapshot(&mut transaction, tenant_id, expected_version, &plan.record).await?;

        let entry = plan.entry;
        sqlx::query(
            r#"
            INSERT INTO workflow_transitions (
                tenant_id,
                record_id,
                sequence,
                from_state,
                to_state,
                action,
                actor_id,
                actor_role,
                occurred_at,
                notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(entry.record_id.as_str())
        .bind(to_storage_version(entry.sequence)?)
        .bind(entry.from_state.as_str())
        .bind(entry.to_state.as_str())
        .bind(entry.action.as_str())
        .bind(entry.actor_id.as_str())
        .bind(entry.actor_role.as_str())
        .bind(entry.timestamp)
        .bind(entry.notes.as_deref())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to append transition entry: {error}"))
        })?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }

    async fn update_record(
        &self,
        tenant_id: TenantId,
        expected_version: u64,
        record: WorkflowRecord,
    ) -> AppResult<()> {
        let mut transaction = self.begin().await?;
        write_snapshot(&mut transaction, tenant_id, expected_version, &record).await?;
        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }

    async fn list_records(
        &self,
        tenant_id: TenantId,
        query: RecordListQuery,
    ) -> AppResult<Vec<WorkflowRecord>> {
        let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);
        let (after_created_at, after_record_id): (Option<DateTime<Utc>>, Option<String>) =
            match query.after {
                Some(cursor) => (Some(cursor.created_at), Some(cursor.record_id)),
                None => (None, None),
            };

        let rows = sqlx::query_as::<_, RecordRow>(&format!(
            r#"
            SELECT {RECORD_COLUMNS}
            FROM workflow_records
            WHERE tenant_id = $1
                AND ($2::TEXT IS NULL OR kind = $2)
                AND ($3::TEXT IS NULL OR state = $3)
                AND ($4::TEXT IS NULL OR requested_by = $4)
                AND ($5::TIMESTAMPTZ IS NULL OR created_at >= $5)
                AND ($6::TIMESTAMPTZ IS NULL OR created_at < $6)
                AND ($7::TIMESTAMPTZ IS NULL OR (created_at, id) > ($7, $8::TEXT))
            ORDER BY created_at, id
            LIMIT $9
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(query.kind.map(|kind| kind.as_str()))
        .bind(query.state.map(|state| state.as_str()))
        .bind(query.requested_by.as_deref())
        .bind(query.created_from)
        .bind(query.created_to)
        .bind(after_created_at)
        .bind(after_record_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list workflow records: {error}")))?;

        rows.into_iter().map(WorkflowRecord::try_from).collect()
    }

    async fn list_transitions(
        &self,
        tenant_id: TenantId,
        record_id: &str,
    ) -> AppResult<Vec<TransitionEntry>> {
        let rows = sqlx::query_as::<_, TransitionRow>(
            r#"
            SELECT
                record_id,
                sequence,
                from_state,
                to_state,
                action,
                actor_id,
                actor_role,
                occurred_at,
                notes
            FROM workflow_transitions
            WHERE tenant_id = $1 AND record_id = $2
            ORDER BY sequence
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(record_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list transition entries: {error}"))
        })?;

        rows.into_iter().map(TransitionEntry::try_from).collect()
    }

    async fn state_distribution(&self, tenant_id: TenantId) -> AppResult<Vec<StateDistributionRow>> {
        let rows = sqlx::query_as::<_, DistributionRow>(
            r#"
            SELECT
                kind,
                state,
                COUNT(*) AS record_count,
                COALESCE(SUM(amount), 0) AS total_amount
            FROM workflow_records
            WHERE tenant_id = $1
            GROUP BY kind, state
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to aggregate state distribution: {error}"))
        })?;

        let mut distribution = rows
            .into_iter()
            .map(StateDistributionRow::try_from)
            .collect::<AppResult<Vec<_>>>()?;
        distribution.sort_by_key(|row| (row.kind, row.state));
        Ok(distribution)
    }
}

/// Overwrites the mutable columns when the stored version still matches.
async fn write_snapshot(
    transaction: &mut Transaction<'_, Postgres>,
    tenant_id: TenantId,
    expected_version: u64,
    record: &WorkflowRecord,
) -> AppResult<()> {
    let updated = sqlx::query(
        r#"
        UPDATE workflow_records
        SET amount = $4,
            department = $5,
            priority = $6,
            branch = $7,
            description = $8,
            state = $9,
            gl_account = $10,
            cost_center = $11,
            fulfillment = $12,
            payment_method = $13,
            version = $14,
            last_transition_at = $15
        WHERE tenant_id = $1 AND id = $2 AND version = $3
        "#,
    )
    .bind(tenant_id.as_uuid())
    .bind(record.record_id().as_str())
    .bind(to_storage_version(expected_version)?)
    .bind(record.amount())
    .bind(record.department())
    .bind(record.priority().as_str())
    .bind(record.branch())
    .bind(record.description())
    .bind(record.state().as_str())
    .bind(record.gl_account().map(|value| value.as_str()))
    .bind(record.cost_center().map(|value| value.as_str()))
    .bind(record.fulfillment().map(|value| value.as_str()))
    .bind(record.payment_method().map(|value| value.as_str()))
    .bind(to_storage_version(record.version())?)
    .bind(record.last_transition_at())
    .execute(&mut **transaction)
    .await
    .map_err(|error| AppError::Internal(format!("failed to update workflow record: {error}")))?;

    if updated.rows_affected() == 1 {
        return Ok(());
    }

    let current_version = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT version
        FROM workflow_records
        WHERE tenant_id = $1 AND id = $2
        "#,
    )
    .bind(tenant_id.as_uuid())
    .bind(record.record_id().as_str())
    .fetch_optional(&mut **transaction)
    .await
    .map_err(|error| AppError::Internal(format!("failed to read record version: {error}")))?;

    match current_version {
        None => Err(AppError::NotFound(format!(
            "record '{}' does not exist",
            record.record_id()
        ))),
        Some(version) => Err(AppError::StaleState(format!(
            "record '{}' is at version {version} but version {expected_version} was expected",
            record.record_id()
        ))),
    }
}
