use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

use tallyflow_application::StateDistributionRow;
use tallyflow_core::{AppError, AppResult};
use tallyflow_domain::{
    FulfillmentStatus, PaymentMethod, Priority, RecordKind, RecordState, TransitionAction,
    TransitionEntry, WorkflowRecord, WorkflowRecordParts,
};

#[derive(Debug, FromRow)]
pub(super) struct RecordRow {
    id: String,
    kind: String,
    amount: Decimal,
    currency: String,
    requested_by: String,
    department: String,
    priority: String,
    branch: Option<String>,
    description: Option<String>,
    state: String,
    gl_account: Option<String>,
    cost_center: Option<String>,
    fulfillment: Option<String>,
    payment_method: Option<String>,
    version: i64,
    created_at: DateTime<Utc>,
    last_transition_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
pub(super) struct TransitionRow {
    record_id: String,
    sequence: i64,
    from_state: String,
    to_state: String,
    action: String,
    actor_id: String,
    actor_role: String,
    occurred_at: DateTime<Utc>,
    notes: Option<String>,
}

#[derive(Debug, FromRow)]
pub(super) struct DistributionRow {
    kind: String,
    state: String,
    record_count: i64,
    total_amount: Decimal,
}

pub(super) fn to_storage_version(version: u64) -> AppResult<i64> {
    i64::try_from(version)
        .map_err(|_| AppError::Internal(format!("version {version} exceeds storage range")))
}

fn from_storage_version(version: i64) -> AppResult<u64> {
    u64::try_from(version)
        .map_err(|_| AppError::Internal(format!("stored version {version} is negative")))
}

fn parse_column<T>(column: &str, value: &str) -> AppResult<T>
where
    T: FromStr<Err = AppError>,
{
    value.parse().map_err(|error: AppError| {
        AppError::Internal(format!("invalid stored {column} '{value}': {error}"))
    })
}

impl TryFrom<RecordRow> for WorkflowRecord {
    type Error = AppError;

    fn try_from(row: RecordRow) -> AppResult<Self> {
        WorkflowRecord::from_parts(WorkflowRecordParts {
            kind: parse_column::<RecordKind>("kind", row.kind.as_str())?,
            priority: parse_column::<Priority>("priority", row.priority.as_str())?,
            state: parse_column::<RecordState>("state", row.state.as_str())?,
            fulfillment: row
                .fulfillment
                .as_deref()
                .map(|value| parse_column::<FulfillmentStatus>("fulfillment", value))
                .transpose()?,
            payment_method: row
                .payment_method
                .as_deref()
                .map(|value| parse_column::<PaymentMethod>("payment method", value))
                .transpose()?,
            version: from_storage_version(row.version)?,
            record_id: row.id,
            amount: row.amount,
            currency: row.currency,
            requested_by: row.requested_by,
            department: row.department,
            branch: row.branch,
            description: row.description,
            gl_account: row.gl_account,
            cost_center: row.cost_center,
            created_at: row.created_at,
            last_transition_at: row.last_transition_at,
        })
    }
}

impl TryFrom<TransitionRow> for TransitionEntry {
    type Error = AppError;

    fn try_from(row: TransitionRow) -> AppResult<Self> {
        Ok(Self {
            sequence: from_storage_version(row.sequence)?,
            from_state: parse_column::<RecordState>("from state", row.from_state.as_str())?,
            to_state: parse_column::<RecordState>("to state", row.to_state.as_str())?,
            action: parse_column::<TransitionAction>("action", row.action.as_str())?,
            record_id: row.record_id,
            actor_id: row.actor_id,
            actor_role: row.actor_role,
            timestamp: row.occurred_at,
            notes: row.notes,
        })
    }
}

impl TryFrom<DistributionRow> for StateDistributionRow {
    type Error = AppError;

    fn try_from(row: DistributionRow) -> AppResult<Self> {
        Ok(Self {
            kind: parse_column::<RecordKind>("kind", row.kind.as_str())?,
            state: parse_column::<RecordState>("state", row.state.as_str())?,
            record_count: u64::try_from(row.record_count).map_err(|_| {
                AppError::Internal(format!("negative record count {}", row.record_count))
            })?,
            total_amount: row.total_amount,
        })
    }
}
