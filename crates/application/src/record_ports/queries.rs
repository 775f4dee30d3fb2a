use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tallyflow_core::{AppError, AppResult};
use tallyflow_domain::{RecordKind, RecordState, WorkflowRecord};

/// Keyset position in the `(created_at, record_id)` ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RecordCursor {
    /// Creation timestamp of the last returned record.
    pub created_at: DateTime<Utc>,
    /// Identifier of the last returned record.
    pub record_id: String,
}

impl RecordCursor {
    /// Returns the cursor positioned at a record.
    #[must_use]
    pub fn after_record(record: &WorkflowRecord) -> Self {
        Self {
            created_at: record.created_at(),
            record_id: record.record_id().as_str().to_owned(),
        }
    }

    /// Encodes the cursor as an opaque transport token.
    #[must_use]
    pub fn to_token(&self) -> String {
        format!(
            "{}|{}",
            self.created_at.timestamp_micros(),
            self.record_id
        )
    }

    /// Decodes a token produced by [`Self::to_token`].
    pub fn from_token(token: &str) -> AppResult<Self> {
        let invalid = || AppError::Validation(format!("invalid page cursor '{token}'"));
        let (micros, record_id) = token.split_once('|').ok_or_else(invalid)?;
        let micros = micros.parse::<i64>().map_err(|_| invalid())?;
        let created_at = DateTime::<Utc>::from_timestamp_micros(micros).ok_or_else(invalid)?;

        if record_id.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            created_at,
            record_id: record_id.to_owned(),
        })
    }

    /// Returns whether a record sorts strictly after this cursor.
    #[must_use]
    pub fn precedes(&self, record: &WorkflowRecord) -> bool {
        (record.created_at(), record.record_id().as_str())
            > (self.created_at, self.record_id.as_str())
    }
}

/// Filtered, keyset-paginated record listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordListQuery {
    /// Optional kind filter.
    pub kind: Option<RecordKind>,
    /// Optional state filter.
    pub state: Option<RecordState>,
    /// Optional requester filter.
    pub requested_by: Option<String>,
    /// Inclusive lower bound on `created_at`.
    pub created_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`.
    pub created_to: Option<DateTime<Utc>>,
    /// Return only records after this position.
    pub after: Option<RecordCursor>,
    /// Maximum rows returned.
    pub limit: usize,
}

impl RecordListQuery {
    /// Returns whether a record passes every filter, cursor included.
    #[must_use]
    pub fn matches(&self, record: &WorkflowRecord) -> bool {
        self.kind.is_none_or(|kind| record.kind() == kind)
            && self.state.is_none_or(|state| record.state() == state)
            && self
                .requested_by
                .as_deref()
                .is_none_or(|requested_by| record.requested_by() == requested_by)
            && self
                .created_from
                .is_none_or(|from| record.created_at() >= from)
            && self.created_to.is_none_or(|to| record.created_at() < to)
            && self
                .after
                .as_ref()
                .is_none_or(|cursor| cursor.precedes(record))
    }
}

/// Record count and amount total for one `(kind, state)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateDistributionRow {
    /// Record kind.
    pub kind: RecordKind,
    /// Workflow state.
    pub state: RecordState,
    /// Number of records.
    pub record_count: u64,
    /// Sum of record amounts.
    pub total_amount: Decimal,
}
