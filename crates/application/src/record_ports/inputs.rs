use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tallyflow_domain::{
    Priority, RecordKind, RecordState, TransitionAction, TransitionEntry, TransitionPayload,
    WorkflowRecord,
};

/// Fields supplied by the requester when submitting a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRecordInput {
    /// Record kind.
    pub kind: RecordKind,
    /// Requested amount.
    pub amount: Decimal,
    /// Optional currency code.
    pub currency: Option<String>,
    /// Owning department.
    pub department: String,
    /// Request priority.
    pub priority: Priority,
    /// Optional branch code.
    pub branch: Option<String>,
    /// Optional description.
    pub description: Option<String>,
}

/// One requested transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyTransitionInput {
    /// Target record.
    pub record_id: String,
    /// Requested action.
    pub action: TransitionAction,
    /// Action-specific fields.
    pub payload: TransitionPayload,
    /// Record version the caller last observed.
    pub expected_version: u64,
}

/// Result of a transition request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome {
    /// Record after the transition.
    pub record: WorkflowRecord,
    /// Entry describing the transition.
    pub entry: TransitionEntry,
    /// False when an identical posting was replayed and nothing was written.
    pub is_new: bool,
}

/// Filters for an actor's pending work.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingRecordsQuery {
    /// Optional kind filter.
    pub kind: Option<RecordKind>,
    /// Optional state filter.
    pub state: Option<RecordState>,
    /// Inclusive lower bound on submission time.
    pub created_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on submission time.
    pub created_to: Option<DateTime<Utc>>,
    /// Cursor token returned by a previous page.
    pub cursor: Option<String>,
    /// Page size.
    pub limit: Option<usize>,
}

/// One page of pending work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRecordsPage {
    /// Records the actor may act on, oldest first.
    pub records: Vec<WorkflowRecord>,
    /// Token to resume after the last returned record.
    pub next_cursor: Option<String>,
}
