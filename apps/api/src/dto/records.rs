use serde::{Deserialize, Serialize};
use ts_rs::TS;

mod conversions;

/// Incoming payload for a new workflow record.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/submit-record-request.ts"
)]
pub struct SubmitRecordRequest {
    pub kind: String,
    pub amount: String,
    pub currency: Option<String>,
    pub department: String,
    pub priority: String,
    pub branch: Option<String>,
    pub description: Option<String>,
}

/// Field edits sent with a resubmission.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/record-edits-request.ts"
)]
pub struct RecordEditsRequest {
    pub amount: Option<String>,
    pub department: Option<String>,
    pub priority: Option<String>,
    pub branch: Option<String>,
    pub description: Option<String>,
}

/// Incoming payload for a transition request.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/apply-transition-request.ts"
)]
pub struct ApplyTransitionRequest {
    pub action: String,
    #[ts(type = "number")]
    pub expected_version: u64,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub rejection_category: Option<String>,
    #[serde(default)]
    pub query_text: Option<String>,
    #[serde(default)]
    pub referral_reason: Option<String>,
    #[serde(default)]
    pub gl_account: Option<String>,
    #[serde(default)]
    pub cost_center: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub edits: Option<RecordEditsRequest>,
}

/// Incoming payload for ledger posting.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/post-to-ledger-request.ts"
)]
pub struct PostToLedgerRequest {
    pub gl_account: String,
    pub cost_center: String,
    pub notes: Option<String>,
    #[ts(type = "number")]
    pub expected_version: u64,
}

/// Incoming payload for purchase-order delivery confirmation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/confirm-delivery-request.ts"
)]
pub struct ConfirmDeliveryRequest {
    pub notes: Option<String>,
    #[ts(type = "number")]
    pub expected_version: u64,
}

/// Incoming payload for a posting rejection.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/reject-posting-request.ts"
)]
pub struct RejectPostingRequest {
    pub reason: String,
    #[ts(type = "number")]
    pub expected_version: u64,
}

/// API representation of a workflow record.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/workflow-record-response.ts"
)]
pub struct WorkflowRecordResponse {
    pub record_id: String,
    pub kind: String,
    pub amount: String,
    pub currency: String,
    pub requested_by: String,
    pub department: String,
    pub priority: String,
    pub branch: Option<String>,
    pub description: Option<String>,
    pub state: String,
    pub gl_account: Option<String>,
    pub cost_center: Option<String>,
    pub fulfillment: Option<String>,
    pub payment_method: Option<String>,
    #[ts(type = "number")]
    pub version: u64,
    pub created_at: String,
    pub last_transition_at: String,
}

/// API representation of one audit-log entry.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/transition-entry-response.ts"
)]
pub struct TransitionEntryResponse {
    pub record_id: String,
    #[ts(type = "number")]
    pub sequence: u64,
    pub from_state: String,
    pub to_state: String,
    pub action: String,
    pub actor_id: String,
    pub actor_role: String,
    pub timestamp: String,
    pub notes: Option<String>,
}

/// Record and entry produced by a transition.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/transition-outcome-response.ts"
)]
pub struct TransitionOutcomeResponse {
    pub record: WorkflowRecordResponse,
    pub entry: TransitionEntryResponse,
    pub is_new: bool,
}

/// One page of an actor's pending work.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/pending-records-response.ts"
)]
pub struct PendingRecordsResponse {
    pub records: Vec<WorkflowRecordResponse>,
    pub next_cursor: Option<String>,
}

/// Whether an actor may perform an action right now.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/can-act-response.ts"
)]
pub struct CanActResponse {
    pub action: String,
    pub allowed: bool,
}
