use tallyflow_core::{ActorContext, AppResult};
use tallyflow_domain::{TransitionAction, TransitionPayload};

use crate::WorkflowService;
use crate::record_ports::{ApplyTransitionInput, TransitionOutcome};

/// Ledger posting request for an approved record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostToLedgerInput {
    /// Target record.
    pub record_id: String,
    /// General-ledger account code.
    pub gl_account: String,
    /// Cost center code.
    pub cost_center: String,
    /// Optional notes.
    pub notes: Option<String>,
    /// Record version the caller last observed.
    pub expected_version: u64,
}

/// Moves approved records into accounts payable.
///
/// Every operation is a transition through [`WorkflowService`], so posting
/// shares its authorization, concurrency and audit guarantees.
#[derive(Clone)]
pub struct PostingGateway {
    workflow_service: WorkflowService,
}

impl PostingGateway {
    /// Creates a gateway over the workflow service.
    #[must_use]
    pub fn new(workflow_service: WorkflowService) -> Self {
        Self { workflow_service }
    }

    /// Stamps ledger coding and moves the record to `posted_to_ap`.
    ///
    /// Re-posting identical codes is idempotent; different codes fail with `AlreadyPosted`.
    pub async fn post_to_ledger(
        &self,
        actor: &ActorContext,
        input: PostToLedgerInput,
    ) -> AppResult<TransitionOutcome> {
        self.workflow_service
            .apply_transition(
                actor,
                ApplyTransitionInput {
                    record_id: input.record_id,
                    action: TransitionAction::Post,
                    payload: TransitionPayload {
                        gl_account: Some(input.gl_account),
                        cost_center: Some(input.cost_center),
                        notes: input.notes,
                        ..TransitionPayload::default()
                    },
                    expected_version: input.expected_version,
                },
            )
            .await
    }

    /// Confirms delivery of an approved purchase order whose fulfillment is executed.
    pub async fn confirm_delivery(
        &self,
        actor: &ActorContext,
        record_id: &str,
        notes: Option<String>,
        expected_version: u64,
    ) -> AppResult<TransitionOutcome> {
        self.workflow_service
            .apply_transition(
                actor,
                ApplyTransitionInput {
                    record_id: record_id.to_owned(),
                    action: TransitionAction::ConfirmDelivery,
                    payload: TransitionPayload {
                        notes,
                        ..TransitionPayload::default()
                    },
                    expected_version,
                },
            )
            .await
    }

    /// Returns a record awaiting posting to `pending_review` with the reason recorded.
    pub async fn reject_posting(
        &self,
        actor: &ActorContext,
        record_id: &str,
        reason: &str,
        expected_version: u64,
    ) -> AppResult<TransitionOutcome> {
        self.workflow_service
            .apply_transition(
                actor,
                ApplyTransitionInput {
                    record_id: record_id.to_owned(),
                    action: TransitionAction::RejectPosting,
                    payload: TransitionPayload {
                        rejection_reason: Some(reason.to_owned()),
                        ..TransitionPayload::default()
                    },
                    expected_version,
                },
            )
            .await
    }
}
