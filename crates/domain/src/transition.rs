use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tallyflow_core::{AppError, AppResult};

use crate::ledger::{CostCenter, GlAccount};
use crate::record::{
    FulfillmentStatus, PaymentMethod, RecordEdits, RecordKind, RecordState, WorkflowRecord,
};
use crate::security::{Permission, PermissionAction, Resource};

/// Action requested against a workflow record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionAction {
    /// Approve at review or escalation.
    Approve,
    /// Reject at review or escalation.
    Reject,
    /// Suspend pending the requester's answer.
    Query,
    /// Refer to the escalation role.
    Refer,
    /// Requester answers a query and returns the record to review.
    Resubmit,
    /// Post to accounts payable with ledger coding.
    Post,
    /// Confirm purchase order delivery.
    ConfirmDelivery,
    /// Send an approved record back to review from the posting desk.
    RejectPosting,
    /// Release a posted record for payment.
    ReleasePayment,
    /// Start processing the payment.
    ProcessPayment,
    /// Confirm settlement.
    ConfirmPayment,
}

impl TransitionAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Query => "query",
            Self::Refer => "refer",
            Self::Resubmit => "resubmit",
            Self::Post => "post",
            Self::ConfirmDelivery => "confirm_delivery",
            Self::RejectPosting => "reject_posting",
            Self::ReleasePayment => "release_payment",
            Self::ProcessPayment => "process_payment",
            Self::ConfirmPayment => "confirm_payment",
        }
    }

    /// Returns all known actions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[TransitionAction] = &[
            TransitionAction::Approve,
            TransitionAction::Reject,
            TransitionAction::Query,
            TransitionAction::Refer,
            TransitionAction::Resubmit,
            TransitionAction::Post,
            TransitionAction::ConfirmDelivery,
            TransitionAction::RejectPosting,
            TransitionAction::ReleasePayment,
            TransitionAction::ProcessPayment,
            TransitionAction::ConfirmPayment,
        ];

        ALL
    }

    /// Returns the permission an actor needs to perform this action on a record kind.
    #[must_use]
    pub fn required_permission(&self, kind: RecordKind) -> Permission {
        match self {
            Self::Approve => Permission::new(kind.resource(), PermissionAction::Approve),
            Self::Reject => Permission::new(kind.resource(), PermissionAction::Reject),
            Self::Query => Permission::new(kind.resource(), PermissionAction::Query),
            Self::Refer => Permission::new(kind.resource(), PermissionAction::Refer),
            Self::Resubmit => Permission::new(kind.resource(), PermissionAction::Submit),
            Self::Post => Permission::new(Resource::Ledger, PermissionAction::Post),
            Self::RejectPosting => Permission::new(Resource::Ledger, PermissionAction::Reject),
            Self::ConfirmDelivery => {
                Permission::new(Resource::PurchaseOrder, PermissionAction::ConfirmDelivery)
            }
            Self::ReleasePayment => Permission::new(Resource::Payment, PermissionAction::Release),
            Self::ProcessPayment => Permission::new(Resource::Payment, PermissionAction::Process),
            Self::ConfirmPayment => Permission::new(Resource::Payment, PermissionAction::Confirm),
        }
    }
}

impl Display for TransitionAction {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for TransitionAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|action| action.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown transition action '{value}'")))
    }
}

/// Closed set of reasons accepted for a referral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferralReason {
    /// Amount exceeds the reviewer's authority.
    HighValue,
    /// Request needs an exception to policy.
    PolicyException,
    /// Decision has strategic impact.
    StrategicDecision,
    /// Compliance must review.
    ComplianceReview,
    /// Anything else; notes must explain.
    Other,
}

impl ReferralReason {
    /// Returns a stable storage value for this reason.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HighValue => "high-value",
            Self::PolicyException => "policy-exception",
            Self::StrategicDecision => "strategic-decision",
            Self::ComplianceReview => "compliance-review",
            Self::Other => "other",
        }
    }
}

impl FromStr for ReferralReason {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "high-value" => Ok(Self::HighValue),
            "policy-exception" => Ok(Self::PolicyException),
            "strategic-decision" => Ok(Self::StrategicDecision),
            "compliance-review" => Ok(Self::ComplianceReview),
            "other" => Ok(Self::Other),
            _ => Err(AppError::Validation(format!(
                "unknown referral reason '{value}'"
            ))),
        }
    }
}

/// Category attached to a rejection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionCategory {
    /// Plain rejection.
    #[default]
    Standard,
    /// Rejection because the request needs a policy exception; may auto-escalate.
    PolicyException,
}

impl FromStr for RejectionCategory {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "standard" => Ok(Self::Standard),
            "policy_exception" => Ok(Self::PolicyException),
            _ => Err(AppError::Validation(format!(
                "unknown rejection category '{value}'"
            ))),
        }
    }
}

/// Loosely-typed action payload as supplied by callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionPayload {
    /// Free-text notes.
    pub notes: Option<String>,
    /// Rejection reason text.
    pub rejection_reason: Option<String>,
    /// Rejection category.
    pub rejection_category: Option<RejectionCategory>,
    /// Query text.
    pub query_text: Option<String>,
    /// Referral reason.
    pub referral_reason: Option<ReferralReason>,
    /// Ledger account for posting.
    pub gl_account: Option<String>,
    /// Cost center for posting.
    pub cost_center: Option<String>,
    /// Payment method for processing.
    pub payment_method: Option<PaymentMethod>,
    /// Field edits for resubmission.
    pub edits: Option<RecordEdits>,
}

/// Validated, action-specific input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionInput {
    /// Approval with optional notes.
    Approve {
        /// Optional notes.
        notes: Option<String>,
    },
    /// Rejection.
    Reject {
        /// Reason text.
        reason: String,
        /// Rejection category.
        category: RejectionCategory,
    },
    /// Query raised to the requester.
    Query {
        /// Question for the requester.
        query_text: String,
    },
    /// Referral to the escalation role.
    Refer {
        /// Referral reason.
        reason: ReferralReason,
        /// Justification.
        notes: String,
    },
    /// Resubmission after a query.
    Resubmit {
        /// Field edits.
        edits: RecordEdits,
        /// Optional answer to the query.
        notes: Option<String>,
    },
    /// Ledger posting.
    Post {
        /// Ledger account.
        gl_account: GlAccount,
        /// Cost center.
        cost_center: CostCenter,
        /// Optional notes.
        notes: Option<String>,
    },
    /// Delivery confirmation.
    ConfirmDelivery {
        /// Optional notes.
        notes: Option<String>,
    },
    /// Return from posting desk to review.
    RejectPosting {
        /// Reason text.
        reason: String,
    },
    /// Release for payment.
    ReleasePayment {
        /// Optional notes.
        notes: Option<String>,
    },
    /// Start payment processing.
    ProcessPayment {
        /// Settlement channel.
        payment_method: PaymentMethod,
        /// Optional notes.
        notes: Option<String>,
    },
    /// Confirm settlement.
    ConfirmPayment {
        /// Optional notes.
        notes: Option<String>,
    },
}

impl ActionInput {
    /// Returns the audit notes recorded for this input.
    #[must_use]
    pub fn audit_notes(&self) -> Option<String> {
        match self {
            Self::Approve { notes }
            | Self::ConfirmDelivery { notes }
            | Self::ReleasePayment { notes }
            | Self::ConfirmPayment { notes }
            | Self::Resubmit { notes, .. } => notes.clone(),
            Self::Reject { reason, category } => Some(match category {
                RejectionCategory::Standard => reason.clone(),
                RejectionCategory::PolicyException => format!("policy exception: {reason}"),
            }),
            Self::Query { query_text } => Some(query_text.clone()),
            Self::Refer { reason, notes } => Some(format!("{}: {notes}", reason.as_str())),
            Self::Post {
                gl_account,
                cost_center,
                notes,
            } => Some(match notes {
                Some(notes) => format!("posted to {gl_account} / {cost_center}: {notes}"),
                None => format!("posted to {gl_account} / {cost_center}"),
            }),
            Self::RejectPosting { reason } => Some(reason.clone()),
            Self::ProcessPayment {
                payment_method,
                notes,
            } => Some(match notes {
                Some(notes) => format!("{}: {notes}", payment_method.as_str()),
                None => payment_method.as_str().to_owned(),
            }),
        }
    }
}

/// Checks that the payload carries the fields the action requires.
pub fn validate_payload(
    action: TransitionAction,
    payload: &TransitionPayload,
) -> AppResult<ActionInput> {
    let notes = trimmed(payload.notes.as_deref());

    match action {
        TransitionAction::Approve => Ok(ActionInput::Approve { notes }),
        TransitionAction::Reject => Ok(ActionInput::Reject {
            reason: required(payload.rejection_reason.as_deref(), "rejection_reason")?,
            category: payload.rejection_category.unwrap_or_default(),
        }),
        TransitionAction::Query => Ok(ActionInput::Query {
            query_text: required(payload.query_text.as_deref(), "query_text")?,
        }),
        TransitionAction::Refer => Ok(ActionInput::Refer {
            reason: payload.referral_reason.ok_or_else(|| {
                AppError::Validation("refer requires a referral_reason".to_owned())
            })?,
            notes: required(payload.notes.as_deref(), "notes")?,
        }),
        TransitionAction::Resubmit => Ok(ActionInput::Resubmit {
            edits: payload.edits.clone().unwrap_or_default(),
            notes,
        }),
        TransitionAction::Post => {
            let gl_account = required(payload.gl_account.as_deref(), "gl_account")?;
            let cost_center = required(payload.cost_center.as_deref(), "cost_center")?;
            Ok(ActionInput::Post {
                gl_account: GlAccount::parse(gl_account.as_str())?,
                cost_center: CostCenter::parse(cost_center.as_str())?,
                notes,
            })
        }
        TransitionAction::ConfirmDelivery => Ok(ActionInput::ConfirmDelivery { notes }),
        TransitionAction::RejectPosting => Ok(ActionInput::RejectPosting {
            reason: required(payload.rejection_reason.as_deref(), "rejection_reason")?,
        }),
        TransitionAction::ReleasePayment => Ok(ActionInput::ReleasePayment { notes }),
        TransitionAction::ProcessPayment => Ok(ActionInput::ProcessPayment {
            payment_method: payload.payment_method.ok_or_else(|| {
                AppError::Validation("process_payment requires a payment_method".to_owned())
            })?,
            notes,
        }),
        TransitionAction::ConfirmPayment => Ok(ActionInput::ConfirmPayment { notes }),
    }
}

/// Resolves the target state of an action, or fails with `InvalidTransition`.
pub fn next_state(
    kind: RecordKind,
    from: RecordState,
    action: TransitionAction,
) -> AppResult<RecordState> {
    use RecordState as S;
    use TransitionAction as A;

    let target = match (from, action) {
        (S::PendingReview, A::Approve) => Some(S::Approved),
        (S::PendingReview, A::Reject) => Some(S::Rejected),
        (S::PendingReview, A::Query) => Some(S::Queried),
        (S::PendingReview, A::Refer) => Some(S::ReferredToEscalation),
        (S::ReferredToEscalation, A::Approve) => Some(S::Approved),
        (S::ReferredToEscalation, A::Reject) => Some(S::Rejected),
        (S::Queried, A::Resubmit) => Some(S::PendingReview),
        (S::Approved, A::ConfirmDelivery) if kind == RecordKind::PurchaseOrder => {
            Some(S::PendingPosting)
        }
        (S::Approved, A::Post) if kind != RecordKind::PurchaseOrder => Some(S::PostedToAp),
        (S::PendingPosting, A::Post) => Some(S::PostedToAp),
        (S::Approved | S::PendingPosting, A::RejectPosting) => Some(S::PendingReview),
        (S::PostedToAp, A::ReleasePayment) => Some(S::ReadyForPayment),
        (S::ReadyForPayment, A::ProcessPayment) => Some(S::PaymentProcessing),
        (S::PaymentProcessing, A::ConfirmPayment) => Some(S::Paid),
        _ => None,
    };

    target.ok_or_else(|| {
        AppError::InvalidTransition(format!(
            "action '{action}' is not allowed from state '{from}' for {}",
            kind.as_str()
        ))
    })
}

/// Returns whether `from -> to` is an edge of the state graph for the kind.
///
/// Covers policy-exception auto-escalation, which rejects into `referred_to_escalation`.
#[must_use]
pub fn is_legal_edge(kind: RecordKind, from: RecordState, to: RecordState) -> bool {
    if from == RecordState::PendingReview && to == RecordState::ReferredToEscalation {
        return true;
    }

    TransitionAction::all()
        .iter()
        .any(|action| next_state(kind, from, *action).is_ok_and(|target| target == to))
}

/// Immutable audit record of one committed transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionEntry {
    /// Record the transition applies to.
    pub record_id: String,
    /// Record version the transition was applied to; strictly increasing per record.
    pub sequence: u64,
    /// State before the transition.
    pub from_state: RecordState,
    /// State after the transition.
    pub to_state: RecordState,
    /// Requested action.
    pub action: TransitionAction,
    /// Acting principal.
    pub actor_id: String,
    /// Role the actor held when acting.
    pub actor_role: String,
    /// Commit timestamp.
    pub timestamp: DateTime<Utc>,
    /// Reason, query text or referral justification.
    pub notes: Option<String>,
}

/// Next record snapshot plus the entry that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionPlan {
    /// Record after the transition.
    pub record: WorkflowRecord,
    /// Entry to append.
    pub entry: TransitionEntry,
}

/// Who is applying a planned transition.
#[derive(Debug, Clone, Copy)]
pub struct TransitionActor<'a> {
    /// Acting principal.
    pub actor_id: &'a str,
    /// Role the actor holds.
    pub actor_role: &'a str,
}

impl WorkflowRecord {
    /// Builds the next record snapshot and its audit entry without persisting anything.
    ///
    /// `target` must be a legal edge from the current state.
    pub fn plan_transition(
        &self,
        input: &ActionInput,
        action: TransitionAction,
        target: RecordState,
        actor: TransitionActor<'_>,
        now: DateTime<Utc>,
    ) -> AppResult<TransitionPlan> {
        if self.state().is_terminal() {
            return Err(AppError::InvalidTransition(format!(
                "record '{}' is in terminal state '{}'",
                self.record_id(),
                self.state()
            )));
        }

        if !is_legal_edge(self.kind(), self.state(), target) {
            return Err(AppError::InvalidTransition(format!(
                "record '{}' cannot move from '{}' to '{target}'",
                self.record_id(),
                self.state()
            )));
        }

        let mut record = self.clone();

        match input {
            ActionInput::Post {
                gl_account,
                cost_center,
                ..
            } => {
                if self.gl_account().is_some() {
                    return Err(AppError::AlreadyPosted(format!(
                        "record '{}' already carries ledger coding",
                        self.record_id()
                    )));
                }
                record.stamp_ledger_coding(gl_account.clone(), cost_center.clone());
            }
            ActionInput::ConfirmDelivery { .. } => {
                if self.fulfillment() != Some(FulfillmentStatus::Executed) {
                    return Err(AppError::Validation(format!(
                        "purchase order '{}' has not been marked executed by fulfillment",
                        self.record_id()
                    )));
                }
            }
            ActionInput::ProcessPayment { payment_method, .. } => {
                record.set_payment_method(*payment_method);
            }
            ActionInput::Resubmit { edits, .. } => {
                record.apply_edits(edits)?;
            }
            _ => {}
        }

        let sequence = self.version();
        record.set_state(target);
        record.advance_version(now);

        let entry = TransitionEntry {
            record_id: self.record_id().as_str().to_owned(),
            sequence,
            from_state: self.state(),
            to_state: target,
            action,
            actor_id: actor.actor_id.to_owned(),
            actor_role: actor.actor_role.to_owned(),
            timestamp: record.last_transition_at(),
            notes: input.audit_notes(),
        };

        Ok(TransitionPlan { record, entry })
    }
}

/// Folds a record's ordered log from `pending_review` and returns the resulting state.
pub fn replay_state(kind: RecordKind, entries: &[TransitionEntry]) -> AppResult<RecordState> {
    let mut current = RecordState::PendingReview;

    for (index, entry) in entries.iter().enumerate() {
        if entry.from_state != current {
            return Err(AppError::Internal(format!(
                "transition #{} of record '{}' starts at '{}' but replay is at '{current}'",
                index + 1,
                entry.record_id,
                entry.from_state
            )));
        }

        if !is_legal_edge(kind, entry.from_state, entry.to_state) {
            return Err(AppError::Internal(format!(
                "transition #{} of record '{}' uses illegal edge '{}' -> '{}'",
                index + 1,
                entry.record_id,
                entry.from_state,
                entry.to_state
            )));
        }

        current = entry.to_state;
    }

    Ok(current)
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_owned())
    })
}

fn required(value: Option<&str>, field: &str) -> AppResult<String> {
    trimmed(value).ok_or_else(|| AppError::Validation(format!("{field} must not be empty")))
}
