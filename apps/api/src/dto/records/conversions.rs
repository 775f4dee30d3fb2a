use std::str::FromStr;

use rust_decimal::Decimal;
use tallyflow_application::{SubmitRecordInput, TransitionOutcome};
use tallyflow_core::{AppError, AppResult};
use tallyflow_domain::{
    PaymentMethod, Priority, RecordEdits, RecordKind, ReferralReason, RejectionCategory,
    TransitionAction, TransitionEntry, TransitionPayload, WorkflowRecord,
};

use super::{
    ApplyTransitionRequest, RecordEditsRequest, SubmitRecordRequest, TransitionEntryResponse,
    TransitionOutcomeResponse, WorkflowRecordResponse,
};

fn parse_amount(value: &str) -> AppResult<Decimal> {
    Decimal::from_str(value.trim())
        .map_err(|error| AppError::Validation(format!("invalid amount '{value}': {error}")))
}

fn parse_optional<T: FromStr<Err = AppError>>(value: Option<String>) -> AppResult<Option<T>> {
    value.as_deref().map(str::parse::<T>).transpose()
}

impl SubmitRecordRequest {
    pub fn into_input(self) -> AppResult<SubmitRecordInput> {
        Ok(SubmitRecordInput {
            kind: self.kind.parse::<RecordKind>()?,
            amount: parse_amount(self.amount.as_str())?,
            currency: self.currency,
            department: self.department,
            priority: self.priority.parse::<Priority>()?,
            branch: self.branch,
            description: self.description,
        })
    }
}

impl RecordEditsRequest {
    fn into_edits(self) -> AppResult<RecordEdits> {
        Ok(RecordEdits {
            amount: self.amount.as_deref().map(parse_amount).transpose()?,
            department: self.department,
            priority: parse_optional::<Priority>(self.priority)?,
            branch: self.branch,
            description: self.description,
        })
    }
}

impl ApplyTransitionRequest {
    pub fn action(&self) -> AppResult<TransitionAction> {
        self.action.parse::<TransitionAction>()
    }

    pub fn into_payload(self) -> AppResult<TransitionPayload> {
        Ok(TransitionPayload {
            notes: self.notes,
            rejection_reason: self.rejection_reason,
            rejection_category: parse_optional::<RejectionCategory>(self.rejection_category)?,
            query_text: self.query_text,
            referral_reason: parse_optional::<ReferralReason>(self.referral_reason)?,
            gl_account: self.gl_account,
            cost_center: self.cost_center,
            payment_method: parse_optional::<PaymentMethod>(self.payment_method)?,
            edits: self.edits.map(RecordEditsRequest::into_edits).transpose()?,
        })
    }
}

impl From<WorkflowRecord> for WorkflowRecordResponse {
    fn from(value: WorkflowRecord) -> Self {
        Self {
            record_id: value.record_id().as_str().to_owned(),
            kind: value.kind().as_str().to_owned(),
            amount: value.amount().to_string(),
            currency: value.currency().as_str().to_owned(),
            requested_by: value.requested_by().to_owned(),
            department: value.department().to_owned(),
            priority: value.priority().as_str().to_owned(),
            branch: value.branch().map(str::to_owned),
            description: value.description().map(str::to_owned),
            state: value.state().as_str().to_owned(),
            gl_account: value.gl_account().map(|code| code.as_str().to_owned()),
            cost_center: value.cost_center().map(|code| code.as_str().to_owned()),
            fulfillment: value
                .fulfillment()
                .map(|status| status.as_str().to_owned()),
            payment_method: value
                .payment_method()
                .map(|method| method.as_str().to_owned()),
            version: value.version(),
            created_at: value.created_at().to_rfc3339(),
            last_transition_at: value.last_transition_at().to_rfc3339(),
        }
    }
}

impl From<TransitionEntry> for TransitionEntryResponse {
    fn from(value: TransitionEntry) -> Self {
        Self {
            record_id: value.record_id,
            sequence: value.sequence,
            from_state: value.from_state.as_str().to_owned(),
            to_state: value.to_state.as_str().to_owned(),
            action: value.action.as_str().to_owned(),
            actor_id: value.actor_id,
            actor_role: value.actor_role,
            timestamp: value.timestamp.to_rfc3339(),
            notes: value.notes,
        }
    }
}

impl From<TransitionOutcome> for TransitionOutcomeResponse {
    fn from(value: TransitionOutcome) -> Self {
        Self {
            record: WorkflowRecordResponse::from(value.record),
            entry: TransitionEntryResponse::from(value.entry),
            is_new: value.is_new,
        }
    }
}

#[cfg(test)]
mod tests {
    use tallyflow_core::AppError;
    use tallyflow_domain::{PaymentMethod, ReferralReason, RejectionCategory, TransitionAction};

    use super::super::{ApplyTransitionRequest, RecordEditsRequest, SubmitRecordRequest};

    fn transition(action: &str) -> ApplyTransitionRequest {
        ApplyTransitionRequest {
            action: action.to_owned(),
            expected_version: 1,
            notes: None,
            rejection_reason: None,
            rejection_category: None,
            query_text: None,
            referral_reason: None,
            gl_account: None,
            cost_center: None,
            payment_method: None,
            edits: None,
        }
    }

    #[test]
    fn submit_request_parses_amount_and_enums() {
        let input = SubmitRecordRequest {
            kind: "purchase_order".to_owned(),
            amount: " 1250.50 ".to_owned(),
            currency: None,
            department: "Radiology".to_owned(),
            priority: "urgent".to_owned(),
            branch: None,
            description: None,
        }
        .into_input()
        .unwrap_or_else(|_| unreachable!());

        assert_eq!(input.amount.to_string(), "1250.50");
    }

    #[test]
    fn submit_request_rejects_unknown_kind_and_bad_amount() {
        let unknown_kind = SubmitRecordRequest {
            kind: "payroll".to_owned(),
            amount: "10".to_owned(),
            currency: None,
            department: "HR".to_owned(),
            priority: "low".to_owned(),
            branch: None,
            description: None,
        }
        .into_input();
        assert!(matches!(unknown_kind, Err(AppError::Validation(_))));

        let bad_amount = SubmitRecordRequest {
            kind: "expense".to_owned(),
            amount: "ten naira".to_owned(),
            currency: None,
            department: "HR".to_owned(),
            priority: "low".to_owned(),
            branch: None,
            description: None,
        }
        .into_input();
        assert!(matches!(bad_amount, Err(AppError::Validation(_))));
    }

    #[test]
    fn transition_request_maps_typed_fields() {
        let request = ApplyTransitionRequest {
            rejection_category: Some("policy_exception".to_owned()),
            referral_reason: Some("compliance-review".to_owned()),
            payment_method: Some("insurance".to_owned()),
            edits: Some(RecordEditsRequest {
                amount: Some("900".to_owned()),
                ..RecordEditsRequest::default()
            }),
            ..transition("reject")
        };

        assert_eq!(request.action().ok(), Some(TransitionAction::Reject));
        let payload = request.into_payload().unwrap_or_else(|_| unreachable!());
        assert_eq!(
            payload.rejection_category,
            Some(RejectionCategory::PolicyException)
        );
        assert_eq!(payload.referral_reason, Some(ReferralReason::ComplianceReview));
        assert_eq!(payload.payment_method, Some(PaymentMethod::Insurance));
        assert!(payload.edits.is_some_and(|edits| edits.amount.is_some()));
    }

    #[test]
    fn unknown_action_is_a_validation_error() {
        assert!(matches!(
            transition("approve_all").action(),
            Err(AppError::Validation(_))
        ));
    }
}
