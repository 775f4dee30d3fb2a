use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tallyflow_core::{AppError, AppResult};

use crate::record::{Priority, RecordKind, RecordState, WorkflowRecord};
use crate::transition::TransitionAction;

/// One routing rule. Rules without a kind form the global default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingRule {
    /// Record kind this rule applies to.
    #[serde(default)]
    pub kind: Option<RecordKind>,
    /// Priority this rule applies to; requires a kind.
    #[serde(default)]
    pub priority: Option<Priority>,
    /// Ordered roles that review at `pending_review`.
    pub reviewer_roles: Vec<String>,
    /// Highest amount reviewers may decide directly; above it they may only refer.
    #[serde(default)]
    pub approval_ceiling: Option<Decimal>,
    /// Role that decides referred records.
    #[serde(default)]
    pub escalation_role: Option<String>,
    /// Roles that post approved records to the ledger.
    #[serde(default)]
    pub posting_roles: Vec<String>,
    /// Roles that run the payment pipeline.
    #[serde(default)]
    pub payment_roles: Vec<String>,
}

impl RoutingRule {
    fn key(&self) -> (Option<RecordKind>, Option<Priority>) {
        (self.kind, self.priority)
    }

    fn exceeds_ceiling(&self, amount: Decimal) -> bool {
        self.approval_ceiling.is_some_and(|ceiling| amount > ceiling)
    }
}

/// Validated rule set with `(kind, priority) > kind > global` precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingPolicy {
    global: RoutingRule,
    scoped: Vec<RoutingRule>,
}

impl RoutingPolicy {
    /// Validates a rule set. Exactly one global default is required.
    pub fn new(rules: Vec<RoutingRule>) -> AppResult<Self> {
        let mut seen = BTreeSet::new();
        let mut globals = Vec::new();
        let mut scoped = Vec::new();

        for rule in &rules {
            if rule.kind.is_none() && rule.priority.is_some() {
                return Err(AppError::Validation(
                    "routing rule with a priority must also name a kind".to_owned(),
                ));
            }

            if rule.reviewer_roles.iter().all(|role| role.trim().is_empty()) {
                return Err(AppError::Validation(format!(
                    "routing rule {} must name at least one reviewer role",
                    describe_key(rule.key())
                )));
            }

            if rule
                .approval_ceiling
                .is_some_and(|ceiling| ceiling.is_sign_negative() && !ceiling.is_zero())
            {
                return Err(AppError::Validation(format!(
                    "routing rule {} has a negative approval ceiling",
                    describe_key(rule.key())
                )));
            }

            if !seen.insert(rule.key()) {
                return Err(AppError::Validation(format!(
                    "duplicate routing rule {}",
                    describe_key(rule.key())
                )));
            }
        }

        for rule in rules {
            if rule.kind.is_none() {
                globals.push(rule);
            } else {
                scoped.push(rule);
            }
        }

        let global = match (globals.pop(), globals.is_empty()) {
            (Some(global), true) => global,
            _ => {
                return Err(AppError::Validation(
                    "routing rules must contain exactly one global default".to_owned(),
                ));
            }
        };

        Ok(Self { global, scoped })
    }

    /// Returns the configured rules, global default first.
    pub fn rules(&self) -> impl Iterator<Item = &RoutingRule> {
        std::iter::once(&self.global).chain(self.scoped.iter())
    }

    /// Returns the first matching rule. The global default always matches.
    #[must_use]
    pub fn match_rule(&self, kind: RecordKind, priority: Priority) -> &RoutingRule {
        let exact = self
            .scoped
            .iter()
            .find(|rule| rule.kind == Some(kind) && rule.priority == Some(priority));
        let by_kind = || {
            self.scoped
                .iter()
                .find(|rule| rule.kind == Some(kind) && rule.priority.is_none())
        };

        exact.or_else(by_kind).unwrap_or(&self.global)
    }

    /// Returns the ordered roles eligible to act on the record in its current state.
    #[must_use]
    pub fn eligible_roles(&self, record: &WorkflowRecord) -> Vec<String> {
        let rule = self.match_rule(record.kind(), record.priority());

        match record.state() {
            RecordState::PendingReview => rule.reviewer_roles.clone(),
            RecordState::ReferredToEscalation => rule.escalation_role.iter().cloned().collect(),
            RecordState::Approved | RecordState::PendingPosting => rule.posting_roles.clone(),
            RecordState::PostedToAp
            | RecordState::ReadyForPayment
            | RecordState::PaymentProcessing => rule.payment_roles.clone(),
            RecordState::Queried | RecordState::Rejected | RecordState::Paid => Vec::new(),
        }
    }

    /// Returns the escalation role for the record, if its rule names one.
    #[must_use]
    pub fn escalation_target(&self, record: &WorkflowRecord) -> Option<&str> {
        self.match_rule(record.kind(), record.priority())
            .escalation_role
            .as_deref()
    }

    /// Returns the actions routing permits for a role on the record.
    ///
    /// Permission grants are checked separately.
    #[must_use]
    pub fn allowed_actions(
        &self,
        record: &WorkflowRecord,
        role: &str,
        is_requester: bool,
    ) -> Vec<TransitionAction> {
        let rule = self.match_rule(record.kind(), record.priority());
        let holds = |roles: &[String]| roles.iter().any(|candidate| candidate == role);

        match record.state() {
            RecordState::PendingReview => {
                if is_requester || !holds(&rule.reviewer_roles) {
                    Vec::new()
                } else if rule.exceeds_ceiling(record.amount()) {
                    vec![TransitionAction::Refer]
                } else {
                    vec![
                        TransitionAction::Approve,
                        TransitionAction::Reject,
                        TransitionAction::Query,
                        TransitionAction::Refer,
                    ]
                }
            }
            RecordState::ReferredToEscalation => {
                if !is_requester && rule.escalation_role.as_deref() == Some(role) {
                    vec![TransitionAction::Approve, TransitionAction::Reject]
                } else {
                    Vec::new()
                }
            }
            RecordState::Queried => {
                if is_requester {
                    vec![TransitionAction::Resubmit]
                } else {
                    Vec::new()
                }
            }
            RecordState::Approved if holds(&rule.posting_roles) => {
                let forward = if record.kind() == RecordKind::PurchaseOrder {
                    TransitionAction::ConfirmDelivery
                } else {
                    TransitionAction::Post
                };
                vec![forward, TransitionAction::RejectPosting]
            }
            RecordState::PendingPosting if holds(&rule.posting_roles) => {
                vec![TransitionAction::Post, TransitionAction::RejectPosting]
            }
            RecordState::PostedToAp if holds(&rule.payment_roles) => {
                vec![TransitionAction::ReleasePayment]
            }
            RecordState::ReadyForPayment if holds(&rule.payment_roles) => {
                vec![TransitionAction::ProcessPayment]
            }
            RecordState::PaymentProcessing if holds(&rule.payment_roles) => {
                vec![TransitionAction::ConfirmPayment]
            }
            _ => Vec::new(),
        }
    }
}

/// Built-in routing used when no rule file is configured.
#[must_use]
pub fn default_routing_rules() -> Vec<RoutingRule> {
    let roles = |names: &[&str]| names.iter().map(|name| (*name).to_owned()).collect::<Vec<_>>();

    vec![
        RoutingRule {
            kind: None,
            priority: None,
            reviewer_roles: roles(&["manager", "finance_manager"]),
            approval_ceiling: Some(Decimal::new(200_000, 0)),
            escalation_role: Some("ged".to_owned()),
            posting_roles: roles(&["accountant", "finance_manager"]),
            payment_roles: roles(&["finance_manager", "accountant"]),
        },
        RoutingRule {
            kind: Some(RecordKind::IncomeEntry),
            priority: None,
            reviewer_roles: roles(&["accountant", "finance_manager"]),
            approval_ceiling: None,
            escalation_role: Some("finance_manager".to_owned()),
            posting_roles: roles(&["accountant"]),
            payment_roles: roles(&["finance_manager"]),
        },
        RoutingRule {
            kind: Some(RecordKind::FundTransfer),
            priority: None,
            reviewer_roles: roles(&["finance_manager"]),
            approval_ceiling: Some(Decimal::new(1_000_000, 0)),
            escalation_role: Some("ceo".to_owned()),
            posting_roles: roles(&["accountant"]),
            payment_roles: roles(&["finance_manager"]),
        },
        RoutingRule {
            kind: Some(RecordKind::FundTransfer),
            priority: Some(Priority::Urgent),
            reviewer_roles: roles(&["ged", "finance_manager"]),
            approval_ceiling: Some(Decimal::new(1_000_000, 0)),
            escalation_role: Some("ceo".to_owned()),
            posting_roles: roles(&["accountant"]),
            payment_roles: roles(&["finance_manager"]),
        },
    ]
}

fn describe_key(key: (Option<RecordKind>, Option<Priority>)) -> String {
    match key {
        (None, _) => "(global)".to_owned(),
        (Some(kind), None) => format!("({})", kind.as_str()),
        (Some(kind), Some(priority)) => format!("({}, {})", kind.as_str(), priority.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use crate::record::{Priority, RecordKind, SubmissionInput, WorkflowRecord};
    use crate::transition::TransitionAction;

    use super::{RoutingPolicy, RoutingRule, default_routing_rules};

    fn policy() -> RoutingPolicy {
        RoutingPolicy::new(default_routing_rules()).unwrap_or_else(|_| unreachable!())
    }

    fn record(kind: RecordKind, amount: i64, priority: Priority) -> WorkflowRecord {
        WorkflowRecord::submit(
            "rec-1",
            SubmissionInput {
                kind,
                amount: Decimal::new(amount, 0),
                currency: None,
                requested_by: "amaka".to_owned(),
                department: "Finance".to_owned(),
                priority,
                branch: None,
                description: None,
            },
            Utc::now(),
        )
        .unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn exact_rule_wins_over_kind_and_global_defaults() {
        let policy = policy();

        let urgent = policy.match_rule(RecordKind::FundTransfer, Priority::Urgent);
        assert_eq!(urgent.priority, Some(Priority::Urgent));

        let low = policy.match_rule(RecordKind::FundTransfer, Priority::Low);
        assert_eq!(low.kind, Some(RecordKind::FundTransfer));
        assert_eq!(low.priority, None);

        let expense = policy.match_rule(RecordKind::Expense, Priority::High);
        assert_eq!(expense.kind, None);
    }

    #[test]
    fn amount_over_ceiling_restricts_reviewers_to_refer() {
        let policy = policy();
        let large = record(RecordKind::Expense, 500_000, Priority::High);
        let small = record(RecordKind::Expense, 50_000, Priority::High);

        assert_eq!(
            policy.allowed_actions(&large, "manager", false),
            vec![TransitionAction::Refer]
        );
        assert!(
            policy
                .allowed_actions(&small, "manager", false)
                .contains(&TransitionAction::Approve)
        );
    }

    #[test]
    fn requester_cannot_review_own_record() {
        let policy = policy();
        let small = record(RecordKind::Expense, 50_000, Priority::Low);

        assert!(policy.allowed_actions(&small, "manager", true).is_empty());
    }

    #[test]
    fn escalation_target_follows_matched_rule() {
        let policy = policy();
        let expense = record(RecordKind::Expense, 1, Priority::Low);
        let transfer = record(RecordKind::FundTransfer, 1, Priority::Low);

        assert_eq!(policy.escalation_target(&expense), Some("ged"));
        assert_eq!(policy.escalation_target(&transfer), Some("ceo"));
        assert_eq!(
            policy.eligible_roles(&expense),
            vec!["manager".to_owned(), "finance_manager".to_owned()]
        );
    }

    #[test]
    fn rule_sets_without_single_global_default_are_rejected() {
        let mut rules = default_routing_rules();
        rules.remove(0);
        assert!(RoutingPolicy::new(rules).is_err());

        let mut duplicated = default_routing_rules();
        duplicated.push(duplicated[1].clone());
        assert!(RoutingPolicy::new(duplicated).is_err());
    }

    #[test]
    fn priority_without_kind_is_rejected() {
        let mut rules = default_routing_rules();
        rules.push(RoutingRule {
            kind: None,
            priority: Some(Priority::Urgent),
            ..rules[0].clone()
        });
        assert!(RoutingPolicy::new(rules).is_err());
    }

    #[test]
    fn rules_deserialize_from_json() {
        let rules: Result<Vec<RoutingRule>, _> = serde_json::from_str(
            r#"[{"reviewer_roles":["manager"],"approval_ceiling":"1000","escalation_role":"ceo"}]"#,
        );
        assert!(rules.is_ok());
        let policy = RoutingPolicy::new(rules.unwrap_or_default());
        assert!(policy.is_ok());
    }
}
