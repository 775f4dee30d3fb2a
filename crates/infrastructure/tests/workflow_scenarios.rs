//! End-to-end workflow scenarios over the in-memory adapters.

use std::sync::Arc;

use rust_decimal::Decimal;
use tallyflow_application::{
    ApplyTransitionInput, AuthorizationService, PostToLedgerInput, PostingGateway,
    ReportingService, RoleAdminService, SubmitRecordInput, TenantBootstrapService,
    WorkflowService,
};
use tallyflow_core::{ActorContext, AppError, TenantId};
use tallyflow_domain::{
    AuditAction, PaymentMethod, Priority, RecordKind, RecordState, ReferralReason, RoutingPolicy,
    TransitionAction, TransitionPayload, WorkflowRecord, default_routing_rules, replay_state,
};
use tallyflow_infrastructure::{
    InMemoryAuditRepository, InMemoryRoleGrantCache, InMemoryRoleRepository,
    InMemoryWorkflowRecordRepository,
};

struct Stack {
    tenant_id: TenantId,
    audit: Arc<InMemoryAuditRepository>,
    workflow: WorkflowService,
    posting: PostingGateway,
    reporting: ReportingService,
    role_admin: RoleAdminService,
}

impl Stack {
    async fn new() -> Self {
        let tenant_id = TenantId::new();
        let roles = Arc::new(InMemoryRoleRepository::new());
        let records = Arc::new(InMemoryWorkflowRecordRepository::new());
        let audit = Arc::new(InMemoryAuditRepository::new());

        let bootstrap = TenantBootstrapService::new(roles.clone());
        assert!(bootstrap.ensure_default_security(tenant_id).await.is_ok());
        for (principal, role_name) in [
            ("chidi", "ceo"),
            ("ada", "ged"),
            ("femi", "finance_manager"),
            ("kemi", "accountant"),
            ("obi", "manager"),
            ("amaka", "staff"),
        ] {
            assert!(
                bootstrap
                    .ensure_principal_role(tenant_id, principal, role_name)
                    .await
                    .is_ok()
            );
        }

        let authorization =
            AuthorizationService::new(roles.clone(), Arc::new(InMemoryRoleGrantCache::new()));
        let routing = RoutingPolicy::new(default_routing_rules()).unwrap_or_else(|_| unreachable!());
        let workflow = WorkflowService::new(
            authorization.clone(),
            records.clone(),
            audit.clone(),
            Arc::new(routing),
        );

        Self {
            tenant_id,
            audit: audit.clone(),
            posting: PostingGateway::new(workflow.clone()),
            reporting: ReportingService::new(authorization.clone(), records),
            role_admin: RoleAdminService::new(authorization, roles, audit),
            workflow,
        }
    }

    fn actor(&self, principal: &str) -> ActorContext {
        ActorContext::new(principal, self.tenant_id).unwrap_or_else(|_| unreachable!())
    }

    async fn submit(&self, kind: RecordKind, amount: i64, priority: Priority) -> WorkflowRecord {
        self.workflow
            .submit(
                &self.actor("amaka"),
                SubmitRecordInput {
                    kind,
                    amount: Decimal::new(amount, 0),
                    currency: None,
                    department: "Laboratory".to_owned(),
                    priority,
                    branch: None,
                    description: Some("Reagent restock".to_owned()),
                },
            )
            .await
            .unwrap_or_else(|_| unreachable!())
    }

    async fn apply(
        &self,
        principal: &str,
        record: &WorkflowRecord,
        action: TransitionAction,
        payload: TransitionPayload,
    ) -> Result<WorkflowRecord, AppError> {
        self.workflow
            .apply_transition(
                &self.actor(principal),
                ApplyTransitionInput {
                    record_id: record.record_id().as_str().to_owned(),
                    action,
                    payload,
                    expected_version: record.version(),
                },
            )
            .await
            .map(|outcome| outcome.record)
    }
}

#[tokio::test]
async fn high_value_expense_reaches_accounts_payable_through_escalation() {
    let stack = Stack::new().await;
    let record = stack
        .submit(RecordKind::Expense, 500_000, Priority::High)
        .await;

    let denied = stack
        .apply(
            "obi",
            &record,
            TransitionAction::Approve,
            TransitionPayload::default(),
        )
        .await;
    assert!(matches!(denied, Err(AppError::Unauthorized(_))));

    let referred = stack
        .apply(
            "obi",
            &record,
            TransitionAction::Refer,
            TransitionPayload {
                referral_reason: Some(ReferralReason::HighValue),
                notes: Some("above manager ceiling".to_owned()),
                ..TransitionPayload::default()
            },
        )
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(referred.state(), RecordState::ReferredToEscalation);

    let approved = stack
        .apply(
            "ada",
            &referred,
            TransitionAction::Approve,
            TransitionPayload::default(),
        )
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(approved.state(), RecordState::Approved);

    let posting = PostToLedgerInput {
        record_id: record.record_id().as_str().to_owned(),
        gl_account: "5100-Equipment".to_owned(),
        cost_center: "LAB-01".to_owned(),
        notes: None,
        expected_version: approved.version(),
    };
    let posted = stack
        .posting
        .post_to_ledger(&stack.actor("kemi"), posting.clone())
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(posted.record.state(), RecordState::PostedToAp);

    let reposted = stack
        .posting
        .post_to_ledger(&stack.actor("kemi"), posting.clone())
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(!reposted.is_new);

    let recoded = stack
        .posting
        .post_to_ledger(
            &stack.actor("kemi"),
            PostToLedgerInput {
                gl_account: "5200-Supplies".to_owned(),
                ..posting
            },
        )
        .await;
    assert!(matches!(recoded, Err(AppError::AlreadyPosted(_))));

    let history = stack
        .workflow
        .get_history(&stack.actor("amaka"), record.record_id().as_str())
        .await
        .unwrap_or_default();
    assert_eq!(history.len(), 3);
    assert_eq!(
        replay_state(RecordKind::Expense, &history).ok(),
        Some(RecordState::PostedToAp)
    );
}

#[tokio::test]
async fn concurrent_approvals_commit_exactly_once() {
    let stack = Stack::new().await;
    let record = stack.submit(RecordKind::Expense, 9_000, Priority::Low).await;

    let mut tasks = tokio::task::JoinSet::new();
    for principal in ["obi", "femi", "obi", "femi", "obi", "femi"] {
        let workflow = stack.workflow.clone();
        let actor = stack.actor(principal);
        let input = ApplyTransitionInput {
            record_id: record.record_id().as_str().to_owned(),
            action: TransitionAction::Approve,
            payload: TransitionPayload::default(),
            expected_version: record.version(),
        };
        tasks.spawn(async move { workflow.apply_transition(&actor, input).await });
    }

    let mut committed = 0;
    let mut rejected = 0;
    while let Some(result) = tasks.join_next().await {
        match result {
            Ok(Ok(_)) => committed += 1,
            Ok(Err(AppError::StaleState(_))) => rejected += 1,
            other => panic!("unexpected approval outcome: {other:?}"),
        }
    }

    assert_eq!(committed, 1);
    assert_eq!(rejected, 5);
    let history = stack
        .workflow
        .get_history(&stack.actor("obi"), record.record_id().as_str())
        .await
        .unwrap_or_default();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn paid_records_are_immutable() {
    let stack = Stack::new().await;
    let record = stack
        .submit(RecordKind::FundTransfer, 150_000, Priority::Medium)
        .await;

    let approved = stack
        .apply(
            "femi",
            &record,
            TransitionAction::Approve,
            TransitionPayload::default(),
        )
        .await
        .unwrap_or_else(|_| unreachable!());
    let posted = stack
        .posting
        .post_to_ledger(
            &stack.actor("kemi"),
            PostToLedgerInput {
                record_id: record.record_id().as_str().to_owned(),
                gl_account: "1200".to_owned(),
                cost_center: "TREASURY".to_owned(),
                notes: Some("inter-branch float".to_owned()),
                expected_version: approved.version(),
            },
        )
        .await
        .unwrap_or_else(|_| unreachable!())
        .record;
    let released = stack
        .apply(
            "femi",
            &posted,
            TransitionAction::ReleasePayment,
            TransitionPayload::default(),
        )
        .await
        .unwrap_or_else(|_| unreachable!());
    let processing = stack
        .apply(
            "femi",
            &released,
            TransitionAction::ProcessPayment,
            TransitionPayload {
                payment_method: Some(PaymentMethod::Transfer),
                ..TransitionPayload::default()
            },
        )
        .await
        .unwrap_or_else(|_| unreachable!());
    let paid = stack
        .apply(
            "femi",
            &processing,
            TransitionAction::ConfirmPayment,
            TransitionPayload::default(),
        )
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(paid.state(), RecordState::Paid);

    for action in TransitionAction::all() {
        let result = stack
            .apply("chidi", &paid, *action, TransitionPayload::default())
            .await;
        assert!(
            matches!(result, Err(AppError::InvalidTransition(_))),
            "{action} changed a paid record"
        );
    }

    let reposted = stack
        .posting
        .post_to_ledger(
            &stack.actor("kemi"),
            PostToLedgerInput {
                record_id: record.record_id().as_str().to_owned(),
                gl_account: "1200".to_owned(),
                cost_center: "TREASURY".to_owned(),
                notes: None,
                expected_version: paid.version(),
            },
        )
        .await;
    assert!(matches!(reposted, Err(AppError::InvalidTransition(_))));

    let recoded = stack
        .posting
        .post_to_ledger(
            &stack.actor("kemi"),
            PostToLedgerInput {
                record_id: record.record_id().as_str().to_owned(),
                gl_account: "5200".to_owned(),
                cost_center: "TREASURY".to_owned(),
                notes: None,
                expected_version: paid.version(),
            },
        )
        .await;
    assert!(matches!(recoded, Err(AppError::InvalidTransition(_))));
}

#[tokio::test]
async fn reassigned_principal_loses_access_immediately() {
    let stack = Stack::new().await;
    let record = stack.submit(RecordKind::Expense, 2_500, Priority::Low).await;
    let obi = stack.actor("obi");
    let record_id = record.record_id().as_str();

    let before = stack
        .workflow
        .can_act(&obi, record_id, TransitionAction::Approve)
        .await;
    assert!(matches!(before, Ok(true)));

    let assignment = stack
        .role_admin
        .assign_role(&stack.actor("chidi"), "obi", "staff")
        .await;
    assert!(assignment.is_ok());

    let after = stack
        .workflow
        .can_act(&obi, record_id, TransitionAction::Approve)
        .await;
    assert!(matches!(after, Ok(false)));
    let approval = stack
        .apply(
            "obi",
            &record,
            TransitionAction::Approve,
            TransitionPayload::default(),
        )
        .await;
    assert!(matches!(approval, Err(AppError::Unauthorized(_))));

    let events = stack.audit.events_for_tenant(stack.tenant_id).await;
    assert!(
        events
            .iter()
            .any(|event| event.action == AuditAction::SecurityRoleAssigned)
    );
}

#[tokio::test]
async fn state_distribution_reflects_store_and_requires_reporting_access() {
    let stack = Stack::new().await;
    let first = stack.submit(RecordKind::Expense, 1_000, Priority::Low).await;
    stack.submit(RecordKind::Expense, 2_000, Priority::Low).await;
    assert!(
        stack
            .apply(
                "obi",
                &first,
                TransitionAction::Approve,
                TransitionPayload::default(),
            )
            .await
            .is_ok()
    );

    let denied = stack.reporting.state_distribution(&stack.actor("amaka")).await;
    assert!(matches!(denied, Err(AppError::Unauthorized(_))));

    let report = stack
        .reporting
        .state_distribution(&stack.actor("kemi"))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(report.total_records, 2);
    assert_eq!(report.total_amount, Decimal::new(3_000, 0));
    assert_eq!(report.rows.len(), 2);
}
