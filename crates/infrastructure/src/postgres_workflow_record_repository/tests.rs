use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use tallyflow_application::{RecordCursor, RecordListQuery, WorkflowRecordRepository};
use tallyflow_core::{AppError, TenantId};
use tallyflow_domain::{
    ActionInput, Priority, RecordKind, RecordState, SubmissionInput, TransitionAction,
    TransitionActor, WorkflowRecord,
};

use super::PostgresWorkflowRecordRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(4)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres record tests: {error}");
    }

    Some(pool)
}

fn purchase_order(record_id: &str) -> WorkflowRecord {
    WorkflowRecord::submit(
        record_id,
        SubmissionInput {
            kind: RecordKind::PurchaseOrder,
            amount: Decimal::new(4_250_050, 2),
            currency: Some("NGN".to_owned()),
            requested_by: "amaka".to_owned(),
            department: "Theatre".to_owned(),
            priority: Priority::High,
            branch: Some("ABJ-02".to_owned()),
            description: Some("Surgical gloves".to_owned()),
        },
        Utc::now(),
    )
    .unwrap_or_else(|_| unreachable!())
}

fn approve(record: &WorkflowRecord) -> tallyflow_domain::TransitionPlan {
    record
        .plan_transition(
            &ActionInput::Approve {
                notes: Some("within budget".to_owned()),
            },
            TransitionAction::Approve,
            RecordState::Approved,
            TransitionActor {
                actor_id: "obi",
                actor_role: "manager",
            },
            Utc::now(),
        )
        .unwrap_or_else(|_| unreachable!())
}

#[tokio::test]
async fn inserted_record_round_trips() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresWorkflowRecordRepository::new(pool);
    let tenant_id = TenantId::new();
    let record = purchase_order("po-round-trip");

    assert!(repository.insert_record(tenant_id, record.clone()).await.is_ok());
    let duplicate = repository.insert_record(tenant_id, record.clone()).await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    let stored = repository
        .find_record(tenant_id, "po-round-trip")
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(stored, Some(record));

    let other_tenant = repository
        .find_record(TenantId::new(), "po-round-trip")
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(other_tenant.is_none());
}

#[tokio::test]
async fn concurrent_commits_on_one_version_admit_a_single_winner() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresWorkflowRecordRepository::new(pool);
    let tenant_id = TenantId::new();
    let record = purchase_order("po-race");
    assert!(repository.insert_record(tenant_id, record.clone()).await.is_ok());

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..4 {
        let repository = repository.clone();
        let plan = approve(&record);
        let expected_version = record.version();
        tasks.spawn(async move {
            repository
                .commit_transition(tenant_id, expected_version, plan)
                .await
        });
    }

    let mut committed = 0;
    let mut stale = 0;
    while let Some(result) = tasks.join_next().await {
        match result {
            Ok(Ok(())) => committed += 1,
            Ok(Err(AppError::StaleState(_))) => stale += 1,
            other => panic!("unexpected commit outcome: {other:?}"),
        }
    }

    assert_eq!(committed, 1);
    assert_eq!(stale, 3);
    let entries = repository
        .list_transitions(tenant_id, "po-race")
        .await
        .unwrap_or_default();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].sequence, record.version());
}

#[tokio::test]
async fn list_records_resumes_after_cursor() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresWorkflowRecordRepository::new(pool);
    let tenant_id = TenantId::new();
    for record_id in ["po-a", "po-b", "po-c"] {
        assert!(
            repository
                .insert_record(tenant_id, purchase_order(record_id))
                .await
                .is_ok()
        );
    }

    let query = |after: Option<RecordCursor>| RecordListQuery {
        kind: Some(RecordKind::PurchaseOrder),
        state: Some(RecordState::PendingReview),
        requested_by: Some("amaka".to_owned()),
        created_from: None,
        created_to: None,
        after,
        limit: 2,
    };

    let first = repository
        .list_records(tenant_id, query(None))
        .await
        .unwrap_or_default();
    assert_eq!(first.len(), 2);

    let cursor = first.last().map(RecordCursor::after_record);
    let second = repository
        .list_records(tenant_id, query(cursor))
        .await
        .unwrap_or_default();
    assert_eq!(second.len(), 1);
    assert!(
        first
            .iter()
            .all(|record| record.record_id() != second[0].record_id())
    );

    let distribution = repository
        .state_distribution(tenant_id)
        .await
        .unwrap_or_default();
    assert_eq!(distribution.len(), 1);
    assert_eq!(distribution[0].record_count, 3);
}
