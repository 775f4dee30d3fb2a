use std::collections::HashMap;

use async_trait::async_trait;
use tallyflow_application::{RecordListQuery, StateDistributionRow, WorkflowRecordRepository};
use tallyflow_core::{AppError, AppResult, TenantId};
use tallyflow_domain::{TransitionEntry, TransitionPlan, WorkflowRecord};
use tokio::sync::RwLock;
use tracing::debug;

type RecordKey = (TenantId, String);

#[derive(Debug, Clone)]
struct StoredRecord {
    record: WorkflowRecord,
    transitions: Vec<TransitionEntry>,
}

/// In-memory record store. Snapshot and log share one lock so commits are atomic.
#[derive(Default)]
pub struct InMemoryWorkflowRecordRepository {
    records: RwLock<HashMap<RecordKey, StoredRecord>>,
}

impl InMemoryWorkflowRecordRepository {
    /// Creates an empty record store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn stale(record_id: &str, expected_version: u64, actual_version: u64) -> AppError {
    AppError::StaleState(format!(
        "record '{record_id}' is at version {actual_version} but version {expected_version} was expected"
    ))
}

#[async_trait]
impl WorkflowRecordRepository for InMemoryWorkflowRecordRepository {
    async fn insert_record(&self, tenant_id: TenantId, record: WorkflowRecord) -> AppResult<()> {
        let key = (tenant_id, record.record_id().as_str().to_owned());
        let mut records = self.records.write().await;

        if records.contains_key(&key) {
            return Err(AppError::Conflict(format!(
                "record '{}' already exists",
                key.1
            )));
        }

        records.insert(
            key,
            StoredRecord {
                record,
                transitions: Vec::new(),
            },
        );
        Ok(())
    }

    async fn find_record(
        &self,
        tenant_id: TenantId,
        record_id: &str,
    ) -> AppResult<Option<WorkflowRecord>> {
        Ok(self
            .records
            .read()
            .await
            .get(&(tenant_id, record_id.to_owned()))
            .map(|stored| stored.record.clone()))
    }

    async fn commit_transition(
        &self,
        tenant_id: TenantId,
        expected_version: u64,
        plan: TransitionPlan,
    ) -> AppResult<()> {
        let record_id = plan.record.record_id().as_str().to_owned();
        let mut records = self.records.write().await;
        let stored = records
            .get_mut(&(tenant_id, record_id.clone()))
            .ok_or_else(|| AppError::NotFound(format!("record '{record_id}' does not exist")))?;

        if stored.record.version() != expected_version {
            debug!(
                %tenant_id,
                record_id = record_id.as_str(),
                expected_version,
                actual_version = stored.record.version(),
                "transition commit lost version race"
            );
            return Err(stale(
                record_id.as_str(),
                expected_version,
                stored.record.version(),
            ));
        }

        stored.transitions.push(plan.entry);
        stored.record = plan.record;
        Ok(())
    }

    async fn update_record(
        &self,
        tenant_id: TenantId,
        expected_version: u64,
        record: WorkflowRecord,
    ) -> AppResult<()> {
        let record_id = record.record_id().as_str().to_owned();
        let mut records = self.records.write().await;
        let stored = records
            .get_mut(&(tenant_id, record_id.clone()))
            .ok_or_else(|| AppError::NotFound(format!("record '{record_id}' does not exist")))?;

        if stored.record.version() != expected_version {
            return Err(stale(
                record_id.as_str(),
                expected_version,
                stored.record.version(),
            ));
        }

        stored.record = record;
        Ok(())
    }

    async fn list_records(
        &self,
        tenant_id: TenantId,
        query: RecordListQuery,
    ) -> AppResult<Vec<WorkflowRecord>> {
        let mut records: Vec<WorkflowRecord> = self
            .records
            .read()
            .await
            .iter()
            .filter(|((stored_tenant_id, _), stored)| {
                *stored_tenant_id == tenant_id && query.matches(&stored.record)
            })
            .map(|(_, stored)| stored.record.clone())
            .collect();

        records.sort_by(|left, right| {
            (left.created_at(), left.record_id().as_str())
                .cmp(&(right.created_at(), right.record_id().as_str()))
        });
        records.truncate(query.limit);
        Ok(records)
    }

    async fn list_transitions(
        &self,
        tenant_id: TenantId,
        record_id: &str,
    ) -> AppResult<Vec<TransitionEntry>> {
        Ok(self
            .records
            .read()
            .await
            .get(&(tenant_id, record_id.to_owned()))
            .map(|stored| stored.transitions.clone())
            .unwrap_or_default())
    }

    async fn state_distribution(&self, tenant_id: TenantId) -> AppResult<Vec<StateDistributionRow>> {
        let mut totals = HashMap::new();
        for ((stored_tenant_id, _), stored) in self.records.read().await.iter() {
            if *stored_tenant_id != tenant_id {
                continue;
            }

            let row = totals
                .entry((stored.record.kind(), stored.record.state()))
                .or_insert_with(|| StateDistributionRow {
                    kind: stored.record.kind(),
                    state: stored.record.state(),
                    record_count: 0,
                    total_amount: rust_decimal::Decimal::ZERO,
                });
            row.record_count += 1;
            row.total_amount += stored.record.amount();
        }

        let mut rows: Vec<StateDistributionRow> = totals.into_values().collect();
        rows.sort_by_key(|row| (row.kind, row.state));
        Ok(rows)
    }
}
