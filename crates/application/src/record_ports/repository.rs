use async_trait::async_trait;
use tallyflow_core::{AppResult, TenantId};
use tallyflow_domain::{TransitionEntry, TransitionPlan, WorkflowRecord};

use super::queries::{RecordListQuery, StateDistributionRow};

/// Repository port for workflow records and their append-only transition logs.
#[async_trait]
pub trait WorkflowRecordRepository: Send + Sync {
    /// Stores a newly submitted record. Fails with `Conflict` on duplicate ids.
    async fn insert_record(&self, tenant_id: TenantId, record: WorkflowRecord) -> AppResult<()>;

    /// Returns one record.
    async fn find_record(
        &self,
        tenant_id: TenantId,
        record_id: &str,
    ) -> AppResult<Option<WorkflowRecord>>;

    /// Atomically appends the plan's entry and replaces the record snapshot.
    ///
    /// Fails with `StaleState` and changes nothing unless the stored version
    /// equals `expected_version`.
    async fn commit_transition(
        &self,
        tenant_id: TenantId,
        expected_version: u64,
        plan: TransitionPlan,
    ) -> AppResult<()>;

    /// Replaces a record snapshot without a log entry, guarded by `expected_version`.
    async fn update_record(
        &self,
        tenant_id: TenantId,
        expected_version: u64,
        record: WorkflowRecord,
    ) -> AppResult<()>;

    /// Lists records ordered by `(created_at, record_id)` ascending.
    async fn list_records(
        &self,
        tenant_id: TenantId,
        query: RecordListQuery,
    ) -> AppResult<Vec<WorkflowRecord>>;

    /// Lists a record's transition log in commit order.
    async fn list_transitions(
        &self,
        tenant_id: TenantId,
        record_id: &str,
    ) -> AppResult<Vec<TransitionEntry>>;

    /// Counts records and sums amounts per `(kind, state)`.
    async fn state_distribution(&self, tenant_id: TenantId) -> AppResult<Vec<StateDistributionRow>>;
}
