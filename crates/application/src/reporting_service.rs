use std::sync::Arc;

use rust_decimal::Decimal;
use tallyflow_core::{ActorContext, AppResult};
use tallyflow_domain::{Permission, PermissionAction, Resource};

use crate::AuthorizationService;
use crate::record_ports::{StateDistributionRow, WorkflowRecordRepository};

/// Record counts and totals per `(kind, state)` for one tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateDistributionReport {
    /// One row per populated `(kind, state)` pair.
    pub rows: Vec<StateDistributionRow>,
    /// Total number of records.
    pub total_records: u64,
    /// Sum of all record amounts.
    pub total_amount: Decimal,
}

/// Dashboard metrics computed from the record store.
#[derive(Clone)]
pub struct ReportingService {
    authorization_service: AuthorizationService,
    repository: Arc<dyn WorkflowRecordRepository>,
}

impl ReportingService {
    /// Creates a reporting service.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        repository: Arc<dyn WorkflowRecordRepository>,
    ) -> Self {
        Self {
            authorization_service,
            repository,
        }
    }

    /// Returns the current state distribution.
    pub async fn state_distribution(
        &self,
        actor: &ActorContext,
    ) -> AppResult<StateDistributionReport> {
        self.authorization_service
            .require_permission(
                actor.tenant_id(),
                actor.actor_id(),
                Permission::new(Resource::Reporting, PermissionAction::Read),
            )
            .await?;

        let rows = self
            .repository
            .state_distribution(actor.tenant_id())
            .await?;
        let total_records = rows.iter().map(|row| row.record_count).sum();
        let total_amount = rows.iter().map(|row| row.total_amount).sum();

        Ok(StateDistributionReport {
            rows,
            total_records,
            total_amount,
        })
    }
}
