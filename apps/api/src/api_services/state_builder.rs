use std::sync::Arc;

use sqlx::PgPool;
use tallyflow_application::{
    AuditRepository, AuthorizationService, PostingGateway, ReportingService, RoleAdminService,
    RoleRepository, WorkflowRecordRepository, WorkflowService,
};
use tallyflow_domain::RoutingPolicy;
use tallyflow_infrastructure::{
    InMemoryAuditRepository, InMemoryRoleGrantCache, InMemoryRoleRepository,
    InMemoryWorkflowRecordRepository, PostgresAuditRepository, PostgresRoleRepository,
    PostgresWorkflowRecordRepository,
};

use crate::state::{AppState, StorageHandle};

/// Port implementations for one storage backend.
#[derive(Clone)]
pub struct RepositorySet {
    pub record_repository: Arc<dyn WorkflowRecordRepository>,
    pub role_repository: Arc<dyn RoleRepository>,
    pub audit_repository: Arc<dyn AuditRepository>,
    pub storage: StorageHandle,
}

impl RepositorySet {
    pub fn in_memory() -> Self {
        Self {
            record_repository: Arc::new(InMemoryWorkflowRecordRepository::new()),
            role_repository: Arc::new(InMemoryRoleRepository::new()),
            audit_repository: Arc::new(InMemoryAuditRepository::new()),
            storage: StorageHandle::Memory,
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            record_repository: Arc::new(PostgresWorkflowRecordRepository::new(pool.clone())),
            role_repository: Arc::new(PostgresRoleRepository::new(pool.clone())),
            audit_repository: Arc::new(PostgresAuditRepository::new(pool.clone())),
            storage: StorageHandle::Postgres(pool),
        }
    }
}

/// Wires services over the repositories. The grant cache is always process-local.
pub fn build_app_state(repositories: &RepositorySet, routing_policy: RoutingPolicy) -> AppState {
    let authorization_service = AuthorizationService::new(
        repositories.role_repository.clone(),
        Arc::new(InMemoryRoleGrantCache::new()),
    );

    let workflow_service = WorkflowService::new(
        authorization_service.clone(),
        repositories.record_repository.clone(),
        repositories.audit_repository.clone(),
        Arc::new(routing_policy),
    );

    AppState {
        posting_gateway: PostingGateway::new(workflow_service.clone()),
        reporting_service: ReportingService::new(
            authorization_service.clone(),
            repositories.record_repository.clone(),
        ),
        role_admin_service: RoleAdminService::new(
            authorization_service,
            repositories.role_repository.clone(),
            repositories.audit_repository.clone(),
        ),
        workflow_service,
        storage: repositories.storage.clone(),
    }
}
