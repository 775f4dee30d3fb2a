use sqlx::PgPool;
use tallyflow_application::{PostingGateway, ReportingService, RoleAdminService, WorkflowService};

/// Backend the services were wired against.
#[derive(Clone)]
pub enum StorageHandle {
    Memory,
    Postgres(PgPool),
}

impl StorageHandle {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Postgres(_) => "postgres",
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub workflow_service: WorkflowService,
    pub posting_gateway: PostingGateway,
    pub reporting_service: ReportingService,
    pub role_admin_service: RoleAdminService,
    pub storage: StorageHandle,
}
