//! Application services and ports.

#![forbid(unsafe_code)]

mod audit_ports;
mod authorization_service;
mod posting_gateway;
mod record_ports;
mod reporting_service;
mod role_admin_service;
mod security_ports;
mod tenant_bootstrap_service;
mod workflow_service;

#[cfg(test)]
mod test_fakes;

pub use audit_ports::{AuditEvent, AuditRepository};
pub use authorization_service::AuthorizationService;
pub use posting_gateway::{PostToLedgerInput, PostingGateway};
pub use record_ports::{
    ApplyTransitionInput, PendingRecordsPage, PendingRecordsQuery, RecordCursor,
    RecordListQuery, StateDistributionRow, SubmitRecordInput, TransitionOutcome,
    WorkflowRecordRepository,
};
pub use reporting_service::{ReportingService, StateDistributionReport};
pub use role_admin_service::RoleAdminService;
pub use security_ports::{RoleAssignment, RoleGrantCache, RoleRepository};
pub use tenant_bootstrap_service::TenantBootstrapService;
pub use workflow_service::WorkflowService;
