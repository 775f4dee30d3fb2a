mod common;
mod records;
mod reports;
mod security;

pub use common::{HealthDependencyStatus, HealthResponse};
pub use records::{
    ApplyTransitionRequest, CanActResponse, ConfirmDeliveryRequest, PendingRecordsResponse,
    PostToLedgerRequest, RejectPostingRequest, SubmitRecordRequest, TransitionEntryResponse,
    TransitionOutcomeResponse, WorkflowRecordResponse,
};
pub use reports::StateDistributionResponse;
pub use security::{
    AssignRoleRequest, CreateRoleRequest, ResourcePolicyRequest, ResourcePolicyResponse,
    RoleAssignmentResponse, RoleResponse, UpdateRolePermissionsRequest,
};

pub(crate) use security::parse_permissions;
