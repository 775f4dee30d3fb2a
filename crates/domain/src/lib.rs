//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod ledger;
mod record;
mod role_catalog;
mod routing;
mod security;
mod transition;

pub use ledger::{CostCenter, GlAccount};
pub use record::{
    CurrencyCode, FulfillmentStatus, PaymentMethod, Priority, RecordEdits, RecordKind,
    RecordState, SubmissionInput, WorkflowRecord, WorkflowRecordParts,
};
pub use role_catalog::{default_resource_policies, default_roles};
pub use routing::{RoutingPolicy, RoutingRule, default_routing_rules};
pub use security::{
    AuditAction, GrantDecision, HIGHEST_ROLE_LEVEL, LOWEST_ROLE_LEVEL, Permission,
    PermissionAction, PermissionCategory, Resource, ResourcePolicy, ResolvedGrant,
    RoleDefinition, RoleDefinitionInput,
};
pub use transition::{
    ActionInput, ReferralReason, RejectionCategory, TransitionAction, TransitionActor,
    TransitionEntry, TransitionPayload, TransitionPlan, is_legal_edge, next_state, replay_state,
    validate_payload,
};
