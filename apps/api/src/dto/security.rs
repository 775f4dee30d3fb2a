use serde::{Deserialize, Serialize};
use ts_rs::TS;

mod conversions;

pub(crate) use conversions::parse_permissions;

/// Incoming payload for custom role creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/create-role-request.ts"
)]
pub struct CreateRoleRequest {
    pub name: String,
    pub level: u8,
    pub permissions: Vec<String>,
    pub inherits_from: Option<String>,
}

/// Incoming payload replacing a role's explicit permissions.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/update-role-permissions-request.ts"
)]
pub struct UpdateRolePermissionsRequest {
    pub permissions: Vec<String>,
}

/// Incoming payload for role assignment.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/assign-role-request.ts"
)]
pub struct AssignRoleRequest {
    pub principal: String,
    pub role_name: String,
}

/// Incoming payload for a resource override policy.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/resource-policy-request.ts"
)]
pub struct ResourcePolicyRequest {
    pub resource: String,
    pub required_level: u8,
    pub ceo_only: bool,
}

/// API representation of an RBAC role.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/role-response.ts"
)]
pub struct RoleResponse {
    pub name: String,
    pub level: u8,
    pub is_system: bool,
    pub inherits_from: Option<String>,
    pub explicit_permissions: Vec<String>,
    pub permissions: Vec<String>,
}

/// API representation of a principal's active role.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/role-assignment-response.ts"
)]
pub struct RoleAssignmentResponse {
    pub principal: String,
    pub role_name: String,
    pub assigned_at: String,
}

/// API representation of a resource override policy.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/resource-policy-response.ts"
)]
pub struct ResourcePolicyResponse {
    pub resource: String,
    pub category: String,
    pub required_level: u8,
    pub ceo_only: bool,
}
