use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;

use tallyflow_core::ActorContext;

use crate::dto::{
    AssignRoleRequest, CreateRoleRequest, ResourcePolicyRequest, ResourcePolicyResponse,
    RoleAssignmentResponse, RoleResponse, UpdateRolePermissionsRequest, parse_permissions,
};
use crate::error::ApiResult;
use crate::state::AppState;

mod policies;
mod roles;

pub use policies::{list_resource_policies_handler, set_resource_policy_handler};
pub use roles::{
    assign_role_handler, create_role_handler, list_role_assignments_handler, list_roles_handler,
    update_role_permissions_handler,
};
