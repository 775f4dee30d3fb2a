use tallyflow_application::RoleAssignment;
use tallyflow_core::AppResult;
use tallyflow_domain::{Permission, Resource, ResourcePolicy, RoleDefinition, RoleDefinitionInput};

use super::{
    CreateRoleRequest, ResourcePolicyRequest, RoleAssignmentResponse, ResourcePolicyResponse,
    RoleResponse,
};

pub(crate) fn parse_permissions(values: &[String]) -> AppResult<Vec<Permission>> {
    values
        .iter()
        .map(|value| Permission::from_transport(value.as_str()))
        .collect()
}

impl CreateRoleRequest {
    pub fn into_input(self) -> AppResult<RoleDefinitionInput> {
        Ok(RoleDefinitionInput {
            permissions: parse_permissions(&self.permissions)?,
            name: self.name,
            level: self.level,
            inherits_from: self.inherits_from,
            is_system: false,
        })
    }
}

impl ResourcePolicyRequest {
    pub fn into_policy(self) -> AppResult<ResourcePolicy> {
        Ok(ResourcePolicy {
            resource: self.resource.parse::<Resource>()?,
            required_level: self.required_level,
            ceo_only: self.ceo_only,
        })
    }
}

fn permission_strings<'a>(permissions: impl Iterator<Item = &'a Permission>) -> Vec<String> {
    permissions.map(Permission::as_string).collect()
}

impl From<RoleDefinition> for RoleResponse {
    fn from(value: RoleDefinition) -> Self {
        Self {
            name: value.name().as_str().to_owned(),
            level: value.level(),
            is_system: value.is_system(),
            inherits_from: value.inherits_from().map(str::to_owned),
            explicit_permissions: permission_strings(value.explicit_permissions().iter()),
            permissions: permission_strings(value.effective_permissions().iter()),
        }
    }
}

impl From<RoleAssignment> for RoleAssignmentResponse {
    fn from(value: RoleAssignment) -> Self {
        Self {
            principal: value.principal,
            role_name: value.role_name,
            assigned_at: value.assigned_at.to_rfc3339(),
        }
    }
}

impl From<ResourcePolicy> for ResourcePolicyResponse {
    fn from(value: ResourcePolicy) -> Self {
        Self {
            resource: value.resource.as_str().to_owned(),
            category: value.resource.category().as_str().to_owned(),
            required_level: value.required_level,
            ceo_only: value.ceo_only,
        }
    }
}

#[cfg(test)]
mod tests {
    use tallyflow_core::AppError;

    use super::super::CreateRoleRequest;

    #[test]
    fn create_role_request_rejects_malformed_permission() {
        let result = CreateRoleRequest {
            name: "lab_supervisor".to_owned(),
            level: 5,
            permissions: vec!["inventory:manage".to_owned(), "inventory".to_owned()],
            inherits_from: None,
        }
        .into_input();

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn create_role_request_is_never_a_system_role() {
        let input = CreateRoleRequest {
            name: "lab_supervisor".to_owned(),
            level: 5,
            permissions: vec!["inventory:manage".to_owned()],
            inherits_from: Some("staff".to_owned()),
        }
        .into_input()
        .unwrap_or_else(|_| unreachable!());

        assert!(!input.is_system);
        assert_eq!(input.permissions.len(), 1);
    }
}
