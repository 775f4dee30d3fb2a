use async_trait::async_trait;
use tallyflow_core::{AppResult, TenantId};
use tallyflow_domain::{Resource, ResourcePolicy, RoleDefinition};

use super::roles::RoleAssignment;

/// Repository port for roles, principal assignments and resource override policies.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Returns one role by name.
    async fn find_role(
        &self,
        tenant_id: TenantId,
        role_name: &str,
    ) -> AppResult<Option<RoleDefinition>>;

    /// Lists all tenant roles ordered by level then name.
    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<RoleDefinition>>;

    /// Creates a role. Fails with `Conflict` when the name is taken.
    async fn create_role(&self, tenant_id: TenantId, role: RoleDefinition) -> AppResult<()>;

    /// Replaces the stored definitions of existing roles as one unit.
    ///
    /// Fails with `NotFound` and writes nothing when any role is missing.
    async fn update_roles(
        &self,
        tenant_id: TenantId,
        roles: Vec<RoleDefinition>,
    ) -> AppResult<()>;

    /// Lists roles that inherit from the named parent.
    async fn list_child_roles(
        &self,
        tenant_id: TenantId,
        parent_role_name: &str,
    ) -> AppResult<Vec<RoleDefinition>>;

    /// Makes the role the principal's single active assignment, replacing any previous one.
    async fn assign_role(
        &self,
        tenant_id: TenantId,
        principal: &str,
        role_name: &str,
    ) -> AppResult<RoleAssignment>;

    /// Returns the principal's active assignment.
    async fn find_assignment(
        &self,
        tenant_id: TenantId,
        principal: &str,
    ) -> AppResult<Option<RoleAssignment>>;

    /// Lists all assignments in tenant scope.
    async fn list_role_assignments(&self, tenant_id: TenantId) -> AppResult<Vec<RoleAssignment>>;

    /// Returns the override policy for a resource.
    async fn find_resource_policy(
        &self,
        tenant_id: TenantId,
        resource: Resource,
    ) -> AppResult<Option<ResourcePolicy>>;

    /// Creates or replaces the override policy for a resource.
    async fn save_resource_policy(
        &self,
        tenant_id: TenantId,
        policy: ResourcePolicy,
    ) -> AppResult<()>;

    /// Lists all override policies in tenant scope.
    async fn list_resource_policies(&self, tenant_id: TenantId) -> AppResult<Vec<ResourcePolicy>>;
}
