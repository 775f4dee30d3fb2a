use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tallyflow_application::{RoleAssignment, RoleRepository};
use tallyflow_core::{AppError, AppResult, TenantId};
use tallyflow_domain::{Resource, ResourcePolicy, RoleDefinition};
use tokio::sync::RwLock;

#[derive(Default)]
struct TenantSecurity {
    roles: HashMap<String, RoleDefinition>,
    assignments: HashMap<String, RoleAssignment>,
    policies: HashMap<Resource, ResourcePolicy>,
}

/// In-memory role, assignment and override-policy store.
#[derive(Default)]
pub struct InMemoryRoleRepository {
    tenants: RwLock<HashMap<TenantId, TenantSecurity>>,
}

impl InMemoryRoleRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn find_role(
        &self,
        tenant_id: TenantId,
        role_name: &str,
    ) -> AppResult<Option<RoleDefinition>> {
        Ok(self
            .tenants
            .read()
            .await
            .get(&tenant_id)
            .and_then(|tenant| tenant.roles.get(role_name))
            .cloned())
    }

    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<RoleDefinition>> {
        let mut roles: Vec<RoleDefinition> = self
            .tenants
            .read()
            .await
            .get(&tenant_id)
            .map(|tenant| tenant.roles.values().cloned().collect())
            .unwrap_or_default();

        roles.sort_by(|left, right| {
            (left.level(), left.name().as_str()).cmp(&(right.level(), right.name().as_str()))
        });
        Ok(roles)
    }

    async fn create_role(&self, tenant_id: TenantId, role: RoleDefinition) -> AppResult<()> {
        let mut tenants = self.tenants.write().await;
        let tenant = tenants.entry(tenant_id).or_default();
        let role_name = role.name().as_str().to_owned();

        if tenant.roles.contains_key(&role_name) {
            return Err(AppError::Conflict(format!(
                "role '{role_name}' already exists"
            )));
        }

        tenant.roles.insert(role_name, role);
        Ok(())
    }

    async fn update_roles(
        &self,
        tenant_id: TenantId,
        roles: Vec<RoleDefinition>,
    ) -> AppResult<()> {
        let mut tenants = self.tenants.write().await;
        let stored = tenants.entry(tenant_id).or_default();

        if let Some(missing) = roles
            .iter()
            .find(|role| !stored.roles.contains_key(role.name().as_str()))
        {
            return Err(AppError::NotFound(format!(
                "role '{}' was not found",
                missing.name()
            )));
        }

        for role in roles {
            stored.roles.insert(role.name().as_str().to_owned(), role);
        }
        Ok(())
    }

    async fn list_child_roles(
        &self,
        tenant_id: TenantId,
        parent_role_name: &str,
    ) -> AppResult<Vec<RoleDefinition>> {
        Ok(self
            .tenants
            .read()
            .await
            .get(&tenant_id)
            .map(|tenant| {
                tenant
                    .roles
                    .values()
                    .filter(|role| role.inherits_from() == Some(parent_role_name))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn assign_role(
        &self,
        tenant_id: TenantId,
        principal: &str,
        role_name: &str,
    ) -> AppResult<RoleAssignment> {
        let mut tenants = self.tenants.write().await;
        let tenant = tenants
            .get_mut(&tenant_id)
            .filter(|tenant| tenant.roles.contains_key(role_name))
            .ok_or_else(|| AppError::NotFound(format!("role '{role_name}' was not found")))?;

        let assignment = RoleAssignment {
            principal: principal.to_owned(),
            role_name: role_name.to_owned(),
            assigned_at: Utc::now(),
        };
        tenant
            .assignments
            .insert(principal.to_owned(), assignment.clone());
        Ok(assignment)
    }

    async fn find_assignment(
        &self,
        tenant_id: TenantId,
        principal: &str,
    ) -> AppResult<Option<RoleAssignment>> {
        Ok(self
            .tenants
            .read()
            .await
            .get(&tenant_id)
            .and_then(|tenant| tenant.assignments.get(principal))
            .cloned())
    }

    async fn list_role_assignments(&self, tenant_id: TenantId) -> AppResult<Vec<RoleAssignment>> {
        let mut assignments: Vec<RoleAssignment> = self
            .tenants
            .read()
            .await
            .get(&tenant_id)
            .map(|tenant| tenant.assignments.values().cloned().collect())
            .unwrap_or_default();

        assignments.sort_by(|left, right| left.principal.cmp(&right.principal));
        Ok(assignments)
    }

    async fn find_resource_policy(
        &self,
        tenant_id: TenantId,
        resource: Resource,
    ) -> AppResult<Option<ResourcePolicy>> {
        Ok(self
            .tenants
            .read()
            .await
            .get(&tenant_id)
            .and_then(|tenant| tenant.policies.get(&resource))
            .copied())
    }

    async fn save_resource_policy(
        &self,
        tenant_id: TenantId,
        policy: ResourcePolicy,
    ) -> AppResult<()> {
        self.tenants
            .write()
            .await
            .entry(tenant_id)
            .or_default()
            .policies
            .insert(policy.resource, policy);
        Ok(())
    }

    async fn list_resource_policies(&self, tenant_id: TenantId) -> AppResult<Vec<ResourcePolicy>> {
        let mut policies: Vec<ResourcePolicy> = self
            .tenants
            .read()
            .await
            .get(&tenant_id)
            .map(|tenant| tenant.policies.values().copied().collect())
            .unwrap_or_default();

        policies.sort_by_key(|policy| policy.resource.as_str());
        Ok(policies)
    }
}

#[cfg(test)]
mod tests {
    use tallyflow_application::RoleRepository;
    use tallyflow_core::{AppError, TenantId};
    use tallyflow_domain::{RoleDefinition, RoleDefinitionInput, default_roles};

    use super::InMemoryRoleRepository;

    async fn seeded(tenant_id: TenantId) -> InMemoryRoleRepository {
        let repository = InMemoryRoleRepository::new();
        for role in default_roles().unwrap_or_default() {
            assert!(repository.create_role(tenant_id, role).await.is_ok());
        }
        repository
    }

    #[tokio::test]
    async fn assign_role_replaces_previous_assignment() {
        let tenant_id = TenantId::new();
        let repository = seeded(tenant_id).await;

        assert!(
            repository
                .assign_role(tenant_id, "obi", "manager")
                .await
                .is_ok()
        );
        assert!(
            repository
                .assign_role(tenant_id, "obi", "finance_manager")
                .await
                .is_ok()
        );

        let assignments = repository
            .list_role_assignments(tenant_id)
            .await
            .unwrap_or_default();
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].role_name, "finance_manager");
    }

    #[tokio::test]
    async fn assign_role_requires_existing_role() {
        let tenant_id = TenantId::new();
        let repository = seeded(tenant_id).await;

        let result = repository.assign_role(tenant_id, "obi", "auditor").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn roles_are_listed_by_level_and_scoped_by_tenant() {
        let tenant_id = TenantId::new();
        let repository = seeded(tenant_id).await;

        let names: Vec<String> = repository
            .list_roles(tenant_id)
            .await
            .unwrap_or_default()
            .iter()
            .map(|role| role.name().as_str().to_owned())
            .collect();
        assert_eq!(names.first().map(String::as_str), Some("ceo"));
        assert_eq!(names.last().map(String::as_str), Some("staff"));

        let other = repository
            .list_roles(TenantId::new())
            .await
            .unwrap_or_default();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn create_role_rejects_duplicate_names() {
        let tenant_id = TenantId::new();
        let repository = seeded(tenant_id).await;
        let manager = default_roles()
            .unwrap_or_default()
            .into_iter()
            .find(|role| role.name().as_str() == "manager");

        let Some(manager) = manager else {
            unreachable!();
        };
        let result = repository.create_role(tenant_id, manager).await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn update_roles_writes_nothing_when_any_role_is_missing() {
        let tenant_id = TenantId::new();
        let repository = seeded(tenant_id).await;
        let Ok(Some(manager)) = repository.find_role(tenant_id, "manager").await else {
            unreachable!();
        };
        let original_grants = manager.explicit_permissions().len();
        let auditor = RoleDefinition::new(RoleDefinitionInput {
            name: "auditor".to_owned(),
            level: 6,
            permissions: Vec::new(),
            inherits_from: None,
            is_system: false,
        })
        .unwrap_or_else(|_| unreachable!());

        let result = repository
            .update_roles(tenant_id, vec![manager.with_permissions(Vec::new()), auditor])
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        let stored = repository
            .find_role(tenant_id, "manager")
            .await
            .unwrap_or_default()
            .map(|role| role.explicit_permissions().len());
        assert_eq!(stored, Some(original_grants));
    }
}
