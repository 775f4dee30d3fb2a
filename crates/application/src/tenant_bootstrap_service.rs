use std::sync::Arc;

use tallyflow_core::{AppError, AppResult, TenantId};
use tallyflow_domain::{default_resource_policies, default_roles};
use tracing::info;

use crate::RoleRepository;

/// Ensures a tenant carries the built-in roles and override policies.
#[derive(Clone)]
pub struct TenantBootstrapService {
    repository: Arc<dyn RoleRepository>,
}

impl TenantBootstrapService {
    /// Creates a bootstrap service over the role repository.
    #[must_use]
    pub fn new(repository: Arc<dyn RoleRepository>) -> Self {
        Self { repository }
    }

    /// Creates missing system roles and resource policies. Existing rows are left untouched.
    pub async fn ensure_default_security(&self, tenant_id: TenantId) -> AppResult<()> {
        let mut created_roles = 0_usize;
        for role in default_roles()? {
            if self
                .repository
                .find_role(tenant_id, role.name().as_str())
                .await?
                .is_some()
            {
                continue;
            }

            match self.repository.create_role(tenant_id, role).await {
                Ok(()) => created_roles += 1,
                // Another process seeded the role first.
                Err(AppError::Conflict(_)) => {}
                Err(error) => return Err(error),
            }
        }

        for policy in default_resource_policies() {
            if self
                .repository
                .find_resource_policy(tenant_id, policy.resource)
                .await?
                .is_none()
            {
                self.repository
                    .save_resource_policy(tenant_id, policy)
                    .await?;
            }
        }

        info!(%tenant_id, created_roles, "tenant security defaults ensured");
        Ok(())
    }

    /// Assigns a role to a principal that has no assignment yet.
    pub async fn ensure_principal_role(
        &self,
        tenant_id: TenantId,
        principal: &str,
        role_name: &str,
    ) -> AppResult<()> {
        if self
            .repository
            .find_assignment(tenant_id, principal)
            .await?
            .is_some()
        {
            return Ok(());
        }

        self.repository
            .assign_role(tenant_id, principal, role_name)
            .await?;
        Ok(())
    }
}
