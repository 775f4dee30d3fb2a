use std::collections::HashMap;

use async_trait::async_trait;
use tallyflow_application::RoleGrantCache;
use tallyflow_core::{AppResult, TenantId};
use tallyflow_domain::ResolvedGrant;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
struct TenantGrants {
    generation: u64,
    grants: HashMap<String, ResolvedGrant>,
}

/// Process-local grant cache.
///
/// Generation check and insert happen under one write lock, so a grant
/// resolved before an invalidation is never stored after it.
#[derive(Default)]
pub struct InMemoryRoleGrantCache {
    tenants: RwLock<HashMap<TenantId, TenantGrants>>,
}

impl InMemoryRoleGrantCache {
    /// Creates an empty grant cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoleGrantCache for InMemoryRoleGrantCache {
    async fn generation(&self, tenant_id: TenantId) -> AppResult<u64> {
        Ok(self
            .tenants
            .read()
            .await
            .get(&tenant_id)
            .map_or(0, |tenant| tenant.generation))
    }

    async fn get_grant(
        &self,
        tenant_id: TenantId,
        principal: &str,
    ) -> AppResult<Option<ResolvedGrant>> {
        Ok(self
            .tenants
            .read()
            .await
            .get(&tenant_id)
            .and_then(|tenant| tenant.grants.get(principal))
            .cloned())
    }

    async fn set_grant(
        &self,
        tenant_id: TenantId,
        grant: ResolvedGrant,
        observed_generation: u64,
    ) -> AppResult<()> {
        let mut tenants = self.tenants.write().await;
        let tenant = tenants.entry(tenant_id).or_default();

        if tenant.generation != observed_generation {
            debug!(
                %tenant_id,
                principal = grant.principal.as_str(),
                observed_generation,
                current_generation = tenant.generation,
                "discarding grant resolved before invalidation"
            );
            return Ok(());
        }

        tenant.grants.insert(grant.principal.clone(), grant);
        Ok(())
    }

    async fn invalidate_principal(&self, tenant_id: TenantId, principal: &str) -> AppResult<()> {
        let mut tenants = self.tenants.write().await;
        let tenant = tenants.entry(tenant_id).or_default();
        tenant.generation += 1;
        tenant.grants.remove(principal);
        Ok(())
    }

    async fn invalidate_role(&self, tenant_id: TenantId, role_name: &str) -> AppResult<()> {
        let mut tenants = self.tenants.write().await;
        let tenant = tenants.entry(tenant_id).or_default();
        tenant.generation += 1;
        tenant.grants.retain(|_, grant| grant.role_name != role_name);
        Ok(())
    }
}
