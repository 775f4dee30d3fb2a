use async_trait::async_trait;
use tallyflow_core::{AppResult, TenantId};
use tallyflow_domain::ResolvedGrant;

/// Shared read-mostly cache of resolved principal grants.
///
/// Every invalidation advances the tenant generation. `set_grant` must drop
/// writes whose observed generation is no longer current, so a grant resolved
/// before an invalidation never lands after it.
#[async_trait]
pub trait RoleGrantCache: Send + Sync {
    /// Returns the current invalidation generation for a tenant.
    async fn generation(&self, tenant_id: TenantId) -> AppResult<u64>;

    /// Returns a cached grant.
    async fn get_grant(
        &self,
        tenant_id: TenantId,
        principal: &str,
    ) -> AppResult<Option<ResolvedGrant>>;

    /// Stores a grant resolved while `observed_generation` was current.
    async fn set_grant(
        &self,
        tenant_id: TenantId,
        grant: ResolvedGrant,
        observed_generation: u64,
    ) -> AppResult<()>;

    /// Drops the cached grant of one principal.
    async fn invalidate_principal(&self, tenant_id: TenantId, principal: &str) -> AppResult<()>;

    /// Drops every cached grant that resolved through the role.
    async fn invalidate_role(&self, tenant_id: TenantId, role_name: &str) -> AppResult<()>;
}
