use super::*;

impl AuthorizationService {
    /// Resolves the principal's grant, reading through the cache.
    ///
    /// Fails with `UnknownPrincipal` when the principal holds no role in the tenant.
    pub async fn resolve_grant(
        &self,
        tenant_id: TenantId,
        principal: &str,
    ) -> AppResult<ResolvedGrant> {
        if let Some(grant) = self.grant_cache.get_grant(tenant_id, principal).await? {
            debug!(%tenant_id, principal, role = %grant.role_name, "grant cache hit");
            return Ok(grant);
        }

        debug!(%tenant_id, principal, "grant cache miss");
        let observed_generation = self.grant_cache.generation(tenant_id).await?;

        let assignment = self
            .repository
            .find_assignment(tenant_id, principal)
            .await?
            .ok_or_else(|| {
                AppError::UnknownPrincipal(format!(
                    "principal '{principal}' has no role in tenant '{tenant_id}'"
                ))
            })?;

        let role = self
            .repository
            .find_role(tenant_id, assignment.role_name.as_str())
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "principal '{principal}' is assigned to missing role '{}'",
                    assignment.role_name
                ))
            })?;

        let grant = ResolvedGrant::from_role(principal, &role);
        self.grant_cache
            .set_grant(tenant_id, grant.clone(), observed_generation)
            .await?;

        Ok(grant)
    }

    /// Drops cached grants of every holder of the role.
    pub async fn invalidate_role(&self, tenant_id: TenantId, role_name: &str) -> AppResult<()> {
        self.grant_cache.invalidate_role(tenant_id, role_name).await
    }

    /// Drops the cached grant of one principal.
    pub async fn invalidate_principal(&self, tenant_id: TenantId, principal: &str) -> AppResult<()> {
        self.grant_cache
            .invalidate_principal(tenant_id, principal)
            .await
    }
}
