use super::*;

impl AuthorizationService {
    /// Returns whether the principal may perform the permission.
    pub async fn can_perform(
        &self,
        tenant_id: TenantId,
        principal: &str,
        permission: Permission,
    ) -> AppResult<bool> {
        let grant = self.resolve_grant(tenant_id, principal).await?;
        Ok(self.decide(tenant_id, &grant, permission).await?.is_allowed())
    }

    /// Ensures the principal holds the permission and returns their grant.
    ///
    /// Denials only name the resource; the full reason is logged.
    pub async fn require_permission(
        &self,
        tenant_id: TenantId,
        principal: &str,
        permission: Permission,
    ) -> AppResult<ResolvedGrant> {
        let grant = self.resolve_grant(tenant_id, principal).await?;
        let decision = self.decide(tenant_id, &grant, permission).await?;

        if decision.is_allowed() {
            return Ok(grant);
        }

        warn!(
            %tenant_id,
            principal,
            role = %grant.role_name,
            level = grant.level,
            permission = %permission,
            ?decision,
            "permission denied"
        );
        Err(AppError::Unauthorized(permission.resource().as_str().to_owned()))
    }

    /// Returns the principal's authority level, 1 being highest.
    pub async fn effective_level(&self, tenant_id: TenantId, principal: &str) -> AppResult<u8> {
        Ok(self.resolve_grant(tenant_id, principal).await?.level)
    }

    /// Decides a permission for an already resolved grant, applying the resource override policy.
    pub async fn decide(
        &self,
        tenant_id: TenantId,
        grant: &ResolvedGrant,
        permission: Permission,
    ) -> AppResult<GrantDecision> {
        if grant.permissions.contains(&permission) {
            return Ok(GrantDecision::Explicit);
        }

        let policy = self
            .repository
            .find_resource_policy(tenant_id, permission.resource())
            .await?;

        Ok(grant.decide(permission, policy.as_ref()))
    }
}
