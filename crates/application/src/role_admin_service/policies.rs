use super::*;

impl RoleAdminService {
    /// Creates or replaces the override policy of one resource.
    pub async fn set_resource_policy(
        &self,
        actor: &ActorContext,
        policy: ResourcePolicy,
    ) -> AppResult<ResourcePolicy> {
        self.require_role_manage_permission(actor).await?;

        if !(HIGHEST_ROLE_LEVEL..=LOWEST_ROLE_LEVEL).contains(&policy.required_level) {
            return Err(AppError::Validation(format!(
                "required level must be between {HIGHEST_ROLE_LEVEL} and {LOWEST_ROLE_LEVEL}, got {}",
                policy.required_level
            )));
        }

        let tenant_id = actor.tenant_id();
        self.repository
            .save_resource_policy(tenant_id, policy)
            .await?;

        info!(
            %tenant_id,
            resource = %policy.resource,
            required_level = policy.required_level,
            ceo_only = policy.ceo_only,
            "resource policy updated"
        );
        self.append_audit(
            actor,
            AuditAction::SecurityResourcePolicyUpdated,
            "rbac_resource_policy",
            policy.resource.as_str().to_owned(),
            format!(
                "resource '{}' requires level {} (ceo_only={})",
                policy.resource, policy.required_level, policy.ceo_only
            ),
        )
        .await;

        Ok(policy)
    }

    /// Lists override policies for administrative users.
    pub async fn list_resource_policies(
        &self,
        actor: &ActorContext,
    ) -> AppResult<Vec<ResourcePolicy>> {
        self.require_role_manage_permission(actor).await?;
        self.repository
            .list_resource_policies(actor.tenant_id())
            .await
    }
}
