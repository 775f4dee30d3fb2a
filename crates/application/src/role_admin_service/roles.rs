use super::*;

impl RoleAdminService {
    /// Returns tenant roles for administrative users.
    pub async fn list_roles(&self, actor: &ActorContext) -> AppResult<Vec<RoleDefinition>> {
        self.require_role_manage_permission(actor).await?;
        self.repository.list_roles(actor.tenant_id()).await
    }

    /// Creates a role, folding in its parent's permissions, and emits an audit event.
    pub async fn create_role(
        &self,
        actor: &ActorContext,
        input: RoleDefinitionInput,
    ) -> AppResult<RoleDefinition> {
        self.require_role_manage_permission(actor).await?;

        let tenant_id = actor.tenant_id();
        let role = RoleDefinition::new(input)?;
        let parent = self.find_parent(actor, &role).await?;
        let role = role.resolve_inheritance(parent.as_ref())?;

        self.repository.create_role(tenant_id, role.clone()).await?;
        self.authorization_service
            .invalidate_role(tenant_id, role.name().as_str())
            .await?;

        info!(%tenant_id, role = %role.name(), level = role.level(), "role created");
        self.append_audit(
            actor,
            AuditAction::SecurityRoleCreated,
            "rbac_role",
            role.name().as_str().to_owned(),
            format!(
                "created role '{}' at level {} with {} permissions",
                role.name(),
                role.level(),
                role.effective_permissions().len()
            ),
        )
        .await;

        Ok(role)
    }

    /// Replaces a role's explicit permissions, re-resolves children and invalidates every holder.
    pub async fn update_role_permissions(
        &self,
        actor: &ActorContext,
        role_name: &str,
        permissions: Vec<Permission>,
    ) -> AppResult<RoleDefinition> {
        self.require_role_manage_permission(actor).await?;

        let tenant_id = actor.tenant_id();
        let existing = self
            .repository
            .find_role(tenant_id, role_name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_name}' does not exist")))?;

        let parent = self.find_parent(actor, &existing).await?;
        let updated = existing
            .with_permissions(permissions)
            .resolve_inheritance(parent.as_ref())?;

        let children = self
            .repository
            .list_child_roles(tenant_id, role_name)
            .await?
            .into_iter()
            .map(|child| {
                child
                    .with_permissions(child.explicit_permissions().iter().copied().collect())
                    .resolve_inheritance(Some(&updated))
            })
            .collect::<AppResult<Vec<_>>>()?;
        let child_names = children
            .iter()
            .map(|child| child.name().as_str().to_owned())
            .collect::<Vec<_>>();

        let mut family = Vec::with_capacity(children.len() + 1);
        family.push(updated.clone());
        family.extend(children);
        self.repository.update_roles(tenant_id, family).await?;

        self.authorization_service
            .invalidate_role(tenant_id, role_name)
            .await?;
        for child_name in &child_names {
            self.authorization_service
                .invalidate_role(tenant_id, child_name)
                .await?;
        }

        info!(%tenant_id, role = role_name, "role permissions updated");
        self.append_audit(
            actor,
            AuditAction::SecurityRolePermissionsUpdated,
            "rbac_role",
            role_name.to_owned(),
            format!(
                "role '{role_name}' now grants {}",
                updated
                    .explicit_permissions()
                    .iter()
                    .map(Permission::as_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        )
        .await;

        Ok(updated)
    }

    /// Makes a role the principal's single active assignment and emits an audit event.
    pub async fn assign_role(
        &self,
        actor: &ActorContext,
        principal: &str,
        role_name: &str,
    ) -> AppResult<RoleAssignment> {
        self.require_role_manage_permission(actor).await?;

        let tenant_id = actor.tenant_id();
        let principal = principal.trim();
        if principal.is_empty() {
            return Err(AppError::Validation(
                "principal must not be empty".to_owned(),
            ));
        }

        if self
            .repository
            .find_role(tenant_id, role_name)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound(format!(
                "role '{role_name}' does not exist"
            )));
        }

        let assignment = self
            .repository
            .assign_role(tenant_id, principal, role_name)
            .await?;
        self.authorization_service
            .invalidate_principal(tenant_id, principal)
            .await?;

        info!(%tenant_id, principal, role = role_name, "role assigned");
        self.append_audit(
            actor,
            AuditAction::SecurityRoleAssigned,
            "rbac_principal_role",
            format!("{principal}:{role_name}"),
            format!("assigned role '{role_name}' to '{principal}'"),
        )
        .await;

        Ok(assignment)
    }

    /// Returns role assignments for administrative users.
    pub async fn list_role_assignments(
        &self,
        actor: &ActorContext,
    ) -> AppResult<Vec<RoleAssignment>> {
        self.require_role_manage_permission(actor).await?;
        self.repository
            .list_role_assignments(actor.tenant_id())
            .await
    }

    async fn find_parent(
        &self,
        actor: &ActorContext,
        role: &RoleDefinition,
    ) -> AppResult<Option<RoleDefinition>> {
        match role.inherits_from() {
            Some(parent_name) => {
                self.repository
                    .find_role(actor.tenant_id(), parent_name)
                    .await
            }
            None => Ok(None),
        }
    }
}
