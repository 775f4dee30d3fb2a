use std::sync::Arc;

use tallyflow_core::{ActorContext, AppError, AppResult};
use tallyflow_domain::{
    AuditAction, HIGHEST_ROLE_LEVEL, LOWEST_ROLE_LEVEL, Permission, PermissionAction, Resource,
    ResourcePolicy, RoleDefinition, RoleDefinitionInput,
};
use tracing::{info, warn};

use crate::security_ports::{RoleAssignment, RoleRepository};
use crate::{AuditEvent, AuditRepository, AuthorizationService};

mod policies;
mod roles;

const ROLE_MANAGE: Permission = Permission::new(Resource::SecurityRole, PermissionAction::Manage);

/// Application service for role, assignment and override-policy administration.
///
/// Every write invalidates affected cached grants before returning.
#[derive(Clone)]
pub struct RoleAdminService {
    authorization_service: AuthorizationService,
    repository: Arc<dyn RoleRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl RoleAdminService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        repository: Arc<dyn RoleRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            authorization_service,
            repository,
            audit_repository,
        }
    }

    async fn require_role_manage_permission(&self, actor: &ActorContext) -> AppResult<()> {
        self.authorization_service
            .require_permission(actor.tenant_id(), actor.actor_id(), ROLE_MANAGE)
            .await
            .map(|_| ())
    }

    /// Appends an audit event for a write that has already committed.
    ///
    /// A failed append is logged and does not fail the caller.
    async fn append_audit(
        &self,
        actor: &ActorContext,
        action: AuditAction,
        resource_type: &str,
        resource_id: String,
        detail: String,
    ) {
        let tenant_id = actor.tenant_id();
        let result = self
            .audit_repository
            .append_event(AuditEvent {
                tenant_id,
                subject: actor.actor_id().to_owned(),
                action,
                resource_type: resource_type.to_owned(),
                resource_id: resource_id.clone(),
                detail: Some(detail),
            })
            .await;

        if let Err(error) = result {
            warn!(
                %tenant_id,
                action = action.as_str(),
                resource_id = resource_id.as_str(),
                %error,
                "audit event was not recorded"
            );
        }
    }
}
