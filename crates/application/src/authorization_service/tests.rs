use std::sync::Arc;

use tallyflow_core::{AppError, TenantId};
use tallyflow_domain::{
    Permission, PermissionAction, Resource, ResourcePolicy, RoleDefinition, RoleDefinitionInput,
};

use crate::security_ports::{RoleGrantCache, RoleRepository};
use crate::test_fakes::{FakeGrantCache, FakeRoleRepository};

use super::AuthorizationService;

async fn service(
    principals: &[(&str, &str)],
) -> (
    TenantId,
    AuthorizationService,
    Arc<FakeRoleRepository>,
    Arc<FakeGrantCache>,
) {
    let tenant_id = TenantId::new();
    let repository = Arc::new(FakeRoleRepository::seeded(tenant_id, principals).await);
    let cache = Arc::new(FakeGrantCache::default());
    let service = AuthorizationService::new(repository.clone(), cache.clone());
    (tenant_id, service, repository, cache)
}

#[tokio::test]
async fn explicit_grant_allows_permission() {
    let (tenant_id, service, _, _) = service(&[("obi", "manager")]).await;

    let allowed = service
        .can_perform(
            tenant_id,
            "obi",
            Permission::new(Resource::Expense, PermissionAction::Approve),
        )
        .await;

    assert!(matches!(allowed, Ok(true)));
}

#[tokio::test]
async fn unknown_principal_is_distinguished_from_unauthorized() {
    let (tenant_id, service, _, _) = service(&[("obi", "staff")]).await;
    let permission = Permission::new(Resource::Expense, PermissionAction::Approve);

    let unknown = service
        .require_permission(tenant_id, "nobody", permission)
        .await;
    assert!(matches!(unknown, Err(AppError::UnknownPrincipal(_))));

    let denied = service.require_permission(tenant_id, "obi", permission).await;
    assert!(matches!(denied, Err(AppError::Unauthorized(resource)) if resource == "expense"));
}

#[tokio::test]
async fn level_override_applies_unless_resource_is_ceo_only() {
    let (tenant_id, service, repository, _) = service(&[("ada", "ged")]).await;

    repository
        .save_resource_policy(
            tenant_id,
            ResourcePolicy {
                resource: Resource::StaffRecord,
                required_level: 2,
                ceo_only: false,
            },
        )
        .await
        .unwrap_or_else(|_| unreachable!());

    let staff_read = service
        .can_perform(
            tenant_id,
            "ada",
            Permission::new(Resource::StaffRecord, PermissionAction::Read),
        )
        .await;
    assert!(matches!(staff_read, Ok(true)));

    let role_manage = service
        .can_perform(
            tenant_id,
            "ada",
            Permission::new(Resource::SecurityRole, PermissionAction::Manage),
        )
        .await;
    assert!(matches!(role_manage, Ok(false)));
}

#[tokio::test]
async fn effective_level_reads_assigned_role() {
    let (tenant_id, service, _, _) = service(&[("ada", "ged"), ("obi", "manager")]).await;

    assert!(matches!(service.effective_level(tenant_id, "ada").await, Ok(2)));
    assert!(matches!(service.effective_level(tenant_id, "obi").await, Ok(5)));
}

#[tokio::test]
async fn invalidated_role_is_re_resolved_on_next_read() {
    let (tenant_id, service, repository, cache) = service(&[("obi", "auditor")]).await;
    let audit_read = Permission::new(Resource::AuditLog, PermissionAction::Read);

    let role = RoleDefinition::new(RoleDefinitionInput {
        name: "auditor".to_owned(),
        level: 6,
        permissions: Vec::new(),
        inherits_from: None,
        is_system: false,
    })
    .unwrap_or_else(|_| unreachable!());
    repository
        .create_role(tenant_id, role.clone())
        .await
        .unwrap_or_else(|_| unreachable!());

    assert!(matches!(
        service.can_perform(tenant_id, "obi", audit_read).await,
        Ok(false)
    ));
    assert!(
        cache
            .get_grant(tenant_id, "obi")
            .await
            .unwrap_or_default()
            .is_some()
    );

    repository
        .update_roles(tenant_id, vec![role.with_permissions(vec![audit_read])])
        .await
        .unwrap_or_else(|_| unreachable!());
    service
        .invalidate_role(tenant_id, "auditor")
        .await
        .unwrap_or_else(|_| unreachable!());

    assert!(matches!(
        service.can_perform(tenant_id, "obi", audit_read).await,
        Ok(true)
    ));
}

#[tokio::test]
async fn grant_resolved_before_invalidation_is_not_cached() {
    let (tenant_id, _, _, cache) = service(&[]).await;
    let observed = cache.generation(tenant_id).await.unwrap_or_default();

    cache
        .invalidate_principal(tenant_id, "obi")
        .await
        .unwrap_or_else(|_| unreachable!());
    cache
        .set_grant(
            tenant_id,
            tallyflow_domain::ResolvedGrant {
                principal: "obi".to_owned(),
                role_name: "manager".to_owned(),
                level: 5,
                permissions: Default::default(),
            },
            observed,
        )
        .await
        .unwrap_or_else(|_| unreachable!());

    assert!(
        cache
            .get_grant(tenant_id, "obi")
            .await
            .unwrap_or_default()
            .is_none()
    );
}
