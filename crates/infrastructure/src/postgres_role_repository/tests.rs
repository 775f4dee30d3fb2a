use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use tallyflow_application::RoleRepository;
use tallyflow_core::{AppError, TenantId};
use tallyflow_domain::{
    Permission, PermissionAction, Resource, ResourcePolicy, RoleDefinition, RoleDefinitionInput,
    default_roles,
};

use super::PostgresRoleRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres role tests: {error}");
    }

    Some(pool)
}

fn custom_role(name: &str, parent: Option<&str>, permissions: Vec<Permission>) -> RoleDefinition {
    RoleDefinition::new(RoleDefinitionInput {
        name: name.to_owned(),
        level: 6,
        permissions,
        inherits_from: parent.map(str::to_owned),
        is_system: false,
    })
    .unwrap_or_else(|_| unreachable!())
}

#[tokio::test]
async fn default_roles_round_trip_with_permissions() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresRoleRepository::new(pool);
    let tenant_id = TenantId::new();
    let defaults = default_roles().unwrap_or_default();
    for role in defaults.clone() {
        assert!(repository.create_role(tenant_id, role).await.is_ok());
    }

    let stored = repository.list_roles(tenant_id).await.unwrap_or_default();
    assert_eq!(stored, defaults);

    let duplicate = repository.create_role(tenant_id, defaults[0].clone()).await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn child_role_reads_back_with_inherited_permissions() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresRoleRepository::new(pool);
    let tenant_id = TenantId::new();
    let read_expense = Permission::new(Resource::Expense, PermissionAction::Read);
    let read_inventory = Permission::new(Resource::Inventory, PermissionAction::Read);

    let parent = custom_role("clerk", None, vec![read_expense]);
    let child = custom_role("senior_clerk", Some("clerk"), vec![read_inventory])
        .resolve_inheritance(Some(&parent))
        .unwrap_or_else(|_| unreachable!());
    assert!(repository.create_role(tenant_id, parent).await.is_ok());
    assert!(repository.create_role(tenant_id, child).await.is_ok());

    let stored = repository
        .find_role(tenant_id, "senior_clerk")
        .await
        .unwrap_or_default();
    let Some(stored) = stored else {
        panic!("senior_clerk was not stored");
    };
    assert!(stored.effective_permissions().contains(&read_expense));
    assert_eq!(stored.explicit_permissions().len(), 1);

    let children = repository
        .list_child_roles(tenant_id, "clerk")
        .await
        .unwrap_or_default();
    assert_eq!(children.len(), 1);
}

#[tokio::test]
async fn assignment_is_replaced_and_policies_upserted() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresRoleRepository::new(pool);
    let tenant_id = TenantId::new();
    for role in default_roles().unwrap_or_default() {
        assert!(repository.create_role(tenant_id, role).await.is_ok());
    }

    assert!(repository.assign_role(tenant_id, "obi", "manager").await.is_ok());
    assert!(repository.assign_role(tenant_id, "obi", "ged").await.is_ok());
    let missing = repository.assign_role(tenant_id, "obi", "auditor").await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    let assignment = repository
        .find_assignment(tenant_id, "obi")
        .await
        .unwrap_or_default();
    assert_eq!(assignment.map(|value| value.role_name), Some("ged".to_owned()));

    for required_level in [3, 2] {
        assert!(
            repository
                .save_resource_policy(
                    tenant_id,
                    ResourcePolicy {
                        resource: Resource::Reporting,
                        required_level,
                        ceo_only: false,
                    },
                )
                .await
                .is_ok()
        );
    }

    let policy = repository
        .find_resource_policy(tenant_id, Resource::Reporting)
        .await
        .unwrap_or_default();
    assert_eq!(policy.map(|value| value.required_level), Some(2));
    let policies = repository
        .list_resource_policies(tenant_id)
        .await
        .unwrap_or_default();
    assert_eq!(policies.len(), 1);
}
