use std::sync::Arc;

use tallyflow_application::{RoleRepository, TenantBootstrapService};
use tallyflow_core::{AppError, AppResult, TenantId};
use tracing::info;
use uuid::Uuid;

const DEV_SEED_TENANT_ID: &str = "11111111-1111-1111-1111-111111111111";

/// Demo principals, one per built-in role.
const DEV_SEED_PRINCIPALS: &[(&str, &str)] = &[
    ("chidi", "ceo"),
    ("ada", "ged"),
    ("femi", "finance_manager"),
    ("kemi", "accountant"),
    ("obi", "manager"),
    ("sola", "storekeeper"),
    ("amaka", "staff"),
];

/// Seeds built-in roles, override policies and demo principals into one tenant.
pub async fn run(
    role_repository: Arc<dyn RoleRepository>,
    preferred_tenant_id: Option<TenantId>,
) -> AppResult<TenantId> {
    let tenant_id = match preferred_tenant_id {
        Some(tenant_id) => tenant_id,
        None => default_dev_seed_tenant_id()?,
    };

    let bootstrap = TenantBootstrapService::new(role_repository);
    bootstrap.ensure_default_security(tenant_id).await?;
    for (principal, role_name) in DEV_SEED_PRINCIPALS {
        bootstrap
            .ensure_principal_role(tenant_id, principal, role_name)
            .await?;
    }

    info!(
        %tenant_id,
        principals = DEV_SEED_PRINCIPALS.len(),
        "development seed applied"
    );
    Ok(tenant_id)
}

fn default_dev_seed_tenant_id() -> AppResult<TenantId> {
    Uuid::parse_str(DEV_SEED_TENANT_ID)
        .map(TenantId::from_uuid)
        .map_err(|error| AppError::Internal(format!("invalid DEV_SEED_TENANT_ID: {error}")))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tallyflow_application::RoleRepository;
    use tallyflow_infrastructure::InMemoryRoleRepository;

    use super::{DEV_SEED_PRINCIPALS, run};

    #[tokio::test]
    async fn seed_is_repeatable_and_assigns_every_principal() {
        let repository = Arc::new(InMemoryRoleRepository::new());

        let first = run(repository.clone(), None).await;
        let second = run(repository.clone(), None).await;
        let Ok(tenant_id) = first else {
            panic!("first seed failed");
        };
        assert_eq!(second.ok(), Some(tenant_id));

        let assignments = repository
            .list_role_assignments(tenant_id)
            .await
            .unwrap_or_default();
        assert_eq!(assignments.len(), DEV_SEED_PRINCIPALS.len());
    }
}
