use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use tallyflow_application::{RoleAssignment, RoleRepository};
use tallyflow_core::{AppError, AppResult, TenantId};
use tallyflow_domain::{Permission, Resource, ResourcePolicy, RoleDefinition, RoleDefinitionInput};

mod policies;

#[cfg(test)]
mod tests;

/// PostgreSQL-backed role, assignment and override-policy store.
///
/// Only explicit grants are stored; inherited permissions are re-derived on read.
#[derive(Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> AppResult<Transaction<'_, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|error| AppError::Internal(format!("failed to begin transaction: {error}")))
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    role_name: String,
    level: i16,
    inherits_from: Option<String>,
    is_system: bool,
    permission: Option<String>,
}

#[derive(Debug, FromRow)]
struct RoleAssignmentRow {
    principal: String,
    role_name: String,
    assigned_at: DateTime<Utc>,
}

impl From<RoleAssignmentRow> for RoleAssignment {
    fn from(row: RoleAssignmentRow) -> Self {
        Self {
            principal: row.principal,
            role_name: row.role_name,
            assigned_at: row.assigned_at,
        }
    }
}

fn level_from_storage(level: i16) -> AppResult<u8> {
    u8::try_from(level).map_err(|_| AppError::Internal(format!("stored role level {level} is invalid")))
}

fn aggregate_roles(rows: Vec<RoleRow>) -> AppResult<Vec<RoleDefinition>> {
    let mut inputs: BTreeMap<String, RoleDefinitionInput> = BTreeMap::new();
    for row in rows {
        let level = level_from_storage(row.level)?;
        let input = inputs
            .entry(row.role_name.clone())
            .or_insert_with(|| RoleDefinitionInput {
                name: row.role_name.clone(),
                level,
                permissions: Vec::new(),
                inherits_from: row.inherits_from.clone(),
                is_system: row.is_system,
            });

        if let Some(permission) = row.permission {
            input.permissions.push(
                permission
                    .parse::<Permission>()
                    .map_err(|error| {
                        AppError::Internal(format!(
                            "role '{}' has invalid stored permission '{permission}': {error}",
                            row.role_name
                        ))
                    })?,
            );
        }
    }

    let base: BTreeMap<String, RoleDefinition> = inputs
        .into_iter()
        .map(|(name, input)| RoleDefinition::new(input).map(|role| (name, role)))
        .collect::<AppResult<_>>()?;

    let mut roles = base
        .values()
        .map(|role| {
            let parent = role.inherits_from().and_then(|parent| base.get(parent));
            role.clone().resolve_inheritance(parent)
        })
        .collect::<AppResult<Vec<_>>>()?;

    roles.sort_by(|left, right| {
        (left.level(), left.name().as_str()).cmp(&(right.level(), right.name().as_str()))
    });
    Ok(roles)
}

async fn replace_permissions(
    transaction: &mut Transaction<'_, Postgres>,
    role_id: uuid::Uuid,
    role: &RoleDefinition,
) -> AppResult<()> {
    sqlx::query("DELETE FROM rbac_role_permissions WHERE role_id = $1")
        .bind(role_id)
        .execute(&mut **transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to clear role grants: {error}")))?;

    for permission in role.explicit_permissions() {
        sqlx::query(
            r#"
            INSERT INTO rbac_role_permissions (role_id, permission)
            VALUES ($1, $2)
            ON CONFLICT (role_id, permission) DO NOTHING
            "#,
        )
        .bind(role_id)
        .bind(permission.as_string())
        .execute(&mut **transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to persist role grants: {error}")))?;
    }

    Ok(())
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn find_role(
        &self,
        tenant_id: TenantId,
        role_name: &str,
    ) -> AppResult<Option<RoleDefinition>> {
        Ok(self
            .list_roles(tenant_id)
            .await?
            .into_iter()
            .find(|role| role.name().as_str() == role_name))
    }

    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<RoleDefinition>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT
                roles.name AS role_name,
                roles.level,
                roles.inherits_from,
                roles.is_system,
                grants.permission
            FROM rbac_roles AS roles
            LEFT JOIN rbac_role_permissions AS grants
                ON grants.role_id = roles.id
            WHERE roles.tenant_id = $1
            ORDER BY roles.level, roles.name, grants.permission
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        aggregate_roles(rows)
    }

    async fn create_role(&self, tenant_id: TenantId, role: RoleDefinition) -> AppResult<()> {
        let mut transaction = self.begin().await?;

        let role_id = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            INSERT INTO rbac_roles (tenant_id, name, level, inherits_from, is_system)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role.name().as_str())
        .bind(i16::from(role.level()))
        .bind(role.inherits_from())
        .bind(role.is_system())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| {
            if let sqlx::Error::Database(database_error) = &error
                && database_error.code().as_deref() == Some("23505")
            {
                return AppError::Conflict(format!("role '{}' already exists", role.name()));
            }

            AppError::Internal(format!("failed to create role: {error}"))
        })?;

        replace_permissions(&mut transaction, role_id, &role).await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }

    async fn update_roles(
        &self,
        tenant_id: TenantId,
        roles: Vec<RoleDefinition>,
    ) -> AppResult<()> {
        let mut transaction = self.begin().await?;

        for role in &roles {
            let role_id = sqlx::query_scalar::<_, uuid::Uuid>(
                r#"
                UPDATE rbac_roles
                SET level = $3, inherits_from = $4
                WHERE tenant_id = $1 AND name = $2
                RETURNING id
                "#,
            )
            .bind(tenant_id.as_uuid())
            .bind(role.name().as_str())
            .bind(i16::from(role.level()))
            .bind(role.inherits_from())
            .fetch_optional(&mut *transaction)
            .await
            .map_err(|error| AppError::Internal(format!("failed to update role: {error}")))?
            .ok_or_else(|| AppError::NotFound(format!("role '{}' was not found", role.name())))?;

            replace_permissions(&mut transaction, role_id, role).await?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }

    async fn list_child_roles(
        &self,
        tenant_id: TenantId,
        parent_role_name: &str,
    ) -> AppResult<Vec<RoleDefinition>> {
        Ok(self
            .list_roles(tenant_id)
            .await?
            .into_iter()
            .filter(|role| role.inherits_from() == Some(parent_role_name))
            .collect())
    }

    async fn assign_role(
        &self,
        tenant_id: TenantId,
        principal: &str,
        role_name: &str,
    ) -> AppResult<RoleAssignment> {
        let mut transaction = self.begin().await?;

        let role_id = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            SELECT id
            FROM rbac_roles
            WHERE tenant_id = $1 AND name = $2
            LIMIT 1
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role_name)
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve role: {error}")))?
        .ok_or_else(|| AppError::NotFound(format!("role '{role_name}' was not found")))?;

        let assigned_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"
            INSERT INTO rbac_principal_roles (tenant_id, principal, role_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (tenant_id, principal) DO UPDATE
            SET role_id = EXCLUDED.role_id, assigned_at = now()
            RETURNING assigned_at
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(principal)
        .bind(role_id)
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to assign role: {error}")))?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(RoleAssignment {
            principal: principal.to_owned(),
            role_name: role_name.to_owned(),
            assigned_at,
        })
    }

    async fn find_assignment(
        &self,
        tenant_id: TenantId,
        principal: &str,
    ) -> AppResult<Option<RoleAssignment>> {
        let row = sqlx::query_as::<_, RoleAssignmentRow>(
            r#"
            SELECT
                assignments.principal,
                roles.name AS role_name,
                assignments.assigned_at
            FROM rbac_principal_roles AS assignments
            JOIN rbac_roles AS roles
                ON roles.id = assignments.role_id
            WHERE assignments.tenant_id = $1 AND assignments.principal = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(principal)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find role assignment: {error}")))?;

        Ok(row.map(RoleAssignment::from))
    }

    async fn list_role_assignments(&self, tenant_id: TenantId) -> AppResult<Vec<RoleAssignment>> {
        let rows = sqlx::query_as::<_, RoleAssignmentRow>(
            r#"
            SELECT
                assignments.principal,
                roles.name AS role_name,
                assignments.assigned_at
            FROM rbac_principal_roles AS assignments
            JOIN rbac_roles AS roles
                ON roles.id = assignments.role_id
            WHERE assignments.tenant_id = $1
            ORDER BY assignments.principal
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list role assignments: {error}"))
        })?;

        Ok(rows.into_iter().map(RoleAssignment::from).collect())
    }

    async fn find_resource_policy(
        &self,
        tenant_id: TenantId,
        resource: Resource,
    ) -> AppResult<Option<ResourcePolicy>> {
        self.find_resource_policy_impl(tenant_id, resource).await
    }

    async fn save_resource_policy(
        &self,
        tenant_id: TenantId,
        policy: ResourcePolicy,
    ) -> AppResult<()> {
        self.save_resource_policy_impl(tenant_id, policy).await
    }

    async fn list_resource_policies(&self, tenant_id: TenantId) -> AppResult<Vec<ResourcePolicy>> {
        self.list_resource_policies_impl(tenant_id).await
    }
}
