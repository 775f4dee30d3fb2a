use super::*;

#[derive(Debug, FromRow)]
struct ResourcePolicyRow {
    resource: String,
    required_level: i16,
    ceo_only: bool,
}

impl TryFrom<ResourcePolicyRow> for ResourcePolicy {
    type Error = AppError;

    fn try_from(row: ResourcePolicyRow) -> AppResult<Self> {
        Ok(Self {
            resource: row.resource.parse::<Resource>().map_err(|error| {
                AppError::Internal(format!(
                    "invalid stored policy resource '{}': {error}",
                    row.resource
                ))
            })?,
            required_level: level_from_storage(row.required_level)?,
            ceo_only: row.ceo_only,
        })
    }
}

impl PostgresRoleRepository {
    pub(super) async fn find_resource_policy_impl(
        &self,
        tenant_id: TenantId,
        resource: Resource,
    ) -> AppResult<Option<ResourcePolicy>> {
        let row = sqlx::query_as::<_, ResourcePolicyRow>(
            r#"
            SELECT resource, required_level, ceo_only
            FROM rbac_resource_policies
            WHERE tenant_id = $1 AND resource = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(resource.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find resource policy: {error}")))?;

        row.map(ResourcePolicy::try_from).transpose()
    }

    pub(super) async fn save_resource_policy_impl(
        &self,
        tenant_id: TenantId,
        policy: ResourcePolicy,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO rbac_resource_policies (tenant_id, resource, required_level, ceo_only)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (tenant_id, resource) DO UPDATE
            SET required_level = EXCLUDED.required_level, ceo_only = EXCLUDED.ceo_only
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(policy.resource.as_str())
        .bind(i16::from(policy.required_level))
        .bind(policy.ceo_only)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to save resource policy: {error}")))?;

        Ok(())
    }

    pub(super) async fn list_resource_policies_impl(
        &self,
        tenant_id: TenantId,
    ) -> AppResult<Vec<ResourcePolicy>> {
        let rows = sqlx::query_as::<_, ResourcePolicyRow>(
            r#"
            SELECT resource, required_level, ceo_only
            FROM rbac_resource_policies
            WHERE tenant_id = $1
            ORDER BY resource
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list resource policies: {error}"))
        })?;

        rows.into_iter().map(ResourcePolicy::try_from).collect()
    }
}
