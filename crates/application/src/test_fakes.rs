use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use tallyflow_core::{ActorContext, AppError, AppResult, TenantId};
use tallyflow_domain::{
    Resource, ResourcePolicy, ResolvedGrant, RoleDefinition, RoutingPolicy, TransitionEntry,
    TransitionPlan, WorkflowRecord, default_resource_policies, default_roles,
    default_routing_rules,
};

use crate::record_ports::{RecordListQuery, StateDistributionRow, WorkflowRecordRepository};
use crate::security_ports::{RoleAssignment, RoleGrantCache, RoleRepository};
use crate::{AuditEvent, AuditRepository, AuthorizationService, WorkflowService};

#[derive(Default)]
pub(crate) struct FakeAuditRepository {
    pub(crate) events: Mutex<Vec<AuditEvent>>,
    pub(crate) unavailable: AtomicBool,
}

#[async_trait]
impl AuditRepository for FakeAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Internal("audit store unavailable".to_owned()));
        }
        self.events.lock().await.push(event);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeRoleRepository {
    pub(crate) roles: Mutex<HashMap<(TenantId, String), RoleDefinition>>,
    pub(crate) assignments: Mutex<HashMap<(TenantId, String), RoleAssignment>>,
    pub(crate) policies: Mutex<HashMap<(TenantId, Resource), ResourcePolicy>>,
}

impl FakeRoleRepository {
    pub(crate) async fn seeded(tenant_id: TenantId, principals: &[(&str, &str)]) -> Self {
        let repository = Self::default();
        for role in default_roles().unwrap_or_else(|_| unreachable!()) {
            repository
                .roles
                .lock()
                .await
                .insert((tenant_id, role.name().as_str().to_owned()), role);
        }
        for policy in default_resource_policies() {
            repository
                .policies
                .lock()
                .await
                .insert((tenant_id, policy.resource), policy);
        }
        for (principal, role_name) in principals {
            repository.assignments.lock().await.insert(
                (tenant_id, (*principal).to_owned()),
                RoleAssignment {
                    principal: (*principal).to_owned(),
                    role_name: (*role_name).to_owned(),
                    assigned_at: Utc::now(),
                },
            );
        }
        repository
    }
}

#[async_trait]
impl RoleRepository for FakeRoleRepository {
    async fn find_role(
        &self,
        tenant_id: TenantId,
        role_name: &str,
    ) -> AppResult<Option<RoleDefinition>> {
        Ok(self
            .roles
            .lock()
            .await
            .get(&(tenant_id, role_name.to_owned()))
            .cloned())
    }

    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<RoleDefinition>> {
        let mut roles: Vec<RoleDefinition> = self
            .roles
            .lock()
            .await
            .iter()
            .filter(|((stored_tenant_id, _), _)| *stored_tenant_id == tenant_id)
            .map(|(_, role)| role.clone())
            .collect();
        roles.sort_by(|left, right| {
            (left.level(), left.name().as_str()).cmp(&(right.level(), right.name().as_str()))
        });
        Ok(roles)
    }

    async fn create_role(&self, tenant_id: TenantId, role: RoleDefinition) -> AppResult<()> {
        let mut roles = self.roles.lock().await;
        let key = (tenant_id, role.name().as_str().to_owned());
        if roles.contains_key(&key) {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists",
                role.name()
            )));
        }
        roles.insert(key, role);
        Ok(())
    }

    async fn update_roles(
        &self,
        tenant_id: TenantId,
        roles: Vec<RoleDefinition>,
    ) -> AppResult<()> {
        let mut stored = self.roles.lock().await;
        if let Some(missing) = roles
            .iter()
            .find(|role| !stored.contains_key(&(tenant_id, role.name().as_str().to_owned())))
        {
            return Err(AppError::NotFound(format!(
                "role '{}' was not found",
                missing.name()
            )));
        }
        for role in roles {
            stored.insert((tenant_id, role.name().as_str().to_owned()), role);
        }
        Ok(())
    }

    async fn list_child_roles(
        &self,
        tenant_id: TenantId,
        parent_role_name: &str,
    ) -> AppResult<Vec<RoleDefinition>> {
        Ok(self
            .roles
            .lock()
            .await
            .iter()
            .filter(|((stored_tenant_id, _), role)| {
                *stored_tenant_id == tenant_id && role.inherits_from() == Some(parent_role_name)
            })
            .map(|(_, role)| role.clone())
            .collect())
    }

    async fn assign_role(
        &self,
        tenant_id: TenantId,
        principal: &str,
        role_name: &str,
    ) -> AppResult<RoleAssignment> {
        let assignment = RoleAssignment {
            principal: principal.to_owned(),
            role_name: role_name.to_owned(),
            assigned_at: Utc::now(),
        };
        self.assignments
            .lock()
            .await
            .insert((tenant_id, principal.to_owned()), assignment.clone());
        Ok(assignment)
    }

    async fn find_assignment(
        &self,
        tenant_id: TenantId,
        principal: &str,
    ) -> AppResult<Option<RoleAssignment>> {
        Ok(self
            .assignments
            .lock()
            .await
            .get(&(tenant_id, principal.to_owned()))
            .cloned())
    }

    async fn list_role_assignments(&self, tenant_id: TenantId) -> AppResult<Vec<RoleAssignment>> {
        Ok(self
            .assignments
            .lock()
            .await
            .iter()
            .filter(|((stored_tenant_id, _), _)| *stored_tenant_id == tenant_id)
            .map(|(_, assignment)| assignment.clone())
            .collect())
    }

    async fn find_resource_policy(
        &self,
        tenant_id: TenantId,
        resource: Resource,
    ) -> AppResult<Option<ResourcePolicy>> {
        Ok(self
            .policies
            .lock()
            .await
            .get(&(tenant_id, resource))
            .copied())
    }

    async fn save_resource_policy(
        &self,
        tenant_id: TenantId,
        policy: ResourcePolicy,
    ) -> AppResult<()> {
        self.policies
            .lock()
            .await
            .insert((tenant_id, policy.resource), policy);
        Ok(())
    }

    async fn list_resource_policies(&self, tenant_id: TenantId) -> AppResult<Vec<ResourcePolicy>> {
        Ok(self
            .policies
            .lock()
            .await
            .iter()
            .filter(|((stored_tenant_id, _), _)| *stored_tenant_id == tenant_id)
            .map(|(_, policy)| *policy)
            .collect())
    }
}

#[derive(Default)]
pub(crate) struct FakeGrantCache {
    pub(crate) grants: Mutex<HashMap<(TenantId, String), ResolvedGrant>>,
    pub(crate) generation: Mutex<u64>,
}

#[async_trait]
impl RoleGrantCache for FakeGrantCache {
    async fn generation(&self, _tenant_id: TenantId) -> AppResult<u64> {
        Ok(*self.generation.lock().await)
    }

    async fn get_grant(
        &self,
        tenant_id: TenantId,
        principal: &str,
    ) -> AppResult<Option<ResolvedGrant>> {
        Ok(self
            .grants
            .lock()
            .await
            .get(&(tenant_id, principal.to_owned()))
            .cloned())
    }

    async fn set_grant(
        &self,
        tenant_id: TenantId,
        grant: ResolvedGrant,
        observed_generation: u64,
    ) -> AppResult<()> {
        if *self.generation.lock().await == observed_generation {
            self.grants
                .lock()
                .await
                .insert((tenant_id, grant.principal.clone()), grant);
        }
        Ok(())
    }

    async fn invalidate_principal(&self, tenant_id: TenantId, principal: &str) -> AppResult<()> {
        *self.generation.lock().await += 1;
        self.grants
            .lock()
            .await
            .remove(&(tenant_id, principal.to_owned()));
        Ok(())
    }

    async fn invalidate_role(&self, tenant_id: TenantId, role_name: &str) -> AppResult<()> {
        *self.generation.lock().await += 1;
        self.grants
            .lock()
            .await
            .retain(|(stored_tenant_id, _), grant| {
                !(*stored_tenant_id == tenant_id && grant.role_name == role_name)
            });
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeWorkflowRecordRepository {
    pub(crate) records: Mutex<HashMap<(TenantId, String), WorkflowRecord>>,
    pub(crate) transitions: Mutex<HashMap<(TenantId, String), Vec<TransitionEntry>>>,
}

#[async_trait]
impl WorkflowRecordRepository for FakeWorkflowRecordRepository {
    async fn insert_record(&self, tenant_id: TenantId, record: WorkflowRecord) -> AppResult<()> {
        self.records
            .lock()
            .await
            .insert((tenant_id, record.record_id().as_str().to_owned()), record);
        Ok(())
    }

    async fn find_record(
        &self,
        tenant_id: TenantId,
        record_id: &str,
    ) -> AppResult<Option<WorkflowRecord>> {
        Ok(self
            .records
            .lock()
            .await
            .get(&(tenant_id, record_id.to_owned()))
            .cloned())
    }

    async fn commit_transition(
        &self,
        tenant_id: TenantId,
        expected_version: u64,
        plan: TransitionPlan,
    ) -> AppResult<()> {
        let mut records = self.records.lock().await;
        let key = (tenant_id, plan.record.record_id().as_str().to_owned());
        let current = records
            .get(&key)
            .ok_or_else(|| AppError::NotFound(format!("record '{}' does not exist", key.1)))?;

        if current.version() != expected_version {
            return Err(AppError::StaleState(format!(
                "record '{}' changed since version {expected_version}",
                key.1
            )));
        }

        self.transitions
            .lock()
            .await
            .entry(key.clone())
            .or_default()
            .push(plan.entry);
        records.insert(key, plan.record);
        Ok(())
    }

    async fn update_record(
        &self,
        tenant_id: TenantId,
        expected_version: u64,
        record: WorkflowRecord,
    ) -> AppResult<()> {
        let mut records = self.records.lock().await;
        let key = (tenant_id, record.record_id().as_str().to_owned());
        if records.get(&key).map(WorkflowRecord::version) != Some(expected_version) {
            return Err(AppError::StaleState(format!(
                "record '{}' changed since version {expected_version}",
                key.1
            )));
        }
        records.insert(key, record);
        Ok(())
    }

    async fn list_records(
        &self,
        tenant_id: TenantId,
        query: RecordListQuery,
    ) -> AppResult<Vec<WorkflowRecord>> {
        let mut records: Vec<WorkflowRecord> = self
            .records
            .lock()
            .await
            .iter()
            .filter(|((stored_tenant_id, _), record)| {
                *stored_tenant_id == tenant_id && query.matches(record)
            })
            .map(|(_, record)| record.clone())
            .collect();
        records.sort_by(|left, right| {
            (left.created_at(), left.record_id().as_str())
                .cmp(&(right.created_at(), right.record_id().as_str()))
        });
        records.truncate(query.limit);
        Ok(records)
    }

    async fn list_transitions(
        &self,
        tenant_id: TenantId,
        record_id: &str,
    ) -> AppResult<Vec<TransitionEntry>> {
        Ok(self
            .transitions
            .lock()
            .await
            .get(&(tenant_id, record_id.to_owned()))
            .cloned()
            .unwrap_or_default())
    }

    async fn state_distribution(&self, tenant_id: TenantId) -> AppResult<Vec<StateDistributionRow>> {
        let mut rows: Vec<StateDistributionRow> = Vec::new();
        for ((stored_tenant_id, _), record) in self.records.lock().await.iter() {
            if *stored_tenant_id != tenant_id {
                continue;
            }
            match rows
                .iter_mut()
                .find(|row| row.kind == record.kind() && row.state == record.state())
            {
                Some(row) => {
                    row.record_count += 1;
                    row.total_amount += record.amount();
                }
                None => rows.push(StateDistributionRow {
                    kind: record.kind(),
                    state: record.state(),
                    record_count: 1,
                    total_amount: record.amount(),
                }),
            }
        }
        rows.sort_by_key(|row| (row.kind, row.state));
        Ok(rows)
    }
}

pub(crate) struct Harness {
    pub(crate) tenant_id: TenantId,
    pub(crate) roles: Arc<FakeRoleRepository>,
    pub(crate) records: Arc<FakeWorkflowRecordRepository>,
    pub(crate) audit: Arc<FakeAuditRepository>,
    pub(crate) authorization_service: AuthorizationService,
    pub(crate) workflow_service: WorkflowService,
}

impl Harness {
    pub(crate) async fn new(principals: &[(&str, &str)]) -> Self {
        let tenant_id = TenantId::new();
        let roles = Arc::new(FakeRoleRepository::seeded(tenant_id, principals).await);
        let records = Arc::new(FakeWorkflowRecordRepository::default());
        let audit = Arc::new(FakeAuditRepository::default());
        let authorization_service =
            AuthorizationService::new(roles.clone(), Arc::new(FakeGrantCache::default()));
        let routing_policy = RoutingPolicy::new(default_routing_rules())
            .unwrap_or_else(|_| unreachable!());
        let workflow_service = WorkflowService::new(
            authorization_service.clone(),
            records.clone(),
            audit.clone(),
            Arc::new(routing_policy),
        );

        Self {
            tenant_id,
            roles,
            records,
            audit,
            authorization_service,
            workflow_service,
        }
    }

    pub(crate) fn actor(&self, principal: &str) -> ActorContext {
        ActorContext::new(principal, self.tenant_id).unwrap_or_else(|_| unreachable!())
    }
}

pub(crate) fn amount(value: i64) -> Decimal {
    Decimal::new(value, 0)
}
