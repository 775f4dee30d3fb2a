use std::sync::Arc;

use chrono::Utc;
use tallyflow_core::{ActorContext, AppError, AppResult, TenantId};
use tallyflow_domain::{
    ActionInput, AuditAction, FulfillmentStatus, Permission, PermissionAction, RecordState,
    RejectionCategory, Resource, ResolvedGrant, RoutingPolicy, SubmissionInput, TransitionAction,
    TransitionActor, TransitionEntry, TransitionPayload, WorkflowRecord, next_state,
    validate_payload,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::record_ports::{
    ApplyTransitionInput, PendingRecordsPage, PendingRecordsQuery, RecordCursor,
    RecordListQuery, SubmitRecordInput, TransitionOutcome, WorkflowRecordRepository,
};
use crate::{AuditEvent, AuditRepository, AuthorizationService};

mod fulfillment;
mod queries;
mod submission;
mod transitions;

const FULFILLMENT_MANAGE: Permission =
    Permission::new(Resource::Inventory, PermissionAction::Manage);

/// Transition engine plus record submission, listing and history.
#[derive(Clone)]
pub struct WorkflowService {
    authorization_service: AuthorizationService,
    repository: Arc<dyn WorkflowRecordRepository>,
    audit_repository: Arc<dyn AuditRepository>,
    routing_policy: Arc<RoutingPolicy>,
}

impl WorkflowService {
    /// Creates a workflow service.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        repository: Arc<dyn WorkflowRecordRepository>,
        audit_repository: Arc<dyn AuditRepository>,
        routing_policy: Arc<RoutingPolicy>,
    ) -> Self {
        Self {
            authorization_service,
            repository,
            audit_repository,
            routing_policy,
        }
    }

    /// Returns the active routing policy.
    #[must_use]
    pub fn routing_policy(&self) -> &RoutingPolicy {
        &self.routing_policy
    }

    async fn load_record(&self, tenant_id: TenantId, record_id: &str) -> AppResult<WorkflowRecord> {
        self.repository
            .find_record(tenant_id, record_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("record '{record_id}' does not exist")))
    }

    /// Appends an audit event for a write that has already committed.
    ///
    /// A failed append is logged and does not fail the caller.
    async fn record_audit_event(&self, event: AuditEvent) {
        let tenant_id = event.tenant_id;
        let action = event.action;
        let resource_id = event.resource_id.clone();
        if let Err(error) = self.audit_repository.append_event(event).await {
            warn!(
                %tenant_id,
                action = action.as_str(),
                resource_id = resource_id.as_str(),
                %error,
                "audit event was not recorded"
            );
        }
    }

    /// Checks the permission grant and the routing policy for one action.
    ///
    /// Both must pass; neither failure is logged here.
    async fn authorize_action(
        &self,
        actor: &ActorContext,
        record: &WorkflowRecord,
        action: TransitionAction,
    ) -> AppResult<ResolvedGrant> {
        let tenant_id = actor.tenant_id();
        let grant = self
            .authorization_service
            .resolve_grant(tenant_id, actor.actor_id())
            .await?;

        let permission = action.required_permission(record.kind());
        let decision = self
            .authorization_service
            .decide(tenant_id, &grant, permission)
            .await?;
        if !decision.is_allowed() {
            return Err(AppError::Unauthorized(
                permission.resource().as_str().to_owned(),
            ));
        }

        let is_requester = record.requested_by() == actor.actor_id();
        if !self
            .routing_policy
            .allowed_actions(record, grant.role_name.as_str(), is_requester)
            .contains(&action)
        {
            return Err(AppError::Unauthorized(
                record.kind().resource().as_str().to_owned(),
            ));
        }

        Ok(grant)
    }

    /// Requesters always see their own records; anyone else needs read on the kind.
    async fn ensure_can_read(&self, actor: &ActorContext, record: &WorkflowRecord) -> AppResult<()> {
        if record.requested_by() == actor.actor_id() {
            return Ok(());
        }

        self.authorization_service
            .require_permission(
                actor.tenant_id(),
                actor.actor_id(),
                Permission::new(record.kind().resource(), PermissionAction::Read),
            )
            .await
            .map(|_| ())
    }
}
