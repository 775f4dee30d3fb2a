use super::*;

impl WorkflowService {
    /// Creates a record in `pending_review` on behalf of the actor.
    pub async fn submit(
        &self,
        actor: &ActorContext,
        input: SubmitRecordInput,
    ) -> AppResult<WorkflowRecord> {
        let tenant_id = actor.tenant_id();
        self.authorization_service
            .require_permission(
                tenant_id,
                actor.actor_id(),
                Permission::new(input.kind.resource(), PermissionAction::Submit),
            )
            .await?;

        let record = WorkflowRecord::submit(
            Uuid::new_v4().to_string(),
            SubmissionInput {
                kind: input.kind,
                amount: input.amount,
                currency: input.currency,
                requested_by: actor.actor_id().to_owned(),
                department: input.department,
                priority: input.priority,
                branch: input.branch,
                description: input.description,
            },
            Utc::now(),
        )?;

        self.repository
            .insert_record(tenant_id, record.clone())
            .await?;

        info!(
            %tenant_id,
            record_id = %record.record_id(),
            kind = record.kind().as_str(),
            amount = %record.amount(),
            requested_by = actor.actor_id(),
            "workflow record submitted"
        );

        self.record_audit_event(AuditEvent {
            tenant_id,
            subject: actor.actor_id().to_owned(),
            action: AuditAction::WorkflowRecordSubmitted,
            resource_type: "workflow_record".to_owned(),
            resource_id: record.record_id().as_str().to_owned(),
            detail: Some(format!(
                "submitted {} of {} {}",
                record.kind().as_str(),
                record.amount(),
                record.currency().as_str()
            )),
        })
        .await;

        Ok(record)
    }
}
