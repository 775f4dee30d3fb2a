use super::*;

impl WorkflowService {
    /// Records that a purchase order's goods or services were received.
    ///
    /// Repeated calls return the record unchanged.
    pub async fn mark_fulfillment_executed(
        &self,
        actor: &ActorContext,
        record_id: &str,
    ) -> AppResult<WorkflowRecord> {
        let tenant_id = actor.tenant_id();
        self.authorization_service
            .require_permission(tenant_id, actor.actor_id(), FULFILLMENT_MANAGE)
            .await?;

        let record = self.load_record(tenant_id, record_id).await?;
        if record.fulfillment() == Some(FulfillmentStatus::Executed) {
            return Ok(record);
        }

        let updated = record.mark_fulfillment_executed(Utc::now())?;
        self.repository
            .update_record(tenant_id, record.version(), updated.clone())
            .await?;

        info!(%tenant_id, record_id, actor = actor.actor_id(), "fulfillment executed");
        self.record_audit_event(AuditEvent {
            tenant_id,
            subject: actor.actor_id().to_owned(),
            action: AuditAction::WorkflowFulfillmentExecuted,
            resource_type: "workflow_record".to_owned(),
            resource_id: record_id.to_owned(),
            detail: Some("purchase order fulfillment marked executed".to_owned()),
        })
        .await;

        Ok(updated)
    }
}
