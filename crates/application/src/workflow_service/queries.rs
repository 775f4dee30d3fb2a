use super::*;

const DEFAULT_PAGE_SIZE: usize = 50;
const MAX_PAGE_SIZE: usize = 200;
const SCAN_BATCH_SIZE: usize = 200;

impl WorkflowService {
    /// Returns one record visible to the actor.
    pub async fn find_record(
        &self,
        actor: &ActorContext,
        record_id: &str,
    ) -> AppResult<WorkflowRecord> {
        let record = self.load_record(actor.tenant_id(), record_id).await?;
        self.ensure_can_read(actor, &record).await?;
        Ok(record)
    }

    /// Returns a record's transition log in commit order.
    pub async fn get_history(
        &self,
        actor: &ActorContext,
        record_id: &str,
    ) -> AppResult<Vec<TransitionEntry>> {
        let record = self.load_record(actor.tenant_id(), record_id).await?;
        self.ensure_can_read(actor, &record).await?;
        self.repository
            .list_transitions(actor.tenant_id(), record_id)
            .await
    }

    /// Lists records the actor can act on now, oldest first.
    ///
    /// The returned cursor resumes after the last returned record, so paging
    /// is restartable while records keep moving.
    pub async fn list_pending(
        &self,
        actor: &ActorContext,
        query: PendingRecordsQuery,
    ) -> AppResult<PendingRecordsPage> {
        let tenant_id = actor.tenant_id();
        let grant = self
            .authorization_service
            .resolve_grant(tenant_id, actor.actor_id())
            .await?;

        let limit = query
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let mut after = query
            .cursor
            .as_deref()
            .map(RecordCursor::from_token)
            .transpose()?;
        let mut records = Vec::new();

        loop {
            let batch = self
                .repository
                .list_records(
                    tenant_id,
                    RecordListQuery {
                        kind: query.kind,
                        state: query.state,
                        requested_by: None,
                        created_from: query.created_from,
                        created_to: query.created_to,
                        after: after.clone(),
                        limit: SCAN_BATCH_SIZE,
                    },
                )
                .await?;
            let exhausted = batch.len() < SCAN_BATCH_SIZE;

            for record in batch {
                after = Some(RecordCursor::after_record(&record));

                if self.is_actionable(actor, &grant, &record).await? {
                    records.push(record);
                    if records.len() == limit {
                        return Ok(PendingRecordsPage {
                            records,
                            next_cursor: after.map(|cursor| cursor.to_token()),
                        });
                    }
                }
            }

            if exhausted {
                return Ok(PendingRecordsPage {
                    records,
                    next_cursor: None,
                });
            }
        }
    }

    async fn is_actionable(
        &self,
        actor: &ActorContext,
        grant: &ResolvedGrant,
        record: &WorkflowRecord,
    ) -> AppResult<bool> {
        let is_requester = record.requested_by() == actor.actor_id();
        let actions =
            self.routing_policy
                .allowed_actions(record, grant.role_name.as_str(), is_requester);

        for action in actions {
            let decision = self
                .authorization_service
                .decide(
                    actor.tenant_id(),
                    grant,
                    action.required_permission(record.kind()),
                )
                .await?;
            if decision.is_allowed() {
                return Ok(true);
            }
        }

        Ok(false)
    }
}
