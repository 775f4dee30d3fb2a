use super::*;

impl WorkflowService {
    /// Validates and atomically applies one transition.
    ///
    /// Checks run in a fixed order: record lookup, identical re-post replay
    /// (only while the record sits in `posted_to_ap`), version, state legality,
    /// authorization, payload. The commit itself
    /// re-checks the version so at most one caller wins per version.
    pub async fn apply_transition(
        &self,
        actor: &ActorContext,
        input: ApplyTransitionInput,
    ) -> AppResult<TransitionOutcome> {
        let tenant_id = actor.tenant_id();
        let ApplyTransitionInput {
            record_id,
            action,
            payload,
            expected_version,
        } = input;

        let record = self.load_record(tenant_id, record_id.as_str()).await?;

        if action == TransitionAction::Post && record.state() == RecordState::PostedToAp {
            return self.replay_posting(actor, record, &payload).await;
        }

        if record.version() != expected_version {
            return Err(AppError::StaleState(format!(
                "record '{record_id}' is at version {} but version {expected_version} was expected",
                record.version()
            )));
        }

        let mut target = next_state(record.kind(), record.state(), action)?;

        let grant = self
            .authorize_action(actor, &record, action)
            .await
            .inspect_err(|error| {
                warn!(
                    %tenant_id,
                    record_id = record_id.as_str(),
                    actor = actor.actor_id(),
                    action = action.as_str(),
                    state = record.state().as_str(),
                    %error,
                    "transition denied"
                );
            })?;

        let action_input = validate_payload(action, &payload)?;

        if let ActionInput::Reject {
            category: RejectionCategory::PolicyException,
            ..
        } = &action_input
            && record.state() == RecordState::PendingReview
            && self.routing_policy.escalation_target(&record).is_some()
        {
            target = RecordState::ReferredToEscalation;
        }

        let plan = record.plan_transition(
            &action_input,
            action,
            target,
            TransitionActor {
                actor_id: actor.actor_id(),
                actor_role: grant.role_name.as_str(),
            },
            Utc::now(),
        )?;

        self.repository
            .commit_transition(tenant_id, expected_version, plan.clone())
            .await?;

        info!(
            %tenant_id,
            record_id = record_id.as_str(),
            actor = actor.actor_id(),
            role = grant.role_name.as_str(),
            action = action.as_str(),
            from = plan.entry.from_state.as_str(),
            to = plan.entry.to_state.as_str(),
            version = plan.record.version(),
            "transition committed"
        );

        Ok(TransitionOutcome {
            record: plan.record,
            entry: plan.entry,
            is_new: true,
        })
    }

    /// Returns whether the action is legal from the record's state and the actor is authorized for it.
    ///
    /// Missing records and unknown principals yield `false`.
    pub async fn can_act(
        &self,
        actor: &ActorContext,
        record_id: &str,
        action: TransitionAction,
    ) -> AppResult<bool> {
        let Some(record) = self
            .repository
            .find_record(actor.tenant_id(), record_id)
            .await?
        else {
            return Ok(false);
        };

        if next_state(record.kind(), record.state(), action).is_err() {
            return Ok(false);
        }

        match self.authorize_action(actor, &record, action).await {
            Ok(_) => Ok(true),
            Err(AppError::Unauthorized(_) | AppError::UnknownPrincipal(_)) => Ok(false),
            Err(error) => Err(error),
        }
    }

    /// Handles `post` on a record currently in `posted_to_ap`.
    ///
    /// Identical codes return the original posting entry without writing;
    /// different codes fail with `AlreadyPosted`.
    async fn replay_posting(
        &self,
        actor: &ActorContext,
        record: WorkflowRecord,
        payload: &TransitionPayload,
    ) -> AppResult<TransitionOutcome> {
        let tenant_id = actor.tenant_id();
        let ActionInput::Post {
            gl_account,
            cost_center,
            ..
        } = validate_payload(TransitionAction::Post, payload)?
        else {
            return Err(AppError::Internal(
                "post payload validated into a different action".to_owned(),
            ));
        };

        if record.gl_account() != Some(&gl_account) || record.cost_center() != Some(&cost_center) {
            return Err(AppError::AlreadyPosted(format!(
                "record '{}' is already posted to {} / {}",
                record.record_id(),
                record
                    .gl_account()
                    .map(|value| value.as_str())
                    .unwrap_or_default(),
                record
                    .cost_center()
                    .map(|value| value.as_str())
                    .unwrap_or_default()
            )));
        }

        self.authorization_service
            .require_permission(
                tenant_id,
                actor.actor_id(),
                TransitionAction::Post.required_permission(record.kind()),
            )
            .await?;

        let entry = self
            .repository
            .list_transitions(tenant_id, record.record_id().as_str())
            .await?
            .into_iter()
            .rev()
            .find(|entry| entry.action == TransitionAction::Post)
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "record '{}' carries ledger coding without a posting entry",
                    record.record_id()
                ))
            })?;

        info!(
            %tenant_id,
            record_id = %record.record_id(),
            actor = actor.actor_id(),
            "identical posting replayed"
        );

        Ok(TransitionOutcome {
            record,
            entry,
            is_new: false,
        })
    }
}
