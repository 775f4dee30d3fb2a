use super::*;

pub async fn apply_transition_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Path(record_id): Path<String>,
    Json(payload): Json<ApplyTransitionRequest>,
) -> ApiResult<Json<TransitionOutcomeResponse>> {
    let action = payload.action()?;
    let expected_version = payload.expected_version;
    let outcome = state
        .workflow_service
        .apply_transition(
            &actor,
            ApplyTransitionInput {
                record_id,
                action,
                payload: payload.into_payload()?,
                expected_version,
            },
        )
        .await?;

    Ok(Json(TransitionOutcomeResponse::from(outcome)))
}
