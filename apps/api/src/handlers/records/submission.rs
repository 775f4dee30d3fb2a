use super::*;

pub async fn submit_record_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Json(payload): Json<SubmitRecordRequest>,
) -> ApiResult<(StatusCode, Json<WorkflowRecordResponse>)> {
    let record = state
        .workflow_service
        .submit(&actor, payload.into_input()?)
        .await?;

    Ok((StatusCode::CREATED, Json(WorkflowRecordResponse::from(record))))
}

pub async fn mark_fulfillment_executed_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Path(record_id): Path<String>,
) -> ApiResult<Json<WorkflowRecordResponse>> {
    let record = state
        .workflow_service
        .mark_fulfillment_executed(&actor, record_id.as_str())
        .await?;

    Ok(Json(WorkflowRecordResponse::from(record)))
}
