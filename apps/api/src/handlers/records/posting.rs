use super::*;

pub async fn post_to_ledger_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Path(record_id): Path<String>,
    Json(payload): Json<PostToLedgerRequest>,
) -> ApiResult<Json<TransitionOutcomeResponse>> {
    let outcome = state
        .posting_gateway
        .post_to_ledger(
            &actor,
            PostToLedgerInput {
                record_id,
                gl_account: payload.gl_account,
                cost_center: payload.cost_center,
                notes: payload.notes,
                expected_version: payload.expected_version,
            },
        )
        .await?;

    Ok(Json(TransitionOutcomeResponse::from(outcome)))
}

pub async fn confirm_delivery_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Path(record_id): Path<String>,
    Json(payload): Json<ConfirmDeliveryRequest>,
) -> ApiResult<Json<TransitionOutcomeResponse>> {
    let outcome = state
        .posting_gateway
        .confirm_delivery(
            &actor,
            record_id.as_str(),
            payload.notes,
            payload.expected_version,
        )
        .await?;

    Ok(Json(TransitionOutcomeResponse::from(outcome)))
}

pub async fn reject_posting_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Path(record_id): Path<String>,
    Json(payload): Json<RejectPostingRequest>,
) -> ApiResult<Json<TransitionOutcomeResponse>> {
    let outcome = state
        .posting_gateway
        .reject_posting(
            &actor,
            record_id.as_str(),
            payload.reason.as_str(),
            payload.expected_version,
        )
        .await?;

    Ok(Json(TransitionOutcomeResponse::from(outcome)))
}
