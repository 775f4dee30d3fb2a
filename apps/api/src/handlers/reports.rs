use axum::Json;
use axum::extract::{Extension, State};

use tallyflow_core::ActorContext;

use crate::dto::StateDistributionResponse;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn state_distribution_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
) -> ApiResult<Json<StateDistributionResponse>> {
    let report = state.reporting_service.state_distribution(&actor).await?;

    Ok(Json(StateDistributionResponse::from(report)))
}
