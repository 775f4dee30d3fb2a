use super::*;

pub async fn list_resource_policies_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
) -> ApiResult<Json<Vec<ResourcePolicyResponse>>> {
    let policies = state
        .role_admin_service
        .list_resource_policies(&actor)
        .await?
        .into_iter()
        .map(ResourcePolicyResponse::from)
        .collect();

    Ok(Json(policies))
}

pub async fn set_resource_policy_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Json(payload): Json<ResourcePolicyRequest>,
) -> ApiResult<Json<ResourcePolicyResponse>> {
    let policy = state
        .role_admin_service
        .set_resource_policy(&actor, payload.into_policy()?)
        .await?;

    Ok(Json(ResourcePolicyResponse::from(policy)))
}
