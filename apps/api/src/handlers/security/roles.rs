use super::*;

pub async fn list_roles_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let roles = state
        .role_admin_service
        .list_roles(&actor)
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn create_role_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Json(payload): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    let role = state
        .role_admin_service
        .create_role(&actor, payload.into_input()?)
        .await?;

    Ok((StatusCode::CREATED, Json(RoleResponse::from(role))))
}

pub async fn update_role_permissions_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Path(role_name): Path<String>,
    Json(payload): Json<UpdateRolePermissionsRequest>,
) -> ApiResult<Json<RoleResponse>> {
    let permissions = parse_permissions(&payload.permissions)?;
    let role = state
        .role_admin_service
        .update_role_permissions(&actor, role_name.as_str(), permissions)
        .await?;

    Ok(Json(RoleResponse::from(role)))
}

pub async fn assign_role_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Json(payload): Json<AssignRoleRequest>,
) -> ApiResult<Json<RoleAssignmentResponse>> {
    let assignment = state
        .role_admin_service
        .assign_role(&actor, payload.principal.as_str(), payload.role_name.as_str())
        .await?;

    Ok(Json(RoleAssignmentResponse::from(assignment)))
}

pub async fn list_role_assignments_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
) -> ApiResult<Json<Vec<RoleAssignmentResponse>>> {
    let assignments = state
        .role_admin_service
        .list_role_assignments(&actor)
        .await?
        .into_iter()
        .map(RoleAssignmentResponse::from)
        .collect();

    Ok(Json(assignments))
}
