use axum::Router;
use axum::middleware::from_fn;
use axum::routing::{get, post, put};
use tallyflow_core::AppError;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

mod cors;

pub fn build_router(app_state: AppState, frontend_url: &str) -> Result<Router, AppError> {
    let cors_layer = cors::build_cors_layer(frontend_url)?;

    let record_routes = Router::new()
        .route(
            "/api/records",
            post(handlers::records::submit_record_handler),
        )
        .route(
            "/api/records/pending",
            get(handlers::records::list_pending_handler),
        )
        .route(
            "/api/records/{record_id}",
            get(handlers::records::get_record_handler),
        )
        .route(
            "/api/records/{record_id}/history",
            get(handlers::records::record_history_handler),
        )
        .route(
            "/api/records/{record_id}/transitions",
            post(handlers::records::apply_transition_handler),
        )
        .route(
            "/api/records/{record_id}/can-act",
            get(handlers::records::can_act_handler),
        )
        .route(
            "/api/records/{record_id}/posting",
            post(handlers::records::post_to_ledger_handler),
        )
        .route(
            "/api/records/{record_id}/confirm-delivery",
            post(handlers::records::confirm_delivery_handler),
        )
        .route(
            "/api/records/{record_id}/reject-posting",
            post(handlers::records::reject_posting_handler),
        )
        .route(
            "/api/records/{record_id}/fulfillment",
            post(handlers::records::mark_fulfillment_executed_handler),
        );

    let security_routes = Router::new()
        .route(
            "/api/security/roles",
            get(handlers::security::list_roles_handler)
                .post(handlers::security::create_role_handler),
        )
        .route(
            "/api/security/roles/{role_name}/permissions",
            put(handlers::security::update_role_permissions_handler),
        )
        .route(
            "/api/security/role-assignments",
            get(handlers::security::list_role_assignments_handler)
                .post(handlers::security::assign_role_handler),
        )
        .route(
            "/api/security/resource-policies",
            get(handlers::security::list_resource_policies_handler)
                .put(handlers::security::set_resource_policy_handler),
        );

    let protected_routes = Router::new()
        .merge(record_routes)
        .merge(security_routes)
        .route(
            "/api/reports/state-distribution",
            get(handlers::reports::state_distribution_handler),
        )
        .route_layer(from_fn(middleware::require_actor));

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(app_state))
}
