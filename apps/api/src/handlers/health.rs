use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::dto::{HealthDependencyStatus, HealthResponse};
use crate::state::{AppState, StorageHandle};

pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let storage = check_storage(&state.storage).await;

    let ready = storage.status == "ok";
    let http_status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        http_status,
        Json(HealthResponse {
            status: if ready { "ok" } else { "degraded" },
            storage_backend: state.storage.label(),
            storage,
        }),
    )
}

async fn check_storage(storage: &StorageHandle) -> HealthDependencyStatus {
    let StorageHandle::Postgres(pool) = storage else {
        return HealthDependencyStatus {
            status: "ok",
            detail: None,
        };
    };

    match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await {
        Ok(_) => HealthDependencyStatus {
            status: "ok",
            detail: None,
        },
        Err(error) => HealthDependencyStatus {
            status: "error",
            detail: Some(format!("postgres check failed: {error}")),
        },
    }
}
