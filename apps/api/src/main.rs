//! Tallyflow API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod dev_seed;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use tallyflow_core::AppError;
use tracing::info;

use crate::api_config::{ApiConfig, StorageConfig, init_tracing};
use crate::api_services::RepositorySet;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;

    let repositories = match &config.storage {
        StorageConfig::Memory => RepositorySet::in_memory(),
        StorageConfig::Postgres {
            database_url,
            max_connections,
        } => {
            let pool =
                api_services::connect_and_migrate(database_url.as_str(), *max_connections).await?;
            if config.migrate_only {
                info!("database migrations applied");
                return Ok(());
            }
            RepositorySet::postgres(pool)
        }
    };

    let routing_policy = api_services::load_routing_policy(config.routing_rules_path.as_deref())?;

    if config.dev_seed {
        dev_seed::run(repositories.role_repository.clone(), config.dev_tenant_id).await?;
    }

    let app_state = api_services::build_app_state(&repositories, routing_policy);
    let app = api_router::build_router(app_state, config.frontend_url.as_str())?;
    let address = config.socket_address()?;

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(
        %address,
        storage_backend = config.storage.label(),
        "tallyflow-api listening"
    );

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
