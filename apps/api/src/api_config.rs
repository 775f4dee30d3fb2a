use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use tallyflow_core::{AppError, TenantId};
use tracing_subscriber::EnvFilter;

/// Persistence backend selected at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Memory,
    Postgres {
        database_url: String,
        max_connections: u32,
    },
}

impl StorageConfig {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Postgres { .. } => "postgres",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub api_host: String,
    pub api_port: u16,
    pub storage: StorageConfig,
    pub routing_rules_path: Option<PathBuf>,
    pub frontend_url: String,
    pub dev_seed: bool,
    pub dev_tenant_id: Option<TenantId>,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = match optional_env("API_PORT") {
            Some(value) => value
                .parse::<u16>()
                .map_err(|error| AppError::Validation(format!("invalid API_PORT: {error}")))?,
            None => 3001,
        };

        let storage = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "memory".to_owned())
            .as_str()
        {
            "memory" => StorageConfig::Memory,
            "postgres" => {
                let max_connections = match optional_env("DATABASE_MAX_CONNECTIONS") {
                    Some(value) => value.parse::<u32>().map_err(|error| {
                        AppError::Validation(format!("invalid DATABASE_MAX_CONNECTIONS: {error}"))
                    })?,
                    None => 10,
                };
                StorageConfig::Postgres {
                    database_url: required_non_empty_env("DATABASE_URL")?,
                    max_connections,
                }
            }
            other => {
                return Err(AppError::Validation(format!(
                    "STORAGE_BACKEND must be either 'memory' or 'postgres', got '{other}'"
                )));
            }
        };

        if migrate_only && storage == StorageConfig::Memory {
            return Err(AppError::Validation(
                "migrate requires STORAGE_BACKEND=postgres".to_owned(),
            ));
        }

        let routing_rules_path = optional_env("ROUTING_RULES_PATH").map(PathBuf::from);
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());
        let dev_seed = env::var("DEV_SEED")
            .unwrap_or_else(|_| "false".to_owned())
            .eq_ignore_ascii_case("true");

        let dev_tenant_id = optional_env("DEV_TENANT_ID")
            .map(|value| {
                uuid::Uuid::parse_str(value.as_str())
                    .map(TenantId::from_uuid)
                    .map_err(|error| AppError::Validation(format!("invalid DEV_TENANT_ID: {error}")))
            })
            .transpose()?;

        Ok(Self {
            migrate_only,
            api_host,
            api_port,
            storage,
            routing_rules_path,
            frontend_url,
            dev_seed,
            dev_tenant_id,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Validation(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn optional_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}
