mod database;
mod routing;
mod state_builder;

pub use database::connect_and_migrate;
pub use routing::load_routing_policy;
pub use state_builder::{RepositorySet, build_app_state};
