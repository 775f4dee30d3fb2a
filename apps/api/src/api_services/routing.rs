use std::path::Path;

use tallyflow_core::{AppError, AppResult};
use tallyflow_domain::{RoutingPolicy, RoutingRule, default_routing_rules};
use tracing::info;

/// Loads routing rules from a JSON file, or the built-in rules when no path is configured.
pub fn load_routing_policy(path: Option<&Path>) -> AppResult<RoutingPolicy> {
    let Some(path) = path else {
        return RoutingPolicy::new(default_routing_rules());
    };

    let contents = std::fs::read_to_string(path).map_err(|error| {
        AppError::Validation(format!(
            "failed to read ROUTING_RULES_PATH '{}': {error}",
            path.display()
        ))
    })?;
    let rules = parse_routing_rules(contents.as_str())?;
    info!(path = %path.display(), rules = rules.len(), "loaded routing rules");

    RoutingPolicy::new(rules)
}

fn parse_routing_rules(contents: &str) -> AppResult<Vec<RoutingRule>> {
    serde_json::from_str::<Vec<RoutingRule>>(contents)
        .map_err(|error| AppError::Validation(format!("invalid routing rules file: {error}")))
}
