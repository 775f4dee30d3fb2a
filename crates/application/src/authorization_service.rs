use std::sync::Arc;

use tallyflow_core::{AppError, AppResult, TenantId};
use tallyflow_domain::{GrantDecision, Permission, ResolvedGrant};
use tracing::{debug, warn};

use crate::security_ports::{RoleGrantCache, RoleRepository};

mod grants;
mod permissions;

/// Application service for tenant-scoped authorization checks.
///
/// Grants are resolved from the principal's single active role and cached
/// cache-aside in the shared [`RoleGrantCache`].
#[derive(Clone)]
pub struct AuthorizationService {
    repository: Arc<dyn RoleRepository>,
    grant_cache: Arc<dyn RoleGrantCache>,
}

impl AuthorizationService {
    /// Creates a new authorization service from a repository and grant cache.
    #[must_use]
    pub fn new(repository: Arc<dyn RoleRepository>, grant_cache: Arc<dyn RoleGrantCache>) -> Self {
        Self {
            repository,
            grant_cache,
        }
    }
}

#[cfg(test)]
mod tests;
