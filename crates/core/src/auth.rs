use serde::{Deserialize, Serialize};

use crate::{AppResult, NonEmptyString, TenantId};

/// Explicit caller identity passed into every workflow call.
///
/// The role is never carried here; it is resolved from the tenant's role assignments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorContext {
    actor_id: NonEmptyString,
    tenant_id: TenantId,
}

impl ActorContext {
    /// Creates an actor context, rejecting blank actor ids.
    pub fn new(actor_id: impl Into<String>, tenant_id: TenantId) -> AppResult<Self> {
        Ok(Self {
            actor_id: NonEmptyString::new(actor_id)?,
            tenant_id,
        })
    }

    /// Returns the stable principal identifier.
    #[must_use]
    pub fn actor_id(&self) -> &str {
        self.actor_id.as_str()
    }

    /// Returns the tenant the actor is operating in.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}
