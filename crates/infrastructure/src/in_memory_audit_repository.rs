use async_trait::async_trait;
use tallyflow_application::{AuditEvent, AuditRepository};
use tallyflow_core::{AppResult, TenantId};
use tokio::sync::RwLock;

/// Append-only in-memory audit store.
#[derive(Default)]
pub struct InMemoryAuditRepository {
    events: RwLock<Vec<AuditEvent>>,
}

impl InMemoryAuditRepository {
    /// Creates an empty audit store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the tenant's events in append order.
    pub async fn events_for_tenant(&self, tenant_id: TenantId) -> Vec<AuditEvent> {
        self.events
            .read()
            .await
            .iter()
            .filter(|event| event.tenant_id == tenant_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl AuditRepository for InMemoryAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.events.write().await.push(event);
        Ok(())
    }
}
