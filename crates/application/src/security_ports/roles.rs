use chrono::{DateTime, Utc};

/// Active role assignment of one principal in a tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAssignment {
    /// Principal identifier.
    pub principal: String,
    /// Assigned role name.
    pub role_name: String,
    /// Assignment timestamp.
    pub assigned_at: DateTime<Utc>,
}
