use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tallyflow_core::{AppError, AppResult, NonEmptyString};

/// Highest authority level.
pub const HIGHEST_ROLE_LEVEL: u8 = 1;
/// Lowest authority level accepted for a role.
pub const LOWEST_ROLE_LEVEL: u8 = 10;

/// Category used to group permissions in administrative views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionCategory {
    /// Money movement and approvals.
    Financial,
    /// Day-to-day operations.
    Operational,
    /// Staff records.
    Staff,
    /// Dashboards and reports.
    Reporting,
    /// Roles and audit.
    Security,
}

impl PermissionCategory {
    /// Returns a stable label for this category.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Financial => "financial",
            Self::Operational => "operational",
            Self::Staff => "staff",
            Self::Reporting => "reporting",
            Self::Security => "security",
        }
    }
}

/// Protected resource named in `resource:action` permission strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    /// Expense records.
    Expense,
    /// Income entry records.
    IncomeEntry,
    /// Purchase order records.
    PurchaseOrder,
    /// Fund transfer records.
    FundTransfer,
    /// Ledger posting.
    Ledger,
    /// Payment settlement.
    Payment,
    /// Inventory operations.
    Inventory,
    /// Staff records.
    StaffRecord,
    /// Reports and state distribution.
    Reporting,
    /// Role administration.
    SecurityRole,
    /// Audit log.
    AuditLog,
}

impl Resource {
    /// Returns a stable storage value for this resource.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::IncomeEntry => "income_entry",
            Self::PurchaseOrder => "purchase_order",
            Self::FundTransfer => "fund_transfer",
            Self::Ledger => "ledger",
            Self::Payment => "payment",
            Self::Inventory => "inventory",
            Self::StaffRecord => "staff_record",
            Self::Reporting => "reporting",
            Self::SecurityRole => "security_role",
            Self::AuditLog => "audit_log",
        }
    }

    /// Returns the category this resource belongs to.
    #[must_use]
    pub fn category(&self) -> PermissionCategory {
        match self {
            Self::Expense
            | Self::IncomeEntry
            | Self::PurchaseOrder
            | Self::FundTransfer
            | Self::Ledger
            | Self::Payment => PermissionCategory::Financial,
            Self::Inventory => PermissionCategory::Operational,
            Self::StaffRecord => PermissionCategory::Staff,
            Self::Reporting => PermissionCategory::Reporting,
            Self::SecurityRole | Self::AuditLog => PermissionCategory::Security,
        }
    }

    /// Returns all known resources.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Resource] = &[
            Resource::Expense,
            Resource::IncomeEntry,
            Resource::PurchaseOrder,
            Resource::FundTransfer,
            Resource::Ledger,
            Resource::Payment,
            Resource::Inventory,
            Resource::StaffRecord,
            Resource::Reporting,
            Resource::SecurityRole,
            Resource::AuditLog,
        ];

        ALL
    }
}

impl Display for Resource {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|resource| resource.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown resource '{value}'")))
    }
}

/// Action half of a `resource:action` permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionAction {
    /// Read records.
    Read,
    /// Submit or resubmit records.
    Submit,
    /// Approve records.
    Approve,
    /// Reject records.
    Reject,
    /// Raise a query on records.
    Query,
    /// Refer records to the escalation role.
    Refer,
    /// Post to the ledger.
    Post,
    /// Confirm delivery of purchase orders.
    ConfirmDelivery,
    /// Release posted items for payment.
    Release,
    /// Start payment processing.
    Process,
    /// Confirm settlement.
    Confirm,
    /// Administer the resource.
    Manage,
}

impl PermissionAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Submit => "submit",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Query => "query",
            Self::Refer => "refer",
            Self::Post => "post",
            Self::ConfirmDelivery => "confirm_delivery",
            Self::Release => "release",
            Self::Process => "process",
            Self::Confirm => "confirm",
            Self::Manage => "manage",
        }
    }
}

impl FromStr for PermissionAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "read" => Ok(Self::Read),
            "submit" => Ok(Self::Submit),
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            "query" => Ok(Self::Query),
            "refer" => Ok(Self::Refer),
            "post" => Ok(Self::Post),
            "confirm_delivery" => Ok(Self::ConfirmDelivery),
            "release" => Ok(Self::Release),
            "process" => Ok(Self::Process),
            "confirm" => Ok(Self::Confirm),
            "manage" => Ok(Self::Manage),
            _ => Err(AppError::Validation(format!(
                "unknown permission action '{value}'"
            ))),
        }
    }
}

/// Capability expressed as `resource:action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Permission {
    resource: Resource,
    action: PermissionAction,
}

impl Permission {
    /// Creates a permission from its parts.
    #[must_use]
    pub const fn new(resource: Resource, action: PermissionAction) -> Self {
        Self { resource, action }
    }

    /// Returns the protected resource.
    #[must_use]
    pub fn resource(&self) -> Resource {
        self.resource
    }

    /// Returns the permitted action.
    #[must_use]
    pub fn action(&self) -> PermissionAction {
        self.action
    }

    /// Returns the permission category, derived from the resource.
    #[must_use]
    pub fn category(&self) -> PermissionCategory {
        self.resource.category()
    }

    /// Returns the stable `resource:action` storage value.
    #[must_use]
    pub fn as_string(&self) -> String {
        format!("{}:{}", self.resource.as_str(), self.action.as_str())
    }

    /// Parses a transport value into a permission.
    pub fn from_transport(value: &str) -> Result<Self, AppError> {
        Self::from_str(value)
    }
}

impl Display for Permission {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}:{}",
            self.resource.as_str(),
            self.action.as_str()
        )
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let Some((resource, action)) = value.split_once(':') else {
            return Err(AppError::Validation(format!(
                "permission '{value}' must use the resource:action form"
            )));
        };

        Ok(Self::new(resource.parse()?, action.parse()?))
    }
}

/// Input payload used to construct a validated role definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDefinitionInput {
    /// Unique role name in tenant scope.
    pub name: String,
    /// Authority level, 1 is highest.
    pub level: u8,
    /// Explicitly granted permissions.
    pub permissions: Vec<Permission>,
    /// Optional parent role whose explicit permissions are folded in.
    pub inherits_from: Option<String>,
    /// Indicates a system-managed role.
    pub is_system: bool,
}

/// Tenant role with an explicit permission set and a cached effective set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDefinition {
    name: NonEmptyString,
    level: u8,
    explicit_permissions: BTreeSet<Permission>,
    effective_permissions: BTreeSet<Permission>,
    inherits_from: Option<String>,
    is_system: bool,
}

impl RoleDefinition {
    /// Creates a validated role. Inheritance must be resolved with [`Self::resolve_inheritance`].
    pub fn new(input: RoleDefinitionInput) -> AppResult<Self> {
        let RoleDefinitionInput {
            name,
            level,
            permissions,
            inherits_from,
            is_system,
        } = input;

        if !(HIGHEST_ROLE_LEVEL..=LOWEST_ROLE_LEVEL).contains(&level) {
            return Err(AppError::Validation(format!(
                "role level must be between {HIGHEST_ROLE_LEVEL} and {LOWEST_ROLE_LEVEL}, got {level}"
            )));
        }

        let name = NonEmptyString::new(name.trim())
            .map_err(|_| AppError::Validation("role name must not be empty".to_owned()))?;

        let inherits_from = inherits_from.and_then(|value| {
            let trimmed = value.trim().to_owned();
            (!trimmed.is_empty()).then_some(trimmed)
        });

        if inherits_from.as_deref() == Some(name.as_str()) {
            return Err(AppError::Validation(format!(
                "role '{name}' cannot inherit from itself"
            )));
        }

        let explicit_permissions: BTreeSet<Permission> = permissions.into_iter().collect();

        Ok(Self {
            name,
            level,
            effective_permissions: explicit_permissions.clone(),
            explicit_permissions,
            inherits_from,
            is_system,
        })
    }

    /// Folds the parent's explicit permissions into the effective set.
    ///
    /// The parent must not inherit from another role.
    pub fn resolve_inheritance(mut self, parent: Option<&RoleDefinition>) -> AppResult<Self> {
        let mut effective = self.explicit_permissions.clone();

        match (self.inherits_from.as_deref(), parent) {
            (None, _) => {}
            (Some(expected), Some(parent)) => {
                if parent.name.as_str() != expected {
                    return Err(AppError::Internal(format!(
                        "role '{}' resolved against '{}' instead of '{expected}'",
                        self.name, parent.name
                    )));
                }

                if let Some(grandparent) = parent.inherits_from() {
                    return Err(AppError::Validation(format!(
                        "role '{}' cannot inherit from '{}' which itself inherits from '{grandparent}'",
                        self.name, parent.name
                    )));
                }

                effective.extend(parent.explicit_permissions.iter().copied());
            }
            (Some(expected), None) => {
                return Err(AppError::Validation(format!(
                    "parent role '{expected}' does not exist"
                )));
            }
        }

        self.effective_permissions = effective;
        Ok(self)
    }

    /// Returns a copy with a replaced explicit permission set; inheritance must be re-resolved.
    #[must_use]
    pub fn with_permissions(&self, permissions: Vec<Permission>) -> Self {
        let explicit_permissions: BTreeSet<Permission> = permissions.into_iter().collect();
        Self {
            name: self.name.clone(),
            level: self.level,
            effective_permissions: explicit_permissions.clone(),
            explicit_permissions,
            inherits_from: self.inherits_from.clone(),
            is_system: self.is_system,
        }
    }

    /// Returns the role name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the authority level.
    #[must_use]
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Returns explicitly granted permissions.
    #[must_use]
    pub fn explicit_permissions(&self) -> &BTreeSet<Permission> {
        &self.explicit_permissions
    }

    /// Returns explicit plus inherited permissions.
    #[must_use]
    pub fn effective_permissions(&self) -> &BTreeSet<Permission> {
        &self.effective_permissions
    }

    /// Returns the parent role name.
    #[must_use]
    pub fn inherits_from(&self) -> Option<&str> {
        self.inherits_from.as_deref()
    }

    /// Returns whether the role is system-managed.
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.is_system
    }
}

/// Override policy for one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePolicy {
    /// Protected resource.
    pub resource: Resource,
    /// Actors at this level or higher (numerically lower) may act without a grant.
    pub required_level: u8,
    /// When set, no level grants an override; an explicit permission is required.
    pub ceo_only: bool,
}

/// Permissions of one principal, resolved from their single active role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedGrant {
    /// Principal identifier.
    pub principal: String,
    /// Active role name.
    pub role_name: String,
    /// Role level.
    pub level: u8,
    /// Effective permission set.
    pub permissions: BTreeSet<Permission>,
}

/// Outcome of checking one permission against a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantDecision {
    /// Role holds the permission.
    Explicit,
    /// Role level satisfies the resource override policy.
    LevelOverride,
    /// Resource is on the deny-list for overrides and no grant exists.
    DeniedCeoOnly,
    /// No grant and no applicable override.
    Denied,
}

impl GrantDecision {
    /// Returns whether the decision allows the action.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Explicit | Self::LevelOverride)
    }
}

impl ResolvedGrant {
    /// Creates a grant snapshot from a principal's role.
    #[must_use]
    pub fn from_role(principal: impl Into<String>, role: &RoleDefinition) -> Self {
        Self {
            principal: principal.into(),
            role_name: role.name().as_str().to_owned(),
            level: role.level(),
            permissions: role.effective_permissions().clone(),
        }
    }

    /// Decides whether this grant covers the permission.
    #[must_use]
    pub fn decide(&self, permission: Permission, policy: Option<&ResourcePolicy>) -> GrantDecision {
        if self.permissions.contains(&permission) {
            return GrantDecision::Explicit;
        }

        match policy {
            Some(policy) if policy.ceo_only => GrantDecision::DeniedCeoOnly,
            Some(policy) if self.level <= policy.required_level => GrantDecision::LevelOverride,
            _ => GrantDecision::Denied,
        }
    }
}

/// Stable audit actions emitted by application use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when a workflow record is submitted.
    WorkflowRecordSubmitted,
    /// Emitted when fulfillment marks a purchase order executed.
    WorkflowFulfillmentExecuted,
    /// Emitted when a role is created.
    SecurityRoleCreated,
    /// Emitted when a role's permissions change.
    SecurityRolePermissionsUpdated,
    /// Emitted when a role is assigned to a principal.
    SecurityRoleAssigned,
    /// Emitted when a resource override policy changes.
    SecurityResourcePolicyUpdated,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WorkflowRecordSubmitted => "workflow.record.submitted",
            Self::WorkflowFulfillmentExecuted => "workflow.fulfillment.executed",
            Self::SecurityRoleCreated => "security.role.created",
            Self::SecurityRolePermissionsUpdated => "security.role.permissions_updated",
            Self::SecurityRoleAssigned => "security.role.assigned",
            Self::SecurityResourcePolicyUpdated => "security.resource_policy.updated",
        }
    }
}
