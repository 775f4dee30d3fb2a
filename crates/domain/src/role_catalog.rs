use tallyflow_core::AppResult;

use crate::record::RecordKind;
use crate::security::{
    Permission, PermissionAction, Resource, ResourcePolicy, RoleDefinition, RoleDefinitionInput,
};

const REVIEW_ACTIONS: &[PermissionAction] = &[
    PermissionAction::Read,
    PermissionAction::Approve,
    PermissionAction::Reject,
    PermissionAction::Query,
    PermissionAction::Refer,
];

const PAYMENT_ACTIONS: &[PermissionAction] = &[
    PermissionAction::Release,
    PermissionAction::Process,
    PermissionAction::Confirm,
];

/// Built-in tenant roles, highest authority first.
pub fn default_roles() -> AppResult<Vec<RoleDefinition>> {
    let staff = role(
        "staff",
        8,
        on_every_kind(&[PermissionAction::Read, PermissionAction::Submit]),
    )?;

    let storekeeper = role(
        "storekeeper",
        7,
        vec![
            Permission::new(Resource::PurchaseOrder, PermissionAction::Read),
            Permission::new(Resource::Inventory, PermissionAction::Read),
            Permission::new(Resource::Inventory, PermissionAction::Manage),
        ],
    )?;

    let mut manager_grants = on_every_kind(REVIEW_ACTIONS);
    manager_grants.extend(on_every_kind(&[PermissionAction::Submit]));
    let manager = role("manager", 5, manager_grants)?;

    let mut accountant_grants = on_every_kind(&[PermissionAction::Read]);
    accountant_grants.extend(
        REVIEW_ACTIONS
            .iter()
            .map(|action| Permission::new(Resource::IncomeEntry, *action)),
    );
    accountant_grants.extend(posting_grants());
    accountant_grants.extend(payment_grants());
    accountant_grants.push(Permission::new(Resource::Reporting, PermissionAction::Read));
    let accountant = role("accountant", 4, accountant_grants)?;

    let mut finance_grants = on_every_kind(REVIEW_ACTIONS);
    finance_grants.extend(on_every_kind(&[PermissionAction::Submit]));
    finance_grants.extend(posting_grants());
    finance_grants.extend(payment_grants());
    finance_grants.push(Permission::new(Resource::Reporting, PermissionAction::Read));
    let finance_manager = role("finance_manager", 3, finance_grants)?;

    let mut ged_grants = on_every_kind(REVIEW_ACTIONS);
    ged_grants.push(Permission::new(Resource::Reporting, PermissionAction::Read));
    let ged = role("ged", 2, ged_grants)?;

    let mut ceo_grants = on_every_kind(REVIEW_ACTIONS);
    ceo_grants.extend([
        Permission::new(Resource::Reporting, PermissionAction::Read),
        Permission::new(Resource::SecurityRole, PermissionAction::Manage),
        Permission::new(Resource::AuditLog, PermissionAction::Read),
    ]);
    let ceo = role("ceo", 1, ceo_grants)?;

    Ok(vec![
        ceo,
        ged,
        finance_manager,
        accountant,
        manager,
        storekeeper,
        staff,
    ])
}

/// Built-in override policies: security administration and audit are never overridable.
#[must_use]
pub fn default_resource_policies() -> Vec<ResourcePolicy> {
    vec![
        ResourcePolicy {
            resource: Resource::SecurityRole,
            required_level: 1,
            ceo_only: true,
        },
        ResourcePolicy {
            resource: Resource::AuditLog,
            required_level: 1,
            ceo_only: true,
        },
        ResourcePolicy {
            resource: Resource::Reporting,
            required_level: 3,
            ceo_only: false,
        },
        ResourcePolicy {
            resource: Resource::StaffRecord,
            required_level: 2,
            ceo_only: false,
        },
    ]
}

fn role(name: &str, level: u8, permissions: Vec<Permission>) -> AppResult<RoleDefinition> {
    RoleDefinition::new(RoleDefinitionInput {
        name: name.to_owned(),
        level,
        permissions,
        inherits_from: None,
        is_system: true,
    })
}

fn on_every_kind(actions: &[PermissionAction]) -> Vec<Permission> {
    RecordKind::all()
        .iter()
        .flat_map(|kind| {
            actions
                .iter()
                .map(move |action| Permission::new(kind.resource(), *action))
        })
        .collect()
}

fn posting_grants() -> Vec<Permission> {
    vec![
        Permission::new(Resource::Ledger, PermissionAction::Post),
        Permission::new(Resource::Ledger, PermissionAction::Reject),
        Permission::new(Resource::PurchaseOrder, PermissionAction::ConfirmDelivery),
    ]
}

fn payment_grants() -> Vec<Permission> {
    PAYMENT_ACTIONS
        .iter()
        .map(|action| Permission::new(Resource::Payment, *action))
        .collect()
}
