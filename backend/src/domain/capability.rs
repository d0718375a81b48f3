//! Capability tokens and per-role grants.
//!
//! Routes are gated on capabilities rather than roles, so a single generic
//! handler can serve every hub.

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::json;

use super::{Error, Principal, Role};

/// String permission token such as `inventory:view`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Read the role dashboard.
    DashboardView,
    /// Manage dashboard data such as clearing activity.
    DashboardManage,
    /// Read orders.
    OrdersView,
    /// Create orders.
    OrdersCreate,
    /// Apply workflow actions to orders.
    OrdersUpdate,
    /// Approve orders awaiting this role.
    OrdersApprove,
    /// Read reports and feedback.
    ReportsView,
    /// File reports and feedback.
    ReportsCreate,
    /// Change report status and resolve reports.
    ReportsManage,
    /// Read inventory levels.
    InventoryView,
    /// Read the system activity log.
    AuditView,
    /// Prune the system activity log.
    AuditManage,
    /// Archive, restore, and hard-delete entities.
    ArchiveManage,
    /// Move accounts between parents in the hierarchy.
    DirectoryManage,
}

/// Every capability, in token order.
pub const ALL_CAPABILITIES: [Capability; 14] = [
    Capability::DashboardView,
    Capability::DashboardManage,
    Capability::OrdersView,
    Capability::OrdersCreate,
    Capability::OrdersUpdate,
    Capability::OrdersApprove,
    Capability::ReportsView,
    Capability::ReportsCreate,
    Capability::ReportsManage,
    Capability::InventoryView,
    Capability::AuditView,
    Capability::AuditManage,
    Capability::ArchiveManage,
    Capability::DirectoryManage,
];

const MANAGER: &[Capability] = &[
    Capability::DashboardView,
    Capability::DashboardManage,
    Capability::OrdersView,
    Capability::OrdersCreate,
    Capability::OrdersUpdate,
    Capability::OrdersApprove,
    Capability::ReportsView,
    Capability::ReportsCreate,
    Capability::ReportsManage,
    Capability::InventoryView,
];

const CONTRACTOR: &[Capability] = &[
    Capability::DashboardView,
    Capability::OrdersView,
    Capability::OrdersCreate,
    Capability::OrdersUpdate,
    Capability::OrdersApprove,
    Capability::ReportsView,
    Capability::ReportsCreate,
];

const REQUESTER: &[Capability] = &[
    Capability::DashboardView,
    Capability::OrdersView,
    Capability::OrdersCreate,
    Capability::OrdersUpdate,
    Capability::ReportsView,
    Capability::ReportsCreate,
];

const WAREHOUSE: &[Capability] = &[
    Capability::DashboardView,
    Capability::OrdersView,
    Capability::OrdersUpdate,
    Capability::OrdersApprove,
    Capability::InventoryView,
    Capability::ReportsView,
    Capability::ReportsCreate,
];

impl Capability {
    /// Wire token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DashboardView => "dashboard:view",
            Self::DashboardManage => "dashboard:manage",
            Self::OrdersView => "orders:view",
            Self::OrdersCreate => "orders:create",
            Self::OrdersUpdate => "orders:update",
            Self::OrdersApprove => "orders:approve",
            Self::ReportsView => "reports:view",
            Self::ReportsCreate => "reports:create",
            Self::ReportsManage => "reports:manage",
            Self::InventoryView => "inventory:view",
            Self::AuditView => "audit:view",
            Self::AuditManage => "audit:manage",
            Self::ArchiveManage => "archive:manage",
            Self::DirectoryManage => "directory:manage",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Capability {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Capabilities granted to `role`.
#[must_use]
pub fn capabilities_for(role: Role) -> &'static [Capability] {
    match role {
        Role::Admin => &ALL_CAPABILITIES,
        Role::Manager => MANAGER,
        Role::Contractor => CONTRACTOR,
        Role::Customer | Role::Center | Role::Crew => REQUESTER,
        Role::Warehouse => WAREHOUSE,
    }
}

/// Whether `role` holds `capability`.
#[must_use]
pub fn has_capability(role: Role, capability: Capability) -> bool {
    capabilities_for(role).contains(&capability)
}

fn tokens(caps: &[Capability]) -> Vec<&'static str> {
    caps.iter().map(|cap| cap.as_str()).collect()
}

fn authenticated(principal: Option<&Principal>) -> Result<&Principal, Error> {
    principal.ok_or_else(|| Error::unauthorized("Authentication required"))
}

/// Require every capability in `caps`.
///
/// # Errors
///
/// `unauthorized` without a principal; `forbidden` listing the missing
/// capabilities otherwise.
pub fn require_caps<'a>(
    principal: Option<&'a Principal>,
    caps: &[Capability],
) -> Result<&'a Principal, Error> {
    let principal = authenticated(principal)?;
    let missing: Vec<Capability> = caps
        .iter()
        .copied()
        .filter(|cap| !has_capability(principal.role(), *cap))
        .collect();
    if missing.is_empty() {
        return Ok(principal);
    }
    Err(Error::forbidden("Insufficient permissions").with_details(json!({
        "required": tokens(caps),
        "missing": tokens(&missing),
    })))
}

/// Require at least one capability in `caps`.
///
/// # Errors
///
/// `unauthorized` without a principal; `forbidden` when none is held.
pub fn require_any_cap<'a>(
    principal: Option<&'a Principal>,
    caps: &[Capability],
) -> Result<&'a Principal, Error> {
    let principal = authenticated(principal)?;
    if caps
        .iter()
        .any(|cap| has_capability(principal.role(), *cap))
    {
        return Ok(principal);
    }
    Err(Error::forbidden("Insufficient permissions").with_details(json!({
        "required": tokens(caps),
        "missing": tokens(caps),
    })))
}
