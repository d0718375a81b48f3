//! Roles, CKS codes, and the authenticated principal.
//!
//! Every hub account is identified by a CKS code whose prefix names its role
//! (`MGR-012`, `CEN-010`, ...). Codes are compared after normalisation: trim
//! and upper-case.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Platform administrator with global scope.
    Admin,
    /// Manager owning an ecosystem of contractors, customers and centers.
    Manager,
    /// Contractor under a manager.
    Contractor,
    /// Customer under a contractor.
    Customer,
    /// Service center under a customer.
    Center,
    /// Crew assigned to a center.
    Crew,
    /// Warehouse fulfilling product orders.
    Warehouse,
}

/// The six hub roles, in hierarchy order.
pub const HUB_ROLES: [Role; 6] = [
    Role::Manager,
    Role::Contractor,
    Role::Customer,
    Role::Center,
    Role::Crew,
    Role::Warehouse,
];

/// Raised when a role name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl Role {
    /// Lower-case role name used in paths and payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Contractor => "contractor",
            Self::Customer => "customer",
            Self::Center => "center",
            Self::Crew => "crew",
            Self::Warehouse => "warehouse",
        }
    }

    /// Code prefix for accounts of this role.
    #[must_use]
    pub const fn code_prefix(self) -> &'static str {
        match self {
            Self::Admin => "ADM",
            Self::Manager => "MGR",
            Self::Contractor => "CON",
            Self::Customer => "CUS",
            Self::Center => "CEN",
            Self::Crew => "CRW",
            Self::Warehouse => "WHS",
        }
    }

    /// Whether this is one of the six hub roles.
    #[must_use]
    pub const fn is_hub(self) -> bool {
        !matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "contractor" => Ok(Self::Contractor),
            "customer" => Ok(Self::Customer),
            "center" => Ok(Self::Center),
            "crew" => Ok(Self::Crew),
            "warehouse" => Ok(Self::Warehouse),
            _ => Err(UnknownRole(s.to_owned())),
        }
    }
}

/// Trim and upper-case an identity code; blank input yields `None`.
///
/// # Examples
/// ```
/// use cks_backend::domain::normalize_identity;
///
/// assert_eq!(normalize_identity(Some(" cen-010 ")).as_deref(), Some("CEN-010"));
/// assert_eq!(normalize_identity(Some("   ")), None);
/// ```
#[must_use]
pub fn normalize_identity(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_uppercase())
    }
}

/// Pick the normalised primary code, falling back to the normalised fallback.
///
/// # Examples
/// ```
/// use cks_backend::domain::resolved_user_code;
///
/// assert_eq!(resolved_user_code(Some(" abc-123 "), Some("zzz")).as_deref(), Some("ABC-123"));
/// assert_eq!(resolved_user_code(None, Some(" mgr-001 ")).as_deref(), Some("MGR-001"));
/// assert_eq!(resolved_user_code(Some(" "), None), None);
/// ```
#[must_use]
pub fn resolved_user_code(primary: Option<&str>, fallback: Option<&str>) -> Option<String> {
    normalize_identity(primary).or_else(|| normalize_identity(fallback))
}

/// Infer the role from a code prefix such as `CRW-` or `WHS-`.
#[must_use]
pub fn role_for_code(code: &str) -> Option<Role> {
    let normalized = normalize_identity(Some(code))?;
    let (prefix, _) = normalized.split_once('-')?;
    [Role::Admin]
        .into_iter()
        .chain(HUB_ROLES)
        .find(|role| role.code_prefix() == prefix)
}

/// Account lifecycle state as stored on the account row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    /// Role of the table the account was found in.
    pub role: Role,
    /// Normalised CKS code.
    pub code: String,
    /// Raw status column; `None` when the table has no status.
    pub status: Option<String>,
}

impl AccountRecord {
    /// Accounts are usable unless a status is present and is not `active`.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status
            .as_deref()
            .is_none_or(|status| status.trim().eq_ignore_ascii_case("active"))
    }
}

/// Authenticated caller.
///
/// # Examples
/// ```
/// use cks_backend::domain::{Principal, Role};
///
/// let crew = Principal::hub(Role::Crew, "crw-004");
/// assert_eq!(crew.code(), Some("CRW-004"));
/// assert!(!crew.is_admin());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    role: Role,
    code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    clerk_user_id: Option<String>,
}

impl Principal {
    /// A hub account with a normalised code.
    pub fn hub(role: Role, code: &str) -> Self {
        Self {
            role,
            code: normalize_identity(Some(code)),
            clerk_user_id: None,
        }
    }

    /// An administrator, optionally carrying an admin code.
    #[must_use]
    pub fn admin(code: Option<&str>) -> Self {
        Self {
            role: Role::Admin,
            code: normalize_identity(code),
            clerk_user_id: None,
        }
    }

    /// Build from a directory record.
    #[must_use]
    pub fn from_account(account: AccountRecord, clerk_user_id: Option<String>) -> Self {
        Self {
            role: account.role,
            code: normalize_identity(Some(&account.code)),
            clerk_user_id,
        }
    }

    /// Role of the caller.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Normalised CKS code; admins may have none.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Identity provider user id, when authenticated through a token.
    #[must_use]
    pub fn clerk_user_id(&self) -> Option<&str> {
        self.clerk_user_id.as_deref()
    }

    /// Whether the caller is an administrator.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }

    /// Code recorded as the actor in activity rows.
    #[must_use]
    pub fn actor_id(&self) -> String {
        self.code
            .clone()
            .unwrap_or_else(|| self.role.as_str().to_uppercase())
    }
}
