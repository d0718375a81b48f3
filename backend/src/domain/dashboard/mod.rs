//! Role-scoped dashboards.
//!
//! Every hub is served by the same handlers, parameterised by a
//! [`DashboardConfig`]. The config fixes which capability gates the hub,
//! which features are switched on, and how far its data reaches:
//!
//! | role                         | scope     | analytics | clear activity |
//! |------------------------------|-----------|-----------|----------------|
//! | admin                        | global    | on        | on             |
//! | manager                      | ecosystem | on        | off            |
//! | contractor, customer, center, crew, warehouse | entity | off | off   |

mod service;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{ActivityScope, Capability, Error, Principal, Role, normalize_identity};

pub use service::DashboardService;

/// Confirmation phrase required to clear activity.
pub const CLEAR_CONFIRMATION: &str = "CLEAR-LOGS";
/// Default number of recent activity rows.
pub const RECENT_ACTIVITY_LIMIT: u32 = 50;
/// Largest accepted recent activity limit.
pub const MAX_RECENT_ACTIVITY_LIMIT: u32 = 200;

/// How far a dashboard's data reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DashboardScope {
    Global,
    Ecosystem,
    Entity,
}

/// Optional dashboard features.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardFeature {
    Kpis,
    Orders,
    Activity,
    Analytics,
    ClearActivity,
}

impl DashboardFeature {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kpis => "kpis",
            Self::Orders => "orders",
            Self::Activity => "activity",
            Self::Analytics => "analytics",
            Self::ClearActivity => "clearActivity",
        }
    }
}

/// Feature switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardFeatures {
    pub kpis: bool,
    pub orders: bool,
    pub activity: bool,
    pub analytics: bool,
    pub clear_activity: bool,
}

impl DashboardFeatures {
    /// Whether `feature` is switched on.
    #[must_use]
    pub const fn enabled(self, feature: DashboardFeature) -> bool {
        match feature {
            DashboardFeature::Kpis => self.kpis,
            DashboardFeature::Orders => self.orders,
            DashboardFeature::Activity => self.activity,
            DashboardFeature::Analytics => self.analytics,
            DashboardFeature::ClearActivity => self.clear_activity,
        }
    }
}

/// Capabilities gating a dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DashboardCapabilities {
    pub view: Capability,
    pub manage: Capability,
}

/// Per-role dashboard configuration.
///
/// # Examples
/// ```
/// use cks_backend::domain::{DashboardConfig, DashboardScope, Role};
///
/// let config = DashboardConfig::for_role(Role::Manager);
/// assert_eq!(config.scope, DashboardScope::Ecosystem);
/// assert!(!config.features.clear_activity);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardConfig {
    #[serde(rename = "roleCode")]
    pub role: Role,
    pub capabilities: DashboardCapabilities,
    pub features: DashboardFeatures,
    pub scope: DashboardScope,
}

impl DashboardConfig {
    /// Configuration for `role`.
    #[must_use]
    pub const fn for_role(role: Role) -> Self {
        let (scope, analytics, clear_activity) = match role {
            Role::Admin => (DashboardScope::Global, true, true),
            Role::Manager => (DashboardScope::Ecosystem, true, false),
            _ => (DashboardScope::Entity, false, false),
        };
        Self {
            role,
            capabilities: DashboardCapabilities {
                view: Capability::DashboardView,
                manage: Capability::DashboardManage,
            },
            features: DashboardFeatures {
                kpis: true,
                orders: true,
                activity: true,
                analytics,
                clear_activity,
            },
            scope,
        }
    }
}

/// Resolved hub: configuration plus the account whose data is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubContext {
    config: DashboardConfig,
    viewer: Principal,
}

impl HubContext {
    /// Bind `principal` to the hub described by `config`.
    ///
    /// Hub accounts may only open their own role's hub. Administrators may
    /// open any hub; non-admin hubs then need an explicit `code`.
    ///
    /// # Errors
    ///
    /// `forbidden` for another role's hub or another account's code;
    /// `invalid_request` when an administrator omits or mistypes the code.
    pub fn resolve(
        config: DashboardConfig,
        principal: &Principal,
        requested_code: Option<&str>,
    ) -> Result<Self, Error> {
        let requested = normalize_identity(requested_code);
        if principal.is_admin() {
            if config.role == Role::Admin {
                return Ok(Self {
                    config,
                    viewer: principal.clone(),
                });
            }
            let code = requested.ok_or_else(|| {
                Error::invalid_request(format!(
                    "A {} code is required to open this hub",
                    config.role
                ))
            })?;
            if super::role_for_code(&code) != Some(config.role) {
                return Err(Error::invalid_request(format!(
                    "{code} is not a {} code",
                    config.role
                )));
            }
            return Ok(Self {
                config,
                viewer: Principal::hub(config.role, &code),
            });
        }

        if principal.role() != config.role {
            return Err(Error::forbidden(format!(
                "Role {} cannot open the {} hub",
                principal.role(),
                config.role
            )));
        }
        let Some(own) = principal.code() else {
            return Err(Error::forbidden("Hub account has no CKS code"));
        };
        if requested.as_deref().is_some_and(|code| code != own) {
            return Err(Error::forbidden("Cannot open another account's hub"));
        }
        Ok(Self {
            config,
            viewer: principal.clone(),
        })
    }

    /// Hub configuration.
    #[must_use]
    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Account whose data the hub shows.
    #[must_use]
    pub fn viewer(&self) -> &Principal {
        &self.viewer
    }

    /// Code of the account whose data the hub shows.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.viewer.code()
    }

    /// Fail with `not_found` when `feature` is off.
    ///
    /// # Errors
    ///
    /// `not_found` naming the feature.
    pub fn require(&self, feature: DashboardFeature) -> Result<(), Error> {
        if self.config.features.enabled(feature) {
            Ok(())
        } else {
            Err(Error::not_found(format!(
                "Feature {} is not available for the {} hub",
                feature.as_str(),
                self.config.role
            )))
        }
    }

    /// Rows the KPI query aggregates over.
    #[must_use]
    pub fn kpi_scope(&self) -> KpiScope {
        match (self.config.scope, self.viewer.code()) {
            (DashboardScope::Global, _) | (_, None) => KpiScope::Global,
            (DashboardScope::Ecosystem, Some(code)) => KpiScope::Ecosystem {
                manager: code.to_owned(),
            },
            (DashboardScope::Entity, Some(code)) => KpiScope::Entity {
                role: self.config.role,
                code: code.to_owned(),
            },
        }
    }

    /// Activity rows the hub can see.
    #[must_use]
    pub fn activity_scope(&self) -> ActivityScope {
        match (self.config.scope, self.viewer.code()) {
            (DashboardScope::Global, _) | (_, None) => ActivityScope::All,
            (_, Some(code)) => ActivityScope::Code(code.to_owned()),
        }
    }
}

/// Rows a KPI snapshot aggregates over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KpiScope {
    /// All non-archived rows.
    Global,
    /// Rows under one manager.
    Ecosystem { manager: String },
    /// One account's own orders.
    Entity { role: Role, code: String },
}

/// KPI snapshot. Revenue is in cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    pub contractors: i64,
    pub customers: i64,
    pub centers: i64,
    pub crew: i64,
    pub orders: i64,
    pub pending_orders: i64,
    pub revenue: i64,
}

/// `GET /dashboard` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub role: Role,
    pub cks_code: Option<String>,
    pub scope: DashboardScope,
    pub features: DashboardFeatures,
    pub kpis: Option<Kpis>,
}

/// Body of `DELETE /activity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClearActivityRequest {
    #[serde(default)]
    pub confirm: String,
    #[serde(default)]
    pub category: Option<String>,
}

/// Rows removed by a clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClearReport {
    pub cleared: u64,
}
