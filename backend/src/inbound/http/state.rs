//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    ActivityCommand, ActivityQuery, ArchiveCommand, AssignmentCommand, Authenticator,
    DashboardQuery, FixtureActivityCommand, FixtureActivityQuery, FixtureArchive,
    FixtureAssignments, FixtureAuthenticator, FixtureDashboard, FixtureInventory, FixtureOrders,
    FixtureReports, InventoryQuery, OrderCommand, OrderQuery, ReportCommand, ReportQuery,
};
use crate::domain::InventoryService;

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub auth: Arc<dyn Authenticator>,
    pub orders: Arc<dyn OrderCommand>,
    pub orders_query: Arc<dyn OrderQuery>,
    pub inventory: Arc<dyn InventoryQuery>,
    pub reports: Arc<dyn ReportCommand>,
    pub reports_query: Arc<dyn ReportQuery>,
    pub activity: Arc<dyn ActivityCommand>,
    pub activity_query: Arc<dyn ActivityQuery>,
    pub archive: Arc<dyn ArchiveCommand>,
    pub assignments: Arc<dyn AssignmentCommand>,
    pub dashboard: Arc<dyn DashboardQuery>,
}

impl Default for HttpStatePorts {
    /// Fixture ports used when no database is configured.
    fn default() -> Self {
        Self {
            auth: Arc::new(FixtureAuthenticator),
            orders: Arc::new(FixtureOrders),
            orders_query: Arc::new(FixtureOrders),
            inventory: Arc::new(InventoryService::new(Arc::new(FixtureInventory))),
            reports: Arc::new(FixtureReports),
            reports_query: Arc::new(FixtureReports),
            activity: Arc::new(FixtureActivityCommand),
            activity_query: Arc::new(FixtureActivityQuery),
            archive: Arc::new(FixtureArchive),
            assignments: Arc::new(FixtureAssignments),
            dashboard: Arc::new(FixtureDashboard),
        }
    }
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub auth: Arc<dyn Authenticator>,
    pub orders: Arc<dyn OrderCommand>,
    pub orders_query: Arc<dyn OrderQuery>,
    pub inventory: Arc<dyn InventoryQuery>,
    pub reports: Arc<dyn ReportCommand>,
    pub reports_query: Arc<dyn ReportQuery>,
    pub activity: Arc<dyn ActivityCommand>,
    pub activity_query: Arc<dyn ActivityQuery>,
    pub archive: Arc<dyn ArchiveCommand>,
    pub assignments: Arc<dyn AssignmentCommand>,
    pub dashboard: Arc<dyn DashboardQuery>,
    /// Accept `x-cks-dev-role` / `x-cks-dev-code` identity headers.
    pub dev_mock_auth: bool,
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}

impl HttpState {
    /// Construct state from a ports bundle with development headers off.
    ///
    /// # Examples
    /// ```
    /// use cks_backend::inbound::http::state::{HttpState, HttpStatePorts};
    ///
    /// let state = HttpState::new(HttpStatePorts::default()).with_dev_mock_auth(true);
    /// assert!(state.dev_mock_auth);
    /// ```
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            auth,
            orders,
            orders_query,
            inventory,
            reports,
            reports_query,
            activity,
            activity_query,
            archive,
            assignments,
            dashboard,
        } = ports;
        Self {
            auth,
            orders,
            orders_query,
            inventory,
            reports,
            reports_query,
            activity,
            activity_query,
            archive,
            assignments,
            dashboard,
            dev_mock_auth: false,
        }
    }

    /// Toggle the development identity override.
    #[must_use]
    pub fn with_dev_mock_auth(mut self, enabled: bool) -> Self {
        self.dev_mock_auth = enabled;
        self
    }
}
