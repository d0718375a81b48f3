//! Port for dashboard aggregates.

use async_trait::async_trait;

use crate::domain::{KpiScope, Kpis};

use super::define_port_error;

define_port_error! {
    /// Errors raised by dashboard repository adapters.
    pub enum DashboardRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "dashboard repository connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } =>
            "dashboard repository query failed: {message}",
    }
}

/// Reads KPI counts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DashboardRepository: Send + Sync {
    /// KPI snapshot over `scope`; `None` when the scope's account does not
    /// exist or is archived.
    async fn kpis(&self, scope: &KpiScope) -> Result<Option<Kpis>, DashboardRepositoryError>;
}
