//! Driving port for role hubs.

use async_trait::async_trait;

use crate::domain::{
    Activity, ClearActivityRequest, ClearReport, DashboardSummary, Error, HubContext, Kpis,
    Principal,
};

/// Dashboard reads and the activity clear action.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DashboardQuery: Send + Sync {
    /// Role, scope, features, and KPIs when enabled.
    async fn summary(&self, hub: &HubContext) -> Result<DashboardSummary, Error>;

    /// KPI snapshot, all zeros when the hub's account is unknown.
    async fn kpis(&self, hub: &HubContext) -> Result<Kpis, Error>;

    /// Newest activity visible to the hub.
    async fn recent_activity(
        &self,
        hub: &HubContext,
        limit: Option<u32>,
    ) -> Result<Vec<Activity>, Error>;

    /// Delete the activity the hub can see.
    async fn clear_activity(
        &self,
        hub: &HubContext,
        actor: &Principal,
        request: ClearActivityRequest,
    ) -> Result<ClearReport, Error>;
}

/// Fixture used when no database is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureDashboard;

#[async_trait]
impl DashboardQuery for FixtureDashboard {
    async fn summary(&self, hub: &HubContext) -> Result<DashboardSummary, Error> {
        let config = hub.config();
        Ok(DashboardSummary {
            role: config.role,
            cks_code: hub.code().map(str::to_owned),
            scope: config.scope,
            features: config.features,
            kpis: config.features.kpis.then(Kpis::default),
        })
    }

    async fn kpis(&self, _hub: &HubContext) -> Result<Kpis, Error> {
        Ok(Kpis::default())
    }

    async fn recent_activity(
        &self,
        _hub: &HubContext,
        _limit: Option<u32>,
    ) -> Result<Vec<Activity>, Error> {
        Ok(Vec::new())
    }

    async fn clear_activity(
        &self,
        _hub: &HubContext,
        _actor: &Principal,
        _request: ClearActivityRequest,
    ) -> Result<ClearReport, Error> {
        Err(Error::service_unavailable("activity storage is not configured"))
    }
}
