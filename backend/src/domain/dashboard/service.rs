//! Dashboard service.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use super::{
    CLEAR_CONFIRMATION, ClearActivityRequest, ClearReport, DashboardFeature, DashboardSummary,
    HubContext, Kpis, MAX_RECENT_ACTIVITY_LIMIT, RECENT_ACTIVITY_LIMIT,
};
use crate::domain::activity::map_activity_error;
use crate::domain::ports::{
    ActivityRepository, DashboardQuery, DashboardRepository, DashboardRepositoryError,
};
use crate::domain::{Activity, ActivityDraft, Error, Principal};

fn map_dashboard_error(error: DashboardRepositoryError) -> Error {
    match error {
        DashboardRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("dashboard repository unavailable: {message}"))
        }
        DashboardRepositoryError::Query { message } => {
            Error::internal(format!("dashboard repository error: {message}"))
        }
    }
}

/// Hub dashboards over KPI and activity storage.
#[derive(Clone)]
pub struct DashboardService<K, A> {
    kpis: Arc<K>,
    activity: Arc<A>,
}

impl<K, A> DashboardService<K, A> {
    /// Create the service.
    pub fn new(kpis: Arc<K>, activity: Arc<A>) -> Self {
        Self { kpis, activity }
    }
}

impl<K, A> DashboardService<K, A>
where
    K: DashboardRepository,
    A: ActivityRepository,
{
    async fn snapshot(&self, hub: &HubContext) -> Result<Kpis, Error> {
        Ok(self
            .kpis
            .kpis(&hub.kpi_scope())
            .await
            .map_err(map_dashboard_error)?
            .unwrap_or_default())
    }
}

#[async_trait]
impl<K, A> DashboardQuery for DashboardService<K, A>
where
    K: DashboardRepository,
    A: ActivityRepository,
{
    async fn summary(&self, hub: &HubContext) -> Result<DashboardSummary, Error> {
        let config = hub.config();
        let kpis = if config.features.kpis {
            Some(self.snapshot(hub).await?)
        } else {
            None
        };
        Ok(DashboardSummary {
            role: config.role,
            cks_code: hub.code().map(str::to_owned),
            scope: config.scope,
            features: config.features,
            kpis,
        })
    }

    async fn kpis(&self, hub: &HubContext) -> Result<Kpis, Error> {
        hub.require(DashboardFeature::Kpis)?;
        self.snapshot(hub).await
    }

    async fn recent_activity(
        &self,
        hub: &HubContext,
        limit: Option<u32>,
    ) -> Result<Vec<Activity>, Error> {
        hub.require(DashboardFeature::Activity)?;
        let limit = limit
            .unwrap_or(RECENT_ACTIVITY_LIMIT)
            .clamp(1, MAX_RECENT_ACTIVITY_LIMIT);
        self.activity
            .recent(&hub.activity_scope(), limit)
            .await
            .map_err(map_activity_error)
    }

    async fn clear_activity(
        &self,
        hub: &HubContext,
        actor: &Principal,
        request: ClearActivityRequest,
    ) -> Result<ClearReport, Error> {
        hub.require(DashboardFeature::ClearActivity)?;
        if request.confirm != CLEAR_CONFIRMATION {
            return Err(Error::invalid_request(format!(
                "Confirmation must equal {CLEAR_CONFIRMATION}"
            ))
            .with_details(json!({ "field": "confirm", "code": "confirmation_mismatch" })));
        }
        let category = request
            .category
            .map(|c| c.trim().to_ascii_lowercase())
            .filter(|c| !c.is_empty());
        let maintenance = ActivityDraft::new(
            "system_maintenance",
            format!("{} cleared activity", actor.actor_id()),
            actor.actor_id(),
            actor.role().as_str(),
        )
        .with_metadata(json!({
            "operation": "clear_activity",
            "scope": hub.config().scope,
            "category": category,
        }));
        let cleared = self
            .activity
            .clear(&hub.activity_scope(), category, &maintenance)
            .await
            .map_err(map_activity_error)?;
        info!(cleared, actor = %actor.actor_id(), "activity cleared");
        Ok(ClearReport { cleared })
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
