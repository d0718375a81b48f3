//! Builders wiring domain services to persistence adapters.

use std::sync::Arc;
use std::time::Duration;

use cks_backend::domain::ports::{Authenticator, FixtureAuthenticator, IdentityVerifier};
use cks_backend::domain::{
    ActivityService, ArchiveService, AssignmentService, AuthService, DashboardService,
    InventoryService, OrderService, ReportService,
};
use cks_backend::inbound::http::state::{HttpState, HttpStatePorts};
use cks_backend::outbound::identity::{DevIdentityVerifier, HttpIdentityVerifier};
use cks_backend::outbound::persistence::{
    DbPool, DieselActivityRepository, DieselArchiveRepository, DieselAssignmentRepository,
    DieselDashboardRepository, DieselDirectory, DieselInventoryRepository, DieselOrderRepository,
    DieselReportRepository,
};
use cks_backend::settings::IdentitySettings;
use mockable::{Clock, DefaultClock};
use tracing::warn;

const IDENTITY_TIMEOUT: Duration = Duration::from_secs(10);

fn authenticator_with<V>(verifier: V, pool: Option<&DbPool>) -> Arc<dyn Authenticator>
where
    V: IdentityVerifier + 'static,
{
    match pool {
        Some(pool) => Arc::new(AuthService::new(
            Arc::new(verifier),
            Arc::new(DieselDirectory::new(pool.clone())),
        )),
        None => Arc::new(FixtureAuthenticator),
    }
}

fn build_authenticator(
    identity: &IdentitySettings,
    pool: Option<&DbPool>,
) -> std::io::Result<Arc<dyn Authenticator>> {
    match identity {
        IdentitySettings::DevMock => Ok(authenticator_with(DevIdentityVerifier, pool)),
        IdentitySettings::Provider { endpoint, secret } => {
            let verifier =
                HttpIdentityVerifier::new(endpoint.clone(), secret.to_string(), IDENTITY_TIMEOUT)
                    .map_err(|err| std::io::Error::other(format!("identity client: {err}")))?;
            Ok(authenticator_with(verifier, pool))
        }
    }
}

/// Services backed by PostgreSQL.
fn persistence_ports(pool: &DbPool, auth: Arc<dyn Authenticator>) -> HttpStatePorts {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let directory = Arc::new(DieselDirectory::new(pool.clone()));
    let inventory = Arc::new(DieselInventoryRepository::new(pool.clone()));
    let activity_repo = Arc::new(DieselActivityRepository::new(pool.clone()));

    let orders = Arc::new(OrderService::new(
        Arc::new(DieselOrderRepository::new(pool.clone())),
        inventory.clone(),
        directory.clone(),
        clock.clone(),
    ));
    let reports = Arc::new(ReportService::new(
        Arc::new(DieselReportRepository::new(pool.clone())),
        directory,
        clock.clone(),
    ));
    let activity = Arc::new(ActivityService::new(activity_repo.clone(), clock.clone()));

    HttpStatePorts {
        auth,
        orders: orders.clone(),
        orders_query: orders,
        inventory: Arc::new(InventoryService::new(inventory)),
        reports: reports.clone(),
        reports_query: reports,
        activity: activity.clone(),
        activity_query: activity,
        archive: Arc::new(ArchiveService::new(
            Arc::new(DieselArchiveRepository::new(pool.clone())),
            clock.clone(),
        )),
        assignments: Arc::new(AssignmentService::new(
            Arc::new(DieselAssignmentRepository::new(pool.clone())),
            clock,
        )),
        dashboard: Arc::new(DashboardService::new(
            Arc::new(DieselDashboardRepository::new(pool.clone())),
            activity_repo,
        )),
    }
}

/// Build handler state: database-backed when a pool is configured, fixtures
/// otherwise.
pub(super) fn build_http_state(
    identity: &IdentitySettings,
    pool: Option<&DbPool>,
) -> std::io::Result<HttpState> {
    let auth = build_authenticator(identity, pool)?;
    let ports = match pool {
        Some(pool) => persistence_ports(pool, auth),
        None => {
            warn!("DATABASE_URL not set; serving fixture data");
            HttpStatePorts {
                auth,
                ..HttpStatePorts::default()
            }
        }
    };
    Ok(HttpState::new(ports).with_dev_mock_auth(identity.is_dev_mock()))
}
