//! Role hub scopes.
//!
//! Each role gets the same routes under its own prefix, gated by that role's
//! [`DashboardConfig`]:
//!
//! ```text
//! GET    /api/v1/{role}/dashboard[?code=CEN-010]
//! GET    /api/v1/{role}/dashboard/kpis
//! GET    /api/v1/{role}/orders
//! GET    /api/v1/{role}/activity?limit=50
//! DELETE /api/v1/{role}/activity  {"confirm":"CLEAR-LOGS","category":"order_created"}
//! GET    /api/v1/{role}/reports
//! ```
//!
//! Administrators may open any hub by passing the target account's `code`.

use actix_web::{HttpResponse, Scope, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::{
    Activity, Capability, ClearActivityRequest, ClearReport, DashboardConfig, DashboardFeature,
    DashboardSummary, HubContext, HubOrders, HubReports, Kpis, Role,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthContext;
use crate::inbound::http::envelope;
use crate::inbound::http::schemas::ErrorEnvelopeSchema;
use crate::inbound::http::state::HttpState;

/// Selects the account an administrator is looking at.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HubQuery {
    /// CKS code of the hub account. Ignored for hub users opening their own hub.
    pub code: Option<String>,
}

/// Paging for the recent activity feed.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecentActivityQuery {
    pub code: Option<String>,
    /// Defaults to 50, capped at 200.
    pub limit: Option<u32>,
}

/// Routes for one role's hub, mounted at `/{role}`.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use cks_backend::domain::{DashboardConfig, Role};
/// use cks_backend::inbound::http::hub::role_scope;
///
/// let _app = App::new().service(role_scope(DashboardConfig::for_role(Role::Crew)));
/// ```
pub fn role_scope(config: DashboardConfig) -> Scope {
    web::scope(&format!("/{}", config.role.as_str()))
        .app_data(web::Data::new(config))
        .route("/dashboard", web::get().to(dashboard))
        .route("/dashboard/kpis", web::get().to(dashboard_kpis))
        .route("/orders", web::get().to(hub_orders))
        .route("/activity", web::get().to(recent_activity))
        .route("/activity", web::delete().to(clear_activity))
        .route("/reports", web::get().to(hub_reports))
}

/// Scopes for every role, admin first.
pub fn all_role_scopes() -> impl Iterator<Item = Scope> {
    [Role::Admin]
        .into_iter()
        .chain(crate::domain::HUB_ROLES)
        .map(|role| role_scope(DashboardConfig::for_role(role)))
}

fn open_hub(
    config: &DashboardConfig,
    auth: &AuthContext,
    code: Option<&str>,
    extra: &[Capability],
) -> ApiResult<HubContext> {
    let principal = auth.require(&[config.capabilities.view])?;
    if !extra.is_empty() {
        auth.require(extra)?;
    }
    Ok(HubContext::resolve(*config, principal, code)?)
}

/// Hub summary with KPIs when enabled.
#[utoipa::path(
    get,
    path = "/api/v1/{role}/dashboard",
    params(("role" = Role, Path, description = "Hub role"), HubQuery),
    responses(
        (status = 200, description = "Summary", body = DashboardSummary),
        (status = 400, description = "Administrator omitted or mistyped the code", body = ErrorEnvelopeSchema),
        (status = 403, description = "Another role's or account's hub", body = ErrorEnvelopeSchema)
    ),
    tags = ["hub"],
    operation_id = "hubDashboard"
)]
pub async fn dashboard(
    state: web::Data<HttpState>,
    config: web::Data<DashboardConfig>,
    auth: AuthContext,
    query: web::Query<HubQuery>,
) -> ApiResult<HttpResponse> {
    let hub = open_hub(&config, &auth, query.code.as_deref(), &[])?;
    let summary = state.dashboard.summary(&hub).await?;
    Ok(envelope::ok(summary))
}

/// KPI snapshot.
#[utoipa::path(
    get,
    path = "/api/v1/{role}/dashboard/kpis",
    params(("role" = Role, Path, description = "Hub role"), HubQuery),
    responses(
        (status = 200, description = "KPIs", body = Kpis),
        (status = 404, description = "KPIs disabled for this hub", body = ErrorEnvelopeSchema)
    ),
    tags = ["hub"],
    operation_id = "hubKpis"
)]
pub async fn dashboard_kpis(
    state: web::Data<HttpState>,
    config: web::Data<DashboardConfig>,
    auth: AuthContext,
    query: web::Query<HubQuery>,
) -> ApiResult<HttpResponse> {
    let hub = open_hub(&config, &auth, query.code.as_deref(), &[])?;
    hub.require(DashboardFeature::Kpis)?;
    let kpis = state.dashboard.kpis(&hub).await?;
    Ok(envelope::ok(kpis))
}

/// Orders visible to the hub account.
#[utoipa::path(
    get,
    path = "/api/v1/{role}/orders",
    params(("role" = Role, Path, description = "Hub role"), HubQuery),
    responses(
        (status = 200, description = "Orders split by type", body = HubOrders),
        (status = 404, description = "Orders disabled for this hub", body = ErrorEnvelopeSchema)
    ),
    tags = ["hub"],
    operation_id = "hubOrders"
)]
pub async fn hub_orders(
    state: web::Data<HttpState>,
    config: web::Data<DashboardConfig>,
    auth: AuthContext,
    query: web::Query<HubQuery>,
) -> ApiResult<HttpResponse> {
    let hub = open_hub(&config, &auth, query.code.as_deref(), &[Capability::OrdersView])?;
    hub.require(DashboardFeature::Orders)?;
    let orders = state.orders_query.hub_orders(hub.viewer()).await?;
    Ok(envelope::ok(orders))
}

/// Newest activity in the hub's scope.
#[utoipa::path(
    get,
    path = "/api/v1/{role}/activity",
    params(("role" = Role, Path, description = "Hub role"), RecentActivityQuery),
    responses(
        (status = 200, description = "Recent activity", body = [Activity]),
        (status = 404, description = "Activity disabled for this hub", body = ErrorEnvelopeSchema)
    ),
    tags = ["hub"],
    operation_id = "hubActivity"
)]
pub async fn recent_activity(
    state: web::Data<HttpState>,
    config: web::Data<DashboardConfig>,
    auth: AuthContext,
    query: web::Query<RecentActivityQuery>,
) -> ApiResult<HttpResponse> {
    let hub = open_hub(&config, &auth, query.code.as_deref(), &[])?;
    hub.require(DashboardFeature::Activity)?;
    let activity = state.dashboard.recent_activity(&hub, query.limit).await?;
    Ok(envelope::ok(activity))
}

/// Delete the activity the hub can see.
#[utoipa::path(
    delete,
    path = "/api/v1/{role}/activity",
    params(("role" = Role, Path, description = "Hub role"), HubQuery),
    request_body = ClearActivityRequest,
    responses(
        (status = 200, description = "Rows cleared", body = ClearReport),
        (status = 400, description = "Confirmation mismatch", body = ErrorEnvelopeSchema),
        (status = 403, description = "Missing the manage capability", body = ErrorEnvelopeSchema),
        (status = 404, description = "Clearing disabled for this hub", body = ErrorEnvelopeSchema)
    ),
    tags = ["hub"],
    operation_id = "clearHubActivity"
)]
pub async fn clear_activity(
    state: web::Data<HttpState>,
    config: web::Data<DashboardConfig>,
    auth: AuthContext,
    query: web::Query<HubQuery>,
    payload: web::Json<ClearActivityRequest>,
) -> ApiResult<HttpResponse> {
    let hub = open_hub(
        &config,
        &auth,
        query.code.as_deref(),
        &[config.capabilities.manage],
    )?;
    hub.require(DashboardFeature::ClearActivity)?;
    let report = state
        .dashboard
        .clear_activity(&hub, auth.principal(), payload.into_inner())
        .await?;
    Ok(envelope::ok(report))
}

/// Reports and feedback visible to the hub account.
#[utoipa::path(
    get,
    path = "/api/v1/{role}/reports",
    params(("role" = Role, Path, description = "Hub role"), HubQuery),
    responses(
        (status = 200, description = "Tickets", body = HubReports),
        (status = 403, description = "Another role's or account's hub", body = ErrorEnvelopeSchema)
    ),
    tags = ["hub"],
    operation_id = "hubReports"
)]
pub async fn hub_reports(
    state: web::Data<HttpState>,
    config: web::Data<DashboardConfig>,
    auth: AuthContext,
    query: web::Query<HubQuery>,
) -> ApiResult<HttpResponse> {
    let hub = open_hub(&config, &auth, query.code.as_deref(), &[Capability::ReportsView])?;
    let reports = state.reports_query.hub_reports(hub.viewer()).await?;
    Ok(envelope::ok(reports))
}

#[cfg(test)]
#[path = "hub_tests.rs"]
mod tests;
