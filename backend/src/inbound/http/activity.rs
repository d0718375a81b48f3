//! Administrator audit log handlers.
//!
//! ```text
//! GET  /api/v1/system/activity?activityType=order_&dateFrom=...&limit=50&offset=0
//! GET  /api/v1/system/activity/statistics?days=30
//! GET  /api/v1/system/activity/history/{entity_type}/{entity_id}
//! GET  /api/v1/system/activity/tombstone/{entity_type}/{entity_id}
//! POST /api/v1/system/activity
//! POST /api/v1/system/activity/cleanup?days=90
//! POST /api/v1/system/activity/suspicious
//! ```

use actix_web::{HttpResponse, get, post, web};
use pagination::PageRequest;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::{
    Activity, ActivityDraft, ActivityFilter, ActivityReceipt, ActivityStatistics, Capability,
    CleanupReport, Error, SuspiciousReport, Tombstone,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthContext;
use crate::inbound::http::envelope;
use crate::inbound::http::schemas::ErrorEnvelopeSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_optional_rfc3339_timestamp};

/// Filters and paging for the activity listing.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct ActivityListQuery {
    /// Exact type, or a prefix when it ends in `_`.
    pub activity_type: Option<String>,
    pub actor_role: Option<String>,
    pub target_type: Option<String>,
    /// RFC 3339 lower bound, inclusive.
    pub date_from: Option<String>,
    /// RFC 3339 upper bound, inclusive.
    pub date_to: Option<String>,
    /// Matches description, target id or actor id.
    pub search: Option<String>,
    /// Defaults to 50, capped at 200.
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_owned())
        .filter(|raw| !raw.is_empty())
}

impl ActivityListQuery {
    fn into_parts(self) -> Result<(ActivityFilter, PageRequest), Error> {
        let page = PageRequest::new(self.limit, self.offset)
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        let filter = ActivityFilter {
            activity_type: non_blank(self.activity_type),
            actor_role: non_blank(self.actor_role),
            target_type: non_blank(self.target_type),
            date_from: parse_optional_rfc3339_timestamp(
                non_blank(self.date_from),
                FieldName::new("dateFrom"),
            )?,
            date_to: parse_optional_rfc3339_timestamp(
                non_blank(self.date_to),
                FieldName::new("dateTo"),
            )?,
            search: non_blank(self.search),
        };
        if let (Some(from), Some(to)) = (filter.date_from, filter.date_to)
            && from > to
        {
            return Err(Error::invalid_request("dateFrom must not be after dateTo"));
        }
        Ok((filter, page))
    }
}

/// Window for statistics and cleanup.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DaysQuery {
    pub days: Option<u32>,
}

/// Filtered, paginated audit log, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/system/activity",
    params(ActivityListQuery),
    responses(
        (status = 200, description = "Page of activities with the filters echoed back", body = Object),
        (status = 400, description = "Invalid timestamp or limit", body = ErrorEnvelopeSchema),
        (status = 403, description = "Missing audit:view", body = ErrorEnvelopeSchema)
    ),
    tags = ["activity"],
    operation_id = "listActivity"
)]
#[get("/system/activity")]
pub async fn list_activity(
    state: web::Data<HttpState>,
    auth: AuthContext,
    query: web::Query<ActivityListQuery>,
) -> ApiResult<HttpResponse> {
    auth.require(&[Capability::AuditView])?;
    let (filter, page) = query.into_inner().into_parts()?;
    let listing = state.activity_query.list(filter, page).await?;
    Ok(envelope::ok(listing))
}

/// Aggregate counts over a trailing window.
#[utoipa::path(
    get,
    path = "/api/v1/system/activity/statistics",
    params(DaysQuery),
    responses(
        (status = 200, description = "Statistics", body = ActivityStatistics),
        (status = 403, description = "Missing audit:view", body = ErrorEnvelopeSchema)
    ),
    tags = ["activity"],
    operation_id = "activityStatistics"
)]
#[get("/system/activity/statistics")]
pub async fn activity_statistics(
    state: web::Data<HttpState>,
    auth: AuthContext,
    query: web::Query<DaysQuery>,
) -> ApiResult<HttpResponse> {
    auth.require(&[Capability::AuditView])?;
    let stats = state.activity_query.statistics(query.days).await?;
    Ok(envelope::ok(stats))
}

/// Every activity that targeted one entity, oldest first.
#[utoipa::path(
    get,
    path = "/api/v1/system/activity/history/{entity_type}/{entity_id}",
    params(
        ("entity_type" = String, Path, description = "Target type such as order"),
        ("entity_id" = String, Path, description = "Target id")
    ),
    responses(
        (status = 200, description = "History", body = [Activity]),
        (status = 403, description = "Missing audit:view", body = ErrorEnvelopeSchema)
    ),
    tags = ["activity"],
    operation_id = "entityHistory"
)]
#[get("/system/activity/history/{entity_type}/{entity_id}")]
pub async fn entity_history(
    state: web::Data<HttpState>,
    auth: AuthContext,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    auth.require(&[Capability::AuditView])?;
    let (entity_type, entity_id) = path.into_inner();
    let history = state
        .activity_query
        .history(&entity_type, &entity_id)
        .await?;
    Ok(envelope::ok(history))
}

/// Snapshot captured when an entity was hard-deleted.
#[utoipa::path(
    get,
    path = "/api/v1/system/activity/tombstone/{entity_type}/{entity_id}",
    params(
        ("entity_type" = String, Path, description = "Entity type such as crew"),
        ("entity_id" = String, Path, description = "Entity id")
    ),
    responses(
        (status = 200, description = "Tombstone", body = Tombstone),
        (status = 404, description = "No deletion snapshot", body = ErrorEnvelopeSchema)
    ),
    tags = ["activity"],
    operation_id = "entityTombstone"
)]
#[get("/system/activity/tombstone/{entity_type}/{entity_id}")]
pub async fn entity_tombstone(
    state: web::Data<HttpState>,
    auth: AuthContext,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    auth.require(&[Capability::AuditView])?;
    let (entity_type, entity_id) = path.into_inner();
    let tombstone = state
        .activity_query
        .tombstone(&entity_type, &entity_id)
        .await?;
    Ok(envelope::ok(tombstone))
}

/// Append an activity on behalf of another system.
#[utoipa::path(
    post,
    path = "/api/v1/system/activity",
    request_body = ActivityDraft,
    responses(
        (status = 201, description = "Appended", body = ActivityReceipt),
        (status = 400, description = "Missing required fields", body = ErrorEnvelopeSchema),
        (status = 403, description = "Missing audit:manage", body = ErrorEnvelopeSchema)
    ),
    tags = ["activity"],
    operation_id = "logActivity"
)]
#[post("/system/activity")]
pub async fn log_activity(
    state: web::Data<HttpState>,
    auth: AuthContext,
    payload: web::Json<ActivityDraft>,
) -> ApiResult<HttpResponse> {
    auth.require(&[Capability::AuditManage])?;
    let receipt = state.activity.log(payload.into_inner()).await?;
    Ok(envelope::created(receipt))
}

/// Delete activity older than `days` (default 90).
#[utoipa::path(
    post,
    path = "/api/v1/system/activity/cleanup",
    params(DaysQuery),
    responses(
        (status = 200, description = "Rows removed", body = CleanupReport),
        (status = 403, description = "Missing audit:manage", body = ErrorEnvelopeSchema)
    ),
    tags = ["activity"],
    operation_id = "cleanupActivity"
)]
#[post("/system/activity/cleanup")]
pub async fn cleanup_activity(
    state: web::Data<HttpState>,
    auth: AuthContext,
    query: web::Query<DaysQuery>,
) -> ApiResult<HttpResponse> {
    auth.require(&[Capability::AuditManage])?;
    let report = state.activity.cleanup(query.days).await?;
    Ok(envelope::ok(report))
}

/// Scan the last day of activity for suspicious patterns.
#[utoipa::path(
    post,
    path = "/api/v1/system/activity/suspicious",
    responses(
        (status = 200, description = "Findings", body = SuspiciousReport),
        (status = 403, description = "Missing audit:manage", body = ErrorEnvelopeSchema)
    ),
    tags = ["activity"],
    operation_id = "detectSuspiciousActivity"
)]
#[post("/system/activity/suspicious")]
pub async fn detect_suspicious(
    state: web::Data<HttpState>,
    auth: AuthContext,
) -> ApiResult<HttpResponse> {
    auth.require(&[Capability::AuditManage])?;
    let report = state.activity.detect_suspicious().await?;
    Ok(envelope::ok(report))
}

#[cfg(test)]
#[path = "activity_tests.rs"]
mod tests;
