//! Report and feedback HTTP handlers.
//!
//! ```text
//! POST  /api/v1/reports
//! PATCH /api/v1/reports/{report_id}/status   {"status":"in-progress"}
//! POST  /api/v1/reports/{report_id}/resolve  {"notes":"Lock replaced"}
//! POST  /api/v1/reports/{report_id}/acknowledge
//! POST  /api/v1/feedback
//! POST  /api/v1/feedback/{feedback_id}/acknowledge
//! ```

use actix_web::{HttpResponse, patch, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    AckOutcome, Capability, CreateFeedbackRequest, CreateReportRequest, Feedback, Report,
    ReportKind,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthContext;
use crate::inbound::http::envelope;
use crate::inbound::http::schemas::ErrorEnvelopeSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_report_status, require_text};

/// Body of the status update.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportStatusBody {
    /// `open`, `in-progress` or `closed`.
    #[schema(example = "in-progress")]
    pub status: Option<String>,
}

/// Body of the resolve call.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolveReportBody {
    #[serde(default)]
    pub notes: Option<String>,
}

/// File a report.
#[utoipa::path(
    post,
    path = "/api/v1/reports",
    request_body = CreateReportRequest,
    responses(
        (status = 201, description = "Report filed", body = Report),
        (status = 400, description = "Missing title or description", body = ErrorEnvelopeSchema),
        (status = 403, description = "Missing reports:create", body = ErrorEnvelopeSchema)
    ),
    tags = ["reports"],
    operation_id = "createReport"
)]
#[post("/reports")]
pub async fn create_report(
    state: web::Data<HttpState>,
    auth: AuthContext,
    payload: web::Json<CreateReportRequest>,
) -> ApiResult<HttpResponse> {
    let principal = auth.require(&[Capability::ReportsCreate])?;
    let report = state
        .reports
        .create_report(principal, payload.into_inner())
        .await?;
    Ok(envelope::created(report))
}

/// Leave feedback.
#[utoipa::path(
    post,
    path = "/api/v1/feedback",
    request_body = CreateFeedbackRequest,
    responses(
        (status = 201, description = "Feedback recorded", body = Feedback),
        (status = 400, description = "Missing title or message", body = ErrorEnvelopeSchema),
        (status = 403, description = "Missing reports:create", body = ErrorEnvelopeSchema)
    ),
    tags = ["reports"],
    operation_id = "createFeedback"
)]
#[post("/feedback")]
pub async fn create_feedback(
    state: web::Data<HttpState>,
    auth: AuthContext,
    payload: web::Json<CreateFeedbackRequest>,
) -> ApiResult<HttpResponse> {
    let principal = auth.require(&[Capability::ReportsCreate])?;
    let feedback = state
        .reports
        .create_feedback(principal, payload.into_inner())
        .await?;
    Ok(envelope::created(feedback))
}

/// Move a report between open, in-progress and closed.
#[utoipa::path(
    patch,
    path = "/api/v1/reports/{report_id}/status",
    params(("report_id" = String, Path, description = "Report id such as RPT-004")),
    request_body = ReportStatusBody,
    responses(
        (status = 200, description = "Updated report", body = Report),
        (status = 400, description = "Unknown status", body = ErrorEnvelopeSchema),
        (status = 404, description = "Unknown or archived report", body = ErrorEnvelopeSchema)
    ),
    tags = ["reports"],
    operation_id = "updateReportStatus"
)]
#[patch("/reports/{report_id}/status")]
pub async fn update_report_status(
    state: web::Data<HttpState>,
    auth: AuthContext,
    path: web::Path<String>,
    payload: web::Json<ReportStatusBody>,
) -> ApiResult<HttpResponse> {
    let principal = auth.require(&[Capability::ReportsManage])?;
    let field = FieldName::new("status");
    let raw = require_text(payload.into_inner().status, field)?;
    let status = parse_report_status(&raw, field)?;
    let report = state
        .reports
        .update_status(principal, &path, status)
        .await?;
    Ok(envelope::ok(report))
}

/// Close a report with resolution notes.
#[utoipa::path(
    post,
    path = "/api/v1/reports/{report_id}/resolve",
    params(("report_id" = String, Path, description = "Report id")),
    request_body = ResolveReportBody,
    responses(
        (status = 200, description = "Resolved report", body = Report),
        (status = 404, description = "Unknown or archived report", body = ErrorEnvelopeSchema),
        (status = 409, description = "Already closed", body = ErrorEnvelopeSchema)
    ),
    tags = ["reports"],
    operation_id = "resolveReport"
)]
#[post("/reports/{report_id}/resolve")]
pub async fn resolve_report(
    state: web::Data<HttpState>,
    auth: AuthContext,
    path: web::Path<String>,
    payload: Option<web::Json<ResolveReportBody>>,
) -> ApiResult<HttpResponse> {
    let principal = auth.require(&[Capability::ReportsManage])?;
    let notes = payload.and_then(|body| body.into_inner().notes);
    let report = state.reports.resolve(principal, &path, notes).await?;
    Ok(envelope::ok(report))
}

async fn acknowledge(
    state: &HttpState,
    auth: &AuthContext,
    kind: ReportKind,
    item_id: &str,
) -> ApiResult<HttpResponse> {
    let principal = auth.require(&[Capability::ReportsView])?;
    let outcome = state.reports.acknowledge(principal, kind, item_id).await?;
    Ok(envelope::ok(outcome))
}

/// Acknowledge a report. Repeating the call is a no-op.
#[utoipa::path(
    post,
    path = "/api/v1/reports/{report_id}/acknowledge",
    params(("report_id" = String, Path, description = "Report id")),
    responses(
        (status = 200, description = "`created` is false when already acknowledged", body = AckOutcome),
        (status = 404, description = "Unknown or archived report", body = ErrorEnvelopeSchema)
    ),
    tags = ["reports"],
    operation_id = "acknowledgeReport"
)]
#[post("/reports/{report_id}/acknowledge")]
pub async fn acknowledge_report(
    state: web::Data<HttpState>,
    auth: AuthContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    acknowledge(&state, &auth, ReportKind::Report, &path).await
}

/// Acknowledge feedback. Repeating the call is a no-op.
#[utoipa::path(
    post,
    path = "/api/v1/feedback/{feedback_id}/acknowledge",
    params(("feedback_id" = String, Path, description = "Feedback id such as FBK-002")),
    responses(
        (status = 200, description = "`created` is false when already acknowledged", body = AckOutcome),
        (status = 404, description = "Unknown or archived feedback", body = ErrorEnvelopeSchema)
    ),
    tags = ["reports"],
    operation_id = "acknowledgeFeedback"
)]
#[post("/feedback/{feedback_id}/acknowledge")]
pub async fn acknowledge_feedback(
    state: web::Data<HttpState>,
    auth: AuthContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    acknowledge(&state, &auth, ReportKind::Feedback, &path).await
}

#[cfg(test)]
#[path = "reports_tests.rs"]
mod tests;
