//! Tests for report and feedback handlers.

use super::*;
use crate::domain::ports::MockReportCommand;
use crate::domain::{Error, ReportStatus, Role};
use crate::inbound::http::test_utils::{as_role, dev_state};
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test};
use chrono::{TimeZone, Utc};
use rstest::rstest;
use serde_json::{Value, json};
use std::sync::Arc;

fn test_app(
    state: HttpState,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new().app_data(web::Data::new(state)).service(
        web::scope("/api/v1")
            .service(create_report)
            .service(create_feedback)
            .service(update_report_status)
            .service(resolve_report)
            .service(acknowledge_report)
            .service(acknowledge_feedback),
    )
}

fn report(status: ReportStatus) -> Report {
    let at = Utc
        .with_ymd_and_hms(2025, 3, 14, 9, 30, 0)
        .single()
        .expect("valid timestamp");
    Report {
        report_id: "RPT-004".to_owned(),
        report_type: "safety".to_owned(),
        severity: "high".to_owned(),
        title: "Broken lock".to_owned(),
        description: "Rear door".to_owned(),
        center_id: Some("CEN-010".to_owned()),
        customer_id: None,
        status,
        created_by_role: Role::Center,
        created_by_id: "CEN-010".to_owned(),
        cks_manager: Some("MGR-012".to_owned()),
        resolution_notes: None,
        resolved_by: None,
        resolved_at: None,
        created_at: at,
        updated_at: at,
        archived_at: None,
        acknowledgments: Vec::new(),
    }
}

#[actix_web::test]
async fn filing_a_report_returns_201() {
    let mut reports = MockReportCommand::new();
    reports
        .expect_create_report()
        .withf(|principal, request| {
            principal.code() == Some("CEN-010") && request.title == "Broken lock"
        })
        .times(1)
        .return_once(|_, _| Ok(report(ReportStatus::Open)));
    let state = dev_state(|ports| ports.reports = Arc::new(reports));
    let app = actix_test::init_service(test_app(state)).await;

    let request = as_role(
        actix_test::TestRequest::post().uri("/api/v1/reports"),
        Role::Center,
        Some("CEN-010"),
    )
    .set_json(json!({"type": "safety", "title": "Broken lock", "description": "Rear door"}))
    .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(
        body.pointer("/data/reportId").and_then(Value::as_str),
        Some("RPT-004")
    );
    assert_eq!(body.pointer("/data/status").and_then(Value::as_str), Some("open"));
}

#[rstest]
#[case("in-progress", ReportStatus::InProgress)]
#[case("in_progress", ReportStatus::InProgress)]
#[case("CLOSED", ReportStatus::Closed)]
#[actix_web::test]
async fn status_updates_accept_both_spellings(
    #[case] raw: &str,
    #[case] expected: ReportStatus,
) {
    let mut reports = MockReportCommand::new();
    reports
        .expect_update_status()
        .withf(move |_, id, status| id == "RPT-004" && *status == expected)
        .times(1)
        .returning(move |_, _, status| Ok(report(status)));
    let state = dev_state(|ports| ports.reports = Arc::new(reports));
    let app = actix_test::init_service(test_app(state)).await;

    let request = as_role(
        actix_test::TestRequest::patch().uri("/api/v1/reports/RPT-004/status"),
        Role::Manager,
        Some("MGR-012"),
    )
    .set_json(json!({"status": raw}))
    .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[actix_web::test]
async fn unknown_status_is_rejected_before_the_service() {
    let mut reports = MockReportCommand::new();
    reports.expect_update_status().never();
    let state = dev_state(|ports| ports.reports = Arc::new(reports));
    let app = actix_test::init_service(test_app(state)).await;

    let request = as_role(
        actix_test::TestRequest::patch().uri("/api/v1/reports/RPT-004/status"),
        Role::Manager,
        Some("MGR-012"),
    )
    .set_json(json!({"status": "archived"}))
    .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(
        body.pointer("/error/details/field").and_then(Value::as_str),
        Some("status")
    );
}

#[rstest]
#[case(Role::Contractor, "CON-003")]
#[case(Role::Crew, "CRW-004")]
#[actix_web::test]
async fn only_managers_resolve(#[case] role: Role, #[case] code: &str) {
    let mut reports = MockReportCommand::new();
    reports.expect_resolve().never();
    let state = dev_state(|ports| ports.reports = Arc::new(reports));
    let app = actix_test::init_service(test_app(state)).await;

    let request = as_role(
        actix_test::TestRequest::post().uri("/api/v1/reports/RPT-004/resolve"),
        role,
        Some(code),
    )
    .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn resolve_forwards_notes() {
    let mut reports = MockReportCommand::new();
    reports
        .expect_resolve()
        .withf(|_, id, notes| id == "RPT-004" && notes.as_deref() == Some("Lock replaced"))
        .times(1)
        .return_once(|_, _, notes| {
            let mut closed = report(ReportStatus::Closed);
            closed.resolution_notes = notes;
            Ok(closed)
        });
    let state = dev_state(|ports| ports.reports = Arc::new(reports));
    let app = actix_test::init_service(test_app(state)).await;

    let request = as_role(
        actix_test::TestRequest::post().uri("/api/v1/reports/RPT-004/resolve"),
        Role::Manager,
        Some("MGR-012"),
    )
    .set_json(json!({"notes": "Lock replaced"}))
    .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(
        body.pointer("/data/resolutionNotes").and_then(Value::as_str),
        Some("Lock replaced")
    );
}

#[rstest]
#[case("/api/v1/reports/RPT-004/acknowledge", ReportKind::Report, "RPT-004")]
#[case("/api/v1/feedback/FBK-002/acknowledge", ReportKind::Feedback, "FBK-002")]
#[actix_web::test]
async fn acknowledgements_route_by_kind(
    #[case] uri: &str,
    #[case] kind: ReportKind,
    #[case] id: &'static str,
) {
    let mut reports = MockReportCommand::new();
    reports
        .expect_acknowledge()
        .withf(move |_, k, item| *k == kind && item == id)
        .times(1)
        .return_once(|_, _, _| Ok(AckOutcome { created: false }));
    let state = dev_state(|ports| ports.reports = Arc::new(reports));
    let app = actix_test::init_service(test_app(state)).await;

    let request = as_role(actix_test::TestRequest::post().uri(uri), Role::Crew, Some("CRW-004"))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body.pointer("/data/created"), Some(&Value::Bool(false)));
}

#[actix_web::test]
async fn archived_tickets_surface_as_404() {
    let mut reports = MockReportCommand::new();
    reports
        .expect_acknowledge()
        .return_once(|_, _, _| Err(Error::not_found("Report not found")));
    let state = dev_state(|ports| ports.reports = Arc::new(reports));
    let app = actix_test::init_service(test_app(state)).await;

    let request = as_role(
        actix_test::TestRequest::post().uri("/api/v1/reports/RPT-099/acknowledge"),
        Role::Manager,
        Some("MGR-012"),
    )
    .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
