//! Tests for audit log handlers.

use super::*;
use crate::domain::Role;
use crate::domain::ports::{ActivityLogPage, MockActivityCommand, MockActivityQuery};
use crate::inbound::http::test_utils::{as_role, dev_state};
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test};
use chrono::{TimeZone, Utc};
use pagination::Page;
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
            .service(list_activity)
            .service(activity_statistics)
            .service(entity_history)
            .service(entity_tombstone)
            .service(log_activity)
            .service(cleanup_activity)
            .service(detect_suspicious),
    )
}

fn order_activity() -> Activity {
    Activity {
        activity_id: 41,
        activity_type: "order_created".to_owned(),
        description: "Created CEN-010-PO-001".to_owned(),
        actor_id: "CEN-010".to_owned(),
        actor_role: "center".to_owned(),
        target_id: Some("CEN-010-PO-001".to_owned()),
        target_type: Some("order".to_owned()),
        metadata: json!({}),
        created_at: Utc
            .with_ymd_and_hms(2025, 3, 14, 9, 30, 0)
            .single()
            .expect("valid timestamp"),
    }
}

#[actix_web::test]
async fn listing_parses_filters_and_paging() {
    let mut query = MockActivityQuery::new();
    query
        .expect_list()
        .withf(|filter, page| {
            filter.activity_type.as_deref() == Some("order_")
                && filter.date_from.is_some()
                && filter.search.is_none()
                && page.limit() == 10
                && page.offset() == 20
        })
        .times(1)
        .return_once(|filter, page| {
            Ok(ActivityLogPage {
                page: Page::new(vec![order_activity()], 21, page),
                filters: filter,
            })
        });
    let state = dev_state(|ports| ports.activity_query = Arc::new(query));
    let app = actix_test::init_service(test_app(state)).await;

    let request = as_role(
        actix_test::TestRequest::get().uri(
            "/api/v1/system/activity?activityType=order_&dateFrom=2025-03-01T00:00:00Z&search=%20&limit=10&offset=20",
        ),
        Role::Admin,
        None,
    )
    .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body.pointer("/data/total").and_then(Value::as_u64), Some(21));
    assert_eq!(
        body.pointer("/data/filters/activityType").and_then(Value::as_str),
        Some("order_")
    );
    assert_eq!(
        body.pointer("/data/items/0/activityId").and_then(Value::as_i64),
        Some(41)
    );
}

#[rstest]
#[case("/api/v1/system/activity?dateFrom=yesterday", Some("dateFrom"))]
#[case(
    "/api/v1/system/activity?dateFrom=2025-03-02T00:00:00Z&dateTo=2025-03-01T00:00:00Z",
    None
)]
#[case("/api/v1/system/activity?limit=0", None)]
#[actix_web::test]
async fn bad_listing_parameters_are_rejected(#[case] uri: &str, #[case] field: Option<&str>) {
    let mut query = MockActivityQuery::new();
    query.expect_list().never();
    let state = dev_state(|ports| ports.activity_query = Arc::new(query));
    let app = actix_test::init_service(test_app(state)).await;

    let request = as_role(actix_test::TestRequest::get().uri(uri), Role::Admin, None).to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(
        body.pointer("/error/details/field").and_then(Value::as_str),
        field
    );
}

#[rstest]
#[case(Role::Manager, "MGR-012")]
#[case(Role::Warehouse, "WHS-001")]
#[actix_web::test]
async fn hub_users_cannot_read_the_audit_log(#[case] role: Role, #[case] code: &str) {
    let app = actix_test::init_service(test_app(dev_state(|_| {}))).await;
    let request = as_role(
        actix_test::TestRequest::get().uri("/api/v1/system/activity/statistics"),
        role,
        Some(code),
    )
    .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn history_passes_both_path_segments() {
    let mut query = MockActivityQuery::new();
    query
        .expect_history()
        .withf(|entity_type, entity_id| entity_type == "order" && entity_id == "CEN-010-PO-001")
        .times(1)
        .return_once(|_, _| Ok(vec![order_activity()]));
    let state = dev_state(|ports| ports.activity_query = Arc::new(query));
    let app = actix_test::init_service(test_app(state)).await;

    let request = as_role(
        actix_test::TestRequest::get()
            .uri("/api/v1/system/activity/history/order/CEN-010-PO-001"),
        Role::Admin,
        None,
    )
    .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body.pointer("/data").and_then(Value::as_array).map(Vec::len), Some(1));
}

#[actix_web::test]
async fn cleanup_forwards_the_window() {
    let mut command = MockActivityCommand::new();
    command
        .expect_cleanup()
        .withf(|days| *days == Some(30))
        .times(1)
        .return_once(|_| {
            Ok(CleanupReport {
                deleted_count: 7,
                days_threshold: 30,
            })
        });
    let state = dev_state(|ports| ports.activity = Arc::new(command));
    let app = actix_test::init_service(test_app(state)).await;

    let request = as_role(
        actix_test::TestRequest::post().uri("/api/v1/system/activity/cleanup?days=30"),
        Role::Admin,
        None,
    )
    .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body.pointer("/data/deletedCount").and_then(Value::as_u64), Some(7));
}

#[actix_web::test]
async fn logging_returns_the_receipt() {
    let mut command = MockActivityCommand::new();
    command
        .expect_log()
        .withf(|draft| draft.activity_type == "system_notice" && draft.actor_id == "SYSTEM")
        .times(1)
        .return_once(|_| {
            Ok(ActivityReceipt {
                activity_id: 99,
                created_at: Utc
                    .with_ymd_and_hms(2025, 3, 14, 10, 0, 0)
                    .single()
                    .expect("valid timestamp"),
            })
        });
    let state = dev_state(|ports| ports.activity = Arc::new(command));
    let app = actix_test::init_service(test_app(state)).await;

    let request = as_role(
        actix_test::TestRequest::post().uri("/api/v1/system/activity"),
        Role::Admin,
        None,
    )
    .set_json(json!({
        "activityType": "system_notice",
        "description": "Maintenance window",
        "actorId": "SYSTEM",
        "actorRole": "system",
        "targetId": null,
        "targetType": null,
        "metadata": {}
    }))
    .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body.pointer("/data/activityId").and_then(Value::as_i64), Some(99));
}
