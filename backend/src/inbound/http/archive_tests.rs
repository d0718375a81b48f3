//! Tests for archive administration handlers.

use super::*;
use crate::domain::ports::MockArchiveCommand;
use crate::domain::{Error, Role};
use crate::inbound::http::test_utils::{as_role, dev_state};
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test};
use chrono::{Duration, TimeZone, Utc};
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
            .service(list_archived)
            .service(purge_expired)
            .service(archive_entity)
            .service(restore_entity)
            .service(archive_relationships)
            .service(hard_delete_entity),
    )
}

fn admin(request: actix_test::TestRequest) -> actix_test::TestRequest {
    as_role(request, Role::Admin, None)
}

#[actix_web::test]
async fn archiving_forwards_entity_and_reason() {
    let mut archive = MockArchiveCommand::new();
    archive
        .expect_archive()
        .withf(|_, entity, id, reason| {
            *entity == ArchiveEntity::Crew
                && id == "CRW-004"
                && reason.as_deref() == Some("Left the company")
        })
        .times(1)
        .return_once(|_, entity, id, reason| {
            let at = Utc
                .with_ymd_and_hms(2025, 3, 14, 9, 0, 0)
                .single()
                .expect("valid timestamp");
            Ok(ArchiveOutcome {
                entity_type: entity,
                entity_id: id.to_owned(),
                archived_at: at,
                deletion_scheduled: at + Duration::days(30),
                reason: reason.unwrap_or_default(),
                unassigned_children: 0,
            })
        });
    let state = dev_state(|ports| ports.archive = Arc::new(archive));
    let app = actix_test::init_service(test_app(state)).await;

    let request = admin(actix_test::TestRequest::post().uri("/api/v1/system/archive/crew/CRW-004"))
        .set_json(json!({"reason": "Left the company"}))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(
        body.pointer("/data/entityType").and_then(Value::as_str),
        Some("crew")
    );
    assert_eq!(
        body.pointer("/data/deletionScheduled").and_then(Value::as_str),
        Some("2025-04-13T09:00:00Z")
    );
}

#[actix_web::test]
async fn unknown_entity_types_are_rejected() {
    let mut archive = MockArchiveCommand::new();
    archive.expect_restore().never();
    let state = dev_state(|ports| ports.archive = Arc::new(archive));
    let app = actix_test::init_service(test_app(state)).await;

    let request = admin(
        actix_test::TestRequest::post().uri("/api/v1/system/archive/vehicle/VEH-001/restore"),
    )
    .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(
        body.pointer("/error/details/value").and_then(Value::as_str),
        Some("vehicle")
    );
}

#[rstest]
#[case(None, false)]
#[case(Some(json!({"confirm": false})), false)]
#[case(Some(json!({"confirm": true})), true)]
#[actix_web::test]
async fn hard_delete_reads_confirmation(#[case] body: Option<Value>, #[case] confirm: bool) {
    let mut archive = MockArchiveCommand::new();
    archive
        .expect_hard_delete()
        .withf(move |_, entity, id, flag| {
            *entity == ArchiveEntity::Center && id == "CEN-010" && *flag == confirm
        })
        .times(1)
        .returning(|_, _, _, flag| {
            if flag {
                Ok(())
            } else {
                Err(Error::invalid_request(
                    "Hard delete requires explicit confirmation",
                ))
            }
        });
    let state = dev_state(|ports| ports.archive = Arc::new(archive));
    let app = actix_test::init_service(test_app(state)).await;

    let mut request =
        admin(actix_test::TestRequest::delete().uri("/api/v1/system/archive/center/CEN-010"));
    if let Some(body) = body {
        request = request.set_json(body);
    }
    let response = actix_test::call_service(&app, request.to_request()).await;

    let expected = if confirm {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::BAD_REQUEST
    };
    assert_eq!(response.status(), expected);
}

#[actix_web::test]
async fn listing_parses_the_type_filter() {
    let mut archive = MockArchiveCommand::new();
    archive
        .expect_list_archived()
        .withf(|entity, limit| *entity == Some(ArchiveEntity::Order) && *limit == Some(5))
        .times(1)
        .return_once(|_, _| Ok(Vec::new()));
    let state = dev_state(|ports| ports.archive = Arc::new(archive));
    let app = actix_test::init_service(test_app(state)).await;

    let request =
        admin(actix_test::TestRequest::get().uri("/api/v1/system/archive?entityType=order&limit=5"))
            .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[actix_web::test]
async fn purge_reaches_its_own_route() {
    let mut archive = MockArchiveCommand::new();
    archive
        .expect_purge_expired()
        .times(1)
        .return_once(|_| Ok(PurgeReport { deleted: 3 }));
    archive.expect_archive().never();
    let state = dev_state(|ports| ports.archive = Arc::new(archive));
    let app = actix_test::init_service(test_app(state)).await;

    let request = admin(actix_test::TestRequest::post().uri("/api/v1/system/archive/purge"))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body.pointer("/data/deleted").and_then(Value::as_u64), Some(3));
}

#[actix_web::test]
async fn managers_cannot_archive() {
    let mut archive = MockArchiveCommand::new();
    archive.expect_archive().never();
    let state = dev_state(|ports| ports.archive = Arc::new(archive));
    let app = actix_test::init_service(test_app(state)).await;

    let request = as_role(
        actix_test::TestRequest::post().uri("/api/v1/system/archive/crew/CRW-004"),
        Role::Manager,
        Some("MGR-012"),
    )
    .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
