//! Tests for order HTTP handlers.

use super::*;
use crate::domain::order::test_fixtures::{product_order, service_order};
use crate::domain::ports::{MockOrderCommand, MockOrderQuery};
use crate::domain::{Error, OrderStatus, Role, ViewerStatus};
use crate::inbound::http::test_utils::{as_role, dev_state};
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test};
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
            .service(create_order)
            .service(get_order)
            .service(apply_order_action),
    )
}

fn order_payload() -> Value {
    json!({
        "orderType": "product",
        "items": [{"catalogItemCode": "PRD-009", "quantity": 5}]
    })
}

#[actix_web::test]
async fn create_order_returns_201_envelope() {
    let mut orders = MockOrderCommand::new();
    orders
        .expect_create()
        .withf(|principal, request| {
            principal.code() == Some("CEN-010") && request.items.len() == 1
        })
        .times(1)
        .return_once(|_, _| {
            Ok(OrderView {
                order: product_order(OrderStatus::PendingWarehouse),
                viewer_status: ViewerStatus::InProgress,
            })
        });
    let state = dev_state(|ports| ports.orders = Arc::new(orders));
    let app = actix_test::init_service(test_app(state)).await;

    let request = as_role(
        actix_test::TestRequest::post().uri("/api/v1/orders"),
        Role::Center,
        Some("CEN-010"),
    )
    .set_json(order_payload())
    .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(
        body.pointer("/data/orderId").and_then(Value::as_str),
        Some("CEN-010-PO-001")
    );
    assert_eq!(
        body.pointer("/data/viewerStatus").and_then(Value::as_str),
        Some("in-progress")
    );
}

#[actix_web::test]
async fn warehouses_cannot_create_orders() {
    let mut orders = MockOrderCommand::new();
    orders.expect_create().never();
    let state = dev_state(|ports| ports.orders = Arc::new(orders));
    let app = actix_test::init_service(test_app(state)).await;

    let request = as_role(
        actix_test::TestRequest::post().uri("/api/v1/orders"),
        Role::Warehouse,
        Some("WHS-001"),
    )
    .set_json(order_payload())
    .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(
        body.pointer("/error/details/missing/0").and_then(Value::as_str),
        Some("orders:create")
    );
}

#[actix_web::test]
async fn get_order_passes_the_path_id() {
    let mut query = MockOrderQuery::new();
    query
        .expect_get_order()
        .withf(|_, id| id == "CEN-010-SO-002")
        .times(1)
        .return_once(|_, _| {
            Ok(OrderView {
                order: service_order(OrderStatus::PendingCrew, Some((Role::Crew, "CRW-004"))),
                viewer_status: ViewerStatus::Pending,
            })
        });
    let state = dev_state(|ports| ports.orders_query = Arc::new(query));
    let app = actix_test::init_service(test_app(state)).await;

    let request = as_role(
        actix_test::TestRequest::get().uri("/api/v1/orders/CEN-010-SO-002"),
        Role::Crew,
        Some("CRW-004"),
    )
    .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(
        body.pointer("/data/viewerStatus").and_then(Value::as_str),
        Some("pending")
    );
}

#[actix_web::test]
async fn conflicting_actions_surface_as_409() {
    let mut orders = MockOrderCommand::new();
    orders
        .expect_apply_action()
        .withf(|_, id, request| id == "CEN-010-PO-001" && request.action == OrderAction::Deliver)
        .return_once(|_, _, _| Err(Error::conflict("Order is already final")));
    let state = dev_state(|ports| ports.orders = Arc::new(orders));
    let app = actix_test::init_service(test_app(state)).await;

    let request = as_role(
        actix_test::TestRequest::post().uri("/api/v1/orders/CEN-010-PO-001/actions"),
        Role::Warehouse,
        Some("WHS-001"),
    )
    .set_json(json!({"action": "deliver"}))
    .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(
        body.pointer("/error/message").and_then(Value::as_str),
        Some("Order is already final")
    );
}

#[rstest]
#[case(OrderAction::Cancel, Role::Crew, true)]
#[case(OrderAction::CreateService, Role::Manager, true)]
#[case(OrderAction::CreateService, Role::Center, false)]
#[case(OrderAction::Accept, Role::Warehouse, true)]
fn action_capabilities_follow_role_grants(
    #[case] action: OrderAction,
    #[case] role: Role,
    #[case] allowed: bool,
) {
    let all_held = action_capabilities(action)
        .iter()
        .all(|cap| crate::domain::has_capability(role, *cap));
    assert_eq!(all_held, allowed);
}

#[actix_web::test]
async fn unknown_actions_are_rejected_before_the_service() {
    let mut orders = MockOrderCommand::new();
    orders.expect_apply_action().never();
    let state = dev_state(|ports| ports.orders = Arc::new(orders));
    let app = actix_test::init_service(test_app(state)).await;

    let request = as_role(
        actix_test::TestRequest::post().uri("/api/v1/orders/CEN-010-PO-001/actions"),
        Role::Warehouse,
        Some("WHS-001"),
    )
    .set_json(json!({"action": "teleport"}))
    .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
