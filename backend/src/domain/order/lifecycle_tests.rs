//! Transition table and visibility tests.

use chrono::Duration;
use rstest::rstest;

use super::*;
use crate::domain::ErrorCode;
use crate::domain::order::test_fixtures::{fixture_now, product_order, service_order};

fn request(action: OrderAction) -> OrderActionRequest {
    OrderActionRequest {
        action,
        notes: None,
        transformed_id: None,
    }
}

fn plan(order: &Order, who: &Principal, action: OrderAction) -> Result<OrderChange, Error> {
    plan_transition(order, who, &request(action), fixture_now())
}

fn warehouse() -> Principal {
    Principal::hub(Role::Warehouse, "WHS-001")
}

#[rstest]
fn warehouse_accepts_pending_product_order() {
    let order = product_order(OrderStatus::PendingWarehouse);
    let change = plan(&order, &warehouse(), OrderAction::Accept).expect("accepted");
    assert_eq!(change.expected_status, OrderStatus::PendingWarehouse);
    assert_eq!(change.status, OrderStatus::AwaitingDelivery);
    assert_eq!(change.assigned_warehouse.as_deref(), Some("WHS-001"));
    assert_eq!(change.actor.participant_id, "WHS-001");
    assert_eq!(change.actor.participation_type, ParticipationType::Actor);
}

#[rstest]
fn other_warehouse_cannot_accept() {
    let order = product_order(OrderStatus::PendingWarehouse);
    let error = plan(&order, &Principal::hub(Role::Warehouse, "WHS-002"), OrderAction::Accept)
        .expect_err("wrong warehouse");
    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[rstest]
fn center_cannot_accept_product_order() {
    let order = product_order(OrderStatus::PendingWarehouse);
    let error = plan(&order, &Principal::hub(Role::Center, "CEN-010"), OrderAction::Accept)
        .expect_err("role");
    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[rstest]
fn accept_in_wrong_status_conflicts() {
    let order = product_order(OrderStatus::AwaitingDelivery);
    let error = plan(&order, &warehouse(), OrderAction::Accept).expect_err("status");
    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[rstest]
fn deliver_sets_delivery_date() {
    let order = product_order(OrderStatus::AwaitingDelivery);
    let change = plan(&order, &warehouse(), OrderAction::Deliver).expect("delivered");
    assert_eq!(change.status, OrderStatus::Delivered);
    assert_eq!(change.delivery_date, Some(fixture_now()));
    assert_eq!(change.next_actor_role, None);
}

#[rstest]
fn deliver_rejects_service_orders() {
    let order = service_order(OrderStatus::ServiceInProgress, Some((Role::Crew, "CRW-004")));
    let error = plan(&order, &warehouse(), OrderAction::Deliver).expect_err("type");
    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[rstest]
#[case(OrderStatus::PendingManager, Role::Manager, "MGR-001", OrderStatus::PendingContractor, Some("CON-001"))]
#[case(OrderStatus::PendingContractor, Role::Contractor, "CON-001", OrderStatus::PendingCrew, Some("CRW-004"))]
#[case(OrderStatus::PendingCrew, Role::Crew, "CRW-004", OrderStatus::ServiceInProgress, Some("CRW-004"))]
fn service_accept_chain(
    #[case] from: OrderStatus,
    #[case] role: Role,
    #[case] code: &str,
    #[case] to: OrderStatus,
    #[case] next_code: Option<&str>,
) {
    let order = service_order(from, Some((role, code)));
    let change = plan(&order, &Principal::hub(role, code), OrderAction::Accept).expect("accepted");
    assert_eq!(change.status, to);
    assert_eq!(change.next_actor_code.as_deref(), next_code);
}

#[rstest]
fn contractor_cannot_accept_for_the_manager() {
    let order = service_order(OrderStatus::PendingManager, Some((Role::Manager, "MGR-001")));
    let error = plan(&order, &Principal::hub(Role::Contractor, "CON-001"), OrderAction::Accept)
        .expect_err("not next actor");
    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[rstest]
fn reject_requires_notes() {
    let order = product_order(OrderStatus::PendingWarehouse);
    let error = plan(&order, &warehouse(), OrderAction::Reject).expect_err("notes");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[rstest]
fn reject_records_reason() {
    let order = product_order(OrderStatus::PendingWarehouse);
    let mut req = request(OrderAction::Reject);
    req.notes = Some("  out of stock ".to_owned());
    let change = plan_transition(&order, &warehouse(), &req, fixture_now()).expect("rejected");
    assert_eq!(change.status, OrderStatus::Rejected);
    assert_eq!(change.rejection_reason.as_deref(), Some("out of stock"));
}

#[rstest]
fn reject_by_non_actor_is_forbidden_before_notes_check() {
    let order = product_order(OrderStatus::PendingWarehouse);
    let error = plan(&order, &Principal::hub(Role::Crew, "CRW-004"), OrderAction::Reject)
        .expect_err("forbidden");
    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[rstest]
#[case(Role::Crew, "CRW-004")]
#[case(Role::Manager, "MGR-001")]
fn complete_by_crew_or_manager(#[case] role: Role, #[case] code: &str) {
    let order = service_order(OrderStatus::ServiceInProgress, Some((Role::Crew, "CRW-004")));
    let change = plan(&order, &Principal::hub(role, code), OrderAction::Complete).expect("done");
    assert_eq!(change.status, OrderStatus::ServiceCompleted);
}

#[rstest]
fn only_creator_cancels() {
    let order = product_order(OrderStatus::AwaitingDelivery);
    let error = plan(&order, &warehouse(), OrderAction::Cancel).expect_err("not creator");
    assert_eq!(error.code(), ErrorCode::Forbidden);

    let change = plan(&order, &Principal::hub(Role::Center, "cen-010"), OrderAction::Cancel)
        .expect("creator cancels");
    assert_eq!(change.status, OrderStatus::Cancelled);
}

#[rstest]
fn create_service_generates_id_and_keeps_status() {
    let order = service_order(OrderStatus::PendingContractor, Some((Role::Contractor, "CON-001")));
    let change = plan(&order, &Principal::hub(Role::Manager, "MGR-001"), OrderAction::CreateService)
        .expect("transformed");
    assert_eq!(change.status, OrderStatus::PendingContractor);
    assert_eq!(
        change.transformed_id,
        Some(format!("SVC-{}", fixture_now().timestamp_millis()))
    );
}

#[rstest]
fn create_service_keeps_supplied_id() {
    let order = service_order(OrderStatus::PendingManager, Some((Role::Manager, "MGR-001")));
    let mut req = request(OrderAction::CreateService);
    req.transformed_id = Some("SVC-42".to_owned());
    let change = plan_transition(&order, &Principal::hub(Role::Manager, "MGR-001"), &req, fixture_now())
        .expect("transformed");
    assert_eq!(change.transformed_id.as_deref(), Some("SVC-42"));
}

#[rstest]
fn admin_bypasses_roles_but_not_status() {
    let admin = Principal::admin(None);
    let order = product_order(OrderStatus::PendingWarehouse);
    let change = plan(&order, &admin, OrderAction::Accept).expect("admin accepts");
    assert_eq!(change.assigned_warehouse.as_deref(), Some("WHS-001"));

    let error = plan(&order, &admin, OrderAction::Deliver).expect_err("status still applies");
    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[rstest]
#[case(OrderStatus::Delivered)]
#[case(OrderStatus::Cancelled)]
#[case(OrderStatus::Rejected)]
fn final_orders_conflict(#[case] status: OrderStatus) {
    let order = product_order(status);
    let error = plan(&order, &Principal::admin(None), OrderAction::Cancel).expect_err("final");
    assert_eq!(error.code(), ErrorCode::Conflict);
    assert_eq!(error.message(), "Order is already final");
}

#[rstest]
fn archived_orders_are_not_found() {
    let mut order = product_order(OrderStatus::PendingWarehouse);
    order.archived_at = Some(fixture_now() - Duration::days(1));
    let error = plan(&order, &warehouse(), OrderAction::Accept).expect_err("archived");
    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[rstest]
#[case(OrderStatus::PendingWarehouse, Role::Warehouse, "WHS-001", ViewerStatus::Pending)]
#[case(OrderStatus::PendingWarehouse, Role::Center, "CEN-010", ViewerStatus::InProgress)]
#[case(OrderStatus::Delivered, Role::Center, "CEN-010", ViewerStatus::Completed)]
#[case(OrderStatus::Cancelled, Role::Warehouse, "WHS-001", ViewerStatus::Cancelled)]
#[case(OrderStatus::Rejected, Role::Center, "CEN-010", ViewerStatus::Rejected)]
fn viewer_status_projection(
    #[case] status: OrderStatus,
    #[case] role: Role,
    #[case] code: &str,
    #[case] expected: ViewerStatus,
) {
    let order = product_order(status);
    assert_eq!(viewer_status(&order, &Principal::hub(role, code)), expected);
}

#[rstest]
#[case(Role::Customer, "CUS-001", true)]
#[case(Role::Customer, "CUS-002", false)]
#[case(Role::Center, "CEN-010", true)]
#[case(Role::Manager, "MGR-001", true)]
#[case(Role::Manager, "MGR-009", false)]
#[case(Role::Contractor, "CON-001", true)]
#[case(Role::Crew, "CRW-004", false)]
#[case(Role::Warehouse, "WHS-001", true)]
#[case(Role::Warehouse, "WHS-002", false)]
fn visibility_by_role(#[case] role: Role, #[case] code: &str, #[case] expected: bool) {
    let order = product_order(OrderStatus::PendingWarehouse);
    assert_eq!(is_visible_to(&order, &Principal::hub(role, code)), expected);
}

#[rstest]
fn archived_orders_are_hidden_even_from_admins() {
    let mut order = product_order(OrderStatus::PendingWarehouse);
    assert!(is_visible_to(&order, &Principal::admin(None)));
    order.archived_at = Some(fixture_now());
    assert!(!is_visible_to(&order, &Principal::admin(None)));
}
