//! Order fixtures shared by lifecycle and service tests.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;

use super::{Order, OrderItem, OrderStatus, OrderType};
use crate::domain::{EcosystemLinks, Role};

pub(crate) fn fixture_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

pub(crate) fn product_order(status: OrderStatus) -> Order {
    Order {
        order_id: "CEN-010-PO-001".to_owned(),
        order_type: OrderType::Product,
        title: "Product Order".to_owned(),
        status,
        next_actor_role: Some(Role::Warehouse),
        next_actor_code: Some("WHS-001".to_owned()),
        creator_id: "CEN-010".to_owned(),
        creator_role: Role::Center,
        destination: None,
        links: EcosystemLinks {
            manager_id: Some("MGR-001".to_owned()),
            contractor_id: Some("CON-001".to_owned()),
            customer_id: Some("CUS-001".to_owned()),
            center_id: Some("CEN-010".to_owned()),
            crew_id: None,
        },
        assigned_warehouse: Some("WHS-001".to_owned()),
        expected_date: None,
        delivery_date: None,
        transformed_id: None,
        rejection_reason: None,
        notes: None,
        total_amount: 2500,
        currency: "USD".to_owned(),
        metadata: json!({}),
        items: vec![OrderItem {
            id: 1,
            line_number: 1,
            catalog_item_code: "PRD-009".to_owned(),
            name: "Floor cleaner".to_owned(),
            item_type: "product".to_owned(),
            description: None,
            quantity: 5,
            unit_of_measure: Some("bottle".to_owned()),
            unit_price: 500,
            currency: "USD".to_owned(),
            total_price: 2500,
            metadata: json!({}),
        }],
        created_at: fixture_now(),
        updated_at: fixture_now(),
        archived_at: None,
    }
}

pub(crate) fn service_order(status: OrderStatus, next_actor: Option<(Role, &str)>) -> Order {
    let mut order = product_order(status);
    order.order_id = "CEN-010-SO-002".to_owned();
    order.order_type = OrderType::Service;
    order.title = "Service Order".to_owned();
    order.assigned_warehouse = None;
    order.links.crew_id = Some("CRW-004".to_owned());
    order.next_actor_role = next_actor.map(|(role, _)| role);
    order.next_actor_code = next_actor.map(|(_, code)| code.to_owned());
    order
}
