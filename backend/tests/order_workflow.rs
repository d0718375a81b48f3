//! Product and service order workflows against PostgreSQL.
//!
//! Requires `TEST_DATABASE_URL`; prints `SKIP-TEST-DB` and passes otherwise.

use std::sync::Arc;

use cks_backend::domain::ports::{OrderCommand, OrderQuery};
use cks_backend::domain::{
    CreateOrderRequest, ErrorCode, OrderAction, OrderActionRequest, OrderItemRequest,
    OrderService, OrderStatus, OrderType, Principal, Role, ViewerStatus,
};
use cks_backend::outbound::persistence::{
    DieselDirectory, DieselInventoryRepository, DieselOrderRepository,
};
use mockable::DefaultClock;
use rstest::rstest;
use tokio::runtime::Runtime;

mod support;

use support::{ECOSYSTEM_SQL, pool, provision_database, query_i64, seed};

type Service = OrderService<DieselOrderRepository, DieselInventoryRepository, DieselDirectory>;

struct TestContext {
    runtime: Runtime,
    url: String,
    service: Service,
}

fn setup(name: &str) -> Option<TestContext> {
    let url = match provision_database(name) {
        Ok(Some(url)) => url,
        Ok(None) => return None,
        Err(reason) => panic!("test database setup failed: {reason}"),
    };
    seed(&url, ECOSYSTEM_SQL).expect("seed ecosystem");
    let runtime = Runtime::new().expect("runtime");
    let pool = pool(&runtime, &url).expect("pool");
    let service = OrderService::new(
        Arc::new(DieselOrderRepository::new(pool.clone())),
        Arc::new(DieselInventoryRepository::new(pool.clone())),
        Arc::new(DieselDirectory::new(pool)),
        Arc::new(DefaultClock),
    );
    Some(TestContext {
        runtime,
        url,
        service,
    })
}

fn product_request(quantity: i32) -> CreateOrderRequest {
    CreateOrderRequest {
        order_type: OrderType::Product,
        title: None,
        destination: None,
        expected_date: None,
        notes: Some("Loading dock B".to_owned()),
        items: vec![OrderItemRequest {
            catalog_item_code: "PRD-001".to_owned(),
            quantity,
            description: None,
            metadata: None,
        }],
        metadata: None,
    }
}

fn action(action: OrderAction) -> OrderActionRequest {
    OrderActionRequest {
        action,
        notes: None,
        transformed_id: None,
    }
}

#[rstest]
fn product_order_runs_from_creation_to_delivery() {
    let Some(ctx) = setup("cks_order_product_flow") else {
        return;
    };
    let center = Principal::hub(Role::Center, "CEN-010");
    let warehouse = Principal::hub(Role::Warehouse, "WHS-001");

    ctx.runtime.block_on(async {
        let created = ctx
            .service
            .create(&center, product_request(3))
            .await
            .expect("create order");
        assert_eq!(created.order.order_id, "CEN-010-PO-001");
        assert_eq!(created.order.status, OrderStatus::PendingWarehouse);
        assert_eq!(created.order.next_actor_code.as_deref(), Some("WHS-001"));
        assert_eq!(created.order.total_amount, 3750);
        assert_eq!(created.order.links.manager_id.as_deref(), Some("MGR-012"));
        assert_eq!(created.viewer_status, ViewerStatus::InProgress);

        let accepted = ctx
            .service
            .apply_action(&warehouse, "CEN-010-PO-001", action(OrderAction::Accept))
            .await
            .expect("accept");
        assert_eq!(accepted.order.status, OrderStatus::AwaitingDelivery);

        let delivered = ctx
            .service
            .apply_action(&warehouse, "CEN-010-PO-001", action(OrderAction::Deliver))
            .await
            .expect("deliver");
        assert_eq!(delivered.order.status, OrderStatus::Delivered);
        assert!(delivered.order.delivery_date.is_some());

        let hub = ctx.service.hub_orders(&center).await.expect("hub orders");
        assert_eq!(hub.product_orders.len(), 1);
        assert_eq!(hub.product_orders[0].viewer_status, ViewerStatus::Completed);
    });

    let logged = query_i64(
        &ctx.url,
        "SELECT count(*) FROM system_activity WHERE target_id = 'CEN-010-PO-001'",
    )
    .expect("activity count");
    assert_eq!(logged, 3);
}

#[rstest]
fn product_orders_cannot_exceed_stock() {
    let Some(ctx) = setup("cks_order_stock") else {
        return;
    };
    let center = Principal::hub(Role::Center, "CEN-010");
    let err = ctx
        .runtime
        .block_on(ctx.service.create(&center, product_request(11)))
        .expect_err("insufficient stock");
    assert_eq!(err.code(), ErrorCode::Conflict);
    let stored = query_i64(&ctx.url, "SELECT count(*) FROM orders").expect("order count");
    assert_eq!(stored, 0);
}

#[rstest]
fn rejected_orders_accept_no_further_actions() {
    let Some(ctx) = setup("cks_order_conflict") else {
        return;
    };
    let center = Principal::hub(Role::Center, "CEN-010");
    let warehouse = Principal::hub(Role::Warehouse, "WHS-001");
    ctx.runtime.block_on(async {
        ctx.service
            .create(&center, product_request(1))
            .await
            .expect("create");
        ctx.service
            .apply_action(
                &warehouse,
                "CEN-010-PO-001",
                OrderActionRequest {
                    notes: Some("Discontinued size".to_owned()),
                    ..action(OrderAction::Reject)
                },
            )
            .await
            .expect("reject");
        let err = ctx
            .service
            .apply_action(&warehouse, "CEN-010-PO-001", action(OrderAction::Accept))
            .await
            .expect_err("final orders accept no actions");
        assert_eq!(err.code(), ErrorCode::Conflict);
    });
}

#[rstest]
fn service_orders_route_to_the_manager_and_stay_hidden_from_strangers() {
    let Some(ctx) = setup("cks_order_service_flow") else {
        return;
    };
    seed(
        &ctx.url,
        "INSERT INTO centers (center_id, name) VALUES ('CEN-099', 'Unrelated');",
    )
    .expect("seed stranger");
    let center = Principal::hub(Role::Center, "CEN-010");
    let manager = Principal::hub(Role::Manager, "MGR-012");
    let stranger = Principal::hub(Role::Center, "CEN-099");

    ctx.runtime.block_on(async {
        let request = CreateOrderRequest {
            order_type: OrderType::Service,
            items: vec![OrderItemRequest {
                catalog_item_code: "SRV-001".to_owned(),
                quantity: 1,
                description: None,
                metadata: None,
            }],
            ..product_request(1)
        };
        let created = ctx.service.create(&center, request).await.expect("create");
        assert_eq!(created.order.order_id, "CEN-010-SO-001");
        assert_eq!(created.order.status, OrderStatus::PendingManager);
        assert_eq!(created.order.next_actor_role, Some(Role::Manager));

        let seen = ctx
            .service
            .get_order(&manager, "CEN-010-SO-001")
            .await
            .expect("manager sees order");
        assert_eq!(seen.viewer_status, ViewerStatus::Pending);

        let err = ctx
            .service
            .get_order(&stranger, "CEN-010-SO-001")
            .await
            .expect_err("hidden from unrelated center");
        assert_eq!(err.code(), ErrorCode::NotFound);
    });
}

#[rstest]
fn crew_service_orders_wait_on_the_center_manager() {
    let Some(ctx) = setup("cks_order_crew_manager") else {
        return;
    };
    seed(
        &ctx.url,
        "INSERT INTO managers (manager_id, name) VALUES ('MGR-020', 'Former Lead'); \
         UPDATE crew SET cks_manager = 'MGR-020' WHERE crew_id = 'CRW-004';",
    )
    .expect("reassign crew manager");
    let crew = Principal::hub(Role::Crew, "CRW-004");
    let request = CreateOrderRequest {
        order_type: OrderType::Service,
        items: vec![OrderItemRequest {
            catalog_item_code: "SRV-001".to_owned(),
            quantity: 1,
            description: None,
            metadata: None,
        }],
        ..product_request(1)
    };

    let created = ctx
        .runtime
        .block_on(ctx.service.create(&crew, request))
        .expect("create");
    assert_eq!(created.order.order_id, "CRW-004-SO-001");
    assert_eq!(created.order.next_actor_code.as_deref(), Some("MGR-012"));
    assert_eq!(created.order.links.manager_id.as_deref(), Some("MGR-012"));
    assert_eq!(created.order.links.center_id.as_deref(), Some("CEN-010"));
}
