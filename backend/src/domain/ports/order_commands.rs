//! Driving ports for order workflows.

use async_trait::async_trait;

use crate::domain::{
    CreateOrderRequest, Error, HubOrders, OrderActionRequest, OrderView, Principal,
};

/// Creates and advances orders.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderCommand: Send + Sync {
    /// Validate and persist a new order created by `principal`.
    async fn create(
        &self,
        principal: &Principal,
        request: CreateOrderRequest,
    ) -> Result<OrderView, Error>;

    /// Apply a workflow action.
    async fn apply_action(
        &self,
        principal: &Principal,
        order_id: &str,
        request: OrderActionRequest,
    ) -> Result<OrderView, Error>;
}

/// Reads orders for a viewer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderQuery: Send + Sync {
    /// One visible order.
    async fn get_order(&self, principal: &Principal, order_id: &str) -> Result<OrderView, Error>;

    /// Every order visible to `principal`, split by type.
    async fn hub_orders(&self, principal: &Principal) -> Result<HubOrders, Error>;
}

/// Fixture used when no database is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureOrders;

#[async_trait]
impl OrderCommand for FixtureOrders {
    async fn create(
        &self,
        _principal: &Principal,
        _request: CreateOrderRequest,
    ) -> Result<OrderView, Error> {
        Err(Error::service_unavailable("order storage is not configured"))
    }

    async fn apply_action(
        &self,
        _principal: &Principal,
        order_id: &str,
        _request: OrderActionRequest,
    ) -> Result<OrderView, Error> {
        Err(Error::not_found(format!("Order {order_id} not found")))
    }
}

#[async_trait]
impl OrderQuery for FixtureOrders {
    async fn get_order(&self, _principal: &Principal, order_id: &str) -> Result<OrderView, Error> {
        Err(Error::not_found(format!("Order {order_id} not found")))
    }

    async fn hub_orders(&self, principal: &Principal) -> Result<HubOrders, Error> {
        Ok(HubOrders {
            role: principal.role(),
            cks_code: principal.code().map(str::to_owned),
            service_orders: Vec::new(),
            product_orders: Vec::new(),
            orders: Vec::new(),
        })
    }
}
