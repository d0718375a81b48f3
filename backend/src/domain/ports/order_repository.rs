//! Port for order persistence.

use async_trait::async_trait;

use crate::domain::{
    ActivityDraft, CatalogItem, NewOrder, Order, OrderChange, OrderType, Principal,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by order repository adapters.
    pub enum OrderRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "order repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "order repository query failed: {message}",
        /// The row changed underneath a conditional update.
        Conflict { message: String } =>
            "order repository conflict: {message}",
    }
}

/// Storage for orders, their items, and participants.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Next value of the per-type order sequence.
    async fn next_sequence(&self, order_type: OrderType) -> Result<i64, OrderRepositoryError>;

    /// Active catalog entry for `code` in the catalog matching `order_type`.
    async fn find_catalog_item(
        &self,
        order_type: OrderType,
        code: &str,
    ) -> Result<Option<CatalogItem>, OrderRepositoryError>;

    /// Lowest non-archived warehouse id.
    async fn default_warehouse(&self) -> Result<Option<String>, OrderRepositoryError>;

    /// Insert the order, its items and participants, and `activity` in one
    /// transaction.
    async fn insert(
        &self,
        order: &NewOrder,
        activity: &ActivityDraft,
    ) -> Result<Order, OrderRepositoryError>;

    /// Order with items, including archived rows.
    async fn find_by_id(&self, order_id: &str) -> Result<Option<Order>, OrderRepositoryError>;

    /// Apply `change` while the stored status equals its expected status,
    /// add the actor as participant, and append `activity`, in one
    /// transaction. Fails with `Conflict` when no row matched.
    async fn apply(
        &self,
        change: &OrderChange,
        activity: &ActivityDraft,
    ) -> Result<Order, OrderRepositoryError>;

    /// Non-archived orders visible to `viewer`, newest first.
    async fn list_visible(&self, viewer: &Principal) -> Result<Vec<Order>, OrderRepositoryError>;
}

/// Empty repository used when no database is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureOrderRepository;

#[async_trait]
impl OrderRepository for FixtureOrderRepository {
    async fn next_sequence(&self, _order_type: OrderType) -> Result<i64, OrderRepositoryError> {
        Ok(1)
    }

    async fn find_catalog_item(
        &self,
        _order_type: OrderType,
        _code: &str,
    ) -> Result<Option<CatalogItem>, OrderRepositoryError> {
        Ok(None)
    }

    async fn default_warehouse(&self) -> Result<Option<String>, OrderRepositoryError> {
        Ok(None)
    }

    async fn insert(
        &self,
        _order: &NewOrder,
        _activity: &ActivityDraft,
    ) -> Result<Order, OrderRepositoryError> {
        Err(OrderRepositoryError::connection("no database configured"))
    }

    async fn find_by_id(&self, _order_id: &str) -> Result<Option<Order>, OrderRepositoryError> {
        Ok(None)
    }

    async fn apply(
        &self,
        change: &OrderChange,
        _activity: &ActivityDraft,
    ) -> Result<Order, OrderRepositoryError> {
        Err(OrderRepositoryError::conflict(format!(
            "order {} not stored",
            change.order_id
        )))
    }

    async fn list_visible(&self, _viewer: &Principal) -> Result<Vec<Order>, OrderRepositoryError> {
        Ok(Vec::new())
    }
}
