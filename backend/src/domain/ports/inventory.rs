//! Ports for inventory availability and the catalog.

use async_trait::async_trait;

use crate::domain::{Availability, Catalog, Error};

use super::define_port_error;

define_port_error! {
    /// Errors raised by inventory repository adapters.
    pub enum InventoryRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "inventory repository connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } =>
            "inventory repository query failed: {message}",
    }
}

/// Reads stock levels.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    /// Summed `quantity_available` over active, non-archived rows for
    /// `item_code` across all warehouses.
    async fn available_quantity(&self, item_code: &str) -> Result<i64, InventoryRepositoryError>;

    /// Active products and services, ordered by code.
    async fn catalog(&self) -> Result<Catalog, InventoryRepositoryError>;
}

/// Availability lookups for handlers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InventoryQuery: Send + Sync {
    /// Stock available for `item_code`.
    async fn availability(&self, item_code: &str) -> Result<Availability, Error>;

    /// Everything that can currently be ordered.
    async fn catalog(&self) -> Result<Catalog, Error>;
}

/// Empty stock and catalog used when no database is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureInventory;

#[async_trait]
impl InventoryRepository for FixtureInventory {
    async fn available_quantity(&self, _item_code: &str) -> Result<i64, InventoryRepositoryError> {
        Ok(0)
    }

    async fn catalog(&self) -> Result<Catalog, InventoryRepositoryError> {
        Ok(Catalog::default())
    }
}
