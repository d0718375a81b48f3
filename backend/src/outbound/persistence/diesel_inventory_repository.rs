//! PostgreSQL-backed `InventoryRepository` implementation.
//!
//! Stock is summed from `inventory_items`; the catalog is read from the
//! `catalog_products` and `catalog_services` tables.

use async_trait::async_trait;
use diesel::dsl::sum;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{InventoryRepository, InventoryRepositoryError};
use crate::domain::{Catalog, CatalogItem, OrderType};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::CatalogRow;
use super::pool::DbPool;
use super::schema::{catalog_products, catalog_services, inventory_items};

/// Diesel-backed implementation of the inventory port.
#[derive(Clone)]
pub struct DieselInventoryRepository {
    pool: DbPool,
}

impl DieselInventoryRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InventoryRepository for DieselInventoryRepository {
    async fn available_quantity(&self, item_code: &str) -> Result<i64, InventoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: Option<i64> = inventory_items::table
            .filter(inventory_items::item_code.eq(item_code))
            .filter(inventory_items::status.eq("active"))
            .filter(inventory_items::archived_at.is_null())
            .select(sum(inventory_items::quantity_available))
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(total.unwrap_or(0))
    }

    async fn catalog(&self) -> Result<Catalog, InventoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let products: Vec<CatalogRow> = catalog_products::table
            .filter(catalog_products::is_active.eq(true))
            .order(catalog_products::product_id.asc())
            .select((
                catalog_products::product_id,
                catalog_products::name,
                catalog_products::description,
                catalog_products::unit_of_measure,
                catalog_products::unit_price,
                catalog_products::currency,
            ))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let services: Vec<CatalogRow> = catalog_services::table
            .filter(catalog_services::is_active.eq(true))
            .order(catalog_services::service_id.asc())
            .select((
                catalog_services::service_id,
                catalog_services::name,
                catalog_services::description,
                catalog_services::unit_of_measure,
                catalog_services::unit_price,
                catalog_services::currency,
            ))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(Catalog {
            products: into_items(products, OrderType::Product),
            services: into_items(services, OrderType::Service),
        })
    }
}

fn into_items(rows: Vec<CatalogRow>, order_type: OrderType) -> Vec<CatalogItem> {
    rows.into_iter()
        .map(|row| CatalogItem {
            code: row.code,
            name: row.name,
            item_type: order_type.as_str().to_owned(),
            description: row.description,
            unit_of_measure: row.unit_of_measure,
            unit_price: row.unit_price,
            currency: row.currency,
        })
        .collect()
}
