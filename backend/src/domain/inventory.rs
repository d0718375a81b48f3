//! Inventory availability checks and the orderable catalog.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use super::identity::normalize_identity;
use super::{CatalogItem, Error};
use super::ports::{InventoryQuery, InventoryRepository, InventoryRepositoryError};

/// Stock available for one catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub item_code: String,
    pub available: i64,
}

/// Active catalog entries, split by order type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub products: Vec<CatalogItem>,
    pub services: Vec<CatalogItem>,
}

/// Reject a request for more units than are in stock.
///
/// # Examples
/// ```
/// use cks_backend::domain::check_availability;
///
/// assert!(check_availability("PRD-009", 40, 50).is_ok());
/// assert!(check_availability("PRD-009", 90, 50).is_err());
/// ```
pub fn check_availability(item_code: &str, requested: i64, available: i64) -> Result<(), Error> {
    if requested > available {
        return Err(Error::conflict(format!(
            "Insufficient inventory for {item_code}: requested {requested}, available {available}"
        ))
        .with_details(json!({
            "itemCode": item_code,
            "requested": requested,
            "available": available,
        })));
    }
    Ok(())
}

pub(crate) fn map_inventory_error(error: InventoryRepositoryError) -> Error {
    match error {
        InventoryRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("inventory unavailable: {message}"))
        }
        InventoryRepositoryError::Query { message } => {
            Error::internal(format!("inventory error: {message}"))
        }
    }
}

/// Availability lookups over an [`InventoryRepository`].
#[derive(Clone)]
pub struct InventoryService<R> {
    repo: Arc<R>,
}

impl<R> InventoryService<R> {
    /// Create the service.
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl<R> InventoryQuery for InventoryService<R>
where
    R: InventoryRepository,
{
    async fn availability(&self, item_code: &str) -> Result<Availability, Error> {
        let item_code = normalize_identity(Some(item_code))
            .ok_or_else(|| Error::invalid_request("item code must not be empty"))?;
        let available = self
            .repo
            .available_quantity(&item_code)
            .await
            .map_err(map_inventory_error)?;
        Ok(Availability {
            item_code,
            available,
        })
    }

    async fn catalog(&self) -> Result<Catalog, Error> {
        self.repo.catalog().await.map_err(map_inventory_error)
    }
}
