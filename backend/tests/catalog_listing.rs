//! Catalog listing against PostgreSQL.
//!
//! Requires `TEST_DATABASE_URL`; prints `SKIP-TEST-DB` and passes otherwise.

use std::sync::Arc;

use cks_backend::domain::InventoryService;
use cks_backend::domain::ports::InventoryQuery;
use cks_backend::outbound::persistence::DieselInventoryRepository;
use rstest::rstest;
use tokio::runtime::Runtime;

mod support;

use support::{ECOSYSTEM_SQL, pool, provision_database, seed};

#[rstest]
fn lists_only_active_entries_by_code() {
    let url = match provision_database("cks_catalog_listing") {
        Ok(Some(url)) => url,
        Ok(None) => return,
        Err(reason) => panic!("test database setup failed: {reason}"),
    };
    seed(&url, ECOSYSTEM_SQL).expect("seed ecosystem");
    seed(
        &url,
        "INSERT INTO catalog_products (product_id, name, unit_price, is_active) VALUES \
           ('PRD-000', 'Discontinued wax', 900, FALSE), \
           ('PRD-002', 'Glass cleaner', 450, TRUE); \
         INSERT INTO catalog_services (service_id, name, unit_price, is_active) VALUES \
           ('SRV-002', 'Window wash', 6000, FALSE);",
    )
    .expect("seed catalog");
    let runtime = Runtime::new().expect("runtime");
    let service = InventoryService::new(Arc::new(DieselInventoryRepository::new(
        pool(&runtime, &url).expect("pool"),
    )));

    let catalog = runtime.block_on(service.catalog()).expect("catalog");
    let products: Vec<&str> = catalog.products.iter().map(|p| p.code.as_str()).collect();
    let services: Vec<&str> = catalog.services.iter().map(|s| s.code.as_str()).collect();
    assert_eq!(products, ["PRD-001", "PRD-002"]);
    assert_eq!(services, ["SRV-001"]);
    assert_eq!(catalog.products[0].unit_price, 1250);
    assert_eq!(catalog.services[0].item_type, "service");
}
