//! Shared helpers for database-backed integration tests.
//!
//! Each test provisions its own database on the server named by
//! `TEST_DATABASE_URL`, applies the embedded migrations, and seeds the rows
//! it needs. When the variable is unset the test prints a skip marker and
//! returns early so local runs without PostgreSQL stay green.

#![allow(dead_code, reason = "each test crate uses a different subset")]

use cks_backend::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use postgres::{Client, NoTls};
use reqwest::Url;
use tokio::runtime::Runtime;

/// Server used to create per-test databases.
pub const TEST_DATABASE_URL_ENV: &str = "TEST_DATABASE_URL";

/// Render a `postgres` error with enough detail to be useful in CI logs.
///
/// The `postgres::Error` `Display` implementation often collapses database
/// errors to a generic `db error`, which hides the message and SQLSTATE.
pub fn format_postgres_error(error: &postgres::Error) -> String {
    let Some(db_error) = error.as_db_error() else {
        return error.to_string();
    };

    let mut summary = format!(
        "postgres error {:?}: {}",
        db_error.code(),
        db_error.message()
    );
    if let Some(detail) = db_error.detail() {
        summary.push_str("; detail: ");
        summary.push_str(detail);
    }
    if let Some(hint) = db_error.hint() {
        summary.push_str("; hint: ");
        summary.push_str(hint);
    }
    summary
}

/// Recreate `name` on the test server and migrate it.
///
/// Returns `Ok(None)` after printing `SKIP-TEST-DB` when no server is
/// configured.
pub fn provision_database(name: &str) -> Result<Option<String>, String> {
    let Ok(admin_url) = std::env::var(TEST_DATABASE_URL_ENV) else {
        eprintln!("SKIP-TEST-DB: {TEST_DATABASE_URL_ENV} is not set");
        return Ok(None);
    };

    let mut admin =
        Client::connect(&admin_url, NoTls).map_err(|err| format_postgres_error(&err))?;
    admin
        .batch_execute(&format!(
            "DROP DATABASE IF EXISTS \"{name}\" WITH (FORCE); CREATE DATABASE \"{name}\";"
        ))
        .map_err(|err| format_postgres_error(&err))?;

    let mut url = Url::parse(&admin_url).map_err(|err| err.to_string())?;
    url.set_path(&format!("/{name}"));
    let database_url = url.to_string();
    run_pending_migrations(&database_url).map_err(|err| err.to_string())?;
    Ok(Some(database_url))
}

/// Execute a block of SQL against `url`.
pub fn seed(url: &str, sql: &str) -> Result<(), String> {
    let mut client = Client::connect(url, NoTls).map_err(|err| format_postgres_error(&err))?;
    client
        .batch_execute(sql)
        .map_err(|err| format_postgres_error(&err))
}

/// Read one scalar from `url`.
pub fn query_i64(url: &str, sql: &str) -> Result<i64, String> {
    let mut client = Client::connect(url, NoTls).map_err(|err| format_postgres_error(&err))?;
    let row = client
        .query_one(sql, &[])
        .map_err(|err| format_postgres_error(&err))?;
    Ok(row.get(0))
}

/// Small pool for one test.
pub fn pool(runtime: &Runtime, url: &str) -> Result<DbPool, String> {
    let config = PoolConfig::new(url).with_max_size(2);
    runtime
        .block_on(DbPool::new(config))
        .map_err(|err| err.to_string())
}

/// Directory rows shared by the workflow tests: one chain from manager down
/// to crew, a warehouse, and a stocked catalog product and service.
pub const ECOSYSTEM_SQL: &str = r"
INSERT INTO managers (manager_id, name) VALUES ('MGR-012', 'Morgan Reyes');
INSERT INTO contractors (contractor_id, cks_manager, name) VALUES ('CON-003', 'MGR-012', 'Brightline Facilities');
INSERT INTO customers (customer_id, cks_manager, contractor_id, name) VALUES ('CUS-007', 'MGR-012', 'CON-003', 'Harbour Foods');
INSERT INTO centers (center_id, cks_manager, contractor_id, customer_id, name) VALUES ('CEN-010', 'MGR-012', 'CON-003', 'CUS-007', 'Harbour North');
INSERT INTO crew (crew_id, cks_manager, assigned_center, name) VALUES ('CRW-004', 'MGR-012', 'CEN-010', 'Dana Okafor');
INSERT INTO warehouses (warehouse_id, cks_manager, name) VALUES ('WHS-001', 'MGR-012', 'Central Depot');
INSERT INTO catalog_products (product_id, name, unit_price, currency) VALUES ('PRD-001', 'Floor cleaner 5L', 1250, 'USD');
INSERT INTO catalog_services (service_id, name, unit_price) VALUES ('SRV-001', 'Deep clean', 18000);
INSERT INTO inventory_items (warehouse_id, item_code, item_name, quantity_available) VALUES ('WHS-001', 'PRD-001', 'Floor cleaner 5L', 10);
";
