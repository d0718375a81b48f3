//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! This module provides concrete implementations of domain repository ports
//! backed by PostgreSQL via the Diesel ORM with async support through
//! `diesel-async` and `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: Repository implementations only translate between
//!   Diesel models and domain types. Workflow rules stay in the domain.
//! - **Internal models**: Diesel row structs (`models.rs`) and schema
//!   definitions (`schema.rs`) never leave this module.
//! - **One transaction per mutation**: every write appends its activity row
//!   on the same connection before committing.
//! - **Strongly typed errors**: database failures become the port's
//!   `Connection` or `Query` variants.
//!
//! # Example
//!
//! ```ignore
//! use cks_backend::outbound::persistence::{DbPool, DieselOrderRepository, PoolConfig};
//!
//! let config = PoolConfig::new("postgres://localhost/cks");
//! let pool = DbPool::new(config).await?;
//! let orders = DieselOrderRepository::new(pool);
//! ```

mod diesel_activity_repository;
mod diesel_archive_repository;
mod diesel_assignment_repository;
mod diesel_dashboard_repository;
mod diesel_directory;
mod diesel_error_mapping;
mod diesel_helpers;
mod diesel_inventory_repository;
mod diesel_order_repository;
mod diesel_report_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_activity_repository::DieselActivityRepository;
pub use diesel_archive_repository::DieselArchiveRepository;
pub use diesel_assignment_repository::DieselAssignmentRepository;
pub use diesel_dashboard_repository::DieselDashboardRepository;
pub use diesel_directory::DieselDirectory;
pub use diesel_inventory_repository::DieselInventoryRepository;
pub use diesel_order_repository::DieselOrderRepository;
pub use diesel_report_repository::DieselReportRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_migrations, run_pending_migrations};
pub use pool::{DEFAULT_POOL_MAX, DbPool, PoolConfig, PoolError};
