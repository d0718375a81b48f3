//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`*Repository`, `IdentityVerifier`, directories) are
//! implemented by outbound adapters. Driving ports (`*Command`, `*Query`,
//! `Authenticator`) are implemented by domain services and consumed by the
//! HTTP handlers. Each has a fixture implementation so the server can start
//! without a database.

mod macros;
pub(crate) use macros::define_port_error;

mod account_directory;
mod activity_log;
mod activity_repository;
mod archive_commands;
mod archive_repository;
mod assignment;
mod authenticator;
mod dashboard_query;
mod dashboard_repository;
mod identity_verifier;
mod inventory;
mod order_commands;
mod order_repository;
mod report_commands;
mod report_repository;

#[cfg(test)]
pub use account_directory::{MockAccountDirectory, MockEcosystemDirectory};
pub use account_directory::{AccountDirectory, DirectoryError, EcosystemDirectory, FixtureDirectory};
#[cfg(test)]
pub use activity_log::{MockActivityCommand, MockActivityQuery};
pub use activity_log::{
    ActivityCommand, ActivityLogPage, ActivityQuery, FixtureActivityCommand, FixtureActivityQuery,
};
#[cfg(test)]
pub use activity_repository::MockActivityRepository;
pub use activity_repository::{
    ActivityRepository, ActivityRepositoryError, FixtureActivityRepository,
};
#[cfg(test)]
pub use archive_commands::MockArchiveCommand;
pub use archive_commands::{ArchiveCommand, FixtureArchive};
#[cfg(test)]
pub use archive_repository::MockArchiveRepository;
pub use archive_repository::{ArchiveRepository, ArchiveRepositoryError};
#[cfg(test)]
pub use assignment::{MockAssignmentCommand, MockAssignmentRepository};
pub use assignment::{
    AssignmentCommand, AssignmentRepository, AssignmentRepositoryError, FixtureAssignments,
};
#[cfg(test)]
pub use authenticator::MockAuthenticator;
pub use authenticator::{Authenticator, FixtureAuthenticator};
#[cfg(test)]
pub use dashboard_query::MockDashboardQuery;
pub use dashboard_query::{DashboardQuery, FixtureDashboard};
#[cfg(test)]
pub use dashboard_repository::MockDashboardRepository;
pub use dashboard_repository::{DashboardRepository, DashboardRepositoryError};
#[cfg(test)]
pub use identity_verifier::MockIdentityVerifier;
pub use identity_verifier::{
    FixtureIdentityVerifier, IdentityVerifier, IdentityVerifierError, VerifiedIdentity,
};
#[cfg(test)]
pub use inventory::{MockInventoryQuery, MockInventoryRepository};
pub use inventory::{
    FixtureInventory, InventoryQuery, InventoryRepository, InventoryRepositoryError,
};
#[cfg(test)]
pub use order_commands::{MockOrderCommand, MockOrderQuery};
pub use order_commands::{FixtureOrders, OrderCommand, OrderQuery};
#[cfg(test)]
pub use order_repository::MockOrderRepository;
pub use order_repository::{FixtureOrderRepository, OrderRepository, OrderRepositoryError};
#[cfg(test)]
pub use report_commands::{MockReportCommand, MockReportQuery};
pub use report_commands::{FixtureReports, ReportCommand, ReportQuery};
#[cfg(test)]
pub use report_repository::MockReportRepository;
pub use report_repository::{ReportRepository, ReportRepositoryError};

#[cfg(test)]
mod tests;
