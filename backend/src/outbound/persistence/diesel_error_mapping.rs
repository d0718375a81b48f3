//! Shared Diesel error mapping for the repository adapters.
//!
//! Every driven port error carries `Connection` and `Query` variants, so the
//! adapters share one translation from pool and Diesel failures.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use crate::domain::ports::{
    ActivityRepositoryError, ArchiveRepositoryError, AssignmentRepositoryError,
    DashboardRepositoryError, DirectoryError, InventoryRepositoryError, OrderRepositoryError,
    ReportRepositoryError,
};

use super::pool::PoolError;

/// Port errors with connection and query constructors.
pub(crate) trait RepositoryError: Sized {
    fn connection_error(message: String) -> Self;
    fn query_error(message: String) -> Self;
}

macro_rules! impl_repository_error {
    ($($name:ty),* $(,)?) => {
        $(
            impl RepositoryError for $name {
                fn connection_error(message: String) -> Self {
                    Self::connection(message)
                }

                fn query_error(message: String) -> Self {
                    Self::query(message)
                }
            }
        )*
    };
}

impl_repository_error!(
    ActivityRepositoryError,
    ArchiveRepositoryError,
    AssignmentRepositoryError,
    DashboardRepositoryError,
    DirectoryError,
    InventoryRepositoryError,
    OrderRepositoryError,
    ReportRepositoryError,
);

/// Map pool failures to the port's connection variant.
pub(crate) fn map_pool_error<E: RepositoryError>(error: PoolError) -> E {
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    E::connection_error(message)
}

/// Map Diesel failures to the port's query or connection variant.
///
/// Database messages are logged at debug and replaced with a stable
/// description so SQL details never reach callers.
pub(crate) fn map_diesel_error<E: RepositoryError>(error: DieselError) -> E {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        other => debug!(error = %other, "diesel operation failed"),
    }

    match error {
        DieselError::NotFound => E::query_error("record not found".to_owned()),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            E::connection_error("database connection error".to_owned())
        }
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            E::query_error("unique constraint violated".to_owned())
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
            E::query_error("foreign key violated".to_owned())
        }
        DieselError::DatabaseError(DatabaseErrorKind::CheckViolation, _) => {
            E::query_error("check constraint violated".to_owned())
        }
        DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, _) => {
            E::query_error("transaction serialization failure".to_owned())
        }
        DieselError::QueryBuilderError(_) => E::query_error("database query error".to_owned()),
        _ => E::query_error("database error".to_owned()),
    }
}
