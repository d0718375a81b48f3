//! Ports for reading hub accounts and their ownership links.

use async_trait::async_trait;

use crate::domain::{AccountRecord, EcosystemLinks, Role};

use super::define_port_error;

define_port_error! {
    /// Errors raised by directory adapters.
    pub enum DirectoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "directory connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } =>
            "directory query failed: {message}",
    }
}

/// Looks up accounts by identity-provider user id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Row in `admin_users` linked to the provider user.
    async fn find_admin(&self, clerk_user_id: &str) -> Result<Option<AccountRecord>, DirectoryError>;

    /// First hub row (manager, contractor, customer, center, crew,
    /// warehouse) linked to the provider user. Archived rows are ignored.
    async fn find_hub_account(
        &self,
        clerk_user_id: &str,
    ) -> Result<Option<AccountRecord>, DirectoryError>;
}

/// Resolves where an entity sits in the manager hierarchy.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EcosystemDirectory: Send + Sync {
    /// Links for `code`, including itself. Unknown codes yield only the
    /// self link.
    async fn resolve(&self, role: Role, code: &str) -> Result<EcosystemLinks, DirectoryError>;
}

/// Empty directory used when no database is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureDirectory;

#[async_trait]
impl AccountDirectory for FixtureDirectory {
    async fn find_admin(&self, _clerk_user_id: &str) -> Result<Option<AccountRecord>, DirectoryError> {
        Ok(None)
    }

    async fn find_hub_account(
        &self,
        _clerk_user_id: &str,
    ) -> Result<Option<AccountRecord>, DirectoryError> {
        Ok(None)
    }
}

#[async_trait]
impl EcosystemDirectory for FixtureDirectory {
    async fn resolve(&self, role: Role, code: &str) -> Result<EcosystemLinks, DirectoryError> {
        Ok(EcosystemLinks::of_self(role, code))
    }
}
