//! Bearer-token authentication against the account directory.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::ports::{AccountDirectory, Authenticator, DirectoryError, IdentityVerifier, IdentityVerifierError};
use super::{AccountRecord, BearerToken, Error, Principal};

fn map_verifier_error(error: IdentityVerifierError) -> Error {
    match error {
        IdentityVerifierError::Rejected { message } => {
            debug!(%message, "bearer token rejected");
            Error::unauthorized("Invalid or expired token")
        }
        IdentityVerifierError::Connection { message } => {
            Error::service_unavailable(format!("identity provider unavailable: {message}"))
        }
        IdentityVerifierError::Query { message } => {
            Error::internal(format!("identity provider error: {message}"))
        }
    }
}

pub(crate) fn map_directory_error(error: DirectoryError) -> Error {
    match error {
        DirectoryError::Connection { message } => {
            Error::service_unavailable(format!("directory unavailable: {message}"))
        }
        DirectoryError::Query { message } => Error::internal(format!("directory error: {message}")),
    }
}

/// Resolves principals from provider tokens: admins first, then hub tables.
#[derive(Clone)]
pub struct AuthService<V, D> {
    verifier: Arc<V>,
    directory: Arc<D>,
}

impl<V, D> AuthService<V, D> {
    /// Create the service.
    pub fn new(verifier: Arc<V>, directory: Arc<D>) -> Self {
        Self {
            verifier,
            directory,
        }
    }
}

impl<V, D> AuthService<V, D>
where
    D: AccountDirectory,
{
    async fn lookup(&self, clerk_user_id: &str) -> Result<Option<AccountRecord>, Error> {
        if let Some(admin) = self
            .directory
            .find_admin(clerk_user_id)
            .await
            .map_err(map_directory_error)?
        {
            return Ok(Some(admin));
        }
        self.directory
            .find_hub_account(clerk_user_id)
            .await
            .map_err(map_directory_error)
    }

    async fn active_principal(&self, clerk_user_id: &str) -> Result<Principal, Error> {
        let account = self
            .lookup(clerk_user_id)
            .await?
            .ok_or_else(|| Error::forbidden("No account for this identity"))?;
        if !account.is_active() {
            warn!(code = %account.code, "disabled account attempted to authenticate");
            return Err(Error::forbidden("Account access is disabled"));
        }
        Ok(Principal::from_account(account, Some(clerk_user_id.to_owned())))
    }
}

#[async_trait]
impl<V, D> Authenticator for AuthService<V, D>
where
    V: IdentityVerifier,
    D: AccountDirectory,
{
    async fn authenticate(&self, token: &BearerToken) -> Result<Principal, Error> {
        let identity = self.verifier.verify(token).await.map_err(map_verifier_error)?;
        self.active_principal(&identity.user_id).await
    }

    async fn revalidate(&self, principal: &Principal) -> Result<Principal, Error> {
        let Some(clerk_user_id) = principal.clerk_user_id() else {
            return Err(Error::unauthorized("Session is no longer valid"));
        };
        let current = self.active_principal(clerk_user_id).await?;
        if current.role() != principal.role() || current.code() != principal.code() {
            debug!(role = %principal.role(), "session principal no longer matches its account");
            return Err(Error::unauthorized("Session is no longer valid"));
        }
        Ok(current)
    }
}
