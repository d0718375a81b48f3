//! Driving port turning bearer tokens into principals.

use async_trait::async_trait;

use crate::domain::{BearerToken, Error, Principal};

/// Authenticates identity-provider tokens.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Verify the token and resolve the caller's account.
    async fn authenticate(&self, token: &BearerToken) -> Result<Principal, Error>;

    /// Re-read the account behind a principal cached in a session.
    ///
    /// Fails with 403 once the account is archived or no longer active, and
    /// with 401 when the cached principal no longer matches the account.
    async fn revalidate(&self, principal: &Principal) -> Result<Principal, Error>;
}

/// Authenticator that refuses every token and every cached session.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAuthenticator;

#[async_trait]
impl Authenticator for FixtureAuthenticator {
    async fn authenticate(&self, _token: &BearerToken) -> Result<Principal, Error> {
        Err(Error::unauthorized("Invalid or expired token"))
    }

    async fn revalidate(&self, _principal: &Principal) -> Result<Principal, Error> {
        Err(Error::unauthorized("Session is no longer valid"))
    }
}
