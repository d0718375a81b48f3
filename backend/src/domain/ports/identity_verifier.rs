//! Port for verifying identity-provider bearer tokens.

use async_trait::async_trait;

use crate::domain::BearerToken;

use super::define_port_error;

define_port_error! {
    /// Errors raised by identity verifier adapters.
    pub enum IdentityVerifierError {
        /// The provider did not accept the token.
        Rejected { message: String } =>
            "identity token rejected: {message}",
        /// The provider could not be reached.
        Connection { message: String } =>
            "identity provider unavailable: {message}",
        /// The provider answered with an unexpected payload.
        Query { message: String } =>
            "identity provider response invalid: {message}",
    }
}

/// Provider account a token belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    /// Provider user id, matched against `clerk_user_id` columns.
    pub user_id: String,
}

/// Verifies bearer tokens against the identity provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Resolve the provider user id for a token.
    async fn verify(&self, token: &BearerToken) -> Result<VerifiedIdentity, IdentityVerifierError>;
}

/// Verifier that rejects every token; used when no provider is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureIdentityVerifier;

#[async_trait]
impl IdentityVerifier for FixtureIdentityVerifier {
    async fn verify(&self, _token: &BearerToken) -> Result<VerifiedIdentity, IdentityVerifierError> {
        Err(IdentityVerifierError::rejected("no identity provider configured"))
    }
}
