//! Development verifier that trusts the token as the provider user id.

use async_trait::async_trait;

use crate::domain::BearerToken;
use crate::domain::ports::{IdentityVerifier, IdentityVerifierError, VerifiedIdentity};

/// Treats the bearer token itself as the provider user id.
///
/// Only wired when `DEV_MOCK_AUTH` is enabled in debug builds.
#[derive(Debug, Default, Clone, Copy)]
pub struct DevIdentityVerifier;

#[async_trait]
impl IdentityVerifier for DevIdentityVerifier {
    async fn verify(&self, token: &BearerToken) -> Result<VerifiedIdentity, IdentityVerifierError> {
        Ok(VerifiedIdentity {
            user_id: token.expose().to_owned(),
        })
    }
}
