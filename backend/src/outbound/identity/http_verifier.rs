//! Reqwest-backed token introspection against the identity provider.
//!
//! This adapter owns transport details only: the introspection request,
//! timeout and HTTP status mapping, and decoding the provider user id.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tracing::debug;
use zeroize::Zeroizing;

use crate::domain::BearerToken;
use crate::domain::ports::{IdentityVerifier, IdentityVerifierError, VerifiedIdentity};

/// Provider endpoint used when `CLERK_INTROSPECTION_URL` is unset.
pub const DEFAULT_INTROSPECTION_URL: &str = "https://api.clerk.com/v1/tokens/verify";

#[derive(Debug, Deserialize)]
struct IntrospectionResponse {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
}

impl IntrospectionResponse {
    fn into_user_id(self) -> Option<String> {
        self.sub
            .or(self.user_id)
            .map(|id| id.trim().to_owned())
            .filter(|id| !id.is_empty())
    }
}

/// Verifies tokens by POSTing them to the provider's introspection endpoint.
pub struct HttpIdentityVerifier {
    client: Client,
    endpoint: Url,
    secret: Zeroizing<String>,
}

impl HttpIdentityVerifier {
    /// Build a verifier with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoint: Url, secret: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            secret: Zeroizing::new(secret),
        })
    }
}

#[async_trait]
impl IdentityVerifier for HttpIdentityVerifier {
    async fn verify(&self, token: &BearerToken) -> Result<VerifiedIdentity, IdentityVerifierError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(self.secret.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&serde_json::json!({ "token": token.expose() }))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            debug!(status = status.as_u16(), "identity provider refused token");
            return Err(map_status_error(status));
        }
        parse_identity(body.as_ref())
    }
}

fn parse_identity(body: &[u8]) -> Result<VerifiedIdentity, IdentityVerifierError> {
    let decoded: IntrospectionResponse = serde_json::from_slice(body).map_err(|error| {
        IdentityVerifierError::query(format!("invalid introspection payload: {error}"))
    })?;
    decoded
        .into_user_id()
        .map(|user_id| VerifiedIdentity { user_id })
        .ok_or_else(|| IdentityVerifierError::query("introspection payload has no subject"))
}

fn map_transport_error(error: reqwest::Error) -> IdentityVerifierError {
    IdentityVerifierError::connection(error.to_string())
}

fn map_status_error(status: StatusCode) -> IdentityVerifierError {
    let message = format!("status {}", status.as_u16());
    match status {
        StatusCode::BAD_REQUEST
        | StatusCode::UNAUTHORIZED
        | StatusCode::FORBIDDEN
        | StatusCode::NOT_FOUND
        | StatusCode::UNPROCESSABLE_ENTITY => IdentityVerifierError::rejected(message),
        _ if status.is_server_error() => IdentityVerifierError::connection(message),
        _ => IdentityVerifierError::query(message),
    }
}
