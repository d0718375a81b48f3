//! Bearer token parsing.
//!
//! Inbound adapters hand the raw `Authorization` header value to
//! [`BearerToken::from_header`] so the domain only ever sees a validated,
//! non-empty token.

use std::fmt;

use zeroize::Zeroizing;

/// Reasons an `Authorization` header is not a usable bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BearerTokenError {
    /// The header does not use the `Bearer` scheme.
    WrongScheme,
    /// The token was blank once trimmed.
    EmptyToken,
}

impl fmt::Display for BearerTokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongScheme => write!(f, "authorization header must use the Bearer scheme"),
            Self::EmptyToken => write!(f, "bearer token must not be empty"),
        }
    }
}

impl std::error::Error for BearerTokenError {}

/// Opaque identity-provider token.
///
/// ## Invariants
/// - The token is trimmed and non-empty.
/// - The value is zeroed on drop and never printed by `Debug`.
///
/// # Examples
/// ```
/// use cks_backend::domain::BearerToken;
///
/// let token = BearerToken::from_header("Bearer abc.def").unwrap();
/// assert_eq!(token.expose(), "abc.def");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(Zeroizing<String>);

impl BearerToken {
    /// Parse an `Authorization` header value; the scheme is case-insensitive.
    pub fn from_header(value: &str) -> Result<Self, BearerTokenError> {
        let trimmed = value.trim();
        let (scheme, rest) = trimmed
            .split_once(' ')
            .ok_or(BearerTokenError::WrongScheme)?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err(BearerTokenError::WrongScheme);
        }
        Self::new(rest)
    }

    /// Wrap a raw token value.
    pub fn new(value: &str) -> Result<Self, BearerTokenError> {
        let token = value.trim();
        if token.is_empty() {
            return Err(BearerTokenError::EmptyToken);
        }
        Ok(Self(Zeroizing::new(token.to_owned())))
    }

    /// Raw token for forwarding to the identity provider.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(..)")
    }
}
