//! Identity provider adapters implementing [`IdentityVerifier`].
//!
//! [`IdentityVerifier`]: crate::domain::ports::IdentityVerifier

mod dev_verifier;
mod http_verifier;

pub use dev_verifier::DevIdentityVerifier;
pub use http_verifier::{DEFAULT_INTROSPECTION_URL, HttpIdentityVerifier};
