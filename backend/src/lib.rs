//! CKS portal backend library.
//!
//! Hexagonal layout: [`domain`] holds the workflow model and driving ports,
//! [`inbound`] adapts HTTP requests onto those ports, and [`outbound`]
//! implements the driven ports against PostgreSQL and the identity provider.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
