//! OpenAPI schema definitions for the response envelopes.
//!
//! The domain error serialises through a private DTO, so its schema is
//! registered here in the inbound adapter where framework concerns belong.

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
///
/// Stable machine-readable error codes returned in API error responses.
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// Authentication failed or is missing.
    #[schema(rename = "unauthorized")]
    Unauthorized,
    /// Authenticated but not permitted to perform this action.
    #[schema(rename = "forbidden")]
    Forbidden,
    /// The requested resource does not exist.
    #[schema(rename = "not_found")]
    NotFound,
    /// The request conflicts with the current state of the resource.
    #[schema(rename = "conflict")]
    Conflict,
    /// A dependency is temporarily unavailable.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Error)]
#[schema(rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "forbidden")]
    code: ErrorCodeSchema,
    /// Human-readable message returned to clients.
    #[schema(example = "Insufficient permissions")]
    message: String,
    /// Correlation identifier matching the `trace-id` response header.
    #[schema(example = "7d4b2f10-9f2e-4d0e-9a55-1f5b7c3e2a11")]
    trace_id: Option<String>,
    /// Supplementary error details for clients.
    details: Option<serde_json::Value>,
}

/// Failure envelope `{"success": false, "error": {...}}`.
#[derive(ToSchema)]
#[schema(as = ErrorEnvelope)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorEnvelopeSchema {
    /// Always `false`.
    #[schema(example = false)]
    success: bool,
    /// Error payload.
    error: ErrorSchema,
}

#[cfg(test)]
mod tests {
    use super::*;
    use utoipa::PartialSchema;

    #[test]
    fn envelope_schema_names_both_members() {
        let schema = serde_json::to_value(ErrorEnvelopeSchema::schema()).expect("schema json");
        let properties = schema
            .get("properties")
            .and_then(serde_json::Value::as_object)
            .expect("properties");
        assert!(properties.contains_key("success"));
        assert!(properties.contains_key("error"));
    }

    #[test]
    fn error_code_schema_lists_every_code() {
        let schema = serde_json::to_value(ErrorCodeSchema::schema()).expect("schema json");
        let values = schema
            .get("enum")
            .and_then(serde_json::Value::as_array)
            .expect("enum values");
        assert_eq!(values.len(), 7);
        assert!(values.iter().any(|value| value == "service_unavailable"));
    }
}
