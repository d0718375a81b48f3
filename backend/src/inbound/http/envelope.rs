//! Success envelope shared by every `/api/v1` handler.
//!
//! Failures are rendered by the [`ResponseError`](actix_web::ResponseError)
//! implementation in [`super::error`]; successes go through [`ok`] or
//! [`created`] so both halves share the `success` discriminator.

use actix_web::HttpResponse;
use serde::Serialize;

use super::cache_control::private_no_cache_header;

/// `{"success": true, "data": ...}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    success: bool,
    data: T,
}

impl<T> Envelope<T> {
    /// Wrap `data` in a success envelope.
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// 200 with the success envelope; responses are private and uncached.
pub fn ok<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header(private_no_cache_header())
        .json(Envelope::new(data))
}

/// 201 with the success envelope.
pub fn created<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Created()
        .insert_header(private_no_cache_header())
        .json(Envelope::new(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use actix_web::http::StatusCode;
    use rstest::rstest;
    use serde_json::{Value, json};

    #[rstest]
    #[actix_web::test]
    async fn wraps_payload_in_success_envelope() {
        let response = ok(json!({"cleared": 3}));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("Cache-Control")
                .and_then(|value| value.to_str().ok()),
            Some("private, no-cache, must-revalidate")
        );
        let bytes = to_bytes(response.into_body()).await.expect("body");
        let body: Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(body, json!({"success": true, "data": {"cleared": 3}}));
    }

    #[rstest]
    fn created_uses_201() {
        assert_eq!(created(json!([])).status(), StatusCode::CREATED);
    }
}
