//! Inventory availability and catalog handlers.
//!
//! ```text
//! GET /api/v1/inventory/{item_code}/availability[?requested=90]
//! GET /api/v1/catalog
//! ```

use actix_web::{HttpResponse, get, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::{Availability, Capability, Catalog, check_availability};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthContext;
use crate::inbound::http::envelope;
use crate::inbound::http::schemas::ErrorEnvelopeSchema;
use crate::inbound::http::state::HttpState;

/// Optional quantity to check against current stock.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AvailabilityQuery {
    /// When present, answer 409 unless this many units are available.
    pub requested: Option<i64>,
}

/// Units of a catalog item available across active warehouses.
#[utoipa::path(
    get,
    path = "/api/v1/inventory/{item_code}/availability",
    params(
        ("item_code" = String, Path, description = "Catalog item code such as PRD-009"),
        AvailabilityQuery
    ),
    responses(
        (status = 200, description = "Available quantity", body = Availability),
        (status = 403, description = "Needs inventory:view or orders:create", body = ErrorEnvelopeSchema),
        (status = 409, description = "Fewer units than requested", body = ErrorEnvelopeSchema)
    ),
    tags = ["inventory"],
    operation_id = "itemAvailability"
)]
#[get("/inventory/{item_code}/availability")]
pub async fn item_availability(
    state: web::Data<HttpState>,
    auth: AuthContext,
    path: web::Path<String>,
    query: web::Query<AvailabilityQuery>,
) -> ApiResult<HttpResponse> {
    auth.require_any(&[Capability::InventoryView, Capability::OrdersCreate])?;
    let availability = state.inventory.availability(&path).await?;
    if let Some(requested) = query.requested {
        check_availability(&availability.item_code, requested, availability.available)?;
    }
    Ok(envelope::ok(availability))
}

/// Active products and services that can be ordered.
#[utoipa::path(
    get,
    path = "/api/v1/catalog",
    responses(
        (status = 200, description = "Orderable catalog", body = Catalog),
        (status = 403, description = "Needs inventory:view or orders:create", body = ErrorEnvelopeSchema)
    ),
    tags = ["inventory"],
    operation_id = "listCatalog"
)]
#[get("/catalog")]
pub async fn list_catalog(
    state: web::Data<HttpState>,
    auth: AuthContext,
) -> ApiResult<HttpResponse> {
    auth.require_any(&[Capability::InventoryView, Capability::OrdersCreate])?;
    let catalog = state.inventory.catalog().await?;
    Ok(envelope::ok(catalog))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CatalogItem, Role};
    use crate::domain::ports::MockInventoryQuery;
    use crate::inbound::http::test_utils::{as_role, dev_state};
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use rstest::rstest;
    use serde_json::Value;
    use std::sync::Arc;

    fn stocked(available: i64) -> MockInventoryQuery {
        let mut inventory = MockInventoryQuery::new();
        inventory
            .expect_availability()
            .withf(|code| code == "PRD-009")
            .returning(move |code| {
                Ok(Availability {
                    item_code: code.to_owned(),
                    available,
                })
            });
        inventory
    }

    async fn call(
        inventory: MockInventoryQuery,
        role: Role,
        code: &str,
        uri: &str,
    ) -> actix_web::dev::ServiceResponse {
        let state = dev_state(|ports| ports.inventory = Arc::new(inventory));
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(
                    web::scope("/api/v1")
                        .service(item_availability)
                        .service(list_catalog),
                ),
        )
        .await;
        let request = as_role(actix_test::TestRequest::get().uri(uri), role, Some(code));
        actix_test::call_service(&app, request.to_request()).await
    }

    #[rstest]
    #[case(Role::Warehouse, "WHS-001")]
    #[case(Role::Center, "CEN-010")]
    #[actix_web::test]
    async fn holders_of_either_capability_may_read(#[case] role: Role, #[case] code: &str) {
        let response = call(
            stocked(50),
            role,
            code,
            "/api/v1/inventory/PRD-009/availability",
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body.pointer("/data/available").and_then(Value::as_i64), Some(50));
        assert_eq!(
            body.pointer("/data/itemCode").and_then(Value::as_str),
            Some("PRD-009")
        );
    }

    #[rstest]
    #[case(90, StatusCode::CONFLICT)]
    #[case(40, StatusCode::OK)]
    #[actix_web::test]
    async fn requested_quantity_is_checked(#[case] requested: i64, #[case] expected: StatusCode) {
        let uri = format!("/api/v1/inventory/PRD-009/availability?requested={requested}");
        let response = call(stocked(50), Role::Manager, "MGR-012", &uri).await;
        assert_eq!(response.status(), expected);
    }

    fn one_service() -> MockInventoryQuery {
        let mut inventory = MockInventoryQuery::new();
        inventory.expect_catalog().times(1).return_once(|| {
            Ok(Catalog {
                products: Vec::new(),
                services: vec![CatalogItem {
                    code: "SRV-001".to_owned(),
                    name: "Deep clean".to_owned(),
                    item_type: "service".to_owned(),
                    description: None,
                    unit_of_measure: None,
                    unit_price: 18000,
                    currency: None,
                }],
            })
        });
        inventory
    }

    #[actix_web::test]
    async fn catalog_lists_orderable_services() {
        let response = call(one_service(), Role::Crew, "CRW-004", "/api/v1/catalog").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(
            body.pointer("/data/services/0/code").and_then(Value::as_str),
            Some("SRV-001")
        );
        assert_eq!(
            body.pointer("/data/services/0/unitPrice").and_then(Value::as_i64),
            Some(18000)
        );
        assert_eq!(
            body.pointer("/data/products").and_then(Value::as_array).map(Vec::len),
            Some(0)
        );
    }
}
