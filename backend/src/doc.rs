//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] collects every `/api/v1` handler plus the health probes.
//! Request and response bodies are registered through the path annotations;
//! the error envelope schemas are listed explicitly because the domain error
//! serialises through a private DTO.
//!
//! The document backs Swagger UI in debug builds and is exported with
//! `cargo run --bin openapi-dump`.

use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorEnvelopeSchema, ErrorSchema};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Register the bearer token and session cookie security schemes.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "BearerAuth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .description(Some("Identity provider session token."))
                    .build(),
            ),
        );
        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/auth/session.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "CKS portal API",
        description = "Role hubs, orders, reports, activity audit, archive management, and hierarchy assignments."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerAuth" = []), ("SessionCookie" = [])),
    paths(
        crate::inbound::http::identity::create_session,
        crate::inbound::http::identity::delete_session,
        crate::inbound::http::identity::me,
        crate::inbound::http::orders::create_order,
        crate::inbound::http::orders::get_order,
        crate::inbound::http::orders::apply_order_action,
        crate::inbound::http::inventory::item_availability,
        crate::inbound::http::inventory::list_catalog,
        crate::inbound::http::reports::create_report,
        crate::inbound::http::reports::create_feedback,
        crate::inbound::http::reports::update_report_status,
        crate::inbound::http::reports::resolve_report,
        crate::inbound::http::reports::acknowledge_report,
        crate::inbound::http::reports::acknowledge_feedback,
        crate::inbound::http::activity::list_activity,
        crate::inbound::http::activity::activity_statistics,
        crate::inbound::http::activity::entity_history,
        crate::inbound::http::activity::entity_tombstone,
        crate::inbound::http::activity::log_activity,
        crate::inbound::http::activity::cleanup_activity,
        crate::inbound::http::activity::detect_suspicious,
        crate::inbound::http::archive::list_archived,
        crate::inbound::http::archive::purge_expired,
        crate::inbound::http::archive::archive_entity,
        crate::inbound::http::archive::restore_entity,
        crate::inbound::http::archive::archive_relationships,
        crate::inbound::http::archive::hard_delete_entity,
        crate::inbound::http::assignments::assign_entity,
        crate::inbound::http::hub::dashboard,
        crate::inbound::http::hub::dashboard_kpis,
        crate::inbound::http::hub::hub_orders,
        crate::inbound::http::hub::recent_activity,
        crate::inbound::http::hub::clear_activity,
        crate::inbound::http::hub::hub_reports,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(ErrorSchema, ErrorCodeSchema, ErrorEnvelopeSchema)),
    tags(
        (name = "auth", description = "Session bootstrap and the current principal"),
        (name = "hub", description = "Role-scoped dashboards"),
        (name = "orders", description = "Product and service order workflow"),
        (name = "inventory", description = "Warehouse stock checks and the catalog"),
        (name = "reports", description = "Reports and feedback"),
        (name = "activity", description = "Activity audit log"),
        (name = "archive", description = "Soft delete, restore, and purge"),
        (name = "directory", description = "Hierarchy assignments"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    // utoipa replaces :: with . in schema names
    const ERROR_SCHEMA_NAME: &str = "crate.domain.Error";

    #[test]
    fn error_schema_has_code_and_message() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        match schemas.get(ERROR_SCHEMA_NAME).expect("Error schema") {
            RefOr::T(Schema::Object(obj)) => {
                assert!(obj.properties.contains_key("code"));
                assert!(obj.properties.contains_key("message"));
                assert!(obj.properties.contains_key("traceId"));
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[rstest]
    #[case("/api/v1/auth/session")]
    #[case("/api/v1/orders/{order_id}/actions")]
    #[case("/api/v1/{role}/dashboard")]
    #[case("/api/v1/system/archive/{entity_type}/{entity_id}")]
    #[case("/api/v1/system/assignments")]
    #[case("/api/v1/catalog")]
    #[case("/health/ready")]
    fn documents_route(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing {path}");
    }

    #[test]
    fn registers_both_security_schemes() {
        let doc = ApiDoc::openapi();
        let schemes = &doc.components.as_ref().expect("components").security_schemes;
        assert!(schemes.contains_key("BearerAuth"));
        assert!(schemes.contains_key("SessionCookie"));
    }
}
