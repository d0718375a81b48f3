//! Hierarchy assignment handler.
//!
//! ```text
//! POST /api/v1/system/assignments  {"entityType":"crew","entityId":"CRW-004","parentId":"CEN-011"}
//! POST /api/v1/system/assignments  {"entityType":"crew","entityId":"CRW-004","parentId":null}
//! ```

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{AssignmentOutcome, AssignmentRequest, Capability};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthContext;
use crate::inbound::http::envelope;
use crate::inbound::http::schemas::ErrorEnvelopeSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_archive_entity};

/// Entity to move and its new parent.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentBody {
    /// contractor, customer, center or crew.
    pub entity_type: String,
    pub entity_id: String,
    /// New parent id; `null` or absent detaches the entity.
    #[serde(default)]
    pub parent_id: Option<String>,
}

/// Assign an entity to a parent, or detach it.
#[utoipa::path(
    post,
    path = "/api/v1/system/assignments",
    request_body = AssignmentBody,
    responses(
        (status = 200, description = "Link applied or already in place", body = AssignmentOutcome),
        (status = 400, description = "Unknown entity type or one without a parent", body = ErrorEnvelopeSchema),
        (status = 403, description = "Missing directory:manage", body = ErrorEnvelopeSchema),
        (status = 404, description = "Entity or parent missing or archived", body = ErrorEnvelopeSchema)
    ),
    tags = ["directory"],
    operation_id = "assignEntity"
)]
#[post("/system/assignments")]
pub async fn assign_entity(
    state: web::Data<HttpState>,
    auth: AuthContext,
    body: web::Json<AssignmentBody>,
) -> ApiResult<HttpResponse> {
    let principal = auth.require(&[Capability::DirectoryManage])?;
    let AssignmentBody {
        entity_type,
        entity_id,
        parent_id,
    } = body.into_inner();
    let request = AssignmentRequest {
        entity_type: parse_archive_entity(&entity_type, FieldName::new("entityType"))?,
        entity_id,
        parent_id,
    };
    let outcome = state.assignments.assign(principal, request).await?;
    Ok(envelope::ok(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockAssignmentCommand;
    use crate::domain::{ArchiveEntity, Error, Role};
    use crate::inbound::http::test_utils::{as_role, dev_state};
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use chrono::{TimeZone, Utc};
    use rstest::rstest;
    use serde_json::{Value, json};
    use std::sync::Arc;

    async fn call(
        assignments: MockAssignmentCommand,
        role: Role,
        code: Option<&str>,
        body: Value,
    ) -> actix_web::dev::ServiceResponse {
        let state = dev_state(|ports| ports.assignments = Arc::new(assignments));
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(web::scope("/api/v1").service(assign_entity)),
        )
        .await;
        let request = as_role(
            actix_test::TestRequest::post().uri("/api/v1/system/assignments"),
            role,
            code,
        )
        .set_json(body);
        actix_test::call_service(&app, request.to_request()).await
    }

    #[actix_web::test]
    async fn admins_move_crew_between_centers() {
        let mut assignments = MockAssignmentCommand::new();
        assignments
            .expect_assign()
            .withf(|actor, request| {
                actor.is_admin()
                    && request.entity_type == ArchiveEntity::Crew
                    && request.entity_id == "CRW-004"
                    && request.parent_id.as_deref() == Some("CEN-011")
            })
            .times(1)
            .return_once(|_, request| {
                Ok(AssignmentOutcome {
                    entity_type: request.entity_type,
                    entity_id: request.entity_id,
                    parent_type: ArchiveEntity::Center,
                    parent_id: request.parent_id,
                    previous_parent_id: Some("CEN-010".to_owned()),
                    changed: true,
                    changed_at: Utc
                        .with_ymd_and_hms(2025, 3, 14, 9, 0, 0)
                        .single()
                        .expect("valid timestamp"),
                })
            });

        let response = call(
            assignments,
            Role::Admin,
            None,
            json!({ "entityType": "Crew", "entityId": "CRW-004", "parentId": "CEN-011" }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(
            body.pointer("/data/previousParentId").and_then(Value::as_str),
            Some("CEN-010")
        );
        assert_eq!(body.pointer("/data/parentType").and_then(Value::as_str), Some("center"));
        assert_eq!(body.pointer("/data/changed"), Some(&Value::Bool(true)));
    }

    #[actix_web::test]
    async fn absent_parent_means_detach() {
        let mut assignments = MockAssignmentCommand::new();
        assignments
            .expect_assign()
            .withf(|_, request| request.parent_id.is_none())
            .return_once(|_, _| Err(Error::not_found("crew CRW-004 not found or archived")));

        let response = call(
            assignments,
            Role::Admin,
            None,
            json!({ "entityType": "crew", "entityId": "CRW-004" }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[rstest]
    #[case(Role::Manager, Some("MGR-012"))]
    #[case(Role::Center, Some("CEN-010"))]
    #[actix_web::test]
    async fn hub_roles_cannot_reassign(#[case] role: Role, #[case] code: Option<&str>) {
        let mut assignments = MockAssignmentCommand::new();
        assignments.expect_assign().never();

        let response = call(
            assignments,
            role,
            code,
            json!({ "entityType": "crew", "entityId": "CRW-004", "parentId": "CEN-011" }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn unknown_entity_types_are_rejected() {
        let mut assignments = MockAssignmentCommand::new();
        assignments.expect_assign().never();

        let response = call(
            assignments,
            Role::Admin,
            None,
            json!({ "entityType": "crews", "entityId": "CRW-004", "parentId": "CEN-011" }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(
            body.pointer("/error/code").and_then(Value::as_str),
            Some("invalid_request")
        );
    }
}
