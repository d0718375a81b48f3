//! Archive administration handlers.
//!
//! ```text
//! GET    /api/v1/system/archive?entityType=crew&limit=100
//! POST   /api/v1/system/archive/{entity_type}/{entity_id}          {"reason":"Left the company"}
//! POST   /api/v1/system/archive/{entity_type}/{entity_id}/restore
//! GET    /api/v1/system/archive/{entity_type}/{entity_id}/relationships
//! DELETE /api/v1/system/archive/{entity_type}/{entity_id}          {"confirm":true}
//! POST   /api/v1/system/archive/purge
//! ```

use actix_web::{HttpResponse, delete, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    ArchiveEntity, ArchiveOutcome, ArchiveRelationship, ArchivedEntity, Capability,
    HardDeleteRequest, PurgeReport, RestoreOutcome,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthContext;
use crate::inbound::http::envelope;
use crate::inbound::http::schemas::ErrorEnvelopeSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_archive_entity};

const ENTITY_TYPE: FieldName = FieldName::new("entityType");

/// Optional reason recorded on the archived row.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveBody {
    #[serde(default)]
    pub reason: Option<String>,
}

/// Listing filters.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct ArchiveListQuery {
    /// One of the archivable entity types; all types when absent.
    pub entity_type: Option<String>,
    /// Defaults to 100, capped at 500.
    pub limit: Option<u32>,
}

fn entity_path(path: web::Path<(String, String)>) -> ApiResult<(ArchiveEntity, String)> {
    let (raw, entity_id) = path.into_inner();
    let entity = parse_archive_entity(&raw, ENTITY_TYPE)?;
    Ok((entity, entity_id))
}

/// Archived entities, most recently archived first.
#[utoipa::path(
    get,
    path = "/api/v1/system/archive",
    params(ArchiveListQuery),
    responses(
        (status = 200, description = "Archived entities", body = [ArchivedEntity]),
        (status = 400, description = "Unknown entity type", body = ErrorEnvelopeSchema),
        (status = 403, description = "Missing archive:manage", body = ErrorEnvelopeSchema)
    ),
    tags = ["archive"],
    operation_id = "listArchived"
)]
#[get("/system/archive")]
pub async fn list_archived(
    state: web::Data<HttpState>,
    auth: AuthContext,
    query: web::Query<ArchiveListQuery>,
) -> ApiResult<HttpResponse> {
    auth.require(&[Capability::ArchiveManage])?;
    let ArchiveListQuery { entity_type, limit } = query.into_inner();
    let entity = entity_type
        .as_deref()
        .map(|raw| parse_archive_entity(raw, ENTITY_TYPE))
        .transpose()?;
    let entities = state.archive.list_archived(entity, limit).await?;
    Ok(envelope::ok(entities))
}

/// Delete every archived entity whose scheduled deletion has passed.
#[utoipa::path(
    post,
    path = "/api/v1/system/archive/purge",
    responses(
        (status = 200, description = "Rows purged", body = PurgeReport),
        (status = 403, description = "Missing archive:manage", body = ErrorEnvelopeSchema)
    ),
    tags = ["archive"],
    operation_id = "purgeExpired"
)]
#[post("/system/archive/purge")]
pub async fn purge_expired(
    state: web::Data<HttpState>,
    auth: AuthContext,
) -> ApiResult<HttpResponse> {
    let principal = auth.require(&[Capability::ArchiveManage])?;
    let report = state.archive.purge_expired(principal).await?;
    Ok(envelope::ok(report))
}

/// Soft-delete an entity and detach its children.
#[utoipa::path(
    post,
    path = "/api/v1/system/archive/{entity_type}/{entity_id}",
    params(
        ("entity_type" = String, Path, description = "manager, contractor, customer, center, crew, warehouse, order, report or feedback"),
        ("entity_id" = String, Path, description = "Entity id")
    ),
    request_body = ArchiveBody,
    responses(
        (status = 200, description = "Archived", body = ArchiveOutcome),
        (status = 404, description = "Unknown entity", body = ErrorEnvelopeSchema),
        (status = 409, description = "Already archived", body = ErrorEnvelopeSchema)
    ),
    tags = ["archive"],
    operation_id = "archiveEntity"
)]
#[post("/system/archive/{entity_type}/{entity_id}")]
pub async fn archive_entity(
    state: web::Data<HttpState>,
    auth: AuthContext,
    path: web::Path<(String, String)>,
    payload: Option<web::Json<ArchiveBody>>,
) -> ApiResult<HttpResponse> {
    let principal = auth.require(&[Capability::ArchiveManage])?;
    let (entity, entity_id) = entity_path(path)?;
    let reason = payload.and_then(|body| body.into_inner().reason);
    let outcome = state
        .archive
        .archive(principal, entity, &entity_id, reason)
        .await?;
    Ok(envelope::ok(outcome))
}

/// Clear the archive columns and restore recorded links.
#[utoipa::path(
    post,
    path = "/api/v1/system/archive/{entity_type}/{entity_id}/restore",
    params(
        ("entity_type" = String, Path, description = "Archivable entity type"),
        ("entity_id" = String, Path, description = "Entity id")
    ),
    responses(
        (status = 200, description = "Restored", body = RestoreOutcome),
        (status = 404, description = "Unknown entity", body = ErrorEnvelopeSchema),
        (status = 409, description = "Not archived", body = ErrorEnvelopeSchema)
    ),
    tags = ["archive"],
    operation_id = "restoreEntity"
)]
#[post("/system/archive/{entity_type}/{entity_id}/restore")]
pub async fn restore_entity(
    state: web::Data<HttpState>,
    auth: AuthContext,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let principal = auth.require(&[Capability::ArchiveManage])?;
    let (entity, entity_id) = entity_path(path)?;
    let outcome = state.archive.restore(principal, entity, &entity_id).await?;
    Ok(envelope::ok(outcome))
}

/// Parent links captured when the entity was archived.
#[utoipa::path(
    get,
    path = "/api/v1/system/archive/{entity_type}/{entity_id}/relationships",
    params(
        ("entity_type" = String, Path, description = "Archivable entity type"),
        ("entity_id" = String, Path, description = "Entity id")
    ),
    responses(
        (status = 200, description = "Recorded links", body = [ArchiveRelationship]),
        (status = 400, description = "Unknown entity type", body = ErrorEnvelopeSchema)
    ),
    tags = ["archive"],
    operation_id = "archiveRelationships"
)]
#[get("/system/archive/{entity_type}/{entity_id}/relationships")]
pub async fn archive_relationships(
    state: web::Data<HttpState>,
    auth: AuthContext,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    auth.require(&[Capability::ArchiveManage])?;
    let (entity, entity_id) = entity_path(path)?;
    let links = state.archive.relationships(entity, &entity_id).await?;
    Ok(envelope::ok(links))
}

/// Permanently delete an archived entity.
#[utoipa::path(
    delete,
    path = "/api/v1/system/archive/{entity_type}/{entity_id}",
    params(
        ("entity_type" = String, Path, description = "Archivable entity type"),
        ("entity_id" = String, Path, description = "Entity id")
    ),
    request_body = HardDeleteRequest,
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Missing confirmation", body = ErrorEnvelopeSchema),
        (status = 404, description = "Unknown entity", body = ErrorEnvelopeSchema),
        (status = 409, description = "Not archived or has active children", body = ErrorEnvelopeSchema)
    ),
    tags = ["archive"],
    operation_id = "hardDeleteEntity"
)]
#[delete("/system/archive/{entity_type}/{entity_id}")]
pub async fn hard_delete_entity(
    state: web::Data<HttpState>,
    auth: AuthContext,
    path: web::Path<(String, String)>,
    payload: Option<web::Json<HardDeleteRequest>>,
) -> ApiResult<HttpResponse> {
    let principal = auth.require(&[Capability::ArchiveManage])?;
    let (entity, entity_id) = entity_path(path)?;
    let confirm = payload.is_some_and(|body| body.confirm);
    state
        .archive
        .hard_delete(principal, entity, &entity_id, confirm)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
#[path = "archive_tests.rs"]
mod tests;
