//! Session bootstrap and current-principal handlers.
//!
//! ```text
//! POST   /api/v1/auth/session   (Authorization: Bearer <token>)
//! DELETE /api/v1/auth/session
//! GET    /api/v1/me
//! ```

use actix_web::{HttpResponse, delete, get, post};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use crate::domain::{Capability, DashboardConfig, Principal, Role, capabilities_for};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthContext;
use crate::inbound::http::envelope;
use crate::inbound::http::schemas::ErrorEnvelopeSchema;
use crate::inbound::http::session::SessionContext;

/// Description of the authenticated caller.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub role: Role,
    pub code: Option<String>,
    pub is_admin: bool,
    #[schema(value_type = Vec<String>, example = json!(["dashboard:view", "orders:view"]))]
    pub capabilities: Vec<Capability>,
    #[schema(value_type = Object)]
    pub dashboard: DashboardConfig,
}

impl From<&Principal> for MeResponse {
    fn from(principal: &Principal) -> Self {
        Self {
            role: principal.role(),
            code: principal.code().map(str::to_owned),
            is_admin: principal.is_admin(),
            capabilities: capabilities_for(principal.role()).to_vec(),
            dashboard: DashboardConfig::for_role(principal.role()),
        }
    }
}

/// Authenticate the request and cache the principal in the session cookie.
#[utoipa::path(
    post,
    path = "/api/v1/auth/session",
    responses(
        (status = 200, description = "Session established", body = MeResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 401, description = "Missing or rejected token", body = ErrorEnvelopeSchema),
        (status = 403, description = "No active account for this identity", body = ErrorEnvelopeSchema)
    ),
    tags = ["auth"],
    operation_id = "createSession"
)]
#[post("/auth/session")]
pub async fn create_session(auth: AuthContext, session: SessionContext) -> ApiResult<HttpResponse> {
    let principal = auth.principal();
    session.persist_principal(principal)?;
    info!(role = %principal.role(), code = ?principal.code(), "session established");
    Ok(envelope::ok(MeResponse::from(principal)))
}

/// Forget the cached principal.
#[utoipa::path(
    delete,
    path = "/api/v1/auth/session",
    responses((status = 204, description = "Session cleared")),
    tags = ["auth"],
    operation_id = "deleteSession",
    security([])
)]
#[delete("/auth/session")]
pub async fn delete_session(session: SessionContext) -> HttpResponse {
    session.clear();
    HttpResponse::NoContent().finish()
}

/// Role, capabilities and dashboard configuration of the caller.
#[utoipa::path(
    get,
    path = "/api/v1/me",
    responses(
        (status = 200, description = "Current principal", body = MeResponse),
        (status = 401, description = "Not authenticated", body = ErrorEnvelopeSchema)
    ),
    tags = ["auth"],
    operation_id = "currentPrincipal"
)]
#[get("/me")]
pub async fn me(auth: AuthContext) -> HttpResponse {
    envelope::ok(MeResponse::from(auth.principal()))
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
