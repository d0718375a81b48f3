//! Order HTTP handlers.
//!
//! ```text
//! POST /api/v1/orders
//! GET  /api/v1/orders/{order_id}
//! POST /api/v1/orders/{order_id}/actions {"action":"accept"}
//! ```
//!
//! Hub listings live under the role scopes in [`super::hub`].

use actix_web::{HttpResponse, get, post, web};

use crate::domain::{Capability, CreateOrderRequest, OrderAction, OrderActionRequest, OrderView};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthContext;
use crate::inbound::http::envelope;
use crate::inbound::http::schemas::ErrorEnvelopeSchema;
use crate::inbound::http::state::HttpState;

/// Capabilities an action needs on top of holding the order's turn.
fn action_capabilities(action: OrderAction) -> &'static [Capability] {
    match action {
        OrderAction::CreateService => &[Capability::OrdersUpdate, Capability::OrdersApprove],
        OrderAction::Accept
        | OrderAction::Reject
        | OrderAction::Deliver
        | OrderAction::Complete
        | OrderAction::Cancel => &[Capability::OrdersUpdate],
    }
}

/// Create a product or service order.
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = OrderView),
        (status = 400, description = "Invalid order", body = ErrorEnvelopeSchema),
        (status = 403, description = "Missing orders:create", body = ErrorEnvelopeSchema),
        (status = 409, description = "Insufficient inventory", body = ErrorEnvelopeSchema)
    ),
    tags = ["orders"],
    operation_id = "createOrder"
)]
#[post("/orders")]
pub async fn create_order(
    state: web::Data<HttpState>,
    auth: AuthContext,
    payload: web::Json<CreateOrderRequest>,
) -> ApiResult<HttpResponse> {
    let principal = auth.require(&[Capability::OrdersCreate])?;
    let order = state.orders.create(principal, payload.into_inner()).await?;
    Ok(envelope::created(order))
}

/// Fetch one visible order.
#[utoipa::path(
    get,
    path = "/api/v1/orders/{order_id}",
    params(("order_id" = String, Path, description = "Order id such as CEN-010-PO-001")),
    responses(
        (status = 200, description = "Order", body = OrderView),
        (status = 404, description = "Unknown, archived or not visible", body = ErrorEnvelopeSchema)
    ),
    tags = ["orders"],
    operation_id = "getOrder"
)]
#[get("/orders/{order_id}")]
pub async fn get_order(
    state: web::Data<HttpState>,
    auth: AuthContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let principal = auth.require(&[Capability::OrdersView])?;
    let order = state.orders_query.get_order(principal, &path).await?;
    Ok(envelope::ok(order))
}

/// Apply a workflow action.
#[utoipa::path(
    post,
    path = "/api/v1/orders/{order_id}/actions",
    params(("order_id" = String, Path, description = "Order id")),
    request_body = OrderActionRequest,
    responses(
        (status = 200, description = "Updated order", body = OrderView),
        (status = 400, description = "Missing rejection notes", body = ErrorEnvelopeSchema),
        (status = 403, description = "Role may not apply this action", body = ErrorEnvelopeSchema),
        (status = 404, description = "Unknown or archived order", body = ErrorEnvelopeSchema),
        (status = 409, description = "Order is final or in the wrong status", body = ErrorEnvelopeSchema)
    ),
    tags = ["orders"],
    operation_id = "applyOrderAction"
)]
#[post("/orders/{order_id}/actions")]
pub async fn apply_order_action(
    state: web::Data<HttpState>,
    auth: AuthContext,
    path: web::Path<String>,
    payload: web::Json<OrderActionRequest>,
) -> ApiResult<HttpResponse> {
    let request = payload.into_inner();
    let principal = auth.require(action_capabilities(request.action))?;
    let order = state
        .orders
        .apply_action(principal, &path, request)
        .await?;
    Ok(envelope::ok(order))
}

#[cfg(test)]
#[path = "orders_tests.rs"]
mod tests;
