//! Order workflow service.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use mockable::Clock;
use serde_json::json;
use tracing::info;

use super::{
    CreateOrderRequest, DEFAULT_CURRENCY, Destination, HubOrders, NewOrder, NewOrderItem, Order,
    OrderAction, OrderActionRequest, OrderItemRequest, OrderStatus, OrderType, OrderView,
    Participant, ParticipationType, format_order_id, is_visible_to, plan_transition,
    viewer_status,
};
use crate::domain::auth_service::map_directory_error;
use crate::domain::inventory::map_inventory_error;
use crate::domain::ports::{
    EcosystemDirectory, InventoryRepository, OrderCommand, OrderQuery, OrderRepository,
    OrderRepositoryError,
};
use crate::domain::{
    ActivityDraft, EcosystemLinks, Error, Principal, Role, check_availability,
    normalize_identity, role_for_code,
};

fn map_order_error(error: OrderRepositoryError) -> Error {
    match error {
        OrderRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("order repository unavailable: {message}"))
        }
        OrderRepositoryError::Query { message } => {
            Error::internal(format!("order repository error: {message}"))
        }
        OrderRepositoryError::Conflict { message } => {
            Error::conflict(format!("Order changed while updating: {message}"))
        }
    }
}

fn parse_expected_date(raw: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, Error> {
    let raw = raw.trim();
    let parsed = DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d").map(|day| day.and_time(NaiveTime::MIN).and_utc())
        })
        .map_err(|_| {
            Error::invalid_request("expectedDate must be an RFC 3339 timestamp or a YYYY-MM-DD date")
                .with_details(json!({ "field": "expectedDate", "code": "invalid_format" }))
        })?;
    if parsed.date_naive() < now.date_naive() {
        return Err(Error::invalid_request("expectedDate must not be in the past")
            .with_details(json!({ "field": "expectedDate", "code": "in_past" })));
    }
    Ok(parsed)
}

/// Merge lines that name the same catalog code, rejecting empty requests and
/// non-positive quantities.
fn aggregate_items(items: Vec<OrderItemRequest>) -> Result<Vec<OrderItemRequest>, Error> {
    if items.is_empty() {
        return Err(Error::invalid_request("At least one item is required")
            .with_details(json!({ "field": "items", "code": "missing_field" })));
    }
    let mut merged: Vec<OrderItemRequest> = Vec::with_capacity(items.len());
    for item in items {
        let code = normalize_identity(Some(&item.catalog_item_code))
            .ok_or_else(|| Error::invalid_request("catalogItemCode must not be empty"))?;
        if item.quantity <= 0 {
            return Err(Error::invalid_request(format!(
                "Quantity for {code} must be greater than zero"
            ))
            .with_details(json!({ "field": "quantity", "code": "out_of_range", "value": item.quantity })));
        }
        match merged.iter_mut().find(|line| line.catalog_item_code == code) {
            Some(line) => {
                line.quantity = line
                    .quantity
                    .checked_add(item.quantity)
                    .ok_or_else(|| Error::invalid_request(format!("Quantity for {code} is too large")))?;
            }
            None => merged.push(OrderItemRequest {
                catalog_item_code: code,
                ..item
            }),
        }
    }
    Ok(merged)
}

fn creator_code(principal: &Principal) -> Result<String, Error> {
    principal
        .code()
        .filter(|code| role_for_code(code) == Some(principal.role()))
        .map(str::to_owned)
        .ok_or_else(|| Error::invalid_request("A valid creator code is required to create orders"))
}

fn normalise_destination(destination: Option<Destination>) -> Result<Option<Destination>, Error> {
    let Some(destination) = destination else {
        return Ok(None);
    };
    let code = normalize_identity(Some(&destination.code))
        .filter(|code| role_for_code(code) == Some(destination.role))
        .ok_or_else(|| {
            Error::invalid_request("Destination code does not match its role")
                .with_details(json!({ "field": "destination", "code": "invalid_code" }))
        })?;
    Ok(Some(Destination {
        role: destination.role,
        code,
    }))
}

fn push_participant(participants: &mut Vec<Participant>, participant: Participant) {
    let duplicate = participants.iter().any(|existing| {
        existing.participant_id == participant.participant_id
            && existing.participant_role == participant.participant_role
    });
    if !duplicate {
        participants.push(participant);
    }
}

fn action_summary(action: OrderAction) -> &'static str {
    match action {
        OrderAction::Accept => "accepted",
        OrderAction::Reject => "rejected",
        OrderAction::Deliver => "delivered",
        OrderAction::Complete => "completed",
        OrderAction::Cancel => "cancelled",
        OrderAction::CreateService => "transformed into a service",
    }
}

fn view(order: Order, viewer: &Principal) -> OrderView {
    OrderView {
        viewer_status: viewer_status(&order, viewer),
        order,
    }
}

/// Order workflows over the order, inventory, and directory ports.
#[derive(Clone)]
pub struct OrderService<R, I, E> {
    orders: Arc<R>,
    inventory: Arc<I>,
    ecosystem: Arc<E>,
    clock: Arc<dyn Clock>,
}

impl<R, I, E> OrderService<R, I, E> {
    /// Create the service.
    pub fn new(orders: Arc<R>, inventory: Arc<I>, ecosystem: Arc<E>, clock: Arc<dyn Clock>) -> Self {
        Self {
            orders,
            inventory,
            ecosystem,
            clock,
        }
    }
}

impl<R, I, E> OrderService<R, I, E>
where
    R: OrderRepository,
    I: InventoryRepository,
    E: EcosystemDirectory,
{
    async fn links_for(
        &self,
        creator_role: Role,
        creator_code: &str,
        destination: Option<&Destination>,
    ) -> Result<EcosystemLinks, Error> {
        let creator = self
            .ecosystem
            .resolve(creator_role, creator_code)
            .await
            .map_err(map_directory_error)?;
        match destination {
            Some(dest) if dest.role.is_hub() && dest.role != Role::Warehouse => {
                let addressed = self
                    .ecosystem
                    .resolve(dest.role, &dest.code)
                    .await
                    .map_err(map_directory_error)?;
                Ok(creator.or(addressed))
            }
            _ => Ok(creator),
        }
    }

    async fn price_items(
        &self,
        order_type: OrderType,
        items: Vec<OrderItemRequest>,
    ) -> Result<(Vec<NewOrderItem>, i64), Error> {
        let mut lines = Vec::with_capacity(items.len());
        let mut total: i64 = 0;
        for (index, item) in items.into_iter().enumerate() {
            let code = item.catalog_item_code;
            let catalog = self
                .orders
                .find_catalog_item(order_type, &code)
                .await
                .map_err(map_order_error)?
                .ok_or_else(|| {
                    Error::invalid_request(format!(
                        "{} {code} not found in catalog.",
                        order_type.catalog_noun()
                    ))
                })?;
            if order_type == OrderType::Product {
                let available = self
                    .inventory
                    .available_quantity(&code)
                    .await
                    .map_err(map_inventory_error)?;
                check_availability(&code, i64::from(item.quantity), available)?;
            }
            let overflow = || Error::invalid_request(format!("Order total for {code} is too large"));
            let line_total = catalog
                .unit_price
                .checked_mul(i64::from(item.quantity))
                .ok_or_else(overflow)?;
            total = total.checked_add(line_total).ok_or_else(overflow)?;
            let line_number = i32::try_from(index + 1)
                .map_err(|_| Error::invalid_request("Too many order items"))?;
            lines.push(NewOrderItem {
                line_number,
                catalog_item_code: code,
                name: catalog.name,
                item_type: catalog.item_type,
                description: item.description.or(catalog.description),
                quantity: item.quantity,
                unit_of_measure: catalog.unit_of_measure,
                unit_price: catalog.unit_price,
                currency: catalog.currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_owned()),
                total_price: line_total,
                metadata: item.metadata.unwrap_or_else(|| json!({})),
            });
        }
        Ok((lines, total))
    }

    async fn load_visible(&self, principal: &Principal, order_id: &str) -> Result<Order, Error> {
        let not_found = || Error::not_found(format!("Order {} not found", order_id.trim()));
        let id = normalize_identity(Some(order_id)).ok_or_else(not_found)?;
        let order = self
            .orders
            .find_by_id(&id)
            .await
            .map_err(map_order_error)?
            .ok_or_else(not_found)?;
        if !is_visible_to(&order, principal) {
            return Err(not_found());
        }
        Ok(order)
    }
}

#[async_trait]
impl<R, I, E> OrderCommand for OrderService<R, I, E>
where
    R: OrderRepository,
    I: InventoryRepository,
    E: EcosystemDirectory,
{
    async fn create(
        &self,
        principal: &Principal,
        request: CreateOrderRequest,
    ) -> Result<OrderView, Error> {
        let now = self.clock.utc();
        let creator_id = creator_code(principal)?;
        let creator_role = principal.role();
        let order_type = request.order_type;
        let items = aggregate_items(request.items)?;
        let expected_date = request
            .expected_date
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| parse_expected_date(raw, now))
            .transpose()?;
        let destination = normalise_destination(request.destination)?;

        let (items, total_amount) = self.price_items(order_type, items).await?;
        let links = self
            .links_for(creator_role, &creator_id, destination.as_ref())
            .await?;

        let (status, next_actor_role, next_actor_code, assigned_warehouse) = match order_type {
            OrderType::Product => {
                let warehouse = match &destination {
                    Some(dest) if dest.role == Role::Warehouse => Some(dest.code.clone()),
                    _ => self
                        .orders
                        .default_warehouse()
                        .await
                        .map_err(map_order_error)?,
                };
                (
                    OrderStatus::PendingWarehouse,
                    Role::Warehouse,
                    warehouse.clone(),
                    warehouse,
                )
            }
            OrderType::Service => (
                OrderStatus::PendingManager,
                Role::Manager,
                links.manager_id.clone(),
                None,
            ),
        };

        let mut participants = Vec::new();
        push_participant(
            &mut participants,
            Participant {
                participant_id: creator_id.clone(),
                participant_role: creator_role,
                participation_type: ParticipationType::Creator,
            },
        );
        if let Some(dest) = &destination {
            push_participant(
                &mut participants,
                Participant {
                    participant_id: dest.code.clone(),
                    participant_role: dest.role,
                    participation_type: ParticipationType::Destination,
                },
            );
        }
        if let Some(warehouse) = &assigned_warehouse {
            push_participant(
                &mut participants,
                Participant {
                    participant_id: warehouse.clone(),
                    participant_role: Role::Warehouse,
                    participation_type: ParticipationType::Actor,
                },
            );
        }

        let sequence = self
            .orders
            .next_sequence(order_type)
            .await
            .map_err(map_order_error)?;
        let order_id = format_order_id(&creator_id, order_type, sequence);
        let currency = items
            .first()
            .map_or_else(|| DEFAULT_CURRENCY.to_owned(), |item| item.currency.clone());
        let title = request
            .title
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| order_type.default_title().to_owned());

        let activity = ActivityDraft::new(
            "order_created",
            format!("{} created {} order {order_id}", creator_id, order_type.as_str()),
            creator_id.clone(),
            creator_role.as_str(),
        )
        .with_target(order_id.clone(), "order")
        .with_metadata(json!({
            "orderType": order_type,
            "status": status,
            "itemCount": items.len(),
            "totalAmount": total_amount,
            "nextActorRole": next_actor_role,
        }));

        let new_order = NewOrder {
            order_id,
            order_type,
            title,
            status,
            next_actor_role: Some(next_actor_role),
            next_actor_code,
            creator_id,
            creator_role,
            destination,
            links,
            assigned_warehouse,
            expected_date,
            notes: request.notes.filter(|n| !n.trim().is_empty()),
            total_amount,
            currency,
            metadata: request.metadata.unwrap_or_else(|| json!({})),
            items,
            participants,
        };

        let order = self
            .orders
            .insert(&new_order, &activity)
            .await
            .map_err(map_order_error)?;
        info!(order_id = %order.order_id, order_type = order_type.as_str(), "order created");
        Ok(view(order, principal))
    }

    async fn apply_action(
        &self,
        principal: &Principal,
        order_id: &str,
        request: OrderActionRequest,
    ) -> Result<OrderView, Error> {
        let order = self.load_visible(principal, order_id).await?;
        let change = plan_transition(&order, principal, &request, self.clock.utc())?;
        let activity = ActivityDraft::new(
            request.action.activity_type(),
            format!(
                "Order {} {} by {}",
                order.order_id,
                action_summary(request.action),
                principal.actor_id()
            ),
            principal.actor_id(),
            principal.role().as_str(),
        )
        .with_target(order.order_id.clone(), "order")
        .with_metadata(json!({
            "action": request.action,
            "fromStatus": order.status,
            "toStatus": change.status,
            "notes": request.notes,
            "transformedId": change.transformed_id,
        }));
        let updated = self
            .orders
            .apply(&change, &activity)
            .await
            .map_err(map_order_error)?;
        info!(
            order_id = %updated.order_id,
            action = request.action.as_str(),
            status = %updated.status,
            "order action applied"
        );
        Ok(view(updated, principal))
    }
}

#[async_trait]
impl<R, I, E> OrderQuery for OrderService<R, I, E>
where
    R: OrderRepository,
    I: InventoryRepository,
    E: EcosystemDirectory,
{
    async fn get_order(&self, principal: &Principal, order_id: &str) -> Result<OrderView, Error> {
        let order = self.load_visible(principal, order_id).await?;
        Ok(view(order, principal))
    }

    async fn hub_orders(&self, principal: &Principal) -> Result<HubOrders, Error> {
        let orders: Vec<OrderView> = self
            .orders
            .list_visible(principal)
            .await
            .map_err(map_order_error)?
            .into_iter()
            .filter(|order| is_visible_to(order, principal))
            .map(|order| view(order, principal))
            .collect();
        let (service_orders, product_orders) = orders
            .iter()
            .cloned()
            .partition(|view| view.order.order_type == OrderType::Service);
        Ok(HubOrders {
            role: principal.role(),
            cks_code: principal.code().map(str::to_owned),
            service_orders,
            product_orders,
            orders,
        })
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
