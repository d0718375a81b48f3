//! Order state machine and per-viewer projections.
//!
//! | action         | type    | who                       | from                 | to                   |
//! |----------------|---------|---------------------------|----------------------|----------------------|
//! | accept         | product | warehouse                 | pending_warehouse    | awaiting_delivery    |
//! | accept         | service | manager                   | pending_manager      | pending_contractor   |
//! | accept         | service | contractor                | pending_contractor   | pending_crew         |
//! | accept         | service | crew                      | pending_crew         | service_in_progress  |
//! | reject         | any     | current next actor        | any non-final        | rejected             |
//! | deliver        | product | warehouse                 | awaiting_delivery    | delivered            |
//! | complete       | service | crew, manager             | service_in_progress  | service_completed    |
//! | cancel         | any     | creator                   | any non-final        | cancelled            |
//! | create-service | service | manager                   | any non-final        | unchanged            |
//!
//! Admins skip the "who" column but not the status rules.

use chrono::{DateTime, Utc};

use super::{
    Order, OrderAction, OrderActionRequest, OrderChange, OrderStatus, OrderType, Participant,
    ParticipationType, ViewerStatus,
};
use crate::domain::{Error, Principal, Role};

fn expected_actor(status: OrderStatus) -> Option<Role> {
    match status {
        OrderStatus::PendingWarehouse | OrderStatus::AwaitingDelivery => Some(Role::Warehouse),
        OrderStatus::PendingManager => Some(Role::Manager),
        OrderStatus::PendingContractor => Some(Role::Contractor),
        OrderStatus::PendingCrew | OrderStatus::ServiceInProgress => Some(Role::Crew),
        _ => None,
    }
}

fn require_role(principal: &Principal, allowed: &[Role], action: OrderAction) -> Result<(), Error> {
    if principal.is_admin() || allowed.contains(&principal.role()) {
        return Ok(());
    }
    Err(Error::forbidden(format!(
        "Role {} cannot {} this order",
        principal.role(),
        action.as_str()
    )))
}

fn is_next_actor(order: &Order, principal: &Principal) -> bool {
    let Some(role) = order.next_actor_role.or_else(|| expected_actor(order.status)) else {
        return false;
    };
    role == principal.role()
        && order
            .next_actor_code
            .as_deref()
            .is_none_or(|code| principal.code() == Some(code))
}

fn require_next_actor(order: &Order, principal: &Principal) -> Result<(), Error> {
    if principal.is_admin() || is_next_actor(order, principal) {
        return Ok(());
    }
    Err(Error::forbidden("Order is waiting on another account"))
}

fn require_type(order: &Order, order_type: OrderType, action: OrderAction) -> Result<(), Error> {
    if order.order_type == order_type {
        return Ok(());
    }
    Err(Error::conflict(format!(
        "Cannot {} a {} order",
        action.as_str(),
        order.order_type.as_str()
    )))
}

fn wrong_status(order: &Order, action: OrderAction) -> Error {
    Error::conflict(format!(
        "Cannot {} an order in status {}",
        action.as_str(),
        order.status
    ))
}

fn finish(change: &mut OrderChange, status: OrderStatus) {
    change.status = status;
    change.next_actor_role = None;
    change.next_actor_code = None;
}

fn accept(order: &Order, principal: &Principal, change: &mut OrderChange) -> Result<(), Error> {
    let action = OrderAction::Accept;
    match order.order_type {
        OrderType::Product => {
            require_role(principal, &[Role::Warehouse], action)?;
            if order.status != OrderStatus::PendingWarehouse {
                return Err(wrong_status(order, action));
            }
            require_next_actor(order, principal)?;
            let warehouse = match principal.role() {
                Role::Warehouse => principal.code().map(str::to_owned),
                _ => order.assigned_warehouse.clone(),
            };
            change.status = OrderStatus::AwaitingDelivery;
            change.next_actor_role = Some(Role::Warehouse);
            change.next_actor_code.clone_from(&warehouse);
            change.assigned_warehouse = warehouse;
        }
        OrderType::Service => {
            require_role(principal, &[Role::Manager, Role::Contractor, Role::Crew], action)?;
            let (status, next_role, next_code) = match order.status {
                OrderStatus::PendingManager => (
                    OrderStatus::PendingContractor,
                    Role::Contractor,
                    order.links.contractor_id.clone(),
                ),
                OrderStatus::PendingContractor => {
                    (OrderStatus::PendingCrew, Role::Crew, order.links.crew_id.clone())
                }
                OrderStatus::PendingCrew => {
                    let crew = match principal.role() {
                        Role::Crew => principal.code().map(str::to_owned),
                        _ => order.next_actor_code.clone(),
                    };
                    (OrderStatus::ServiceInProgress, Role::Crew, crew)
                }
                _ => return Err(wrong_status(order, action)),
            };
            require_next_actor(order, principal)?;
            change.status = status;
            change.next_actor_role = Some(next_role);
            change.next_actor_code = next_code;
        }
    }
    Ok(())
}

fn reject(
    order: &Order,
    principal: &Principal,
    notes: Option<&str>,
    change: &mut OrderChange,
) -> Result<(), Error> {
    require_next_actor(order, principal)?;
    let reason = notes
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| Error::invalid_request("Rejection notes are required"))?;
    finish(change, OrderStatus::Rejected);
    change.rejection_reason = Some(reason.to_owned());
    Ok(())
}

fn deliver(
    order: &Order,
    principal: &Principal,
    now: DateTime<Utc>,
    change: &mut OrderChange,
) -> Result<(), Error> {
    let action = OrderAction::Deliver;
    require_role(principal, &[Role::Warehouse], action)?;
    require_type(order, OrderType::Product, action)?;
    if order.status != OrderStatus::AwaitingDelivery {
        return Err(wrong_status(order, action));
    }
    require_next_actor(order, principal)?;
    finish(change, OrderStatus::Delivered);
    change.delivery_date = Some(now);
    Ok(())
}

fn complete(order: &Order, principal: &Principal, change: &mut OrderChange) -> Result<(), Error> {
    let action = OrderAction::Complete;
    require_role(principal, &[Role::Crew, Role::Manager], action)?;
    require_type(order, OrderType::Service, action)?;
    if order.status != OrderStatus::ServiceInProgress {
        return Err(wrong_status(order, action));
    }
    if principal.role() == Role::Crew {
        require_next_actor(order, principal)?;
    }
    finish(change, OrderStatus::ServiceCompleted);
    Ok(())
}

fn cancel(order: &Order, principal: &Principal, change: &mut OrderChange) -> Result<(), Error> {
    if !principal.is_admin() && principal.code() != Some(order.creator_id.as_str()) {
        return Err(Error::forbidden("Only the creator can cancel this order"));
    }
    finish(change, OrderStatus::Cancelled);
    Ok(())
}

fn create_service(
    order: &Order,
    principal: &Principal,
    transformed_id: Option<&str>,
    now: DateTime<Utc>,
    change: &mut OrderChange,
) -> Result<(), Error> {
    let action = OrderAction::CreateService;
    require_role(principal, &[Role::Manager], action)?;
    require_type(order, OrderType::Service, action)?;
    let id = transformed_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map_or_else(|| format!("SVC-{}", now.timestamp_millis()), str::to_owned);
    change.transformed_id = Some(id);
    Ok(())
}

/// Validate `request` against the order and the caller, producing the
/// conditional update to apply.
///
/// Archived orders are not found; final orders conflict.
pub fn plan_transition(
    order: &Order,
    principal: &Principal,
    request: &OrderActionRequest,
    now: DateTime<Utc>,
) -> Result<OrderChange, Error> {
    if order.archived_at.is_some() {
        return Err(Error::not_found(format!("Order {} not found", order.order_id)));
    }
    if order.status.is_final() {
        return Err(Error::conflict("Order is already final"));
    }

    let mut change = OrderChange {
        order_id: order.order_id.clone(),
        expected_status: order.status,
        status: order.status,
        next_actor_role: order.next_actor_role,
        next_actor_code: order.next_actor_code.clone(),
        assigned_warehouse: None,
        rejection_reason: None,
        delivery_date: None,
        transformed_id: None,
        actor: Participant {
            participant_id: principal.actor_id(),
            participant_role: principal.role(),
            participation_type: ParticipationType::Actor,
        },
    };

    match request.action {
        OrderAction::Accept => accept(order, principal, &mut change)?,
        OrderAction::Reject => reject(order, principal, request.notes.as_deref(), &mut change)?,
        OrderAction::Deliver => deliver(order, principal, now, &mut change)?,
        OrderAction::Complete => complete(order, principal, &mut change)?,
        OrderAction::Cancel => cancel(order, principal, &mut change)?,
        OrderAction::CreateService => create_service(
            order,
            principal,
            request.transformed_id.as_deref(),
            now,
            &mut change,
        )?,
    }
    Ok(change)
}

/// Status of `order` from the point of view of `viewer`.
#[must_use]
pub fn viewer_status(order: &Order, viewer: &Principal) -> ViewerStatus {
    match order.status {
        OrderStatus::Cancelled => ViewerStatus::Cancelled,
        OrderStatus::Rejected => ViewerStatus::Rejected,
        OrderStatus::Delivered | OrderStatus::ServiceCompleted => ViewerStatus::Completed,
        _ if is_next_actor(order, viewer) => ViewerStatus::Pending,
        _ => ViewerStatus::InProgress,
    }
}

/// Whether `viewer` may see `order` in hub listings and detail views.
///
/// Archived orders are hidden from everyone; admins see the rest.
#[must_use]
pub fn is_visible_to(order: &Order, viewer: &Principal) -> bool {
    if order.archived_at.is_some() {
        return false;
    }
    if viewer.is_admin() {
        return true;
    }
    let Some(code) = viewer.code() else {
        return false;
    };
    let is = |value: &Option<String>| value.as_deref() == Some(code);
    let created = order.creator_id == code;
    let addressed = order
        .destination
        .as_ref()
        .is_some_and(|destination| destination.code == code);
    match viewer.role() {
        Role::Customer => created || is(&order.links.customer_id),
        Role::Center => created || addressed || is(&order.links.center_id),
        Role::Manager => created || is(&order.links.manager_id),
        Role::Contractor => created || is(&order.links.contractor_id),
        Role::Crew => created || is(&order.links.crew_id),
        Role::Warehouse => addressed || is(&order.assigned_warehouse),
        Role::Admin => true,
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
