//! Product and service orders.
//!
//! An order is created by a hub account, routed to the next actor (a
//! warehouse for product orders, the creator's manager for service orders),
//! and advanced by actions until it reaches a final status. Every change is
//! paired with an activity row written in the same transaction.

mod id;
mod lifecycle;
mod service;
#[cfg(test)]
pub(crate) mod test_fixtures;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::{EcosystemLinks, Role};

pub use id::{format_order_id, order_id_prefix};
pub use lifecycle::{is_visible_to, plan_transition, viewer_status};
pub use service::OrderService;

/// Currency recorded when the catalog does not name one.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Kind of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    /// Catalog products shipped from a warehouse.
    Product,
    /// Catalog services performed by crew.
    Service,
}

impl OrderType {
    /// Lower-case name stored in `orders.order_type`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Service => "service",
        }
    }

    /// Infix used in order ids.
    #[must_use]
    pub const fn id_infix(self) -> &'static str {
        match self {
            Self::Product => "PO",
            Self::Service => "SO",
        }
    }

    /// Title used when the request leaves it blank.
    #[must_use]
    pub const fn default_title(self) -> &'static str {
        match self {
            Self::Product => "Product Order",
            Self::Service => "Service Order",
        }
    }

    pub(crate) const fn catalog_noun(self) -> &'static str {
        match self {
            Self::Product => "Product",
            Self::Service => "Service",
        }
    }
}

impl FromStr for OrderType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "product" => Ok(Self::Product),
            "service" => Ok(Self::Service),
            other => Err(format!("unknown order type: {other}")),
        }
    }
}

/// Workflow status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    PendingWarehouse,
    AwaitingDelivery,
    Delivered,
    PendingManager,
    PendingContractor,
    PendingCrew,
    ServiceInProgress,
    ServiceCompleted,
    Cancelled,
    Rejected,
}

impl OrderStatus {
    /// Parse a stored status, mapping legacy values onto the current set.
    ///
    /// Unknown values fall back to `pending_warehouse`.
    ///
    /// # Examples
    /// ```
    /// use cks_backend::domain::OrderStatus;
    ///
    /// assert_eq!(OrderStatus::from_stored("approved"), OrderStatus::PendingContractor);
    /// assert_eq!(OrderStatus::from_stored("Delivered"), OrderStatus::Delivered);
    /// ```
    #[must_use]
    pub fn from_stored(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "awaiting_delivery" | "in-progress" => Self::AwaitingDelivery,
            "delivered" => Self::Delivered,
            "pending_manager" => Self::PendingManager,
            "pending_contractor" | "approved" => Self::PendingContractor,
            "pending_crew" => Self::PendingCrew,
            "service_in_progress" => Self::ServiceInProgress,
            "service_completed" | "service-created" | "completed" => Self::ServiceCompleted,
            "cancelled" => Self::Cancelled,
            "rejected" => Self::Rejected,
            _ => Self::PendingWarehouse,
        }
    }

    /// Snake-case name stored in `orders.status`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PendingWarehouse => "pending_warehouse",
            Self::AwaitingDelivery => "awaiting_delivery",
            Self::Delivered => "delivered",
            Self::PendingManager => "pending_manager",
            Self::PendingContractor => "pending_contractor",
            Self::PendingCrew => "pending_crew",
            Self::ServiceInProgress => "service_in_progress",
            Self::ServiceCompleted => "service_completed",
            Self::Cancelled => "cancelled",
            Self::Rejected => "rejected",
        }
    }

    /// No further actions apply.
    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(
            self,
            Self::Rejected | Self::Cancelled | Self::Delivered | Self::ServiceCompleted
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action applied to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum OrderAction {
    Accept,
    Reject,
    Deliver,
    Complete,
    Cancel,
    CreateService,
}

impl OrderAction {
    /// Kebab-case name used in requests.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Reject => "reject",
            Self::Deliver => "deliver",
            Self::Complete => "complete",
            Self::Cancel => "cancel",
            Self::CreateService => "create-service",
        }
    }

    /// Activity type recorded for the action, e.g. `order_create_service`.
    #[must_use]
    pub fn activity_type(self) -> String {
        format!("order_{}", self.as_str().replace('-', "_"))
    }
}

/// Status of an order as seen by one viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ViewerStatus {
    /// The viewer is the next actor.
    Pending,
    /// Someone else must act.
    InProgress,
    Completed,
    Cancelled,
    Rejected,
}

/// How an account takes part in an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ParticipationType {
    Creator,
    Destination,
    Actor,
    Watcher,
}

impl ParticipationType {
    /// Lower-case name stored in `order_participants`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Creator => "creator",
            Self::Destination => "destination",
            Self::Actor => "actor",
            Self::Watcher => "watcher",
        }
    }
}

/// One participant row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub participant_id: String,
    pub participant_role: Role,
    pub participation_type: ParticipationType,
}

/// Role and code an order is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    pub role: Role,
    pub code: String,
}

/// Requested line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub catalog_item_code: String,
    pub quantity: i32,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Value>,
}

/// Order creation payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub order_type: OrderType,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub destination: Option<Destination>,
    /// RFC 3339 timestamp or `YYYY-MM-DD` date; must not be in the past.
    #[serde(default)]
    pub expected_date: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub items: Vec<OrderItemRequest>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Value>,
}

/// Action payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderActionRequest {
    pub action: OrderAction,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub transformed_id: Option<String>,
}

/// Active catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub code: String,
    pub name: String,
    pub item_type: String,
    pub description: Option<String>,
    pub unit_of_measure: Option<String>,
    /// Price in minor units (cents).
    pub unit_price: i64,
    pub currency: Option<String>,
}

/// Line item awaiting insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderItem {
    pub line_number: i32,
    pub catalog_item_code: String,
    pub name: String,
    pub item_type: String,
    pub description: Option<String>,
    pub quantity: i32,
    pub unit_of_measure: Option<String>,
    pub unit_price: i64,
    pub currency: String,
    pub total_price: i64,
    pub metadata: Value,
}

/// Stored line item. Prices are minor units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: i64,
    pub line_number: i32,
    pub catalog_item_code: String,
    pub name: String,
    pub item_type: String,
    pub description: Option<String>,
    pub quantity: i32,
    pub unit_of_measure: Option<String>,
    pub unit_price: i64,
    pub currency: String,
    pub total_price: i64,
    #[schema(value_type = Object)]
    pub metadata: Value,
}

/// Order awaiting insertion with its items and participants.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub order_id: String,
    pub order_type: OrderType,
    pub title: String,
    pub status: OrderStatus,
    pub next_actor_role: Option<Role>,
    pub next_actor_code: Option<String>,
    pub creator_id: String,
    pub creator_role: Role,
    pub destination: Option<Destination>,
    pub links: EcosystemLinks,
    pub assigned_warehouse: Option<String>,
    pub expected_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub total_amount: i64,
    pub currency: String,
    pub metadata: Value,
    pub items: Vec<NewOrderItem>,
    pub participants: Vec<Participant>,
}

/// Stored order with its items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: String,
    pub order_type: OrderType,
    pub title: String,
    pub status: OrderStatus,
    pub next_actor_role: Option<Role>,
    pub next_actor_code: Option<String>,
    pub creator_id: String,
    pub creator_role: Role,
    pub destination: Option<Destination>,
    #[serde(flatten)]
    pub links: EcosystemLinks,
    pub assigned_warehouse: Option<String>,
    pub expected_date: Option<DateTime<Utc>>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub transformed_id: Option<String>,
    pub rejection_reason: Option<String>,
    pub notes: Option<String>,
    pub total_amount: i64,
    pub currency: String,
    #[schema(value_type = Object)]
    pub metadata: Value,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

/// Conditional update produced by [`plan_transition`].
///
/// Adapters apply it only while the stored status still equals
/// `expected_status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderChange {
    pub order_id: String,
    pub expected_status: OrderStatus,
    pub status: OrderStatus,
    pub next_actor_role: Option<Role>,
    pub next_actor_code: Option<String>,
    /// New assigned warehouse; `None` keeps the stored value.
    pub assigned_warehouse: Option<String>,
    pub rejection_reason: Option<String>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub transformed_id: Option<String>,
    pub actor: Participant,
}

/// Order annotated with the caller's view of its status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub viewer_status: ViewerStatus,
}

/// Orders visible to one hub account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HubOrders {
    pub role: Role,
    pub cks_code: Option<String>,
    pub service_orders: Vec<OrderView>,
    pub product_orders: Vec<OrderView>,
    pub orders: Vec<OrderView>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("pending", OrderStatus::PendingWarehouse)]
    #[case("in-progress", OrderStatus::AwaitingDelivery)]
    #[case("approved", OrderStatus::PendingContractor)]
    #[case("service-created", OrderStatus::ServiceCompleted)]
    #[case("completed", OrderStatus::ServiceCompleted)]
    #[case(" PENDING_CREW ", OrderStatus::PendingCrew)]
    #[case("mystery", OrderStatus::PendingWarehouse)]
    fn legacy_statuses_normalise(#[case] stored: &str, #[case] expected: OrderStatus) {
        assert_eq!(OrderStatus::from_stored(stored), expected);
    }

    #[rstest]
    #[case(OrderStatus::Rejected, true)]
    #[case(OrderStatus::Cancelled, true)]
    #[case(OrderStatus::Delivered, true)]
    #[case(OrderStatus::ServiceCompleted, true)]
    #[case(OrderStatus::AwaitingDelivery, false)]
    #[case(OrderStatus::ServiceInProgress, false)]
    fn final_statuses(#[case] status: OrderStatus, #[case] expected: bool) {
        assert_eq!(status.is_final(), expected);
    }

    #[rstest]
    fn status_round_trips_through_storage_name() {
        for status in [
            OrderStatus::PendingWarehouse,
            OrderStatus::AwaitingDelivery,
            OrderStatus::PendingManager,
            OrderStatus::ServiceInProgress,
        ] {
            assert_eq!(OrderStatus::from_stored(status.as_str()), status);
        }
    }

    #[rstest]
    #[case(OrderAction::Accept, "order_accept")]
    #[case(OrderAction::CreateService, "order_create_service")]
    fn action_activity_types(#[case] action: OrderAction, #[case] expected: &str) {
        assert_eq!(action.activity_type(), expected);
    }

    #[rstest]
    fn action_request_reads_kebab_case() {
        let request: OrderActionRequest =
            serde_json::from_str(r#"{"action":"create-service","transformedId":"SVC-1"}"#)
                .expect("valid payload");
        assert_eq!(request.action, OrderAction::CreateService);
        assert_eq!(request.transformed_id.as_deref(), Some("SVC-1"));
    }
}
