//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Repositories convert them into domain
//! values, validating enum columns on the way.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

use super::schema::{
    archive_relationships, feedback, feedback_acknowledgments, order_items, order_participants,
    orders, report_acknowledgments, reports, system_activity,
};

// ---------------------------------------------------------------------------
// Activity
// ---------------------------------------------------------------------------

/// Row read from `system_activity`.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = system_activity)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ActivityRow {
    pub activity_id: i64,
    pub activity_type: String,
    pub description: String,
    pub actor_id: String,
    pub actor_role: String,
    pub target_id: Option<String>,
    pub target_type: Option<String>,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

/// Insertable activity row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = system_activity)]
pub(crate) struct NewActivityRow<'a> {
    pub activity_type: &'a str,
    pub description: &'a str,
    pub actor_id: &'a str,
    pub actor_role: &'a str,
    pub target_id: Option<&'a str>,
    pub target_type: Option<&'a str>,
    pub metadata: &'a Value,
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// Row read from `orders`.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct OrderRow {
    pub order_id: String,
    pub order_type: String,
    pub title: String,
    pub status: String,
    pub next_actor_role: Option<String>,
    pub next_actor_code: Option<String>,
    pub creator_id: String,
    pub creator_role: String,
    pub destination: Option<String>,
    pub destination_role: Option<String>,
    pub manager_id: Option<String>,
    pub contractor_id: Option<String>,
    pub customer_id: Option<String>,
    pub center_id: Option<String>,
    pub crew_id: Option<String>,
    pub assigned_warehouse: Option<String>,
    pub expected_date: Option<DateTime<Utc>>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub transformed_id: Option<String>,
    pub rejection_reason: Option<String>,
    pub notes: Option<String>,
    pub total_amount: i64,
    pub currency: String,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

/// Insertable order row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = orders)]
pub(crate) struct NewOrderRow<'a> {
    pub order_id: &'a str,
    pub order_type: &'a str,
    pub title: &'a str,
    pub status: &'a str,
    pub next_actor_role: Option<&'a str>,
    pub next_actor_code: Option<&'a str>,
    pub creator_id: &'a str,
    pub creator_role: &'a str,
    pub destination: Option<&'a str>,
    pub destination_role: Option<&'a str>,
    pub manager_id: Option<&'a str>,
    pub contractor_id: Option<&'a str>,
    pub customer_id: Option<&'a str>,
    pub center_id: Option<&'a str>,
    pub crew_id: Option<&'a str>,
    pub assigned_warehouse: Option<&'a str>,
    pub expected_date: Option<DateTime<Utc>>,
    pub notes: Option<&'a str>,
    pub total_amount: i64,
    pub currency: &'a str,
    pub metadata: &'a Value,
}

/// Conditional status change.
///
/// `None` fields are left untouched by Diesel.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = orders)]
pub(crate) struct OrderChangeRow<'a> {
    pub status: &'a str,
    pub next_actor_role: Option<Option<&'a str>>,
    pub next_actor_code: Option<Option<&'a str>>,
    pub assigned_warehouse: Option<&'a str>,
    pub rejection_reason: Option<&'a str>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub transformed_id: Option<&'a str>,
}

/// Row read from `order_items`.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = order_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct OrderItemRow {
    pub id: i64,
    pub order_id: String,
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

/// Insertable line item.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = order_items)]
pub(crate) struct NewOrderItemRow<'a> {
    pub order_id: &'a str,
    pub line_number: i32,
    pub catalog_item_code: &'a str,
    pub name: &'a str,
    pub item_type: &'a str,
    pub description: Option<&'a str>,
    pub quantity: i32,
    pub unit_of_measure: Option<&'a str>,
    pub unit_price: i64,
    pub currency: &'a str,
    pub total_price: i64,
    pub metadata: &'a Value,
}

/// Insertable participant.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = order_participants)]
pub(crate) struct NewParticipantRow<'a> {
    pub order_id: &'a str,
    pub participant_id: &'a str,
    pub participant_role: &'a str,
    pub participation_type: &'a str,
}

/// Catalog entry read from either catalog table.
#[derive(Debug, Clone, Queryable)]
pub(crate) struct CatalogRow {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub unit_of_measure: Option<String>,
    pub unit_price: i64,
    pub currency: Option<String>,
}

// ---------------------------------------------------------------------------
// Reports and feedback
// ---------------------------------------------------------------------------

/// Row read from `reports`.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = reports)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ReportRow {
    pub report_id: String,
    pub report_type: String,
    pub severity: String,
    pub title: String,
    pub description: String,
    pub center_id: Option<String>,
    pub customer_id: Option<String>,
    pub status: String,
    pub created_by_role: String,
    pub created_by_id: String,
    pub cks_manager: Option<String>,
    pub resolution_notes: Option<String>,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

/// Insertable report.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = reports)]
pub(crate) struct NewReportRow<'a> {
    pub report_id: &'a str,
    pub report_type: &'a str,
    pub severity: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub center_id: Option<&'a str>,
    pub customer_id: Option<&'a str>,
    pub status: &'a str,
    pub created_by_role: &'a str,
    pub created_by_id: &'a str,
    pub cks_manager: Option<&'a str>,
}

/// Row read from `feedback`.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = feedback)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct FeedbackRow {
    pub feedback_id: String,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub center_id: Option<String>,
    pub customer_id: Option<String>,
    pub status: String,
    pub created_by_role: String,
    pub created_by_id: String,
    pub cks_manager: Option<String>,
    pub created_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

/// Insertable feedback.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = feedback)]
pub(crate) struct NewFeedbackRow<'a> {
    pub feedback_id: &'a str,
    pub kind: &'a str,
    pub title: &'a str,
    pub message: &'a str,
    pub center_id: Option<&'a str>,
    pub customer_id: Option<&'a str>,
    pub status: &'a str,
    pub created_by_role: &'a str,
    pub created_by_id: &'a str,
    pub cks_manager: Option<&'a str>,
}

/// Acknowledgment of a report.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = report_acknowledgments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ReportAckRow {
    pub report_id: String,
    pub acknowledged_by_id: String,
    pub acknowledged_by_role: String,
    pub acknowledged_at: DateTime<Utc>,
}

/// Acknowledgment of a feedback ticket.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = feedback_acknowledgments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct FeedbackAckRow {
    pub feedback_id: String,
    pub acknowledged_by_id: String,
    pub acknowledged_by_role: String,
    pub acknowledged_at: DateTime<Utc>,
}

/// Insertable report acknowledgment.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = report_acknowledgments)]
pub(crate) struct NewReportAckRow<'a> {
    pub report_id: &'a str,
    pub acknowledged_by_id: &'a str,
    pub acknowledged_by_role: &'a str,
}

/// Insertable feedback acknowledgment.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = feedback_acknowledgments)]
pub(crate) struct NewFeedbackAckRow<'a> {
    pub feedback_id: &'a str,
    pub acknowledged_by_id: &'a str,
    pub acknowledged_by_role: &'a str,
}

// ---------------------------------------------------------------------------
// Archive
// ---------------------------------------------------------------------------

/// Row read from `archive_relationships`.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = archive_relationships)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ArchiveRelationshipRow {
    pub entity_type: String,
    pub entity_id: String,
    pub parent_type: String,
    pub parent_id: String,
    pub relationship_data: Value,
    pub archived_by: Option<String>,
    pub archived_at: DateTime<Utc>,
    pub restored: bool,
}

/// Insertable relationship.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = archive_relationships)]
pub(crate) struct NewArchiveRelationshipRow<'a> {
    pub entity_type: &'a str,
    pub entity_id: &'a str,
    pub parent_type: &'a str,
    pub parent_id: &'a str,
    pub relationship_data: &'a Value,
    pub archived_by: &'a str,
    pub archived_at: DateTime<Utc>,
}
