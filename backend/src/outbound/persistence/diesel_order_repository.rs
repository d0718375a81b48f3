//! PostgreSQL-backed `OrderRepository` implementation using Diesel ORM.
//!
//! Orders, their line items, participants, and the matching activity row
//! are written in one transaction. Status changes are conditional on the
//! stored status so concurrent actions cannot both apply.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::dsl::now;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{OrderRepository, OrderRepositoryError};
use crate::domain::{
    ActivityDraft, CatalogItem, Destination, EcosystemLinks, NewOrder, Order, OrderChange,
    OrderItem, OrderStatus, OrderType, Principal, Role, role_for_code,
};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::diesel_helpers::{decode, decode_opt, insert_activity, next_value};
use super::models::{
    CatalogRow, NewOrderItemRow, NewOrderRow, NewParticipantRow, OrderChangeRow, OrderItemRow,
    OrderRow,
};
use super::pool::DbPool;
use super::schema::{
    catalog_products, catalog_services, order_items, order_participants, orders, warehouses,
};

/// Diesel-backed implementation of the order repository port.
#[derive(Clone)]
pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const fn sequence_for(order_type: OrderType) -> &'static str {
    match order_type {
        OrderType::Product => "order_product_sequence",
        OrderType::Service => "order_service_sequence",
    }
}

fn row_to_item(row: OrderItemRow) -> OrderItem {
    OrderItem {
        id: row.id,
        line_number: row.line_number,
        catalog_item_code: row.catalog_item_code,
        name: row.name,
        item_type: row.item_type,
        description: row.description,
        quantity: row.quantity,
        unit_of_measure: row.unit_of_measure,
        unit_price: row.unit_price,
        currency: row.currency,
        total_price: row.total_price,
        metadata: row.metadata,
    }
}

fn destination(
    code: Option<String>,
    role: Option<&str>,
) -> Result<Option<Destination>, OrderRepositoryError> {
    let Some(code) = code else {
        return Ok(None);
    };
    let role = match decode_opt::<Role, _>(role, "destination_role")? {
        Some(role) => Some(role),
        None => role_for_code(&code),
    };
    Ok(role.map(|role| Destination { role, code }))
}

/// Convert a database row into a domain order.
fn row_to_order(row: OrderRow, items: Vec<OrderItemRow>) -> Result<Order, OrderRepositoryError> {
    let mut items: Vec<OrderItem> = items.into_iter().map(row_to_item).collect();
    items.sort_by_key(|item| item.line_number);
    Ok(Order {
        order_type: decode(&row.order_type, "order_type")?,
        status: OrderStatus::from_stored(&row.status),
        next_actor_role: decode_opt(row.next_actor_role.as_deref(), "next_actor_role")?,
        creator_role: decode(&row.creator_role, "creator_role")?,
        destination: destination(row.destination, row.destination_role.as_deref())?,
        links: EcosystemLinks {
            manager_id: row.manager_id,
            contractor_id: row.contractor_id,
            customer_id: row.customer_id,
            center_id: row.center_id,
            crew_id: row.crew_id,
        },
        order_id: row.order_id,
        title: row.title,
        next_actor_code: row.next_actor_code,
        creator_id: row.creator_id,
        assigned_warehouse: row.assigned_warehouse,
        expected_date: row.expected_date,
        delivery_date: row.delivery_date,
        transformed_id: row.transformed_id,
        rejection_reason: row.rejection_reason,
        notes: row.notes,
        total_amount: row.total_amount,
        currency: row.currency,
        metadata: row.metadata,
        items,
        created_at: row.created_at,
        updated_at: row.updated_at,
        archived_at: row.archived_at,
    })
}

async fn load_order(
    conn: &mut AsyncPgConnection,
    order_id: &str,
) -> QueryResult<Option<(OrderRow, Vec<OrderItemRow>)>> {
    let Some(row) = orders::table
        .filter(orders::order_id.eq(order_id))
        .select(OrderRow::as_select())
        .first::<OrderRow>(conn)
        .await
        .optional()?
    else {
        return Ok(None);
    };
    let items = order_items::table
        .filter(order_items::order_id.eq(order_id))
        .order(order_items::line_number.asc())
        .select(OrderItemRow::as_select())
        .load(conn)
        .await?;
    Ok(Some((row, items)))
}

fn new_order_row(order: &NewOrder) -> NewOrderRow<'_> {
    NewOrderRow {
        order_id: &order.order_id,
        order_type: order.order_type.as_str(),
        title: &order.title,
        status: order.status.as_str(),
        next_actor_role: order.next_actor_role.map(Role::as_str),
        next_actor_code: order.next_actor_code.as_deref(),
        creator_id: &order.creator_id,
        creator_role: order.creator_role.as_str(),
        destination: order.destination.as_ref().map(|d| d.code.as_str()),
        destination_role: order.destination.as_ref().map(|d| d.role.as_str()),
        manager_id: order.links.manager_id.as_deref(),
        contractor_id: order.links.contractor_id.as_deref(),
        customer_id: order.links.customer_id.as_deref(),
        center_id: order.links.center_id.as_deref(),
        crew_id: order.links.crew_id.as_deref(),
        assigned_warehouse: order.assigned_warehouse.as_deref(),
        expected_date: order.expected_date,
        notes: order.notes.as_deref(),
        total_amount: order.total_amount,
        currency: &order.currency,
        metadata: &order.metadata,
    }
}

/// Visibility predicate matching the hub listing rules.
fn visible_to(viewer: &Principal) -> Option<orders::BoxedQuery<'_, Pg>> {
    let query = orders::table
        .filter(orders::archived_at.is_null())
        .into_boxed();
    if viewer.is_admin() {
        return Some(query);
    }
    let code = viewer.code()?;
    let created = orders::creator_id.eq(code);
    Some(match viewer.role() {
        Role::Customer => query.filter(created.or(orders::customer_id.eq(code))),
        Role::Center => query.filter(
            created
                .or(orders::center_id.eq(code))
                .or(orders::destination.eq(code)),
        ),
        Role::Manager => query.filter(created.or(orders::manager_id.eq(code))),
        Role::Contractor => query.filter(created.or(orders::contractor_id.eq(code))),
        Role::Crew => query.filter(created.or(orders::crew_id.eq(code))),
        Role::Warehouse => query.filter(
            orders::destination
                .eq(code)
                .or(orders::assigned_warehouse.eq(code)),
        ),
        Role::Admin => query,
    })
}

/// Outcome of a conditional update inside a transaction.
enum ApplyResult {
    Applied(Box<(OrderRow, Vec<OrderItemRow>)>),
    StatusMoved,
}

#[async_trait]
impl OrderRepository for DieselOrderRepository {
    async fn next_sequence(&self, order_type: OrderType) -> Result<i64, OrderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        next_value(&mut conn, sequence_for(order_type))
            .await
            .map_err(map_diesel_error)
    }

    async fn find_catalog_item(
        &self,
        order_type: OrderType,
        code: &str,
    ) -> Result<Option<CatalogItem>, OrderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<CatalogRow> = match order_type {
            OrderType::Product => catalog_products::table
                .filter(catalog_products::product_id.eq(code))
                .filter(catalog_products::is_active.eq(true))
                .select((
                    catalog_products::product_id,
                    catalog_products::name,
                    catalog_products::description,
                    catalog_products::unit_of_measure,
                    catalog_products::unit_price,
                    catalog_products::currency,
                ))
                .first(&mut conn)
                .await
                .optional(),
            OrderType::Service => catalog_services::table
                .filter(catalog_services::service_id.eq(code))
                .filter(catalog_services::is_active.eq(true))
                .select((
                    catalog_services::service_id,
                    catalog_services::name,
                    catalog_services::description,
                    catalog_services::unit_of_measure,
                    catalog_services::unit_price,
                    catalog_services::currency,
                ))
                .first(&mut conn)
                .await
                .optional(),
        }
        .map_err(map_diesel_error)?;
        Ok(row.map(|row| CatalogItem {
            code: row.code,
            name: row.name,
            item_type: order_type.as_str().to_owned(),
            description: row.description,
            unit_of_measure: row.unit_of_measure,
            unit_price: row.unit_price,
            currency: row.currency,
        }))
    }

    async fn default_warehouse(&self) -> Result<Option<String>, OrderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        warehouses::table
            .filter(warehouses::archived_at.is_null())
            .order(warehouses::warehouse_id.asc())
            .select(warehouses::warehouse_id)
            .first::<String>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)
    }

    async fn insert(
        &self,
        order: &NewOrder,
        activity: &ActivityDraft,
    ) -> Result<Order, OrderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let item_rows: Vec<NewOrderItemRow<'_>> = order
            .items
            .iter()
            .map(|item| NewOrderItemRow {
                order_id: &order.order_id,
                line_number: item.line_number,
                catalog_item_code: &item.catalog_item_code,
                name: &item.name,
                item_type: &item.item_type,
                description: item.description.as_deref(),
                quantity: item.quantity,
                unit_of_measure: item.unit_of_measure.as_deref(),
                unit_price: item.unit_price,
                currency: &item.currency,
                total_price: item.total_price,
                metadata: &item.metadata,
            })
            .collect();
        let participant_rows: Vec<NewParticipantRow<'_>> = order
            .participants
            .iter()
            .map(|participant| NewParticipantRow {
                order_id: &order.order_id,
                participant_id: &participant.participant_id,
                participant_role: participant.participant_role.as_str(),
                participation_type: participant.participation_type.as_str(),
            })
            .collect();
        let order_row = new_order_row(order);

        let (row, items) = conn
            .transaction(|conn| {
                async move {
                    diesel::insert_into(orders::table)
                        .values(&order_row)
                        .execute(conn)
                        .await?;
                    diesel::insert_into(order_items::table)
                        .values(&item_rows)
                        .execute(conn)
                        .await?;
                    if !participant_rows.is_empty() {
                        diesel::insert_into(order_participants::table)
                            .values(&participant_rows)
                            .on_conflict((
                                order_participants::order_id,
                                order_participants::participant_id,
                                order_participants::participant_role,
                            ))
                            .do_nothing()
                            .execute(conn)
                            .await?;
                    }
                    insert_activity(conn, activity).await?;
                    load_order(conn, order_row.order_id)
                        .await?
                        .ok_or(diesel::result::Error::NotFound)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        row_to_order(row, items)
    }

    async fn find_by_id(&self, order_id: &str) -> Result<Option<Order>, OrderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        load_order(&mut conn, order_id)
            .await
            .map_err(map_diesel_error)?
            .map(|(row, items)| row_to_order(row, items))
            .transpose()
    }

    async fn apply(
        &self,
        change: &OrderChange,
        activity: &ActivityDraft,
    ) -> Result<Order, OrderRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let changeset = OrderChangeRow {
            status: change.status.as_str(),
            next_actor_role: Some(change.next_actor_role.map(Role::as_str)),
            next_actor_code: Some(change.next_actor_code.as_deref()),
            assigned_warehouse: change.assigned_warehouse.as_deref(),
            rejection_reason: change.rejection_reason.as_deref(),
            delivery_date: change.delivery_date,
            transformed_id: change.transformed_id.as_deref(),
        };
        let actor = NewParticipantRow {
            order_id: &change.order_id,
            participant_id: &change.actor.participant_id,
            participant_role: change.actor.participant_role.as_str(),
            participation_type: change.actor.participation_type.as_str(),
        };

        let result = conn
            .transaction(|conn| {
                async move {
                    let updated = diesel::update(
                        orders::table
                            .filter(orders::order_id.eq(&change.order_id))
                            .filter(orders::status.eq(change.expected_status.as_str()))
                            .filter(orders::archived_at.is_null()),
                    )
                    .set((&changeset, orders::updated_at.eq(now)))
                    .execute(conn)
                    .await?;
                    if updated == 0 {
                        return Ok(ApplyResult::StatusMoved);
                    }
                    diesel::insert_into(order_participants::table)
                        .values(&actor)
                        .on_conflict((
                            order_participants::order_id,
                            order_participants::participant_id,
                            order_participants::participant_role,
                        ))
                        .do_nothing()
                        .execute(conn)
                        .await?;
                    insert_activity(conn, activity).await?;
                    let loaded = load_order(conn, &change.order_id)
                        .await?
                        .ok_or(diesel::result::Error::NotFound)?;
                    Ok(ApplyResult::Applied(Box::new(loaded)))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        match result {
            ApplyResult::Applied(loaded) => {
                let (row, items) = *loaded;
                row_to_order(row, items)
            }
            ApplyResult::StatusMoved => Err(OrderRepositoryError::conflict(format!(
                "{} is no longer {}",
                change.order_id, change.expected_status
            ))),
        }
    }

    async fn list_visible(&self, viewer: &Principal) -> Result<Vec<Order>, OrderRepositoryError> {
        let Some(query) = visible_to(viewer) else {
            return Ok(Vec::new());
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<OrderRow> = query
            .order((orders::created_at.desc(), orders::order_id.desc()))
            .select(OrderRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<&str> = rows.iter().map(|row| row.order_id.as_str()).collect();
        let item_rows: Vec<OrderItemRow> = order_items::table
            .filter(order_items::order_id.eq_any(&ids))
            .select(OrderItemRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let mut items_by_order: HashMap<String, Vec<OrderItemRow>> = HashMap::new();
        for item in item_rows {
            items_by_order
                .entry(item.order_id.clone())
                .or_default()
                .push(item);
        }
        rows.into_iter()
            .map(|row| {
                let items = items_by_order.remove(&row.order_id).unwrap_or_default();
                row_to_order(row, items)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("WHS-001"), Some("warehouse"), Some(Role::Warehouse))]
    #[case(Some("CEN-010"), None, Some(Role::Center))]
    #[case(Some("XYZ-1"), None, None)]
    #[case(None, Some("center"), None)]
    fn destinations_fall_back_to_code_prefix(
        #[case] code: Option<&str>,
        #[case] role: Option<&str>,
        #[case] expected: Option<Role>,
    ) {
        let parsed = destination(code.map(str::to_owned), role).expect("decodes");
        assert_eq!(parsed.map(|d| d.role), expected);
    }

    #[rstest]
    fn unknown_destination_role_is_a_query_error() {
        let error = destination(Some("CEN-010".to_owned()), Some("owner")).expect_err("invalid");
        assert!(matches!(error, OrderRepositoryError::Query { .. }));
    }

    #[rstest]
    fn hub_without_code_sees_nothing() {
        let viewer = Principal::hub(Role::Center, "  ");
        assert!(visible_to(&viewer).is_none());
    }

    #[rstest]
    #[case(OrderType::Product, "order_product_sequence")]
    #[case(OrderType::Service, "order_service_sequence")]
    fn sequences_per_type(#[case] order_type: OrderType, #[case] expected: &str) {
        assert_eq!(sequence_for(order_type), expected);
    }
}
