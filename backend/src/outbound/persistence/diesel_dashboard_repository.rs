//! PostgreSQL-backed `DashboardRepository` computing KPI snapshots.

use async_trait::async_trait;
use diesel::dsl::{count_star, exists, not, select, sql};
use diesel::prelude::*;
use diesel::sql_types::BigInt;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{DashboardRepository, DashboardRepositoryError};
use crate::domain::{KpiScope, Kpis, OrderStatus, Role};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::pool::DbPool;
use super::schema::{
    centers, contractors, crew, customers, managers, order_items, orders, warehouses,
};

/// Diesel-backed implementation of the dashboard port.
#[derive(Clone)]
pub struct DieselDashboardRepository {
    pool: DbPool,
}

impl DieselDashboardRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const REVENUE_STATUSES: [&str; 2] = [
    OrderStatus::Delivered.as_str(),
    OrderStatus::ServiceCompleted.as_str(),
];

const FINAL_STATUSES: [&str; 4] = [
    OrderStatus::Delivered.as_str(),
    OrderStatus::ServiceCompleted.as_str(),
    OrderStatus::Cancelled.as_str(),
    OrderStatus::Rejected.as_str(),
];

/// Orders a KPI scope aggregates over.
#[derive(Debug, Clone, PartialEq, Eq)]
enum OrderFilter {
    All,
    Manager(String),
    Contractor(String),
    Customer(String),
    Center(String),
    Crew(String),
    Warehouse(String),
    Creator(String),
}

/// Applies an [`OrderFilter`] to any boxed query that includes `orders`.
macro_rules! filter_orders {
    ($query:expr, $filter:expr) => {{
        let query = $query.filter(orders::archived_at.is_null());
        match $filter {
            OrderFilter::All => query,
            OrderFilter::Manager(code) => query.filter(orders::manager_id.eq(code)),
            OrderFilter::Contractor(code) => query.filter(orders::contractor_id.eq(code)),
            OrderFilter::Customer(code) => query.filter(orders::customer_id.eq(code)),
            OrderFilter::Center(code) => query.filter(orders::center_id.eq(code)),
            OrderFilter::Crew(code) => query.filter(
                orders::crew_id
                    .eq(code)
                    .or(orders::creator_id.eq(code)),
            ),
            OrderFilter::Warehouse(code) => query.filter(
                orders::assigned_warehouse
                    .eq(code)
                    .or(orders::destination.eq(code)),
            ),
            OrderFilter::Creator(code) => query.filter(orders::creator_id.eq(code)),
        }
    }};
}

/// Count of non-archived rows in `$table`, optionally restricted by `$column`.
macro_rules! count_active {
    ($conn:expr, $table:ident) => {
        $table::table
            .filter($table::archived_at.is_null())
            .select(count_star())
            .get_result::<i64>($conn)
            .await
    };
    ($conn:expr, $table:ident, $column:ident = $value:expr) => {
        $table::table
            .filter($table::archived_at.is_null())
            .filter($table::$column.eq($value))
            .select(count_star())
            .get_result::<i64>($conn)
            .await
    };
}

/// Whether a non-archived row with `$id = $code` exists.
macro_rules! active_exists {
    ($conn:expr, $table:ident, $id:ident, $code:expr) => {
        select(exists(
            $table::table
                .filter($table::$id.eq($code))
                .filter($table::archived_at.is_null()),
        ))
        .get_result::<bool>($conn)
        .await
    };
}

async fn account_is_active(
    conn: &mut AsyncPgConnection,
    role: Role,
    code: &str,
) -> QueryResult<bool> {
    match role {
        Role::Admin => Ok(true),
        Role::Manager => active_exists!(conn, managers, manager_id, code),
        Role::Contractor => active_exists!(conn, contractors, contractor_id, code),
        Role::Customer => active_exists!(conn, customers, customer_id, code),
        Role::Center => active_exists!(conn, centers, center_id, code),
        Role::Crew => active_exists!(conn, crew, crew_id, code),
        Role::Warehouse => active_exists!(conn, warehouses, warehouse_id, code),
    }
}

/// Entity scopes count the orders the account can see in its order list.
fn entity_filter(role: Role, code: &str) -> OrderFilter {
    let code = code.to_owned();
    match role {
        Role::Manager => OrderFilter::Manager(code),
        Role::Contractor => OrderFilter::Contractor(code),
        Role::Customer => OrderFilter::Customer(code),
        Role::Center => OrderFilter::Center(code),
        Role::Crew => OrderFilter::Crew(code),
        Role::Warehouse => OrderFilter::Warehouse(code),
        Role::Admin => OrderFilter::Creator(code),
    }
}

async fn hub_counts(
    conn: &mut AsyncPgConnection,
    scope: &KpiScope,
    kpis: &mut Kpis,
) -> QueryResult<()> {
    match scope {
        KpiScope::Global => {
            kpis.contractors = count_active!(conn, contractors)?;
            kpis.customers = count_active!(conn, customers)?;
            kpis.centers = count_active!(conn, centers)?;
            kpis.crew = count_active!(conn, crew)?;
        }
        KpiScope::Ecosystem { manager } => {
            kpis.contractors = count_active!(conn, contractors, cks_manager = manager)?;
            kpis.customers = count_active!(conn, customers, cks_manager = manager)?;
            kpis.centers = count_active!(conn, centers, cks_manager = manager)?;
            kpis.crew = count_active!(conn, crew, cks_manager = manager)?;
        }
        KpiScope::Entity { role, code } => match role {
            Role::Contractor => {
                kpis.customers = count_active!(conn, customers, contractor_id = code)?;
                kpis.centers = count_active!(conn, centers, contractor_id = code)?;
            }
            Role::Customer => {
                kpis.centers = count_active!(conn, centers, customer_id = code)?;
            }
            Role::Center => {
                kpis.crew = count_active!(conn, crew, assigned_center = code)?;
            }
            _ => {}
        },
    }
    Ok(())
}

async fn order_counts(
    conn: &mut AsyncPgConnection,
    filter: &OrderFilter,
    kpis: &mut Kpis,
) -> QueryResult<()> {
    kpis.orders = filter_orders!(orders::table.into_boxed(), filter)
        .select(count_star())
        .get_result::<i64>(conn)
        .await?;
    kpis.pending_orders = filter_orders!(orders::table.into_boxed(), filter)
        .filter(not(orders::status.eq_any(FINAL_STATUSES.to_vec())))
        .select(count_star())
        .get_result::<i64>(conn)
        .await?;
    kpis.revenue = filter_orders!(order_items::table.inner_join(orders::table).into_boxed(), filter)
        .filter(orders::status.eq_any(REVENUE_STATUSES.to_vec()))
        .select(sql::<BigInt>(
            "COALESCE(SUM(order_items.total_price), 0)::BIGINT",
        ))
        .get_result::<i64>(conn)
        .await?;
    Ok(())
}

#[async_trait]
impl DashboardRepository for DieselDashboardRepository {
    async fn kpis(&self, scope: &KpiScope) -> Result<Option<Kpis>, DashboardRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let filter = match scope {
            KpiScope::Global => OrderFilter::All,
            KpiScope::Ecosystem { manager } => {
                if !account_is_active(&mut conn, Role::Manager, manager)
                    .await
                    .map_err(map_diesel_error)?
                {
                    return Ok(None);
                }
                OrderFilter::Manager(manager.clone())
            }
            KpiScope::Entity { role, code } => {
                if !account_is_active(&mut conn, *role, code)
                    .await
                    .map_err(map_diesel_error)?
                {
                    return Ok(None);
                }
                entity_filter(*role, code)
            }
        };

        let mut kpis = Kpis::default();
        hub_counts(&mut conn, scope, &mut kpis)
            .await
            .map_err(map_diesel_error)?;
        order_counts(&mut conn, &filter, &mut kpis)
            .await
            .map_err(map_diesel_error)?;
        Ok(Some(kpis))
    }
}
