//! PostgreSQL-backed account and ecosystem directory.
//!
//! Accounts are looked up by identity-provider user id across the admin and
//! hub tables. Ecosystem links are read from the ownership columns of each
//! hub table; crew inherit the links of their assigned center, manager
//! included.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{AccountDirectory, DirectoryError, EcosystemDirectory};
use crate::domain::{AccountRecord, EcosystemLinks, Role, normalize_identity};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::pool::DbPool;
use super::schema::{admin_users, centers, contractors, crew, customers, managers, warehouses};

/// Diesel-backed implementation of the directory ports.
#[derive(Clone)]
pub struct DieselDirectory {
    pool: DbPool,
}

impl DieselDirectory {
    /// Create a new directory with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Active row of `$table` linked to the provider user, as `(code, status)`.
macro_rules! linked_account {
    ($conn:expr, $table:ident, $id:ident, $user:expr) => {
        $table::table
            .filter($table::clerk_user_id.eq($user))
            .filter($table::archived_at.is_null())
            .select(($table::$id, $table::status))
            .first::<(String, String)>($conn)
            .await
            .optional()
    };
}

async fn find_hub(
    conn: &mut AsyncPgConnection,
    clerk_user_id: &str,
) -> QueryResult<Option<(Role, String, String)>> {
    let tag = |role: Role| move |(code, status): (String, String)| (role, code, status);
    if let Some(found) = linked_account!(conn, managers, manager_id, clerk_user_id)? {
        return Ok(Some(tag(Role::Manager)(found)));
    }
    if let Some(found) = linked_account!(conn, contractors, contractor_id, clerk_user_id)? {
        return Ok(Some(tag(Role::Contractor)(found)));
    }
    if let Some(found) = linked_account!(conn, customers, customer_id, clerk_user_id)? {
        return Ok(Some(tag(Role::Customer)(found)));
    }
    if let Some(found) = linked_account!(conn, centers, center_id, clerk_user_id)? {
        return Ok(Some(tag(Role::Center)(found)));
    }
    if let Some(found) = linked_account!(conn, crew, crew_id, clerk_user_id)? {
        return Ok(Some(tag(Role::Crew)(found)));
    }
    Ok(linked_account!(conn, warehouses, warehouse_id, clerk_user_id)?.map(tag(Role::Warehouse)))
}

async fn center_links(conn: &mut AsyncPgConnection, code: &str) -> QueryResult<EcosystemLinks> {
    let row = centers::table
        .filter(centers::center_id.eq(code))
        .select((centers::cks_manager, centers::contractor_id, centers::customer_id))
        .first::<(Option<String>, Option<String>, Option<String>)>(conn)
        .await
        .optional()?;
    let mut links = EcosystemLinks::of_self(Role::Center, code);
    if let Some((manager_id, contractor_id, customer_id)) = row {
        links.manager_id = manager_id;
        links.contractor_id = contractor_id;
        links.customer_id = customer_id;
    }
    Ok(links)
}

async fn links_for(
    conn: &mut AsyncPgConnection,
    role: Role,
    code: &str,
) -> QueryResult<EcosystemLinks> {
    let mut links = EcosystemLinks::of_self(role, code);
    match role {
        Role::Admin | Role::Manager => {}
        Role::Contractor => {
            links.manager_id = contractors::table
                .filter(contractors::contractor_id.eq(code))
                .select(contractors::cks_manager)
                .first::<Option<String>>(conn)
                .await
                .optional()?
                .flatten();
        }
        Role::Customer => {
            if let Some((manager_id, contractor_id)) = customers::table
                .filter(customers::customer_id.eq(code))
                .select((customers::cks_manager, customers::contractor_id))
                .first::<(Option<String>, Option<String>)>(conn)
                .await
                .optional()?
            {
                links.manager_id = manager_id;
                links.contractor_id = contractor_id;
            }
        }
        Role::Center => links = center_links(conn, code).await?,
        Role::Crew => {
            if let Some((manager_id, assigned_center)) = crew::table
                .filter(crew::crew_id.eq(code))
                .select((crew::cks_manager, crew::assigned_center))
                .first::<(Option<String>, Option<String>)>(conn)
                .await
                .optional()?
            {
                let center = match assigned_center {
                    Some(center) => Some(center_links(conn, &center).await?),
                    None => None,
                };
                links = EcosystemLinks::for_crew(code, manager_id, center);
            }
        }
        Role::Warehouse => {
            links.manager_id = warehouses::table
                .filter(warehouses::warehouse_id.eq(code))
                .select(warehouses::cks_manager)
                .first::<Option<String>>(conn)
                .await
                .optional()?
                .flatten();
        }
    }
    Ok(links)
}

#[async_trait]
impl AccountDirectory for DieselDirectory {
    async fn find_admin(&self, clerk_user_id: &str) -> Result<Option<AccountRecord>, DirectoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = admin_users::table
            .filter(admin_users::clerk_user_id.eq(clerk_user_id))
            .select((admin_users::admin_id, admin_users::status))
            .first::<(String, String)>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(|(code, status)| AccountRecord {
            role: Role::Admin,
            code,
            status: Some(status),
        }))
    }

    async fn find_hub_account(
        &self,
        clerk_user_id: &str,
    ) -> Result<Option<AccountRecord>, DirectoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let found = find_hub(&mut conn, clerk_user_id)
            .await
            .map_err(map_diesel_error)?;
        Ok(found.map(|(role, code, status)| AccountRecord {
            role,
            code,
            status: Some(status),
        }))
    }
}

#[async_trait]
impl EcosystemDirectory for DieselDirectory {
    async fn resolve(&self, role: Role, code: &str) -> Result<EcosystemLinks, DirectoryError> {
        let Some(code) = normalize_identity(Some(code)) else {
            return Ok(EcosystemLinks::default());
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        links_for(&mut conn, role, &code)
            .await
            .map_err(map_diesel_error)
    }
}
