//! PostgreSQL-backed `AssignmentRepository` implementation.
//!
//! Parent columns differ per table, so statements are built from the static
//! [`ArchiveEntity`] table and column names. Ids are always bound.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_types::{Bool, Nullable, Text, Timestamptz};
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use serde_json::json;
use tracing::debug;

use crate::domain::ports::{AssignmentRepository, AssignmentRepositoryError};
use crate::domain::{ActivityDraft, ArchiveEntity, AssignmentChange, AssignmentResult};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::diesel_helpers::{insert_activity, with_metadata_entry};
use super::pool::DbPool;

/// Diesel-backed implementation of the assignment port.
#[derive(Clone)]
pub struct DieselAssignmentRepository {
    pool: DbPool,
}

impl DieselAssignmentRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(QueryableByName)]
struct ParentRow {
    #[diesel(sql_type = Nullable<Text>)]
    parent_id: Option<String>,
}

#[derive(QueryableByName)]
struct FoundRow {
    #[diesel(sql_type = Bool)]
    found: bool,
}

fn lock_current_parent(change: &AssignmentChange) -> String {
    format!(
        "SELECT {column} AS parent_id FROM {table} \
         WHERE {id} = $1 AND archived_at IS NULL FOR UPDATE",
        column = change.parent.column,
        table = change.entity.table(),
        id = change.entity.id_column(),
    )
}

fn active_row(entity: ArchiveEntity) -> String {
    format!(
        "SELECT EXISTS (SELECT 1 FROM {table} WHERE {id} = $1 AND archived_at IS NULL) AS found",
        id = entity.id_column(),
        table = entity.table(),
    )
}

fn rewrite_parent(change: &AssignmentChange) -> String {
    format!(
        "UPDATE {table} SET {column} = $2, updated_at = $3 WHERE {id} = $1",
        table = change.entity.table(),
        column = change.parent.column,
        id = change.entity.id_column(),
    )
}

#[async_trait]
impl AssignmentRepository for DieselAssignmentRepository {
    async fn assign(
        &self,
        change: &AssignmentChange,
        activity: &ActivityDraft,
    ) -> Result<AssignmentResult, AssignmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                let Some(current) = diesel::sql_query(lock_current_parent(change))
                    .bind::<Text, _>(&change.entity_id)
                    .get_result::<ParentRow>(conn)
                    .await
                    .optional()?
                else {
                    return Ok(AssignmentResult::EntityNotFound);
                };

                if let Some(parent_id) = &change.parent_id {
                    let parent = diesel::sql_query(active_row(change.parent.entity))
                        .bind::<Text, _>(parent_id)
                        .get_result::<FoundRow>(conn)
                        .await?;
                    if !parent.found {
                        return Ok(AssignmentResult::ParentNotFound);
                    }
                }

                if current.parent_id == change.parent_id {
                    return Ok(AssignmentResult::Unchanged);
                }

                diesel::sql_query(rewrite_parent(change))
                    .bind::<Text, _>(&change.entity_id)
                    .bind::<Nullable<Text>, _>(change.parent_id.as_deref())
                    .bind::<Timestamptz, _>(change.changed_at)
                    .execute(conn)
                    .await?;
                let draft =
                    with_metadata_entry(activity, "previousParentId", json!(current.parent_id));
                insert_activity(conn, &draft).await?;
                debug!(
                    entity = %change.entity,
                    entity_id = %change.entity_id,
                    column = change.parent.column,
                    "parent column rewritten"
                );
                Ok(AssignmentResult::Assigned {
                    previous_parent_id: current.parent_id,
                })
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }
}
