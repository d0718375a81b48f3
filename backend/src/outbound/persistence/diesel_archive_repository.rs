//! PostgreSQL-backed `ArchiveRepository` implementation.
//!
//! The archivable tables share the same archive columns, so statements are
//! built from [`ArchiveEntity`] table and column names rather than one
//! Diesel query per table. Only those static identifiers are interpolated;
//! ids and timestamps are always bound.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Jsonb, Nullable, Text, Timestamptz};
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde_json::{Value, json};
use tracing::debug;

use crate::domain::ports::{ArchiveRepository, ArchiveRepositoryError};
use crate::domain::{
    ActivityDraft, ArchiveEntity, ArchiveReceipt, ArchiveRecord, ArchiveRelationship,
    ArchivedEntity, HardDeleteOutcome,
};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::diesel_helpers::{insert_activity, with_metadata_entry};
use super::models::{ArchiveRelationshipRow, NewArchiveRelationshipRow};
use super::pool::DbPool;
use super::schema::archive_relationships;

/// Diesel-backed implementation of the archive port.
#[derive(Clone)]
pub struct DieselArchiveRepository {
    pool: DbPool,
}

impl DieselArchiveRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(QueryableByName)]
struct IdRow {
    #[diesel(sql_type = Text)]
    entity_id: String,
}

#[derive(QueryableByName)]
struct ParentRow {
    #[diesel(sql_type = Nullable<Text>)]
    parent_id: Option<String>,
}

#[derive(QueryableByName)]
struct CountRow {
    #[diesel(sql_type = BigInt)]
    count: i64,
}

#[derive(QueryableByName)]
struct SnapshotRow {
    #[diesel(sql_type = Jsonb)]
    snapshot: Value,
    #[diesel(sql_type = Nullable<Timestamptz>)]
    archived_at: Option<DateTime<Utc>>,
}

#[derive(QueryableByName)]
struct ArchivedRow {
    #[diesel(sql_type = Text)]
    entity_id: String,
    #[diesel(sql_type = Text)]
    name: String,
    #[diesel(sql_type = Timestamptz)]
    archived_at: DateTime<Utc>,
    #[diesel(sql_type = Nullable<Text>)]
    archived_by: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    archive_reason: Option<String>,
    #[diesel(sql_type = Nullable<Timestamptz>)]
    deletion_scheduled: Option<DateTime<Utc>>,
}

impl ArchivedRow {
    fn into_domain(self, entity: ArchiveEntity) -> ArchivedEntity {
        ArchivedEntity {
            entity_type: entity,
            entity_id: self.entity_id,
            name: self.name,
            archived_at: self.archived_at,
            archived_by: self.archived_by,
            archive_reason: self.archive_reason,
            deletion_scheduled: self.deletion_scheduled,
        }
    }
}

impl From<ArchiveRelationshipRow> for ArchiveRelationship {
    fn from(row: ArchiveRelationshipRow) -> Self {
        Self {
            entity_type: row.entity_type,
            entity_id: row.entity_id,
            parent_type: row.parent_type,
            parent_id: row.parent_id,
            relationship_data: row.relationship_data,
            archived_by: row.archived_by,
            archived_at: row.archived_at,
            restored: row.restored,
        }
    }
}

fn archived_select(entity: ArchiveEntity, condition: &str) -> String {
    format!(
        "SELECT {id} AS entity_id, {name} AS name, archived_at, archived_by, archive_reason, \
         deletion_scheduled FROM {table} WHERE archived_at IS NOT NULL{condition} \
         ORDER BY archived_at DESC",
        id = entity.id_column(),
        name = entity.name_column(),
        table = entity.table(),
    )
}

fn newest_first(mut rows: Vec<ArchivedEntity>, limit: Option<u32>) -> Vec<ArchivedEntity> {
    rows.sort_by(|a, b| b.archived_at.cmp(&a.archived_at));
    if let Some(limit) = limit {
        rows.truncate(limit as usize);
    }
    rows
}

async fn record_parent_link(
    conn: &mut AsyncPgConnection,
    record: &ArchiveRecord,
) -> QueryResult<()> {
    let entity = record.entity;
    let Some(parent) = entity.parent() else {
        return Ok(());
    };
    let sql = format!(
        "SELECT {column} AS parent_id FROM {table} WHERE {id} = $1",
        column = parent.column,
        table = entity.table(),
        id = entity.id_column(),
    );
    let parent_id = diesel::sql_query(sql)
        .bind::<Text, _>(&record.entity_id)
        .get_result::<ParentRow>(conn)
        .await
        .optional()?
        .and_then(|row| row.parent_id);
    let Some(parent_id) = parent_id else {
        return Ok(());
    };
    let data = json!({ "column": parent.column });
    diesel::insert_into(archive_relationships::table)
        .values(&NewArchiveRelationshipRow {
            entity_type: entity.as_str(),
            entity_id: &record.entity_id,
            parent_type: parent.entity.as_str(),
            parent_id: &parent_id,
            relationship_data: &data,
            archived_by: &record.archived_by,
            archived_at: record.archived_at,
        })
        .execute(conn)
        .await?;
    Ok(())
}

async fn detach_children(
    conn: &mut AsyncPgConnection,
    record: &ArchiveRecord,
) -> QueryResult<Vec<String>> {
    let entity = record.entity;
    let Some(child) = entity.child() else {
        return Ok(Vec::new());
    };
    let sql = format!(
        "UPDATE {table} SET {column} = NULL WHERE {column} = $1 AND archived_at IS NULL \
         RETURNING {id} AS entity_id",
        table = child.entity.table(),
        column = child.column,
        id = child.entity.id_column(),
    );
    let detached: Vec<String> = diesel::sql_query(sql)
        .bind::<Text, _>(&record.entity_id)
        .load::<IdRow>(conn)
        .await?
        .into_iter()
        .map(|row| row.entity_id)
        .collect();
    let data = json!({ "column": child.column, "unassignedBy": "archive" });
    let rows: Vec<NewArchiveRelationshipRow<'_>> = detached
        .iter()
        .map(|child_id| NewArchiveRelationshipRow {
            entity_type: child.entity.as_str(),
            entity_id: child_id,
            parent_type: entity.as_str(),
            parent_id: &record.entity_id,
            relationship_data: &data,
            archived_by: &record.archived_by,
            archived_at: record.archived_at,
        })
        .collect();
    if !rows.is_empty() {
        diesel::insert_into(archive_relationships::table)
            .values(&rows)
            .execute(conn)
            .await?;
    }
    Ok(detached)
}

#[async_trait]
impl ArchiveRepository for DieselArchiveRepository {
    async fn archive(
        &self,
        record: &ArchiveRecord,
        activity: &ActivityDraft,
    ) -> Result<Option<ArchiveReceipt>, ArchiveRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let entity = record.entity;
        conn.transaction(|conn| {
            async move {
                let lock = format!(
                    "SELECT {id} AS entity_id FROM {table} \
                     WHERE {id} = $1 AND archived_at IS NULL FOR UPDATE",
                    id = entity.id_column(),
                    table = entity.table(),
                );
                let active = diesel::sql_query(lock)
                    .bind::<Text, _>(&record.entity_id)
                    .get_result::<IdRow>(conn)
                    .await
                    .optional()?;
                if active.is_none() {
                    return Ok(None);
                }

                record_parent_link(conn, record).await?;
                let unassigned = detach_children(conn, record).await?;

                let stamp = format!(
                    "UPDATE {table} SET archived_at = $2, archived_by = $3, archive_reason = $4, \
                     deletion_scheduled = $5, restored_at = NULL, restored_by = NULL \
                     WHERE {id} = $1",
                    table = entity.table(),
                    id = entity.id_column(),
                );
                diesel::sql_query(stamp)
                    .bind::<Text, _>(&record.entity_id)
                    .bind::<Timestamptz, _>(record.archived_at)
                    .bind::<Text, _>(&record.archived_by)
                    .bind::<Text, _>(&record.reason)
                    .bind::<Timestamptz, _>(record.deletion_scheduled)
                    .execute(conn)
                    .await?;

                let draft = with_metadata_entry(activity, "unassignedChildren", json!(unassigned));
                insert_activity(conn, &draft).await?;
                debug!(
                    entity = %entity,
                    entity_id = %record.entity_id,
                    unassigned = unassigned.len(),
                    "archive columns stamped"
                );
                Ok(Some(ArchiveReceipt {
                    unassigned_children: unassigned,
                }))
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn restore(
        &self,
        entity: ArchiveEntity,
        entity_id: &str,
        restored_by: &str,
        restored_at: DateTime<Utc>,
        activity: &ActivityDraft,
    ) -> Result<bool, ArchiveRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                let sql = format!(
                    "UPDATE {table} SET archived_at = NULL, archived_by = NULL, \
                     archive_reason = NULL, deletion_scheduled = NULL, \
                     restored_at = $2, restored_by = $3 \
                     WHERE {id} = $1 AND archived_at IS NOT NULL",
                    table = entity.table(),
                    id = entity.id_column(),
                );
                let updated = diesel::sql_query(sql)
                    .bind::<Text, _>(entity_id)
                    .bind::<Timestamptz, _>(restored_at)
                    .bind::<Text, _>(restored_by)
                    .execute(conn)
                    .await?;
                if updated == 0 {
                    return Ok(false);
                }
                diesel::update(
                    archive_relationships::table
                        .filter(archive_relationships::restored.eq(false))
                        .filter(
                            archive_relationships::entity_type
                                .eq(entity.as_str())
                                .and(archive_relationships::entity_id.eq(entity_id))
                                .or(archive_relationships::parent_type
                                    .eq(entity.as_str())
                                    .and(archive_relationships::parent_id.eq(entity_id))),
                        ),
                )
                .set((
                    archive_relationships::restored.eq(true),
                    archive_relationships::restored_at.eq(Some(restored_at)),
                ))
                .execute(conn)
                .await?;
                insert_activity(conn, activity).await?;
                Ok(true)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn list_archived(
        &self,
        entity: Option<ArchiveEntity>,
        limit: u32,
    ) -> Result<Vec<ArchivedEntity>, ArchiveRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let kinds: Vec<ArchiveEntity> = match entity {
            Some(kind) => vec![kind],
            None => ArchiveEntity::ALL.to_vec(),
        };
        let mut found = Vec::new();
        for kind in kinds {
            let sql = format!("{} LIMIT $1", archived_select(kind, ""));
            let rows = diesel::sql_query(sql)
                .bind::<BigInt, _>(i64::from(limit))
                .load::<ArchivedRow>(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            found.extend(rows.into_iter().map(|row| row.into_domain(kind)));
        }
        Ok(newest_first(found, Some(limit)))
    }

    async fn relationships(
        &self,
        entity: ArchiveEntity,
        entity_id: &str,
    ) -> Result<Vec<ArchiveRelationship>, ArchiveRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = archive_relationships::table
            .filter(
                archive_relationships::entity_type
                    .eq(entity.as_str())
                    .and(archive_relationships::entity_id.eq(entity_id))
                    .or(archive_relationships::parent_type
                        .eq(entity.as_str())
                        .and(archive_relationships::parent_id.eq(entity_id))),
            )
            .order((
                archive_relationships::archived_at.desc(),
                archive_relationships::id.desc(),
            ))
            .select(ArchiveRelationshipRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(ArchiveRelationship::from).collect())
    }

    async fn hard_delete(
        &self,
        entity: ArchiveEntity,
        entity_id: &str,
        activity: &ActivityDraft,
    ) -> Result<HardDeleteOutcome, ArchiveRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                let lookup = format!(
                    "SELECT row_to_json(t)::jsonb AS snapshot, t.archived_at \
                     FROM {table} t WHERE t.{id} = $1 FOR UPDATE",
                    table = entity.table(),
                    id = entity.id_column(),
                );
                let Some(found) = diesel::sql_query(lookup)
                    .bind::<Text, _>(entity_id)
                    .get_result::<SnapshotRow>(conn)
                    .await
                    .optional()?
                else {
                    return Ok(HardDeleteOutcome::NotFound);
                };
                if found.archived_at.is_none() {
                    return Ok(HardDeleteOutcome::NotArchived);
                }

                if let Some(child) = entity.child() {
                    let sql = format!(
                        "SELECT COUNT(*) AS count FROM {table} \
                         WHERE {column} = $1 AND archived_at IS NULL",
                        table = child.entity.table(),
                        column = child.column,
                    );
                    let active = diesel::sql_query(sql)
                        .bind::<Text, _>(entity_id)
                        .get_result::<CountRow>(conn)
                        .await?
                        .count;
                    if active > 0 {
                        return Ok(HardDeleteOutcome::ActiveChildren(active));
                    }
                }

                let delete = format!(
                    "DELETE FROM {table} WHERE {id} = $1",
                    table = entity.table(),
                    id = entity.id_column(),
                );
                diesel::sql_query(delete)
                    .bind::<Text, _>(entity_id)
                    .execute(conn)
                    .await?;
                diesel::delete(
                    archive_relationships::table.filter(
                        archive_relationships::entity_type
                            .eq(entity.as_str())
                            .and(archive_relationships::entity_id.eq(entity_id))
                            .or(archive_relationships::parent_type
                                .eq(entity.as_str())
                                .and(archive_relationships::parent_id.eq(entity_id))),
                    ),
                )
                .execute(conn)
                .await?;

                let draft = with_metadata_entry(activity, "snapshot", found.snapshot);
                insert_activity(conn, &draft).await?;
                Ok(HardDeleteOutcome::Deleted)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn expired(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ArchivedEntity>, ArchiveRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut found = Vec::new();
        for kind in ArchiveEntity::ALL {
            let sql = archived_select(kind, " AND deletion_scheduled < $1");
            let rows = diesel::sql_query(sql)
                .bind::<Timestamptz, _>(now)
                .load::<ArchivedRow>(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            found.extend(rows.into_iter().map(|row| row.into_domain(kind)));
        }
        Ok(newest_first(found, None))
    }
}
