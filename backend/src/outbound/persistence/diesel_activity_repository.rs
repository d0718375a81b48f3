//! PostgreSQL-backed `ActivityRepository` implementation using Diesel ORM.
//!
//! Rows are append-only. The only deletes are the retention cleanup and the
//! dashboard clear, and both record a maintenance row in the same
//! transaction.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::dsl::count_star;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Date, Nullable, Text, Timestamptz};
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use pagination::PageRequest;
use serde_json::Value;

use crate::domain::ports::{ActivityRepository, ActivityRepositoryError};
use crate::domain::{
    Activity, ActivityDraft, ActivityFilter, ActivityReceipt, ActivityScope, ActivityTallies,
    ActivityTypeMatch, ActorCount, CountBucket, DailyCount,
};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::diesel_helpers::{escape_like, insert_activity, like_pattern};
use super::models::ActivityRow;
use super::pool::DbPool;
use super::schema::system_activity;

diesel::define_sql_function! {
    /// SQL `lower()` over a nullable text column.
    fn lower(value: Nullable<Text>) -> Nullable<Text>;
}

const DAILY_COUNTS_SQL: &str = r"
SELECT (created_at AT TIME ZONE 'UTC')::date AS day, COUNT(*) AS count
FROM system_activity
WHERE created_at >= $1
GROUP BY day
ORDER BY day
";

#[derive(QueryableByName)]
struct DailyCountRow {
    #[diesel(sql_type = Date)]
    day: NaiveDate,
    #[diesel(sql_type = BigInt)]
    count: i64,
}

/// Diesel-backed implementation of the activity repository port.
#[derive(Clone)]
pub struct DieselActivityRepository {
    pool: DbPool,
}

impl DieselActivityRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn filtered(filter: &ActivityFilter) -> system_activity::BoxedQuery<'_, Pg> {
    let mut query = system_activity::table.into_boxed();
    if let Some(activity_type) = &filter.activity_type {
        query = query.filter(system_activity::activity_type.eq(activity_type));
    }
    if let Some(actor_role) = &filter.actor_role {
        query = query.filter(system_activity::actor_role.eq(actor_role));
    }
    if let Some(target_type) = &filter.target_type {
        query = query.filter(system_activity::target_type.eq(target_type));
    }
    if let Some(from) = filter.date_from {
        query = query.filter(system_activity::created_at.ge(from));
    }
    if let Some(to) = filter.date_to {
        query = query.filter(system_activity::created_at.le(to));
    }
    if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = like_pattern(term);
        query = query.filter(
            system_activity::description
                .ilike(pattern.clone())
                .or(system_activity::target_id.assume_not_null().ilike(pattern.clone()))
                .or(system_activity::actor_id.ilike(pattern)),
        );
    }
    query
}

fn type_pattern(types: &ActivityTypeMatch) -> String {
    match types {
        ActivityTypeMatch::Exact(value) => escape_like(value),
        ActivityTypeMatch::Suffix(suffix) => format!("%{}", escape_like(suffix)),
    }
}

fn with_metadata_field(draft: &ActivityDraft, key: &str, value: Value) -> ActivityDraft {
    let mut draft = draft.clone();
    if let Value::Object(map) = &mut draft.metadata {
        map.insert(key.to_owned(), value);
    }
    draft
}

fn count(value: usize) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

fn buckets(rows: Vec<(String, i64)>) -> Vec<CountBucket> {
    let mut buckets: Vec<CountBucket> = rows
        .into_iter()
        .map(|(key, count)| CountBucket { key, count })
        .collect();
    buckets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    buckets
}

fn actor_counts(rows: Vec<(String, String, i64)>) -> Vec<ActorCount> {
    let mut counts: Vec<ActorCount> = rows
        .into_iter()
        .map(|(actor_id, actor_role, count)| ActorCount {
            actor_id,
            actor_role,
            count,
        })
        .collect();
    counts.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.actor_id.cmp(&b.actor_id))
    });
    counts
}

#[async_trait]
impl ActivityRepository for DieselActivityRepository {
    async fn append(&self, draft: &ActivityDraft) -> Result<ActivityReceipt, ActivityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = insert_activity(&mut conn, draft)
            .await
            .map_err(map_diesel_error)?;
        Ok(ActivityReceipt {
            activity_id: row.activity_id,
            created_at: row.created_at,
        })
    }

    async fn list(
        &self,
        filter: &ActivityFilter,
        page: PageRequest,
    ) -> Result<(Vec<Activity>, u64), ActivityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = filtered(filter)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows: Vec<ActivityRow> = filtered(filter)
            .order((
                system_activity::created_at.desc(),
                system_activity::activity_id.desc(),
            ))
            .limit(i64::from(page.limit()))
            .offset(i64::from(page.offset()))
            .select(ActivityRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok((
            rows.into_iter().map(Activity::from).collect(),
            u64::try_from(total).unwrap_or_default(),
        ))
    }

    async fn tallies(
        &self,
        since: DateTime<Utc>,
        top_actors: u32,
    ) -> Result<ActivityTallies, ActivityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let by_type: Vec<(String, i64)> = system_activity::table
            .filter(system_activity::created_at.ge(since))
            .group_by(system_activity::activity_type)
            .select((system_activity::activity_type, count_star()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let by_role: Vec<(String, i64)> = system_activity::table
            .filter(system_activity::created_at.ge(since))
            .group_by(system_activity::actor_role)
            .select((system_activity::actor_role, count_star()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let per_actor: Vec<(String, String, i64)> = system_activity::table
            .filter(system_activity::created_at.ge(since))
            .group_by((system_activity::actor_id, system_activity::actor_role))
            .select((
                system_activity::actor_id,
                system_activity::actor_role,
                count_star(),
            ))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let daily: Vec<DailyCountRow> = diesel::sql_query(DAILY_COUNTS_SQL)
            .bind::<Timestamptz, _>(since)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let mut most_active_actors = actor_counts(per_actor);
        most_active_actors.truncate(usize::try_from(top_actors).unwrap_or(usize::MAX));
        Ok(ActivityTallies {
            by_type: buckets(by_type),
            by_role: buckets(by_role),
            daily_counts: daily
                .into_iter()
                .map(|row| DailyCount {
                    day: row.day,
                    count: row.count,
                })
                .collect(),
            most_active_actors,
        })
    }

    async fn delete_before(
        &self,
        cutoff: DateTime<Utc>,
        maintenance: &ActivityDraft,
    ) -> Result<u64, ActivityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                let deleted = diesel::delete(
                    system_activity::table.filter(system_activity::created_at.lt(cutoff)),
                )
                .execute(conn)
                .await?;
                let draft = with_metadata_field(maintenance, "deletedCount", deleted.into());
                insert_activity(conn, &draft).await?;
                Ok(count(deleted))
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn actor_counts_since(
        &self,
        types: &ActivityTypeMatch,
        since: DateTime<Utc>,
    ) -> Result<Vec<ActorCount>, ActivityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<(String, String, i64)> = system_activity::table
            .filter(system_activity::created_at.ge(since))
            .filter(system_activity::activity_type.like(type_pattern(types)))
            .group_by((system_activity::actor_id, system_activity::actor_role))
            .select((
                system_activity::actor_id,
                system_activity::actor_role,
                count_star(),
            ))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(actor_counts(rows))
    }

    async fn of_types_since(
        &self,
        types: &[String],
        since: DateTime<Utc>,
    ) -> Result<Vec<Activity>, ActivityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ActivityRow> = system_activity::table
            .filter(system_activity::activity_type.eq_any(types))
            .filter(system_activity::created_at.ge(since))
            .order(system_activity::created_at.desc())
            .select(ActivityRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(Activity::from).collect())
    }

    async fn history(
        &self,
        target_type: &str,
        target_id: &str,
    ) -> Result<Vec<Activity>, ActivityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ActivityRow> = system_activity::table
            .filter(system_activity::target_type.eq(target_type.trim().to_ascii_lowercase()))
            .filter(lower(system_activity::target_id).eq(target_id.trim().to_lowercase()))
            .order((
                system_activity::created_at.asc(),
                system_activity::activity_id.asc(),
            ))
            .select(ActivityRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(Activity::from).collect())
    }

    async fn latest_for_target(
        &self,
        activity_type: &str,
        target_id: &str,
    ) -> Result<Option<Activity>, ActivityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = system_activity::table
            .filter(system_activity::activity_type.eq(activity_type))
            .filter(lower(system_activity::target_id).eq(target_id.trim().to_lowercase()))
            .order((
                system_activity::created_at.desc(),
                system_activity::activity_id.desc(),
            ))
            .select(ActivityRow::as_select())
            .first::<ActivityRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(Activity::from))
    }

    async fn recent(
        &self,
        scope: &ActivityScope,
        limit: u32,
    ) -> Result<Vec<Activity>, ActivityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = system_activity::table.into_boxed();
        if let ActivityScope::Code(code) = scope {
            query = query.filter(
                system_activity::actor_id
                    .eq(code)
                    .or(system_activity::target_id.eq(code)),
            );
        }
        let rows: Vec<ActivityRow> = query
            .order((
                system_activity::created_at.desc(),
                system_activity::activity_id.desc(),
            ))
            .limit(i64::from(limit))
            .select(ActivityRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(Activity::from).collect())
    }

    async fn clear(
        &self,
        scope: &ActivityScope,
        activity_type: Option<String>,
        maintenance: &ActivityDraft,
    ) -> Result<u64, ActivityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                let mut delete = diesel::delete(system_activity::table).into_boxed();
                if let ActivityScope::Code(code) = scope {
                    delete = delete.filter(
                        system_activity::actor_id
                            .eq(code)
                            .or(system_activity::target_id.eq(code)),
                    );
                }
                if let Some(activity_type) = &activity_type {
                    delete = delete.filter(system_activity::activity_type.eq(activity_type));
                }
                let cleared = delete.execute(conn).await?;
                let draft = with_metadata_field(maintenance, "cleared", cleared.into());
                insert_activity(conn, &draft).await?;
                Ok(count(cleared))
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }
}
