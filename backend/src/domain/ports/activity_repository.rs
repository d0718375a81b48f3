//! Port for the append-only system activity table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::PageRequest;

use crate::domain::{
    Activity, ActivityDraft, ActivityFilter, ActivityReceipt, ActivityScope, ActivityTallies,
    ActivityTypeMatch, ActorCount,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by activity repository adapters.
    pub enum ActivityRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "activity repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "activity repository query failed: {message}",
    }
}

/// Storage for activity rows.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    /// Insert one row.
    async fn append(&self, draft: &ActivityDraft) -> Result<ActivityReceipt, ActivityRepositoryError>;

    /// Filtered rows, newest first, with the total matching count.
    async fn list(
        &self,
        filter: &ActivityFilter,
        page: PageRequest,
    ) -> Result<(Vec<Activity>, u64), ActivityRepositoryError>;

    /// Aggregates over rows created at or after `since`.
    async fn tallies(
        &self,
        since: DateTime<Utc>,
        top_actors: u32,
    ) -> Result<ActivityTallies, ActivityRepositoryError>;

    /// Delete rows created before `cutoff` and append `maintenance` in the
    /// same transaction. Returns the number of deleted rows.
    async fn delete_before(
        &self,
        cutoff: DateTime<Utc>,
        maintenance: &ActivityDraft,
    ) -> Result<u64, ActivityRepositoryError>;

    /// Rows per actor whose type matches, created at or after `since`.
    async fn actor_counts_since(
        &self,
        types: &ActivityTypeMatch,
        since: DateTime<Utc>,
    ) -> Result<Vec<ActorCount>, ActivityRepositoryError>;

    /// Rows of the given types created at or after `since`.
    async fn of_types_since(
        &self,
        types: &[String],
        since: DateTime<Utc>,
    ) -> Result<Vec<Activity>, ActivityRepositoryError>;

    /// Rows targeting an entity, oldest first. Ids compare case-insensitively.
    async fn history(
        &self,
        target_type: &str,
        target_id: &str,
    ) -> Result<Vec<Activity>, ActivityRepositoryError>;

    /// Newest row of `activity_type` targeting `target_id`.
    async fn latest_for_target(
        &self,
        activity_type: &str,
        target_id: &str,
    ) -> Result<Option<Activity>, ActivityRepositoryError>;

    /// Newest rows visible to a dashboard scope.
    async fn recent(
        &self,
        scope: &ActivityScope,
        limit: u32,
    ) -> Result<Vec<Activity>, ActivityRepositoryError>;

    /// Delete the rows a scope can see, optionally of one type, and append
    /// `maintenance` in the same transaction.
    async fn clear(
        &self,
        scope: &ActivityScope,
        activity_type: Option<String>,
        maintenance: &ActivityDraft,
    ) -> Result<u64, ActivityRepositoryError>;
}

/// Fixture implementation for tests and database-less startup.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureActivityRepository;

#[async_trait]
impl ActivityRepository for FixtureActivityRepository {
    async fn append(&self, _draft: &ActivityDraft) -> Result<ActivityReceipt, ActivityRepositoryError> {
        Ok(ActivityReceipt {
            activity_id: 1,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        })
    }

    async fn list(
        &self,
        _filter: &ActivityFilter,
        _page: PageRequest,
    ) -> Result<(Vec<Activity>, u64), ActivityRepositoryError> {
        Ok((Vec::new(), 0))
    }

    async fn tallies(
        &self,
        _since: DateTime<Utc>,
        _top_actors: u32,
    ) -> Result<ActivityTallies, ActivityRepositoryError> {
        Ok(ActivityTallies::default())
    }

    async fn delete_before(
        &self,
        _cutoff: DateTime<Utc>,
        _maintenance: &ActivityDraft,
    ) -> Result<u64, ActivityRepositoryError> {
        Ok(0)
    }

    async fn actor_counts_since(
        &self,
        _types: &ActivityTypeMatch,
        _since: DateTime<Utc>,
    ) -> Result<Vec<ActorCount>, ActivityRepositoryError> {
        Ok(Vec::new())
    }

    async fn of_types_since(
        &self,
        _types: &[String],
        _since: DateTime<Utc>,
    ) -> Result<Vec<Activity>, ActivityRepositoryError> {
        Ok(Vec::new())
    }

    async fn history(
        &self,
        _target_type: &str,
        _target_id: &str,
    ) -> Result<Vec<Activity>, ActivityRepositoryError> {
        Ok(Vec::new())
    }

    async fn latest_for_target(
        &self,
        _activity_type: &str,
        _target_id: &str,
    ) -> Result<Option<Activity>, ActivityRepositoryError> {
        Ok(None)
    }

    async fn recent(
        &self,
        _scope: &ActivityScope,
        _limit: u32,
    ) -> Result<Vec<Activity>, ActivityRepositoryError> {
        Ok(Vec::new())
    }

    async fn clear(
        &self,
        _scope: &ActivityScope,
        _activity_type: Option<String>,
        _maintenance: &ActivityDraft,
    ) -> Result<u64, ActivityRepositoryError> {
        Ok(0)
    }
}
