//! Driving ports for the audit log.

use async_trait::async_trait;
use chrono::DateTime;
use pagination::{Page, PageRequest};
use serde::Serialize;

use crate::domain::{
    Activity, ActivityDraft, ActivityFilter, ActivityReceipt, ActivityStatistics, CleanupReport,
    Error, SuspiciousReport, Tombstone,
};

/// Page of activity rows echoing the filters that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogPage {
    #[serde(flatten)]
    pub page: Page<Activity>,
    pub filters: ActivityFilter,
}

/// Writes to the audit log.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActivityCommand: Send + Sync {
    /// Append one validated activity.
    async fn log(&self, draft: ActivityDraft) -> Result<ActivityReceipt, Error>;

    /// Delete rows older than `days` (default 90).
    async fn cleanup(&self, days: Option<u32>) -> Result<CleanupReport, Error>;

    /// Scan recent activity for suspicious patterns.
    async fn detect_suspicious(&self) -> Result<SuspiciousReport, Error>;
}

/// Reads from the audit log.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActivityQuery: Send + Sync {
    /// Filtered, paginated rows, newest first.
    async fn list(&self, filter: ActivityFilter, page: PageRequest) -> Result<ActivityLogPage, Error>;

    /// Aggregates over the last `days` (default 30).
    async fn statistics(&self, days: Option<u32>) -> Result<ActivityStatistics, Error>;

    /// Activities targeting an entity, oldest first.
    async fn history(&self, entity_type: &str, entity_id: &str) -> Result<Vec<Activity>, Error>;

    /// Snapshot of a hard-deleted entity.
    async fn tombstone(&self, entity_type: &str, entity_id: &str) -> Result<Tombstone, Error>;
}

/// Fixture command used when no database is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureActivityCommand;

#[async_trait]
impl ActivityCommand for FixtureActivityCommand {
    async fn log(&self, _draft: ActivityDraft) -> Result<ActivityReceipt, Error> {
        Ok(ActivityReceipt {
            activity_id: 1,
            created_at: DateTime::UNIX_EPOCH,
        })
    }

    async fn cleanup(&self, days: Option<u32>) -> Result<CleanupReport, Error> {
        Ok(CleanupReport {
            deleted_count: 0,
            days_threshold: days.unwrap_or(crate::domain::DEFAULT_RETENTION_DAYS),
        })
    }

    async fn detect_suspicious(&self) -> Result<SuspiciousReport, Error> {
        Ok(SuspiciousReport {
            items: Vec::new(),
            suspicious_count: 0,
            checked_at: DateTime::UNIX_EPOCH,
        })
    }
}

/// Fixture query used when no database is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureActivityQuery;

#[async_trait]
impl ActivityQuery for FixtureActivityQuery {
    async fn list(&self, filter: ActivityFilter, page: PageRequest) -> Result<ActivityLogPage, Error> {
        Ok(ActivityLogPage {
            page: Page::new(Vec::new(), 0, page),
            filters: filter,
        })
    }

    async fn statistics(&self, days: Option<u32>) -> Result<ActivityStatistics, Error> {
        Ok(ActivityStatistics {
            by_type: Vec::new(),
            by_role: Vec::new(),
            daily_counts: Vec::new(),
            most_active_actors: Vec::new(),
            period_days: days.unwrap_or(crate::domain::DEFAULT_STATISTICS_DAYS),
            generated_at: DateTime::UNIX_EPOCH,
        })
    }

    async fn history(&self, _entity_type: &str, _entity_id: &str) -> Result<Vec<Activity>, Error> {
        Ok(Vec::new())
    }

    async fn tombstone(&self, entity_type: &str, entity_id: &str) -> Result<Tombstone, Error> {
        Err(Error::not_found(format!(
            "no deletion snapshot for {entity_type} {entity_id}"
        )))
    }
}
