//! Activity log service implementing the audit driving ports.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use pagination::{Page, PageRequest};
use serde_json::json;
use tracing::warn;

use super::suspicious::{flag_bulk_deletes, flag_failed_logins, flag_off_hours};
use super::{
    Activity, ActivityDraft, ActivityFilter, ActivityReceipt, ActivityStatistics,
    ActivityTypeMatch, CleanupReport, DEFAULT_RETENTION_DAYS, DEFAULT_STATISTICS_DAYS,
    MAX_WINDOW_DAYS, OFF_HOURS_TYPES, SYSTEM_ACTOR, SuspiciousReport, TOP_ACTOR_LIMIT, Tombstone,
    deletion_activity_type,
};
use crate::domain::Error;
use crate::domain::ports::{
    ActivityCommand, ActivityLogPage, ActivityQuery, ActivityRepository, ActivityRepositoryError,
};

pub(crate) fn map_activity_error(error: ActivityRepositoryError) -> Error {
    match error {
        ActivityRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("activity repository unavailable: {message}"))
        }
        ActivityRepositoryError::Query { message } => {
            Error::internal(format!("activity repository error: {message}"))
        }
    }
}

fn require_text(value: &str, field: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(Error::invalid_request(format!("{field} must not be empty"))
            .with_details(json!({ "field": field, "code": "missing_field" })));
    }
    Ok(())
}

fn require_days(days: u32, field: &str) -> Result<u32, Error> {
    if days == 0 || days > MAX_WINDOW_DAYS {
        return Err(Error::invalid_request(format!(
            "{field} must be between 1 and {MAX_WINDOW_DAYS}"
        ))
        .with_details(json!({ "field": field, "code": "out_of_range" })));
    }
    Ok(days)
}

/// Start of a trailing window of `days` ending at `now`.
fn window_start(now: DateTime<Utc>, days: u32) -> Result<DateTime<Utc>, Error> {
    now.checked_sub_signed(Duration::days(i64::from(days)))
        .ok_or_else(|| {
            Error::invalid_request("days reaches before the earliest representable time")
                .with_details(json!({ "field": "days", "code": "out_of_range" }))
        })
}

/// Audit log service over an [`ActivityRepository`].
#[derive(Clone)]
pub struct ActivityService<R> {
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> ActivityService<R> {
    /// Create the service.
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }
}

#[async_trait]
impl<R> ActivityCommand for ActivityService<R>
where
    R: ActivityRepository,
{
    async fn log(&self, mut draft: ActivityDraft) -> Result<ActivityReceipt, Error> {
        require_text(&draft.activity_type, "activityType")?;
        require_text(&draft.description, "description")?;
        require_text(&draft.actor_id, "actorId")?;
        require_text(&draft.actor_role, "actorRole")?;
        draft.activity_type = draft.activity_type.trim().to_ascii_lowercase();
        if !draft.metadata.is_object() {
            draft.metadata = json!({ "value": draft.metadata });
        }
        self.repo.append(&draft).await.map_err(map_activity_error)
    }

    async fn cleanup(&self, days: Option<u32>) -> Result<CleanupReport, Error> {
        let days = require_days(days.unwrap_or(DEFAULT_RETENTION_DAYS), "days")?;
        let cutoff = window_start(self.clock.utc(), days)?;
        let maintenance = ActivityDraft::new(
            "system_maintenance",
            format!("Removed activity older than {days} days"),
            SYSTEM_ACTOR,
            "admin",
        )
        .with_metadata(json!({
            "operation": "cleanup_old_activity",
            "daysThreshold": days,
            "cutoff": cutoff,
        }));
        let deleted_count = self
            .repo
            .delete_before(cutoff, &maintenance)
            .await
            .map_err(map_activity_error)?;
        Ok(CleanupReport {
            deleted_count,
            days_threshold: days,
        })
    }

    async fn detect_suspicious(&self) -> Result<SuspiciousReport, Error> {
        let now = self.clock.utc();
        let hour_ago = now - Duration::hours(1);
        let day_ago = now - Duration::hours(24);

        let failed = self
            .repo
            .actor_counts_since(&ActivityTypeMatch::Exact("login_failed".to_owned()), hour_ago)
            .await
            .map_err(map_activity_error)?;
        let deletes = self
            .repo
            .actor_counts_since(&ActivityTypeMatch::Suffix("_deleted".to_owned()), hour_ago)
            .await
            .map_err(map_activity_error)?;
        let off_hours_types: Vec<String> = OFF_HOURS_TYPES.iter().map(|t| (*t).to_owned()).collect();
        let account_changes = self
            .repo
            .of_types_since(&off_hours_types, day_ago)
            .await
            .map_err(map_activity_error)?;

        let mut items = flag_failed_logins(failed);
        items.extend(flag_bulk_deletes(deletes));
        items.extend(flag_off_hours(account_changes));

        if !items.is_empty() {
            warn!(count = items.len(), "suspicious activity detected");
            let alert = ActivityDraft::new(
                "security_alert",
                format!("Detected {} suspicious activity patterns", items.len()),
                SYSTEM_ACTOR,
                "admin",
            )
            .with_metadata(json!({
                "suspiciousCount": items.len(),
                "findings": items,
            }));
            self.repo.append(&alert).await.map_err(map_activity_error)?;
        }

        Ok(SuspiciousReport {
            suspicious_count: items.len(),
            items,
            checked_at: now,
        })
    }
}

#[async_trait]
impl<R> ActivityQuery for ActivityService<R>
where
    R: ActivityRepository,
{
    async fn list(&self, filter: ActivityFilter, page: PageRequest) -> Result<ActivityLogPage, Error> {
        if let (Some(from), Some(to)) = (filter.date_from, filter.date_to)
            && from > to
        {
            return Err(Error::invalid_request("dateFrom must not be after dateTo")
                .with_details(json!({ "field": "dateFrom", "code": "invalid_range" })));
        }
        let (items, total) = self
            .repo
            .list(&filter, page)
            .await
            .map_err(map_activity_error)?;
        Ok(ActivityLogPage {
            page: Page::new(items, total, page),
            filters: filter,
        })
    }

    async fn statistics(&self, days: Option<u32>) -> Result<ActivityStatistics, Error> {
        let days = require_days(days.unwrap_or(DEFAULT_STATISTICS_DAYS), "days")?;
        let now = self.clock.utc();
        let since = window_start(now, days)?;
        let tallies = self
            .repo
            .tallies(since, TOP_ACTOR_LIMIT)
            .await
            .map_err(map_activity_error)?;
        Ok(ActivityStatistics {
            by_type: tallies.by_type,
            by_role: tallies.by_role,
            daily_counts: tallies.daily_counts,
            most_active_actors: tallies.most_active_actors,
            period_days: days,
            generated_at: now,
        })
    }

    async fn history(&self, entity_type: &str, entity_id: &str) -> Result<Vec<Activity>, Error> {
        require_text(entity_type, "entityType")?;
        require_text(entity_id, "entityId")?;
        self.repo
            .history(&entity_type.trim().to_ascii_lowercase(), entity_id.trim())
            .await
            .map_err(map_activity_error)
    }

    async fn tombstone(&self, entity_type: &str, entity_id: &str) -> Result<Tombstone, Error> {
        require_text(entity_type, "entityType")?;
        require_text(entity_id, "entityId")?;
        let not_found =
            || Error::not_found(format!("no deletion snapshot for {entity_type} {entity_id}"));
        let activity = self
            .repo
            .latest_for_target(&deletion_activity_type(entity_type), entity_id.trim())
            .await
            .map_err(map_activity_error)?
            .ok_or_else(not_found)?;
        Tombstone::from_activity(&entity_type.trim().to_ascii_lowercase(), entity_id, activity)
            .ok_or_else(not_found)
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
