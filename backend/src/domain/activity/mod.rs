//! System activity log.
//!
//! Activity rows are append-only audit records written alongside every
//! state-changing action. Reads power the admin audit views, dashboards,
//! entity histories, and deletion tombstones.

mod service;
mod suspicious;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

pub use service::ActivityService;
pub(crate) use service::map_activity_error;
pub use suspicious::{
    BULK_DELETE_THRESHOLD, FAILED_LOGIN_THRESHOLD, OFF_HOURS_TYPES, SuspiciousActivity,
    SuspiciousKind, SuspiciousReport, is_off_hours,
};

/// Actor recorded for automated maintenance entries.
pub const SYSTEM_ACTOR: &str = "SYSTEM";

/// Default retention, in days, for `cleanup_old_activity`.
pub const DEFAULT_RETENTION_DAYS: u32 = 90;

/// Default window, in days, for activity statistics.
pub const DEFAULT_STATISTICS_DAYS: u32 = 30;

/// Longest look-back window, in days, accepted by cleanup and statistics.
pub const MAX_WINDOW_DAYS: u32 = 36_500;

/// Number of actors returned in `most_active_actors`.
pub const TOP_ACTOR_LIMIT: u32 = 10;

/// Activity row awaiting insertion.
///
/// # Examples
/// ```
/// use cks_backend::domain::ActivityDraft;
/// use serde_json::json;
///
/// let draft = ActivityDraft::new("order_created", "Created CEN-010-PO-001", "CEN-010", "center")
///     .with_target("CEN-010-PO-001", "order")
///     .with_metadata(json!({"orderType": "product"}));
/// assert_eq!(draft.target_id.as_deref(), Some("CEN-010-PO-001"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDraft {
    pub activity_type: String,
    pub description: String,
    pub actor_id: String,
    pub actor_role: String,
    pub target_id: Option<String>,
    pub target_type: Option<String>,
    #[schema(value_type = Object)]
    pub metadata: Value,
}

impl ActivityDraft {
    /// Start a draft without a target or metadata.
    pub fn new(
        activity_type: impl Into<String>,
        description: impl Into<String>,
        actor_id: impl Into<String>,
        actor_role: impl Into<String>,
    ) -> Self {
        Self {
            activity_type: activity_type.into(),
            description: description.into(),
            actor_id: actor_id.into(),
            actor_role: actor_role.into(),
            target_id: None,
            target_type: None,
            metadata: Value::Object(serde_json::Map::new()),
        }
    }

    /// Attach the entity the activity is about.
    #[must_use]
    pub fn with_target(mut self, target_id: impl Into<String>, target_type: impl Into<String>) -> Self {
        self.target_id = Some(target_id.into());
        self.target_type = Some(target_type.into());
        self
    }

    /// Replace the metadata object.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Stored activity row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub activity_id: i64,
    pub activity_type: String,
    pub description: String,
    pub actor_id: String,
    pub actor_role: String,
    pub target_id: Option<String>,
    pub target_type: Option<String>,
    #[schema(value_type = Object)]
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

/// Identifier and timestamp of a freshly appended row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityReceipt {
    pub activity_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Filters accepted by the activity log listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_from: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_to: Option<DateTime<Utc>>,
    /// Case-insensitive match on description, target id, or actor id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

/// Rows visible to a dashboard scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityScope {
    /// Every row.
    All,
    /// Rows where the code is the actor or the target.
    Code(String),
}

/// How activity types are matched when counting per actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityTypeMatch {
    /// Exactly this type.
    Exact(String),
    /// Any type ending in this suffix.
    Suffix(String),
}

/// Count of rows sharing a key such as a type or role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CountBucket {
    pub key: String,
    pub count: i64,
}

/// Rows per calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyCount {
    pub day: NaiveDate,
    pub count: i64,
}

/// Rows per actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActorCount {
    pub actor_id: String,
    pub actor_role: String,
    pub count: i64,
}

/// Raw aggregates read from storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityTallies {
    pub by_type: Vec<CountBucket>,
    pub by_role: Vec<CountBucket>,
    pub daily_counts: Vec<DailyCount>,
    pub most_active_actors: Vec<ActorCount>,
}

/// Aggregated activity over a trailing window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityStatistics {
    pub by_type: Vec<CountBucket>,
    pub by_role: Vec<CountBucket>,
    pub daily_counts: Vec<DailyCount>,
    pub most_active_actors: Vec<ActorCount>,
    pub period_days: u32,
    pub generated_at: DateTime<Utc>,
}

/// Result of pruning old activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CleanupReport {
    pub deleted_count: u64,
    pub days_threshold: u32,
}

/// Snapshot of a hard-deleted entity, read back from its deletion activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tombstone {
    pub entity_type: String,
    pub entity_id: String,
    pub deleted_at: DateTime<Utc>,
    pub deleted_by: String,
    #[schema(value_type = Object)]
    pub snapshot: Value,
}

impl Tombstone {
    /// Build from a `{type}_deleted` activity; `None` when it carries no
    /// snapshot.
    #[must_use]
    pub fn from_activity(entity_type: &str, entity_id: &str, activity: Activity) -> Option<Self> {
        let snapshot = activity.metadata.get("snapshot")?.clone();
        if snapshot.is_null() {
            return None;
        }
        Some(Self {
            entity_type: entity_type.to_owned(),
            entity_id: activity.target_id.unwrap_or_else(|| entity_id.to_owned()),
            deleted_at: activity.created_at,
            deleted_by: activity.actor_id,
            snapshot,
        })
    }
}

/// Activity type written when an entity of `entity_type` is hard-deleted.
#[must_use]
pub fn deletion_activity_type(entity_type: &str) -> String {
    format!("{}_deleted", entity_type.trim().to_ascii_lowercase())
}
