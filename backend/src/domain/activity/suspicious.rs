//! Heuristics flagging suspicious activity patterns.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Activity, ActorCount};

/// Failed logins per actor within an hour that raise a flag.
pub const FAILED_LOGIN_THRESHOLD: i64 = 5;

/// Deletions per actor within an hour that raise a flag.
pub const BULK_DELETE_THRESHOLD: i64 = 10;

/// Account-administration types that are unusual outside working hours.
pub const OFF_HOURS_TYPES: [&str; 3] = ["user_created", "user_deleted", "role_changed"];

/// Category of a suspicious finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SuspiciousKind {
    /// Repeated `login_failed` entries for one actor.
    RepeatedFailedLogins,
    /// Many deletions by one actor.
    BulkDeletes,
    /// Account administration between 22:00 and 06:00 UTC.
    OffHours,
}

/// One suspicious finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuspiciousActivity {
    pub kind: SuspiciousKind,
    pub actor_id: String,
    pub actor_role: String,
    pub count: i64,
    pub description: String,
}

/// All findings from one detection pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuspiciousReport {
    pub items: Vec<SuspiciousActivity>,
    pub suspicious_count: usize,
    pub checked_at: DateTime<Utc>,
}

/// True before 06:00 or after 22:59 UTC.
///
/// # Examples
/// ```
/// use chrono::{TimeZone, Utc};
/// use cks_backend::domain::is_off_hours;
///
/// assert!(is_off_hours(Utc.with_ymd_and_hms(2025, 1, 1, 3, 0, 0).unwrap()));
/// assert!(!is_off_hours(Utc.with_ymd_and_hms(2025, 1, 1, 22, 30, 0).unwrap()));
/// ```
#[must_use]
pub fn is_off_hours(at: DateTime<Utc>) -> bool {
    let hour = at.hour();
    hour < 6 || hour > 22
}

fn over_threshold(
    counts: Vec<ActorCount>,
    threshold: i64,
    kind: SuspiciousKind,
    label: &str,
) -> Vec<SuspiciousActivity> {
    counts
        .into_iter()
        .filter(|row| row.count >= threshold)
        .map(|row| SuspiciousActivity {
            kind,
            description: format!("{} {label} in the last hour", row.count),
            actor_id: row.actor_id,
            actor_role: row.actor_role,
            count: row.count,
        })
        .collect()
}

pub(super) fn flag_failed_logins(counts: Vec<ActorCount>) -> Vec<SuspiciousActivity> {
    over_threshold(
        counts,
        FAILED_LOGIN_THRESHOLD,
        SuspiciousKind::RepeatedFailedLogins,
        "failed logins",
    )
}

pub(super) fn flag_bulk_deletes(counts: Vec<ActorCount>) -> Vec<SuspiciousActivity> {
    over_threshold(
        counts,
        BULK_DELETE_THRESHOLD,
        SuspiciousKind::BulkDeletes,
        "deletions",
    )
}

pub(super) fn flag_off_hours(rows: Vec<Activity>) -> Vec<SuspiciousActivity> {
    rows.into_iter()
        .filter(|row| OFF_HOURS_TYPES.contains(&row.activity_type.as_str()))
        .filter(|row| is_off_hours(row.created_at))
        .map(|row| SuspiciousActivity {
            kind: SuspiciousKind::OffHours,
            description: format!(
                "{} at {} UTC",
                row.activity_type,
                row.created_at.format("%H:%M")
            ),
            actor_id: row.actor_id,
            actor_role: row.actor_role,
            count: 1,
        })
        .collect()
}
