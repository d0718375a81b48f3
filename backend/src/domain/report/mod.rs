//! Reports and feedback tickets.
//!
//! Both ticket kinds are scoped to the ecosystem manager of the center or
//! customer they concern and carry an idempotent acknowledgment list: one
//! row per (ticket, account), enforced by a unique constraint.

mod service;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Role;

pub use service::ReportService;

/// Default report type.
pub const DEFAULT_REPORT_TYPE: &str = "other";
/// Default report severity.
pub const DEFAULT_SEVERITY: &str = "medium";
/// Default feedback kind.
pub const DEFAULT_FEEDBACK_KIND: &str = "general";

/// Ticket kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Report,
    Feedback,
}

impl ReportKind {
    /// Lower-case name used in paths and activity types.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Report => "report",
            Self::Feedback => "feedback",
        }
    }

    /// Id prefix, `RPT` or `FBK`.
    #[must_use]
    pub const fn id_prefix(self) -> &'static str {
        match self {
            Self::Report => "RPT",
            Self::Feedback => "FBK",
        }
    }

    /// Build an id such as `RPT-007`.
    ///
    /// # Examples
    /// ```
    /// use cks_backend::domain::ReportKind;
    ///
    /// assert_eq!(ReportKind::Feedback.format_id(12), "FBK-012");
    /// ```
    #[must_use]
    pub fn format_id(self, sequence: i64) -> String {
        format!("{}-{sequence:03}", self.id_prefix())
    }
}

/// Ticket status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ReportStatus {
    Open,
    InProgress,
    Closed,
}

impl ReportStatus {
    /// Name stored in the `status` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in-progress",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised for status values outside `open | in-progress | closed`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("status must be one of open, in-progress, closed (got {0})")]
pub struct UnknownReportStatus(pub String);

impl FromStr for ReportStatus {
    type Err = UnknownReportStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "in-progress" | "in_progress" => Ok(Self::InProgress),
            "closed" => Ok(Self::Closed),
            other => Err(UnknownReportStatus(other.to_owned())),
        }
    }
}

/// One "mark as seen" row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Acknowledgment {
    pub acknowledged_by_id: String,
    pub acknowledged_by_role: Role,
    pub acknowledged_at: DateTime<Utc>,
}

/// Columns that decide who can see a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketScope<'a> {
    pub created_by_id: &'a str,
    pub center_id: Option<&'a str>,
    pub customer_id: Option<&'a str>,
    pub cks_manager: Option<&'a str>,
    pub archived: bool,
}

/// Stored report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub report_id: String,
    #[serde(rename = "type")]
    pub report_type: String,
    pub severity: String,
    pub title: String,
    pub description: String,
    pub center_id: Option<String>,
    pub customer_id: Option<String>,
    pub status: ReportStatus,
    pub created_by_role: Role,
    pub created_by_id: String,
    pub cks_manager: Option<String>,
    pub resolution_notes: Option<String>,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
    pub acknowledgments: Vec<Acknowledgment>,
}

impl Report {
    /// Visibility columns.
    #[must_use]
    pub fn scope(&self) -> TicketScope<'_> {
        TicketScope {
            created_by_id: &self.created_by_id,
            center_id: self.center_id.as_deref(),
            customer_id: self.customer_id.as_deref(),
            cks_manager: self.cks_manager.as_deref(),
            archived: self.archived_at.is_some(),
        }
    }
}

/// Stored feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub feedback_id: String,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub center_id: Option<String>,
    pub customer_id: Option<String>,
    pub status: ReportStatus,
    pub created_by_role: Role,
    pub created_by_id: String,
    pub cks_manager: Option<String>,
    pub created_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
    pub acknowledgments: Vec<Acknowledgment>,
}

impl Feedback {
    /// Visibility columns.
    #[must_use]
    pub fn scope(&self) -> TicketScope<'_> {
        TicketScope {
            created_by_id: &self.created_by_id,
            center_id: self.center_id.as_deref(),
            customer_id: self.customer_id.as_deref(),
            cks_manager: self.cks_manager.as_deref(),
            archived: self.archived_at.is_some(),
        }
    }
}

/// Report creation payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportRequest {
    #[serde(default, rename = "type")]
    pub report_type: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub center_id: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
}

/// Feedback creation payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFeedbackRequest {
    #[serde(default)]
    pub kind: Option<String>,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub center_id: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
}

/// Report awaiting insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReport {
    pub report_id: String,
    pub report_type: String,
    pub severity: String,
    pub title: String,
    pub description: String,
    pub center_id: Option<String>,
    pub customer_id: Option<String>,
    pub created_by_role: Role,
    pub created_by_id: String,
    pub cks_manager: Option<String>,
}

/// Feedback awaiting insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFeedback {
    pub feedback_id: String,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub center_id: Option<String>,
    pub customer_id: Option<String>,
    pub created_by_role: Role,
    pub created_by_id: String,
    pub cks_manager: Option<String>,
}

/// Status change, optionally closing the report with a resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportUpdate {
    pub report_id: String,
    pub status: ReportStatus,
    pub resolution: Option<Resolution>,
}

/// Resolution recorded when a report is closed through `resolve`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub notes: Option<String>,
    pub resolved_by: String,
    pub resolved_at: DateTime<Utc>,
}

/// Account acknowledging a ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acknowledger {
    pub id: String,
    pub role: Role,
}

/// Whether an acknowledgment inserted a new row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AckOutcome {
    pub created: bool,
}

/// Tickets visible to one hub account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HubReports {
    pub role: Role,
    pub cks_code: Option<String>,
    pub reports: Vec<Report>,
    pub feedback: Vec<Feedback>,
}
