//! Port for report and feedback persistence.

use async_trait::async_trait;

use crate::domain::{
    Acknowledger, ActivityDraft, Feedback, NewFeedback, NewReport, Principal, Report, ReportKind,
    ReportUpdate,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by report repository adapters.
    pub enum ReportRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "report repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "report repository query failed: {message}",
    }
}

/// Storage for reports, feedback, and their acknowledgments.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// Next value of the per-kind id sequence.
    async fn next_sequence(&self, kind: ReportKind) -> Result<i64, ReportRepositoryError>;

    /// Insert a report and `activity` in one transaction.
    async fn insert_report(
        &self,
        report: &NewReport,
        activity: &ActivityDraft,
    ) -> Result<Report, ReportRepositoryError>;

    /// Insert feedback and `activity` in one transaction.
    async fn insert_feedback(
        &self,
        feedback: &NewFeedback,
        activity: &ActivityDraft,
    ) -> Result<Feedback, ReportRepositoryError>;

    /// Report with acknowledgments, including archived rows.
    async fn find_report(&self, report_id: &str) -> Result<Option<Report>, ReportRepositoryError>;

    /// Feedback with acknowledgments, including archived rows.
    async fn find_feedback(
        &self,
        feedback_id: &str,
    ) -> Result<Option<Feedback>, ReportRepositoryError>;

    /// Apply a status change and append `activity` in one transaction.
    async fn update_report(
        &self,
        update: &ReportUpdate,
        activity: &ActivityDraft,
    ) -> Result<Report, ReportRepositoryError>;

    /// Insert an acknowledgment unless one exists for the same account.
    /// `activity` is appended only when a row was inserted. Returns whether
    /// a row was inserted.
    async fn acknowledge(
        &self,
        kind: ReportKind,
        item_id: &str,
        by: &Acknowledger,
        activity: &ActivityDraft,
    ) -> Result<bool, ReportRepositoryError>;

    /// Non-archived tickets visible to `viewer`, newest first.
    async fn list_visible(
        &self,
        viewer: &Principal,
    ) -> Result<(Vec<Report>, Vec<Feedback>), ReportRepositoryError>;
}
