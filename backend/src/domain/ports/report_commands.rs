//! Driving ports for reports and feedback.

use async_trait::async_trait;

use crate::domain::{
    AckOutcome, CreateFeedbackRequest, CreateReportRequest, Error, Feedback, HubReports,
    Principal, Report, ReportKind, ReportStatus,
};

/// Creates and updates tickets.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportCommand: Send + Sync {
    /// File a report scoped to the relevant ecosystem manager.
    async fn create_report(
        &self,
        principal: &Principal,
        request: CreateReportRequest,
    ) -> Result<Report, Error>;

    /// File feedback scoped to the relevant ecosystem manager.
    async fn create_feedback(
        &self,
        principal: &Principal,
        request: CreateFeedbackRequest,
    ) -> Result<Feedback, Error>;

    /// Move a report to another status.
    async fn update_status(
        &self,
        principal: &Principal,
        report_id: &str,
        status: ReportStatus,
    ) -> Result<Report, Error>;

    /// Close a report with resolution notes.
    async fn resolve(
        &self,
        principal: &Principal,
        report_id: &str,
        notes: Option<String>,
    ) -> Result<Report, Error>;

    /// Mark a ticket as seen; repeated calls are no-ops.
    async fn acknowledge(
        &self,
        principal: &Principal,
        kind: ReportKind,
        item_id: &str,
    ) -> Result<AckOutcome, Error>;
}

/// Reads tickets for a viewer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportQuery: Send + Sync {
    /// Tickets visible to `principal`.
    async fn hub_reports(&self, principal: &Principal) -> Result<HubReports, Error>;
}

/// Fixture used when no database is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureReports;

fn unavailable() -> Error {
    Error::service_unavailable("report storage is not configured")
}

#[async_trait]
impl ReportCommand for FixtureReports {
    async fn create_report(
        &self,
        _principal: &Principal,
        _request: CreateReportRequest,
    ) -> Result<Report, Error> {
        Err(unavailable())
    }

    async fn create_feedback(
        &self,
        _principal: &Principal,
        _request: CreateFeedbackRequest,
    ) -> Result<Feedback, Error> {
        Err(unavailable())
    }

    async fn update_status(
        &self,
        _principal: &Principal,
        report_id: &str,
        _status: ReportStatus,
    ) -> Result<Report, Error> {
        Err(Error::not_found(format!("Report {report_id} not found")))
    }

    async fn resolve(
        &self,
        _principal: &Principal,
        report_id: &str,
        _notes: Option<String>,
    ) -> Result<Report, Error> {
        Err(Error::not_found(format!("Report {report_id} not found")))
    }

    async fn acknowledge(
        &self,
        _principal: &Principal,
        kind: ReportKind,
        item_id: &str,
    ) -> Result<AckOutcome, Error> {
        Err(Error::not_found(format!("{} {item_id} not found", kind.as_str())))
    }
}

#[async_trait]
impl ReportQuery for FixtureReports {
    async fn hub_reports(&self, principal: &Principal) -> Result<HubReports, Error> {
        Ok(HubReports {
            role: principal.role(),
            cks_code: principal.code().map(str::to_owned),
            reports: Vec::new(),
            feedback: Vec::new(),
        })
    }
}
