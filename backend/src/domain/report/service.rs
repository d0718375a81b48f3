//! Report and feedback service.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::info;

use super::{
    AckOutcome, Acknowledger, CreateFeedbackRequest, CreateReportRequest, DEFAULT_FEEDBACK_KIND,
    DEFAULT_REPORT_TYPE, DEFAULT_SEVERITY, Feedback, HubReports, NewFeedback, NewReport, Report,
    ReportKind, ReportStatus, ReportUpdate, Resolution, TicketScope,
};
use crate::domain::auth_service::map_directory_error;
use crate::domain::ports::{
    EcosystemDirectory, ReportCommand, ReportQuery, ReportRepository, ReportRepositoryError,
};
use crate::domain::{ActivityDraft, Error, Principal, Role, normalize_identity, role_for_code};

fn map_report_error(error: ReportRepositoryError) -> Error {
    match error {
        ReportRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("report repository unavailable: {message}"))
        }
        ReportRepositoryError::Query { message } => {
            Error::internal(format!("report repository error: {message}"))
        }
    }
}

fn required(value: &str, field: &str) -> Result<String, Error> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid_request(format!("{field} must not be empty"))
            .with_details(json!({ "field": field, "code": "missing_field" })));
    }
    Ok(trimmed.to_owned())
}

fn or_default(value: Option<String>, default: &str) -> String {
    value
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_owned())
}

fn entity_code(value: Option<&str>, role: Role, field: &str) -> Result<Option<String>, Error> {
    let Some(code) = normalize_identity(value) else {
        return Ok(None);
    };
    if role_for_code(&code) != Some(role) {
        return Err(Error::invalid_request(format!("{field} must be a {role} code"))
            .with_details(json!({ "field": field, "code": "invalid_code", "value": code })));
    }
    Ok(Some(code))
}

/// Tickets over a [`ReportRepository`], scoped through the directory.
#[derive(Clone)]
pub struct ReportService<R, E> {
    repo: Arc<R>,
    ecosystem: Arc<E>,
    clock: Arc<dyn Clock>,
}

impl<R, E> ReportService<R, E> {
    /// Create the service.
    pub fn new(repo: Arc<R>, ecosystem: Arc<E>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            ecosystem,
            clock,
        }
    }
}

impl<R, E> ReportService<R, E>
where
    R: ReportRepository,
    E: EcosystemDirectory,
{
    async fn manager_of(&self, role: Role, code: &str) -> Result<Option<String>, Error> {
        Ok(self
            .ecosystem
            .resolve(role, code)
            .await
            .map_err(map_directory_error)?
            .manager_id)
    }

    /// Center's manager, then customer's manager, then the creator's own.
    async fn ecosystem_manager(
        &self,
        principal: &Principal,
        center_id: Option<&str>,
        customer_id: Option<&str>,
    ) -> Result<Option<String>, Error> {
        if let Some(center) = center_id
            && let Some(manager) = self.manager_of(Role::Center, center).await?
        {
            return Ok(Some(manager));
        }
        if let Some(customer) = customer_id
            && let Some(manager) = self.manager_of(Role::Customer, customer).await?
        {
            return Ok(Some(manager));
        }
        match (principal.role(), principal.code()) {
            (Role::Admin | Role::Warehouse, _) | (_, None) => Ok(None),
            (role, Some(code)) => self.manager_of(role, code).await,
        }
    }

    async fn contractor_owns(&self, contractor: &str, scope: TicketScope<'_>) -> Result<bool, Error> {
        for (role, code) in [(Role::Center, scope.center_id), (Role::Customer, scope.customer_id)] {
            let Some(code) = code else { continue };
            let links = self
                .ecosystem
                .resolve(role, code)
                .await
                .map_err(map_directory_error)?;
            if links.contractor_id.as_deref() == Some(contractor) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn can_view(&self, viewer: &Principal, scope: TicketScope<'_>) -> Result<bool, Error> {
        if scope.archived {
            return Ok(false);
        }
        if viewer.is_admin() {
            return Ok(true);
        }
        let Some(code) = viewer.code() else {
            return Ok(false);
        };
        if scope.created_by_id == code {
            return Ok(true);
        }
        match viewer.role() {
            Role::Manager => Ok(scope.cks_manager == Some(code)),
            Role::Customer => Ok(scope.customer_id == Some(code)),
            Role::Center => Ok(scope.center_id == Some(code)),
            Role::Contractor => self.contractor_owns(code, scope).await,
            Role::Crew | Role::Warehouse | Role::Admin => Ok(false),
        }
    }

    async fn load_report(&self, principal: &Principal, report_id: &str) -> Result<Report, Error> {
        let not_found = || Error::not_found(format!("Report {} not found", report_id.trim()));
        let id = normalize_identity(Some(report_id)).ok_or_else(not_found)?;
        let report = self
            .repo
            .find_report(&id)
            .await
            .map_err(map_report_error)?
            .ok_or_else(not_found)?;
        if !self.can_view(principal, report.scope()).await? {
            return Err(not_found());
        }
        Ok(report)
    }

    async fn load_feedback(&self, principal: &Principal, feedback_id: &str) -> Result<Feedback, Error> {
        let not_found = || Error::not_found(format!("Feedback {} not found", feedback_id.trim()));
        let id = normalize_identity(Some(feedback_id)).ok_or_else(not_found)?;
        let feedback = self
            .repo
            .find_feedback(&id)
            .await
            .map_err(map_report_error)?
            .ok_or_else(not_found)?;
        if !self.can_view(principal, feedback.scope()).await? {
            return Err(not_found());
        }
        Ok(feedback)
    }

    async fn next_id(&self, kind: ReportKind) -> Result<String, Error> {
        let sequence = self
            .repo
            .next_sequence(kind)
            .await
            .map_err(map_report_error)?;
        Ok(kind.format_id(sequence))
    }
}

#[async_trait]
impl<R, E> ReportCommand for ReportService<R, E>
where
    R: ReportRepository,
    E: EcosystemDirectory,
{
    async fn create_report(
        &self,
        principal: &Principal,
        request: CreateReportRequest,
    ) -> Result<Report, Error> {
        let title = required(&request.title, "title")?;
        let description = required(&request.description, "description")?;
        let center_id = entity_code(request.center_id.as_deref(), Role::Center, "centerId")?;
        let customer_id = entity_code(request.customer_id.as_deref(), Role::Customer, "customerId")?;
        let cks_manager = self
            .ecosystem_manager(principal, center_id.as_deref(), customer_id.as_deref())
            .await?;
        let report_id = self.next_id(ReportKind::Report).await?;

        let report = NewReport {
            report_id: report_id.clone(),
            report_type: or_default(request.report_type, DEFAULT_REPORT_TYPE),
            severity: or_default(request.severity, DEFAULT_SEVERITY),
            title,
            description,
            center_id,
            customer_id,
            created_by_role: principal.role(),
            created_by_id: principal.actor_id(),
            cks_manager,
        };
        let activity = ActivityDraft::new(
            "report_created",
            format!("{} filed report {report_id}: {}", report.created_by_id, report.title),
            report.created_by_id.clone(),
            principal.role().as_str(),
        )
        .with_target(report_id, "report")
        .with_metadata(json!({
            "type": report.report_type,
            "severity": report.severity,
            "cksManager": report.cks_manager,
        }));
        let stored = self
            .repo
            .insert_report(&report, &activity)
            .await
            .map_err(map_report_error)?;
        info!(report_id = %stored.report_id, "report created");
        Ok(stored)
    }

    async fn create_feedback(
        &self,
        principal: &Principal,
        request: CreateFeedbackRequest,
    ) -> Result<Feedback, Error> {
        let title = required(&request.title, "title")?;
        let message = required(&request.message, "message")?;
        let center_id = entity_code(request.center_id.as_deref(), Role::Center, "centerId")?;
        let customer_id = entity_code(request.customer_id.as_deref(), Role::Customer, "customerId")?;
        let cks_manager = self
            .ecosystem_manager(principal, center_id.as_deref(), customer_id.as_deref())
            .await?;
        let feedback_id = self.next_id(ReportKind::Feedback).await?;

        let feedback = NewFeedback {
            feedback_id: feedback_id.clone(),
            kind: or_default(request.kind, DEFAULT_FEEDBACK_KIND),
            title,
            message,
            center_id,
            customer_id,
            created_by_role: principal.role(),
            created_by_id: principal.actor_id(),
            cks_manager,
        };
        let activity = ActivityDraft::new(
            "feedback_created",
            format!("{} left feedback {feedback_id}: {}", feedback.created_by_id, feedback.title),
            feedback.created_by_id.clone(),
            principal.role().as_str(),
        )
        .with_target(feedback_id, "feedback")
        .with_metadata(json!({
            "kind": feedback.kind,
            "cksManager": feedback.cks_manager,
        }));
        self.repo
            .insert_feedback(&feedback, &activity)
            .await
            .map_err(map_report_error)
    }

    async fn update_status(
        &self,
        principal: &Principal,
        report_id: &str,
        status: ReportStatus,
    ) -> Result<Report, Error> {
        let report = self.load_report(principal, report_id).await?;
        let activity = ActivityDraft::new(
            "report_status_updated",
            format!("Report {} moved to {status}", report.report_id),
            principal.actor_id(),
            principal.role().as_str(),
        )
        .with_target(report.report_id.clone(), "report")
        .with_metadata(json!({ "from": report.status, "to": status }));
        self.repo
            .update_report(
                &ReportUpdate {
                    report_id: report.report_id,
                    status,
                    resolution: None,
                },
                &activity,
            )
            .await
            .map_err(map_report_error)
    }

    async fn resolve(
        &self,
        principal: &Principal,
        report_id: &str,
        notes: Option<String>,
    ) -> Result<Report, Error> {
        let report = self.load_report(principal, report_id).await?;
        if report.status == ReportStatus::Closed && report.resolved_at.is_some() {
            return Err(Error::conflict(format!(
                "Report {} is already resolved",
                report.report_id
            )));
        }
        let notes = notes.map(|n| n.trim().to_owned()).filter(|n| !n.is_empty());
        let activity = ActivityDraft::new(
            "report_resolved",
            format!("Report {} resolved by {}", report.report_id, principal.actor_id()),
            principal.actor_id(),
            principal.role().as_str(),
        )
        .with_target(report.report_id.clone(), "report")
        .with_metadata(json!({ "notes": notes }));
        let update = ReportUpdate {
            report_id: report.report_id,
            status: ReportStatus::Closed,
            resolution: Some(Resolution {
                notes,
                resolved_by: principal.actor_id(),
                resolved_at: self.clock.utc(),
            }),
        };
        self.repo
            .update_report(&update, &activity)
            .await
            .map_err(map_report_error)
    }

    async fn acknowledge(
        &self,
        principal: &Principal,
        kind: ReportKind,
        item_id: &str,
    ) -> Result<AckOutcome, Error> {
        let id = match kind {
            ReportKind::Report => self.load_report(principal, item_id).await?.report_id,
            ReportKind::Feedback => self.load_feedback(principal, item_id).await?.feedback_id,
        };
        let by = Acknowledger {
            id: principal.actor_id(),
            role: principal.role(),
        };
        let activity = ActivityDraft::new(
            format!("{}_acknowledged", kind.as_str()),
            format!("{} acknowledged {} {id}", by.id, kind.as_str()),
            by.id.clone(),
            by.role.as_str(),
        )
        .with_target(id.clone(), kind.as_str());
        let created = self
            .repo
            .acknowledge(kind, &id, &by, &activity)
            .await
            .map_err(map_report_error)?;
        Ok(AckOutcome { created })
    }
}

#[async_trait]
impl<R, E> ReportQuery for ReportService<R, E>
where
    R: ReportRepository,
    E: EcosystemDirectory,
{
    async fn hub_reports(&self, principal: &Principal) -> Result<HubReports, Error> {
        let (reports, feedback) = self
            .repo
            .list_visible(principal)
            .await
            .map_err(map_report_error)?;
        Ok(HubReports {
            role: principal.role(),
            cks_code: principal.code().map(str::to_owned),
            reports: reports
                .into_iter()
                .filter(|r| r.archived_at.is_none())
                .collect(),
            feedback: feedback
                .into_iter()
                .filter(|f| f.archived_at.is_none())
                .collect(),
        })
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
