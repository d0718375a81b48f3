//! PostgreSQL-backed `ReportRepository` implementation using Diesel ORM.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::dsl::now;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{ReportRepository, ReportRepositoryError};
use crate::domain::{
    Acknowledger, Acknowledgment, ActivityDraft, Feedback, NewFeedback, NewReport, Principal,
    Report, ReportKind, ReportStatus, ReportUpdate, Role,
};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::diesel_helpers::{decode, insert_activity, next_value};
use super::models::{
    FeedbackAckRow, FeedbackRow, NewFeedbackAckRow, NewFeedbackRow, NewReportAckRow,
    NewReportRow, ReportAckRow, ReportRow,
};
use super::pool::DbPool;
use super::schema::{
    centers, customers, feedback, feedback_acknowledgments, report_acknowledgments, reports,
};

/// Diesel-backed implementation of the report repository port.
#[derive(Clone)]
pub struct DieselReportRepository {
    pool: DbPool,
}

impl DieselReportRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const fn sequence_for(kind: ReportKind) -> &'static str {
    match kind {
        ReportKind::Report => "report_sequence",
        ReportKind::Feedback => "feedback_sequence",
    }
}

fn ack(
    acknowledged_by_id: String,
    role: &str,
    acknowledged_at: chrono::DateTime<chrono::Utc>,
) -> Result<Acknowledgment, ReportRepositoryError> {
    Ok(Acknowledgment {
        acknowledged_by_id,
        acknowledged_by_role: decode(role, "acknowledged_by_role")?,
        acknowledged_at,
    })
}

fn row_to_report(
    row: ReportRow,
    acks: Vec<ReportAckRow>,
) -> Result<Report, ReportRepositoryError> {
    let acknowledgments = acks
        .into_iter()
        .map(|a| ack(a.acknowledged_by_id, &a.acknowledged_by_role, a.acknowledged_at))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Report {
        status: decode::<ReportStatus, _>(&row.status, "status")?,
        created_by_role: decode::<Role, _>(&row.created_by_role, "created_by_role")?,
        report_id: row.report_id,
        report_type: row.report_type,
        severity: row.severity,
        title: row.title,
        description: row.description,
        center_id: row.center_id,
        customer_id: row.customer_id,
        created_by_id: row.created_by_id,
        cks_manager: row.cks_manager,
        resolution_notes: row.resolution_notes,
        resolved_by: row.resolved_by,
        resolved_at: row.resolved_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
        archived_at: row.archived_at,
        acknowledgments,
    })
}

fn row_to_feedback(
    row: FeedbackRow,
    acks: Vec<FeedbackAckRow>,
) -> Result<Feedback, ReportRepositoryError> {
    let acknowledgments = acks
        .into_iter()
        .map(|a| ack(a.acknowledged_by_id, &a.acknowledged_by_role, a.acknowledged_at))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Feedback {
        status: decode::<ReportStatus, _>(&row.status, "status")?,
        created_by_role: decode::<Role, _>(&row.created_by_role, "created_by_role")?,
        feedback_id: row.feedback_id,
        kind: row.kind,
        title: row.title,
        message: row.message,
        center_id: row.center_id,
        customer_id: row.customer_id,
        created_by_id: row.created_by_id,
        cks_manager: row.cks_manager,
        created_at: row.created_at,
        archived_at: row.archived_at,
        acknowledgments,
    })
}

async fn load_report(
    conn: &mut AsyncPgConnection,
    report_id: &str,
) -> QueryResult<Option<(ReportRow, Vec<ReportAckRow>)>> {
    let Some(row) = reports::table
        .find(report_id)
        .select(ReportRow::as_select())
        .first(conn)
        .await
        .optional()?
    else {
        return Ok(None);
    };
    let acks = report_acknowledgments::table
        .filter(report_acknowledgments::report_id.eq(report_id))
        .order(report_acknowledgments::acknowledged_at.asc())
        .select(ReportAckRow::as_select())
        .load(conn)
        .await?;
    Ok(Some((row, acks)))
}

async fn load_feedback(
    conn: &mut AsyncPgConnection,
    feedback_id: &str,
) -> QueryResult<Option<(FeedbackRow, Vec<FeedbackAckRow>)>> {
    let Some(row) = feedback::table
        .find(feedback_id)
        .select(FeedbackRow::as_select())
        .first(conn)
        .await
        .optional()?
    else {
        return Ok(None);
    };
    let acks = feedback_acknowledgments::table
        .filter(feedback_acknowledgments::feedback_id.eq(feedback_id))
        .order(feedback_acknowledgments::acknowledged_at.asc())
        .select(FeedbackAckRow::as_select())
        .load(conn)
        .await?;
    Ok(Some((row, acks)))
}

/// Generates the per-table visibility filter. Contractors see tickets
/// raised against centers or customers they own.
macro_rules! ticket_visibility {
    ($table:ident, $viewer:expr) => {{
        let query = $table::table
            .filter($table::archived_at.is_null())
            .into_boxed::<Pg>();
        if $viewer.is_admin() {
            Some(query)
        } else if let Some(code) = $viewer.code() {
            let created = $table::created_by_id.eq(code);
            Some(match $viewer.role() {
                Role::Manager => query.filter(created.or($table::cks_manager.eq(code))),
                Role::Customer => query.filter(created.or($table::customer_id.eq(code))),
                Role::Center => query.filter(created.or($table::center_id.eq(code))),
                Role::Contractor => query.filter(
                    created
                        .or($table::center_id.eq_any(
                            centers::table
                                .filter(centers::contractor_id.eq(code))
                                .select(centers::center_id.nullable()),
                        ))
                        .or($table::customer_id.eq_any(
                            customers::table
                                .filter(customers::contractor_id.eq(code))
                                .select(customers::customer_id.nullable()),
                        )),
                ),
                Role::Crew | Role::Warehouse | Role::Admin => query.filter(created),
            })
        } else {
            None
        }
    }};
}

fn group_by<R, K: Fn(&R) -> &str>(rows: Vec<R>, key: K) -> HashMap<String, Vec<R>> {
    let mut grouped: HashMap<String, Vec<R>> = HashMap::new();
    for row in rows {
        grouped.entry(key(&row).to_owned()).or_default().push(row);
    }
    grouped
}

#[async_trait]
impl ReportRepository for DieselReportRepository {
    async fn next_sequence(&self, kind: ReportKind) -> Result<i64, ReportRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        next_value(&mut conn, sequence_for(kind))
            .await
            .map_err(map_diesel_error)
    }

    async fn insert_report(
        &self,
        report: &NewReport,
        activity: &ActivityDraft,
    ) -> Result<Report, ReportRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewReportRow {
            report_id: &report.report_id,
            report_type: &report.report_type,
            severity: &report.severity,
            title: &report.title,
            description: &report.description,
            center_id: report.center_id.as_deref(),
            customer_id: report.customer_id.as_deref(),
            status: ReportStatus::Open.as_str(),
            created_by_role: report.created_by_role.as_str(),
            created_by_id: &report.created_by_id,
            cks_manager: report.cks_manager.as_deref(),
        };
        let (stored, acks) = conn
            .transaction(|conn| {
                async move {
                    diesel::insert_into(reports::table)
                        .values(&row)
                        .execute(conn)
                        .await?;
                    insert_activity(conn, activity).await?;
                    load_report(conn, row.report_id)
                        .await?
                        .ok_or(diesel::result::Error::NotFound)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        row_to_report(stored, acks)
    }

    async fn insert_feedback(
        &self,
        item: &NewFeedback,
        activity: &ActivityDraft,
    ) -> Result<Feedback, ReportRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewFeedbackRow {
            feedback_id: &item.feedback_id,
            kind: &item.kind,
            title: &item.title,
            message: &item.message,
            center_id: item.center_id.as_deref(),
            customer_id: item.customer_id.as_deref(),
            status: ReportStatus::Open.as_str(),
            created_by_role: item.created_by_role.as_str(),
            created_by_id: &item.created_by_id,
            cks_manager: item.cks_manager.as_deref(),
        };
        let (stored, acks) = conn
            .transaction(|conn| {
                async move {
                    diesel::insert_into(feedback::table)
                        .values(&row)
                        .execute(conn)
                        .await?;
                    insert_activity(conn, activity).await?;
                    load_feedback(conn, row.feedback_id)
                        .await?
                        .ok_or(diesel::result::Error::NotFound)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        row_to_feedback(stored, acks)
    }

    async fn find_report(&self, report_id: &str) -> Result<Option<Report>, ReportRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        load_report(&mut conn, report_id)
            .await
            .map_err(map_diesel_error)?
            .map(|(row, acks)| row_to_report(row, acks))
            .transpose()
    }

    async fn find_feedback(
        &self,
        feedback_id: &str,
    ) -> Result<Option<Feedback>, ReportRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        load_feedback(&mut conn, feedback_id)
            .await
            .map_err(map_diesel_error)?
            .map(|(row, acks)| row_to_feedback(row, acks))
            .transpose()
    }

    async fn update_report(
        &self,
        update: &ReportUpdate,
        activity: &ActivityDraft,
    ) -> Result<Report, ReportRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (stored, acks) = conn
            .transaction(|conn| {
                async move {
                    let resolution = update.resolution.as_ref().map(|r| {
                        (
                            reports::resolution_notes.eq(r.notes.as_deref()),
                            reports::resolved_by.eq(Some(r.resolved_by.as_str())),
                            reports::resolved_at.eq(Some(r.resolved_at)),
                        )
                    });
                    diesel::update(reports::table.find(&update.report_id))
                        .set((
                            reports::status.eq(update.status.as_str()),
                            reports::updated_at.eq(now),
                            resolution,
                        ))
                        .execute(conn)
                        .await?;
                    insert_activity(conn, activity).await?;
                    load_report(conn, &update.report_id)
                        .await?
                        .ok_or(diesel::result::Error::NotFound)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        row_to_report(stored, acks)
    }

    async fn acknowledge(
        &self,
        kind: ReportKind,
        item_id: &str,
        by: &Acknowledger,
        activity: &ActivityDraft,
    ) -> Result<bool, ReportRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                let inserted = match kind {
                    ReportKind::Report => {
                        diesel::insert_into(report_acknowledgments::table)
                            .values(&NewReportAckRow {
                                report_id: item_id,
                                acknowledged_by_id: &by.id,
                                acknowledged_by_role: by.role.as_str(),
                            })
                            .on_conflict((
                                report_acknowledgments::report_id,
                                report_acknowledgments::acknowledged_by_id,
                            ))
                            .do_nothing()
                            .execute(conn)
                            .await?
                    }
                    ReportKind::Feedback => {
                        diesel::insert_into(feedback_acknowledgments::table)
                            .values(&NewFeedbackAckRow {
                                feedback_id: item_id,
                                acknowledged_by_id: &by.id,
                                acknowledged_by_role: by.role.as_str(),
                            })
                            .on_conflict((
                                feedback_acknowledgments::feedback_id,
                                feedback_acknowledgments::acknowledged_by_id,
                            ))
                            .do_nothing()
                            .execute(conn)
                            .await?
                    }
                };
                if inserted == 0 {
                    return Ok(false);
                }
                insert_activity(conn, activity).await?;
                Ok(true)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn list_visible(
        &self,
        viewer: &Principal,
    ) -> Result<(Vec<Report>, Vec<Feedback>), ReportRepositoryError> {
        let (Some(report_query), Some(feedback_query)) = (
            ticket_visibility!(reports, viewer),
            ticket_visibility!(feedback, viewer),
        ) else {
            return Ok((Vec::new(), Vec::new()));
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let report_rows: Vec<ReportRow> = report_query
            .order((reports::created_at.desc(), reports::report_id.desc()))
            .select(ReportRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let report_ids: Vec<&str> = report_rows.iter().map(|r| r.report_id.as_str()).collect();
        let report_acks: Vec<ReportAckRow> = report_acknowledgments::table
            .filter(report_acknowledgments::report_id.eq_any(&report_ids))
            .order(report_acknowledgments::acknowledged_at.asc())
            .select(ReportAckRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let feedback_rows: Vec<FeedbackRow> = feedback_query
            .order((feedback::created_at.desc(), feedback::feedback_id.desc()))
            .select(FeedbackRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let feedback_ids: Vec<&str> = feedback_rows
            .iter()
            .map(|f| f.feedback_id.as_str())
            .collect();
        let feedback_acks: Vec<FeedbackAckRow> = feedback_acknowledgments::table
            .filter(feedback_acknowledgments::feedback_id.eq_any(&feedback_ids))
            .order(feedback_acknowledgments::acknowledged_at.asc())
            .select(FeedbackAckRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let mut report_acks = group_by(report_acks, |a| a.report_id.as_str());
        let mut feedback_acks = group_by(feedback_acks, |a| a.feedback_id.as_str());
        let reports = report_rows
            .into_iter()
            .map(|row| {
                let acks = report_acks.remove(&row.report_id).unwrap_or_default();
                row_to_report(row, acks)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let feedback_items = feedback_rows
            .into_iter()
            .map(|row| {
                let acks = feedback_acks.remove(&row.feedback_id).unwrap_or_default();
                row_to_feedback(row, acks)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok((reports, feedback_items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn acknowledgments_are_grouped_per_ticket() {
        let at = chrono::Utc::now();
        let rows = vec![
            ReportAckRow {
                report_id: "RPT-001".into(),
                acknowledged_by_id: "MGR-001".into(),
                acknowledged_by_role: "manager".into(),
                acknowledged_at: at,
            },
            ReportAckRow {
                report_id: "RPT-002".into(),
                acknowledged_by_id: "CEN-001".into(),
                acknowledged_by_role: "center".into(),
                acknowledged_at: at,
            },
            ReportAckRow {
                report_id: "RPT-001".into(),
                acknowledged_by_id: "CUS-001".into(),
                acknowledged_by_role: "customer".into(),
                acknowledged_at: at,
            },
        ];
        let grouped = group_by(rows, |a| a.report_id.as_str());
        assert_eq!(grouped.get("RPT-001").map(Vec::len), Some(2));
        assert_eq!(grouped.get("RPT-002").map(Vec::len), Some(1));
    }

    #[rstest]
    fn unknown_ack_role_is_reported() {
        let error = ack("X".into(), "owner", chrono::Utc::now()).expect_err("invalid role");
        assert!(matches!(error, ReportRepositoryError::Query { .. }));
    }

    #[rstest]
    #[case(ReportKind::Report, "report_sequence")]
    #[case(ReportKind::Feedback, "feedback_sequence")]
    fn sequences_per_kind(#[case] kind: ReportKind, #[case] expected: &str) {
        assert_eq!(sequence_for(kind), expected);
    }
}
