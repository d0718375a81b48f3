//! Archive, restore, hard delete, and the deletion audit trail against
//! PostgreSQL.
//!
//! Requires `TEST_DATABASE_URL`; prints `SKIP-TEST-DB` and passes otherwise.

use std::sync::Arc;

use cks_backend::domain::ports::{ActivityQuery, ArchiveCommand};
use cks_backend::domain::{
    ActivityFilter, ActivityService, ArchiveEntity, ArchiveService, ErrorCode, Principal,
};
use cks_backend::outbound::persistence::{DieselActivityRepository, DieselArchiveRepository};
use mockable::DefaultClock;
use pagination::PageRequest;
use rstest::rstest;
use tokio::runtime::Runtime;

mod support;

use support::{ECOSYSTEM_SQL, pool, provision_database, query_i64, seed};

struct TestContext {
    runtime: Runtime,
    url: String,
    archive: ArchiveService<DieselArchiveRepository>,
    activity: ActivityService<DieselActivityRepository>,
    admin: Principal,
}

fn setup(name: &str) -> Option<TestContext> {
    let url = match provision_database(name) {
        Ok(Some(url)) => url,
        Ok(None) => return None,
        Err(reason) => panic!("test database setup failed: {reason}"),
    };
    seed(&url, ECOSYSTEM_SQL).expect("seed ecosystem");
    let runtime = Runtime::new().expect("runtime");
    let pool = pool(&runtime, &url).expect("pool");
    Some(TestContext {
        runtime,
        url,
        archive: ArchiveService::new(
            Arc::new(DieselArchiveRepository::new(pool.clone())),
            Arc::new(DefaultClock),
        ),
        activity: ActivityService::new(
            Arc::new(DieselActivityRepository::new(pool)),
            Arc::new(DefaultClock),
        ),
        admin: Principal::admin(Some("ADM-001")),
    })
}

#[rstest]
fn archiving_a_center_detaches_its_crew_until_restore() {
    let Some(ctx) = setup("cks_archive_center") else {
        return;
    };
    ctx.runtime.block_on(async {
        let outcome = ctx
            .archive
            .archive(&ctx.admin, ArchiveEntity::Center, "cen-010", Some("Lease ended".to_owned()))
            .await
            .expect("archive center");
        assert_eq!(outcome.entity_id, "CEN-010");
        assert_eq!(outcome.unassigned_children, 1);
        assert_eq!((outcome.deletion_scheduled - outcome.archived_at).num_days(), 30);

        let listed = ctx
            .archive
            .list_archived(Some(ArchiveEntity::Center), None)
            .await
            .expect("list archived");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].archive_reason.as_deref(), Some("Lease ended"));

        let links = ctx
            .archive
            .relationships(ArchiveEntity::Center, "CEN-010")
            .await
            .expect("relationships");
        assert!(links.iter().any(|link| link.entity_id == "CRW-004" && !link.restored));

        ctx.archive
            .restore(&ctx.admin, ArchiveEntity::Center, "CEN-010")
            .await
            .expect("restore");
        let err = ctx
            .archive
            .restore(&ctx.admin, ArchiveEntity::Center, "CEN-010")
            .await
            .expect_err("already active");
        assert_eq!(err.code(), ErrorCode::NotFound);
    });

    let unassigned = query_i64(
        &ctx.url,
        "SELECT count(*) FROM crew WHERE crew_id = 'CRW-004' AND assigned_center IS NULL",
    )
    .expect("crew count");
    assert_eq!(unassigned, 1);
}

#[rstest]
fn hard_delete_requires_an_archived_row_and_leaves_a_tombstone() {
    let Some(ctx) = setup("cks_archive_hard_delete") else {
        return;
    };
    ctx.runtime.block_on(async {
        let err = ctx
            .archive
            .hard_delete(&ctx.admin, ArchiveEntity::Crew, "CRW-004", true)
            .await
            .expect_err("active rows cannot be hard deleted");
        assert_eq!(err.code(), ErrorCode::Conflict);

        ctx.archive
            .archive(&ctx.admin, ArchiveEntity::Crew, "CRW-004", None)
            .await
            .expect("archive crew");
        ctx.archive
            .hard_delete(&ctx.admin, ArchiveEntity::Crew, "CRW-004", true)
            .await
            .expect("hard delete");

        let tombstone = ctx
            .activity
            .tombstone("crew", "CRW-004")
            .await
            .expect("tombstone");
        assert_eq!(tombstone.deleted_by, "ADM-001");
        assert_eq!(
            tombstone.snapshot.get("name").and_then(|v| v.as_str()),
            Some("Dana Okafor")
        );

        let filter = ActivityFilter {
            target_type: Some("crew".to_owned()),
            ..ActivityFilter::default()
        };
        let page = ctx
            .activity
            .list(filter, PageRequest::new(Some(10), None).expect("page"))
            .await
            .expect("list activity");
        let types: Vec<_> = page
            .page
            .items
            .iter()
            .map(|row| row.activity_type.as_str())
            .collect();
        assert_eq!(types, ["crew_deleted", "crew_archived"]);
    });

    let remaining = query_i64(&ctx.url, "SELECT count(*) FROM crew").expect("crew count");
    assert_eq!(remaining, 0);
}

#[rstest]
fn managers_with_active_contractors_cannot_be_hard_deleted() {
    let Some(ctx) = setup("cks_archive_children") else {
        return;
    };
    seed(
        &ctx.url,
        "UPDATE managers SET archived_at = now(), deletion_scheduled = now() WHERE manager_id = 'MGR-012';",
    )
    .expect("archive manager directly");
    let err = ctx
        .runtime
        .block_on(
            ctx.archive
                .hard_delete(&ctx.admin, ArchiveEntity::Manager, "MGR-012", true),
        )
        .expect_err("contractor still active");
    assert_eq!(err.code(), ErrorCode::Conflict);
}
