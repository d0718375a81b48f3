//! Hierarchy assignments against PostgreSQL.
//!
//! Requires `TEST_DATABASE_URL`; prints `SKIP-TEST-DB` and passes otherwise.

use std::sync::Arc;

use cks_backend::domain::ports::AssignmentCommand;
use cks_backend::domain::{
    ArchiveEntity, AssignmentRequest, AssignmentService, ErrorCode, Principal,
};
use cks_backend::outbound::persistence::DieselAssignmentRepository;
use mockable::DefaultClock;
use rstest::rstest;
use tokio::runtime::Runtime;

mod support;

use support::{ECOSYSTEM_SQL, pool, provision_database, query_i64, seed};

struct TestContext {
    runtime: Runtime,
    url: String,
    service: AssignmentService<DieselAssignmentRepository>,
}

fn setup(name: &str) -> Option<TestContext> {
    let url = match provision_database(name) {
        Ok(Some(url)) => url,
        Ok(None) => return None,
        Err(reason) => panic!("test database setup failed: {reason}"),
    };
    seed(&url, ECOSYSTEM_SQL).expect("seed ecosystem");
    seed(
        &url,
        "INSERT INTO centers (center_id, cks_manager, contractor_id, customer_id, name) \
         VALUES ('CEN-011', 'MGR-012', 'CON-003', 'CUS-007', 'Harbour South'); \
         INSERT INTO centers (center_id, name, archived_at) \
         VALUES ('CEN-012', 'Closed site', now());",
    )
    .expect("seed centers");
    let runtime = Runtime::new().expect("runtime");
    let pool = pool(&runtime, &url).expect("pool");
    let service = AssignmentService::new(
        Arc::new(DieselAssignmentRepository::new(pool)),
        Arc::new(DefaultClock),
    );
    Some(TestContext {
        runtime,
        url,
        service,
    })
}

fn crew_to(parent: Option<&str>) -> AssignmentRequest {
    AssignmentRequest {
        entity_type: ArchiveEntity::Crew,
        entity_id: "CRW-004".to_owned(),
        parent_id: parent.map(str::to_owned),
    }
}

fn admin() -> Principal {
    Principal::admin(Some("ADM-001"))
}

#[rstest]
fn moving_crew_rewrites_the_column_and_logs_once() {
    let Some(ctx) = setup("cks_assign_move") else {
        return;
    };
    let (moved, repeated) = ctx.runtime.block_on(async {
        let moved = ctx
            .service
            .assign(&admin(), crew_to(Some("cen-011")))
            .await
            .expect("move crew");
        let repeated = ctx
            .service
            .assign(&admin(), crew_to(Some("CEN-011")))
            .await
            .expect("repeat move");
        (moved, repeated)
    });

    assert!(moved.changed);
    assert_eq!(moved.previous_parent_id.as_deref(), Some("CEN-010"));
    assert!(!repeated.changed);
    let assigned = query_i64(
        &ctx.url,
        "SELECT count(*) FROM crew WHERE crew_id = 'CRW-004' AND assigned_center = 'CEN-011'",
    )
    .expect("crew row");
    assert_eq!(assigned, 1);
    let logged = query_i64(
        &ctx.url,
        "SELECT count(*) FROM system_activity WHERE activity_type = 'crew_assigned' \
         AND target_id = 'CRW-004' AND actor_id = 'ADM-001' \
         AND metadata->>'parentId' = 'CEN-011' AND metadata->>'previousParentId' = 'CEN-010'",
    )
    .expect("activity rows");
    assert_eq!(logged, 1);
}

#[rstest]
fn detaching_clears_the_parent() {
    let Some(ctx) = setup("cks_assign_detach") else {
        return;
    };
    let outcome = ctx
        .runtime
        .block_on(ctx.service.assign(
            &admin(),
            AssignmentRequest {
                entity_type: ArchiveEntity::Contractor,
                entity_id: "CON-003".to_owned(),
                parent_id: None,
            },
        ))
        .expect("detach contractor");
    assert_eq!(outcome.previous_parent_id.as_deref(), Some("MGR-012"));
    let detached = query_i64(
        &ctx.url,
        "SELECT count(*) FROM contractors WHERE contractor_id = 'CON-003' AND cks_manager IS NULL",
    )
    .expect("contractor row");
    assert_eq!(detached, 1);
    let logged = query_i64(
        &ctx.url,
        "SELECT count(*) FROM system_activity WHERE activity_type = 'contractor_unassigned'",
    )
    .expect("activity rows");
    assert_eq!(logged, 1);
}

#[rstest]
#[case(Some("CEN-012"))]
#[case(Some("CEN-404"))]
fn archived_or_missing_parents_change_nothing(#[case] parent: Option<&str>) {
    let name = format!(
        "cks_assign_missing_{}",
        parent.unwrap_or_default().to_ascii_lowercase().replace('-', "_")
    );
    let Some(ctx) = setup(&name) else {
        return;
    };
    let error = ctx
        .runtime
        .block_on(ctx.service.assign(&admin(), crew_to(parent)))
        .expect_err("parent unavailable");
    assert_eq!(error.code(), ErrorCode::NotFound);

    let unchanged = query_i64(
        &ctx.url,
        "SELECT count(*) FROM crew WHERE crew_id = 'CRW-004' AND assigned_center = 'CEN-010'",
    )
    .expect("crew row");
    assert_eq!(unchanged, 1);
    let logged = query_i64(&ctx.url, "SELECT count(*) FROM system_activity").expect("activity");
    assert_eq!(logged, 0);
}
