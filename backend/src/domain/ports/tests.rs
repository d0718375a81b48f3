//! Behaviour of the fixture ports used for database-less startup.

use super::*;
use crate::domain::{BearerToken, ErrorCode, Principal, Role};
use rstest::rstest;

#[rstest]
#[tokio::test]
async fn fixture_directory_resolves_only_self_links() {
    let links = FixtureDirectory
        .resolve(Role::Center, "CEN-010")
        .await
        .expect("resolved");
    assert_eq!(links.center_id.as_deref(), Some("CEN-010"));
    assert_eq!(links.manager_id, None);
    assert_eq!(
        FixtureDirectory.find_admin("user_1").await.expect("lookup"),
        None
    );
}

#[rstest]
#[tokio::test]
async fn fixture_authenticator_rejects_tokens() {
    let token = BearerToken::new("abc").expect("token");
    let error = FixtureAuthenticator
        .authenticate(&token)
        .await
        .expect_err("rejected");
    assert_eq!(error.code(), ErrorCode::Unauthorized);
}

#[rstest]
#[tokio::test]
async fn fixture_verifier_rejects_tokens() {
    let error = FixtureIdentityVerifier
        .verify(&BearerToken::new("abc").expect("token"))
        .await
        .expect_err("rejected");
    assert!(matches!(error, IdentityVerifierError::Rejected { .. }));
}

#[rstest]
#[tokio::test]
async fn fixture_reports_list_nothing() {
    let hub = FixtureReports
        .hub_reports(&Principal::hub(Role::Crew, "CRW-004"))
        .await
        .expect("listed");
    assert!(hub.reports.is_empty() && hub.feedback.is_empty());
    assert_eq!(hub.cks_code.as_deref(), Some("CRW-004"));
}

#[rstest]
#[tokio::test]
async fn fixture_archive_is_unavailable_for_writes() {
    let purged = FixtureArchive
        .purge_expired(&Principal::admin(None))
        .await
        .expect("nothing to purge");
    assert_eq!(purged.deleted, 0);
    let error = FixtureArchive
        .hard_delete(
            &Principal::admin(None),
            crate::domain::ArchiveEntity::Crew,
            "CRW-004",
            true,
        )
        .await
        .expect_err("unavailable");
    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
}

#[rstest]
#[tokio::test]
async fn fixture_session_revalidation_fails() {
    let error = FixtureAuthenticator
        .revalidate(&Principal::hub(Role::Center, "CEN-010"))
        .await
        .expect_err("no directory");
    assert_eq!(error.code(), ErrorCode::Unauthorized);
}

#[rstest]
#[tokio::test]
async fn fixture_assignments_are_unavailable() {
    let error = FixtureAssignments
        .assign(
            &Principal::admin(None),
            crate::domain::AssignmentRequest {
                entity_type: crate::domain::ArchiveEntity::Crew,
                entity_id: "CRW-004".to_owned(),
                parent_id: Some("CEN-010".to_owned()),
            },
        )
        .await
        .expect_err("unavailable");
    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
}

#[rstest]
#[tokio::test]
async fn fixture_catalog_is_empty() {
    let catalog = FixtureInventory.catalog().await.expect("catalog");
    assert!(catalog.products.is_empty() && catalog.services.is_empty());
}

#[rstest]
fn port_errors_render_messages() {
    let error = OrderRepositoryError::conflict("status moved");
    assert_eq!(
        error.to_string(),
        "order repository conflict: status moved".to_owned()
    );
}
