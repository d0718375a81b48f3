//! Moving accounts between parents in the hierarchy.
//!
//! Each child kind has one parent column, the same link archiving detaches
//! (see [`ArchiveEntity::parent`]): contractors hang off a manager, customers
//! off a contractor, centers off a customer, and crew off a center.
//! Assigning rewrites that column and logs `{kind}_assigned` or
//! `{kind}_unassigned` in the same transaction.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use utoipa::ToSchema;

use super::archive::Relation;
use super::ports::{AssignmentCommand, AssignmentRepository, AssignmentRepositoryError};
use super::{ActivityDraft, ArchiveEntity, Error, Principal, normalize_identity};

/// Requested parent for one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentRequest {
    pub entity_type: ArchiveEntity,
    pub entity_id: String,
    /// New parent; `None` detaches the entity.
    pub parent_id: Option<String>,
}

/// Parent column rewrite handed to the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentChange {
    pub entity: ArchiveEntity,
    pub entity_id: String,
    pub parent: Relation,
    pub parent_id: Option<String>,
    pub changed_at: DateTime<Utc>,
}

/// What the repository found while applying an [`AssignmentChange`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentResult {
    /// Column rewritten; carries the parent it replaced.
    Assigned { previous_parent_id: Option<String> },
    /// The entity already pointed at the requested parent.
    Unchanged,
    /// No active entity with that id.
    EntityNotFound,
    /// No active parent with that id.
    ParentNotFound,
}

/// Result of an assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentOutcome {
    pub entity_type: ArchiveEntity,
    pub entity_id: String,
    pub parent_type: ArchiveEntity,
    pub parent_id: Option<String>,
    pub previous_parent_id: Option<String>,
    /// `false` when the entity already had this parent.
    pub changed: bool,
    pub changed_at: DateTime<Utc>,
}

fn map_assignment_error(error: AssignmentRepositoryError) -> Error {
    match error {
        AssignmentRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("directory unavailable: {message}"))
        }
        AssignmentRepositoryError::Query { message } => {
            Error::internal(format!("directory error: {message}"))
        }
    }
}

fn assignment_draft(actor: &Principal, change: &AssignmentChange) -> ActivityDraft {
    let entity = change.entity;
    let parent = change.parent.entity;
    let (activity_type, description) = match &change.parent_id {
        Some(parent_id) => (
            format!("{entity}_assigned"),
            format!("Assigned {entity} {} to {parent} {parent_id}", change.entity_id),
        ),
        None => (
            format!("{entity}_unassigned"),
            format!("Unassigned {entity} {} from its {parent}", change.entity_id),
        ),
    };
    ActivityDraft::new(
        activity_type,
        description,
        actor.actor_id(),
        actor.role().as_str(),
    )
    .with_target(change.entity_id.clone(), entity.as_str())
    .with_metadata(json!({
        "parentType": parent.as_str(),
        "parentId": change.parent_id,
    }))
}

/// Hierarchy administration over an [`AssignmentRepository`].
#[derive(Clone)]
pub struct AssignmentService<R> {
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> AssignmentService<R> {
    /// Create the service.
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }
}

#[async_trait]
impl<R> AssignmentCommand for AssignmentService<R>
where
    R: AssignmentRepository,
{
    async fn assign(
        &self,
        actor: &Principal,
        request: AssignmentRequest,
    ) -> Result<AssignmentOutcome, Error> {
        let entity = request.entity_type;
        let parent = entity.parent().ok_or_else(|| {
            Error::invalid_request(format!("{entity} cannot be assigned to a parent"))
                .with_details(json!({ "field": "entityType", "code": "no_parent" }))
        })?;
        let entity_id = normalize_identity(Some(&request.entity_id))
            .ok_or_else(|| Error::invalid_request("Invalid entity ID"))?;
        let parent_id = match request.parent_id.as_deref() {
            Some(raw) => Some(
                normalize_identity(Some(raw))
                    .ok_or_else(|| Error::invalid_request("Invalid parent ID"))?,
            ),
            None => None,
        };
        let change = AssignmentChange {
            entity,
            entity_id,
            parent,
            parent_id,
            changed_at: self.clock.utc(),
        };
        let activity = assignment_draft(actor, &change);

        let result = self
            .repo
            .assign(&change, &activity)
            .await
            .map_err(map_assignment_error)?;
        let (changed, previous_parent_id) = match result {
            AssignmentResult::Assigned { previous_parent_id } => (true, previous_parent_id),
            AssignmentResult::Unchanged => (false, change.parent_id.clone()),
            AssignmentResult::EntityNotFound => {
                return Err(Error::not_found(format!(
                    "{entity} {} not found or archived",
                    change.entity_id
                )));
            }
            AssignmentResult::ParentNotFound => {
                return Err(Error::not_found(format!(
                    "{} {} not found or archived",
                    parent.entity,
                    change.parent_id.as_deref().unwrap_or_default()
                )));
            }
        };
        if changed {
            info!(
                entity = %entity,
                entity_id = %change.entity_id,
                parent = ?change.parent_id,
                previous = ?previous_parent_id,
                "hierarchy link changed"
            );
        }
        Ok(AssignmentOutcome {
            entity_type: entity,
            entity_id: change.entity_id,
            parent_type: parent.entity,
            parent_id: change.parent_id,
            previous_parent_id,
            changed,
            changed_at: change.changed_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockAssignmentRepository;
    use crate::domain::test_support::fixture_clock;
    use crate::domain::{ErrorCode, Role};
    use rstest::rstest;

    fn admin() -> Principal {
        Principal::admin(Some("ADM-001"))
    }

    fn request(entity: ArchiveEntity, id: &str, parent: Option<&str>) -> AssignmentRequest {
        AssignmentRequest {
            entity_type: entity,
            entity_id: id.to_owned(),
            parent_id: parent.map(str::to_owned),
        }
    }

    fn service(repo: MockAssignmentRepository) -> AssignmentService<MockAssignmentRepository> {
        let now = DateTime::<Utc>::from_timestamp(1_760_000_000, 0).expect("valid timestamp");
        AssignmentService::new(Arc::new(repo), fixture_clock(now))
    }

    #[tokio::test]
    async fn crew_move_to_a_new_center() {
        let mut repo = MockAssignmentRepository::new();
        repo.expect_assign()
            .withf(|change, activity| {
                change.entity == ArchiveEntity::Crew
                    && change.entity_id == "CRW-004"
                    && change.parent.column == "assigned_center"
                    && change.parent_id.as_deref() == Some("CEN-011")
                    && activity.activity_type == "crew_assigned"
                    && activity.description == "Assigned crew CRW-004 to center CEN-011"
                    && activity.metadata == json!({ "parentType": "center", "parentId": "CEN-011" })
                    && activity.actor_id == "ADM-001"
            })
            .times(1)
            .return_once(|_, _| {
                Ok(AssignmentResult::Assigned {
                    previous_parent_id: Some("CEN-010".to_owned()),
                })
            });

        let outcome = service(repo)
            .assign(&admin(), request(ArchiveEntity::Crew, " crw-004 ", Some("cen-011")))
            .await
            .expect("assigned");
        assert!(outcome.changed);
        assert_eq!(outcome.parent_type, ArchiveEntity::Center);
        assert_eq!(outcome.previous_parent_id.as_deref(), Some("CEN-010"));
    }

    #[tokio::test]
    async fn missing_parent_detaches() {
        let mut repo = MockAssignmentRepository::new();
        repo.expect_assign()
            .withf(|change, activity| {
                change.parent_id.is_none()
                    && activity.activity_type == "contractor_unassigned"
                    && activity.description == "Unassigned contractor CON-003 from its manager"
            })
            .return_once(|_, _| {
                Ok(AssignmentResult::Assigned {
                    previous_parent_id: Some("MGR-012".to_owned()),
                })
            });

        let outcome = service(repo)
            .assign(&admin(), request(ArchiveEntity::Contractor, "CON-003", None))
            .await
            .expect("unassigned");
        assert_eq!(outcome.parent_id, None);
        assert_eq!(outcome.parent_type, ArchiveEntity::Manager);
    }

    #[tokio::test]
    async fn repeating_an_assignment_reports_no_change() {
        let mut repo = MockAssignmentRepository::new();
        repo.expect_assign()
            .return_once(|_, _| Ok(AssignmentResult::Unchanged));

        let outcome = service(repo)
            .assign(&admin(), request(ArchiveEntity::Center, "CEN-010", Some("CUS-007")))
            .await
            .expect("unchanged");
        assert!(!outcome.changed);
        assert_eq!(outcome.previous_parent_id.as_deref(), Some("CUS-007"));
    }

    #[rstest]
    #[case(ArchiveEntity::Manager)]
    #[case(ArchiveEntity::Warehouse)]
    #[case(ArchiveEntity::Order)]
    #[tokio::test]
    async fn entities_without_a_parent_are_rejected(#[case] entity: ArchiveEntity) {
        let mut repo = MockAssignmentRepository::new();
        repo.expect_assign().never();

        let error = service(repo)
            .assign(&admin(), request(entity, "X-001", Some("MGR-012")))
            .await
            .expect_err("no parent column");
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
        assert_eq!(
            error.details(),
            Some(&json!({ "field": "entityType", "code": "no_parent" }))
        );
    }

    #[rstest]
    #[case(AssignmentResult::EntityNotFound, "crew CRW-004 not found or archived")]
    #[case(AssignmentResult::ParentNotFound, "center CEN-099 not found or archived")]
    #[tokio::test]
    async fn missing_rows_are_not_found(#[case] result: AssignmentResult, #[case] message: &str) {
        let mut repo = MockAssignmentRepository::new();
        repo.expect_assign().return_once(move |_, _| Ok(result));

        let error = service(repo)
            .assign(&admin(), request(ArchiveEntity::Crew, "CRW-004", Some("CEN-099")))
            .await
            .expect_err("not found");
        assert_eq!(error.code(), ErrorCode::NotFound);
        assert_eq!(error.message(), message);
    }

    #[tokio::test]
    async fn blank_ids_are_rejected_before_storage() {
        let mut repo = MockAssignmentRepository::new();
        repo.expect_assign().never();

        let error = service(repo)
            .assign(&admin(), request(ArchiveEntity::Crew, "CRW-004", Some("  ")))
            .await
            .expect_err("blank parent");
        assert_eq!(error.message(), "Invalid parent ID");
    }

    #[tokio::test]
    async fn hub_actors_are_recorded_by_role() {
        let mut repo = MockAssignmentRepository::new();
        repo.expect_assign()
            .withf(|_, activity| activity.actor_id == "MGR-012" && activity.actor_role == "manager")
            .return_once(|_, _| Ok(AssignmentResult::Unchanged));

        service(repo)
            .assign(
                &Principal::hub(Role::Manager, "MGR-012"),
                request(ArchiveEntity::Customer, "CUS-007", Some("CON-003")),
            )
            .await
            .expect("logged");
    }
}
