//! Archive service over an [`ArchiveRepository`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};

use super::{
    ArchiveEntity, ArchiveOutcome, ArchiveRecord, ArchiveRelationship, ArchivedEntity,
    DEFAULT_ARCHIVE_LIMIT, DEFAULT_ARCHIVE_REASON, HardDeleteOutcome, MAX_ARCHIVE_LIMIT,
    PurgeReport, RETENTION_DAYS, RestoreOutcome,
};
use crate::domain::ports::{ArchiveCommand, ArchiveRepository, ArchiveRepositoryError};
use crate::domain::{ActivityDraft, Error, Principal, deletion_activity_type, normalize_identity};

fn map_archive_error(error: ArchiveRepositoryError) -> Error {
    match error {
        ArchiveRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("archive repository unavailable: {message}"))
        }
        ArchiveRepositoryError::Query { message } => {
            Error::internal(format!("archive repository error: {message}"))
        }
    }
}

fn normalise_id(raw: &str) -> Result<String, Error> {
    normalize_identity(Some(raw)).ok_or_else(|| Error::invalid_request("Invalid entity ID"))
}

fn deletion_draft(actor: &Principal, entity: ArchiveEntity, id: &str, reason: &str) -> ActivityDraft {
    ActivityDraft::new(
        deletion_activity_type(entity.as_str()),
        format!("Permanently deleted {entity} {id}"),
        actor.actor_id(),
        actor.role().as_str(),
    )
    .with_target(id, entity.as_str())
    .with_metadata(json!({ "reason": reason }))
}

/// Soft-delete administration.
#[derive(Clone)]
pub struct ArchiveService<R> {
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> ArchiveService<R> {
    /// Create the service.
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }
}

#[async_trait]
impl<R> ArchiveCommand for ArchiveService<R>
where
    R: ArchiveRepository,
{
    async fn archive(
        &self,
        actor: &Principal,
        entity: ArchiveEntity,
        entity_id: &str,
        reason: Option<String>,
    ) -> Result<ArchiveOutcome, Error> {
        let id = normalise_id(entity_id)?;
        let reason = reason
            .map(|r| r.trim().to_owned())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_ARCHIVE_REASON.to_owned());
        let now = self.clock.utc();
        let record = ArchiveRecord {
            entity,
            entity_id: id.clone(),
            archived_by: actor.actor_id(),
            reason: reason.clone(),
            archived_at: now,
            deletion_scheduled: now + Duration::days(RETENTION_DAYS),
        };
        let activity = ActivityDraft::new(
            format!("{entity}_archived"),
            format!("Archived {entity} {id}"),
            actor.actor_id(),
            actor.role().as_str(),
        )
        .with_target(id.clone(), entity.as_str())
        .with_metadata(json!({ "reason": reason }));

        let receipt = self
            .repo
            .archive(&record, &activity)
            .await
            .map_err(map_archive_error)?
            .ok_or_else(|| {
                Error::not_found(format!("{entity} {id} not found or already archived"))
            })?;
        info!(
            entity = %entity,
            entity_id = %id,
            unassigned = receipt.unassigned_children.len(),
            "entity archived"
        );
        Ok(ArchiveOutcome {
            entity_type: entity,
            entity_id: id,
            archived_at: record.archived_at,
            deletion_scheduled: record.deletion_scheduled,
            reason,
            unassigned_children: receipt.unassigned_children.len(),
        })
    }

    async fn restore(
        &self,
        actor: &Principal,
        entity: ArchiveEntity,
        entity_id: &str,
    ) -> Result<RestoreOutcome, Error> {
        let id = normalise_id(entity_id)?;
        let now = self.clock.utc();
        let restored_by = actor.actor_id();
        let activity = ActivityDraft::new(
            format!("{entity}_restored"),
            format!("Restored {entity} {id}"),
            restored_by.clone(),
            actor.role().as_str(),
        )
        .with_target(id.clone(), entity.as_str());

        let restored = self
            .repo
            .restore(entity, &id, &restored_by, now, &activity)
            .await
            .map_err(map_archive_error)?;
        if !restored {
            return Err(Error::not_found(format!("{entity} {id} is not archived")));
        }
        Ok(RestoreOutcome {
            entity_type: entity,
            entity_id: id,
            restored_at: now,
            restored_by,
        })
    }

    async fn list_archived(
        &self,
        entity: Option<ArchiveEntity>,
        limit: Option<u32>,
    ) -> Result<Vec<ArchivedEntity>, Error> {
        let limit = limit
            .unwrap_or(DEFAULT_ARCHIVE_LIMIT)
            .clamp(1, MAX_ARCHIVE_LIMIT);
        self.repo
            .list_archived(entity, limit)
            .await
            .map_err(map_archive_error)
    }

    async fn relationships(
        &self,
        entity: ArchiveEntity,
        entity_id: &str,
    ) -> Result<Vec<ArchiveRelationship>, Error> {
        let id = normalise_id(entity_id)?;
        self.repo
            .relationships(entity, &id)
            .await
            .map_err(map_archive_error)
    }

    async fn hard_delete(
        &self,
        actor: &Principal,
        entity: ArchiveEntity,
        entity_id: &str,
        confirm: bool,
    ) -> Result<(), Error> {
        if !confirm {
            return Err(Error::invalid_request(
                "Hard delete requires explicit confirmation",
            ));
        }
        let id = normalise_id(entity_id)?;
        let activity = deletion_draft(actor, entity, &id, "Manual hard delete");
        match self
            .repo
            .hard_delete(entity, &id, &activity)
            .await
            .map_err(map_archive_error)?
        {
            HardDeleteOutcome::Deleted => {
                info!(entity = %entity, entity_id = %id, "entity permanently deleted");
                Ok(())
            }
            HardDeleteOutcome::NotFound => {
                Err(Error::not_found(format!("{entity} {id} not found")))
            }
            HardDeleteOutcome::NotArchived => Err(Error::conflict(
                "Entity must be archived before hard deletion",
            )),
            HardDeleteOutcome::ActiveChildren(count) => Err(Error::conflict(format!(
                "Cannot hard delete: entity has {count} active children"
            ))
            .with_details(json!({ "activeChildren": count }))),
        }
    }

    async fn purge_expired(&self, actor: &Principal) -> Result<PurgeReport, Error> {
        let expired = self
            .repo
            .expired(self.clock.utc())
            .await
            .map_err(map_archive_error)?;
        let mut deleted = 0;
        for row in expired {
            let activity =
                deletion_draft(actor, row.entity_type, &row.entity_id, "Scheduled deletion");
            match self
                .repo
                .hard_delete(row.entity_type, &row.entity_id, &activity)
                .await
                .map_err(map_archive_error)?
            {
                HardDeleteOutcome::Deleted => deleted += 1,
                HardDeleteOutcome::ActiveChildren(count) => warn!(
                    entity = %row.entity_type,
                    entity_id = %row.entity_id,
                    count,
                    "skipping scheduled deletion with active children"
                ),
                HardDeleteOutcome::NotFound | HardDeleteOutcome::NotArchived => {}
            }
        }
        info!(deleted, "purged expired archives");
        Ok(PurgeReport { deleted })
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
