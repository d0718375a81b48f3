//! Driving port for archive administration.

use async_trait::async_trait;

use crate::domain::{
    ArchiveEntity, ArchiveOutcome, ArchiveRelationship, ArchivedEntity, Error, Principal,
    PurgeReport, RestoreOutcome,
};

/// Archive, restore, and permanently delete entities.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArchiveCommand: Send + Sync {
    /// Soft-delete an entity.
    async fn archive(
        &self,
        actor: &Principal,
        entity: ArchiveEntity,
        entity_id: &str,
        reason: Option<String>,
    ) -> Result<ArchiveOutcome, Error>;

    /// Undo an archive.
    async fn restore(
        &self,
        actor: &Principal,
        entity: ArchiveEntity,
        entity_id: &str,
    ) -> Result<RestoreOutcome, Error>;

    /// Archived rows, optionally of one kind.
    async fn list_archived(
        &self,
        entity: Option<ArchiveEntity>,
        limit: Option<u32>,
    ) -> Result<Vec<ArchivedEntity>, Error>;

    /// Links recorded for an entity.
    async fn relationships(
        &self,
        entity: ArchiveEntity,
        entity_id: &str,
    ) -> Result<Vec<ArchiveRelationship>, Error>;

    /// Permanently delete an archived entity.
    async fn hard_delete(
        &self,
        actor: &Principal,
        entity: ArchiveEntity,
        entity_id: &str,
        confirm: bool,
    ) -> Result<(), Error>;

    /// Delete everything past its scheduled deletion date.
    async fn purge_expired(&self, actor: &Principal) -> Result<PurgeReport, Error>;
}

/// Fixture used when no database is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureArchive;

fn unavailable() -> Error {
    Error::service_unavailable("archive storage is not configured")
}

#[async_trait]
impl ArchiveCommand for FixtureArchive {
    async fn archive(
        &self,
        _actor: &Principal,
        _entity: ArchiveEntity,
        _entity_id: &str,
        _reason: Option<String>,
    ) -> Result<ArchiveOutcome, Error> {
        Err(unavailable())
    }

    async fn restore(
        &self,
        _actor: &Principal,
        _entity: ArchiveEntity,
        _entity_id: &str,
    ) -> Result<RestoreOutcome, Error> {
        Err(unavailable())
    }

    async fn list_archived(
        &self,
        _entity: Option<ArchiveEntity>,
        _limit: Option<u32>,
    ) -> Result<Vec<ArchivedEntity>, Error> {
        Ok(Vec::new())
    }

    async fn relationships(
        &self,
        _entity: ArchiveEntity,
        _entity_id: &str,
    ) -> Result<Vec<ArchiveRelationship>, Error> {
        Ok(Vec::new())
    }

    async fn hard_delete(
        &self,
        _actor: &Principal,
        _entity: ArchiveEntity,
        _entity_id: &str,
        _confirm: bool,
    ) -> Result<(), Error> {
        Err(unavailable())
    }

    async fn purge_expired(&self, _actor: &Principal) -> Result<PurgeReport, Error> {
        Ok(PurgeReport { deleted: 0 })
    }
}
