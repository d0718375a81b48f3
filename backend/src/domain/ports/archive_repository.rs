//! Port for soft-delete bookkeeping across the entity tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    ActivityDraft, ArchiveEntity, ArchiveReceipt, ArchiveRecord, ArchiveRelationship,
    ArchivedEntity, HardDeleteOutcome,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by archive repository adapters.
    pub enum ArchiveRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "archive repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "archive repository query failed: {message}",
    }
}

/// Archive storage.
///
/// Mutations run in one transaction together with their activity row.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArchiveRepository: Send + Sync {
    /// Archive an active entity, recording relationships and detaching
    /// children. The adapter adds `unassignedChildren` to the activity
    /// metadata. `None` when the entity is missing or already archived.
    async fn archive(
        &self,
        record: &ArchiveRecord,
        activity: &ActivityDraft,
    ) -> Result<Option<ArchiveReceipt>, ArchiveRepositoryError>;

    /// Clear the archive columns and mark relationships restored. `false`
    /// when the entity is not archived.
    async fn restore(
        &self,
        entity: ArchiveEntity,
        entity_id: &str,
        restored_by: &str,
        restored_at: DateTime<Utc>,
        activity: &ActivityDraft,
    ) -> Result<bool, ArchiveRepositoryError>;

    /// Archived rows, newest first.
    async fn list_archived(
        &self,
        entity: Option<ArchiveEntity>,
        limit: u32,
    ) -> Result<Vec<ArchivedEntity>, ArchiveRepositoryError>;

    /// Relationships where the entity is either side.
    async fn relationships(
        &self,
        entity: ArchiveEntity,
        entity_id: &str,
    ) -> Result<Vec<ArchiveRelationship>, ArchiveRepositoryError>;

    /// Delete an archived entity without active children. On success the
    /// adapter stores the deleted row under `snapshot` in the activity
    /// metadata and removes its relationships.
    async fn hard_delete(
        &self,
        entity: ArchiveEntity,
        entity_id: &str,
        activity: &ActivityDraft,
    ) -> Result<HardDeleteOutcome, ArchiveRepositoryError>;

    /// Archived rows whose deletion date is before `now`.
    async fn expired(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ArchivedEntity>, ArchiveRepositoryError>;
}
