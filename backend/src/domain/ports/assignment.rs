//! Ports for moving accounts between parents.

use async_trait::async_trait;

use crate::domain::{
    ActivityDraft, AssignmentChange, AssignmentOutcome, AssignmentRequest, AssignmentResult,
    Error, Principal,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by assignment repository adapters.
    pub enum AssignmentRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "assignment repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "assignment repository query failed: {message}",
    }
}

/// Parent column storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Rewrite the parent column and insert `activity` in one transaction.
    /// The adapter adds `previousParentId` to the activity metadata and
    /// writes nothing when the link is already in place.
    async fn assign(
        &self,
        change: &AssignmentChange,
        activity: &ActivityDraft,
    ) -> Result<AssignmentResult, AssignmentRepositoryError>;
}

/// Hierarchy administration for handlers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssignmentCommand: Send + Sync {
    /// Assign an entity to a parent, or detach it.
    async fn assign(
        &self,
        actor: &Principal,
        request: AssignmentRequest,
    ) -> Result<AssignmentOutcome, Error>;
}

/// Fixture used when no database is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAssignments;

#[async_trait]
impl AssignmentCommand for FixtureAssignments {
    async fn assign(
        &self,
        _actor: &Principal,
        _request: AssignmentRequest,
    ) -> Result<AssignmentOutcome, Error> {
        Err(Error::service_unavailable("directory storage is not configured"))
    }
}
