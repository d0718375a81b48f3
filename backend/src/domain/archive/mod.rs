//! Soft delete, restore, and scheduled hard delete.
//!
//! Archiving stamps `archived_at` on the entity row, detaches its active
//! children, and records both links in `archive_relationships` so a later
//! restore can show what used to hang off the entity. Archived rows become
//! eligible for permanent deletion [`RETENTION_DAYS`] after archiving.

mod service;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

pub use service::ArchiveService;

/// Days between archiving and scheduled permanent deletion.
pub const RETENTION_DAYS: i64 = 30;
/// Reason recorded when the caller gives none.
pub const DEFAULT_ARCHIVE_REASON: &str = "Manual archive";
/// Default page size for archived listings.
pub const DEFAULT_ARCHIVE_LIMIT: u32 = 100;
/// Largest accepted page size for archived listings.
pub const MAX_ARCHIVE_LIMIT: u32 = 500;

/// Entity kinds that can be archived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveEntity {
    Manager,
    Contractor,
    Customer,
    Center,
    Crew,
    Warehouse,
    Order,
    Report,
    Feedback,
}

/// Foreign-key link between an entity table and its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation {
    /// Kind on the other side of the link.
    pub entity: ArchiveEntity,
    /// Column on the child table holding the parent id.
    pub column: &'static str,
}

/// Raised for entity names outside [`ArchiveEntity::ALL`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown entity type: {0}")]
pub struct UnknownArchiveEntity(pub String);

impl ArchiveEntity {
    /// Every archivable kind, parents before children.
    pub const ALL: [Self; 9] = [
        Self::Manager,
        Self::Contractor,
        Self::Customer,
        Self::Center,
        Self::Crew,
        Self::Warehouse,
        Self::Order,
        Self::Report,
        Self::Feedback,
    ];

    /// Lower-case name used in paths and activity types.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Manager => "manager",
            Self::Contractor => "contractor",
            Self::Customer => "customer",
            Self::Center => "center",
            Self::Crew => "crew",
            Self::Warehouse => "warehouse",
            Self::Order => "order",
            Self::Report => "report",
            Self::Feedback => "feedback",
        }
    }

    /// Backing table.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Manager => "managers",
            Self::Contractor => "contractors",
            Self::Customer => "customers",
            Self::Center => "centers",
            Self::Crew => "crew",
            Self::Warehouse => "warehouses",
            Self::Order => "orders",
            Self::Report => "reports",
            Self::Feedback => "feedback",
        }
    }

    /// Primary key column.
    #[must_use]
    pub const fn id_column(self) -> &'static str {
        match self {
            Self::Manager => "manager_id",
            Self::Contractor => "contractor_id",
            Self::Customer => "customer_id",
            Self::Center => "center_id",
            Self::Crew => "crew_id",
            Self::Warehouse => "warehouse_id",
            Self::Order => "order_id",
            Self::Report => "report_id",
            Self::Feedback => "feedback_id",
        }
    }

    /// Column shown as the display name in archive listings.
    #[must_use]
    pub const fn name_column(self) -> &'static str {
        match self {
            Self::Order | Self::Report | Self::Feedback => "title",
            _ => "name",
        }
    }

    /// Child kind detached when this entity is archived.
    #[must_use]
    pub const fn child(self) -> Option<Relation> {
        match self {
            Self::Manager => Some(Relation {
                entity: Self::Contractor,
                column: "cks_manager",
            }),
            Self::Contractor => Some(Relation {
                entity: Self::Customer,
                column: "contractor_id",
            }),
            Self::Customer => Some(Relation {
                entity: Self::Center,
                column: "customer_id",
            }),
            Self::Center => Some(Relation {
                entity: Self::Crew,
                column: "assigned_center",
            }),
            _ => None,
        }
    }

    /// Parent kind and the column on this entity's table that points at it.
    #[must_use]
    pub const fn parent(self) -> Option<Relation> {
        match self {
            Self::Contractor => Some(Relation {
                entity: Self::Manager,
                column: "cks_manager",
            }),
            Self::Customer => Some(Relation {
                entity: Self::Contractor,
                column: "contractor_id",
            }),
            Self::Center => Some(Relation {
                entity: Self::Customer,
                column: "customer_id",
            }),
            Self::Crew => Some(Relation {
                entity: Self::Center,
                column: "assigned_center",
            }),
            _ => None,
        }
    }
}

impl fmt::Display for ArchiveEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArchiveEntity {
    type Err = UnknownArchiveEntity;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|entity| entity.as_str() == wanted)
            .ok_or(UnknownArchiveEntity(wanted))
    }
}

/// Archive columns to stamp on an entity row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRecord {
    pub entity: ArchiveEntity,
    pub entity_id: String,
    pub archived_by: String,
    pub reason: String,
    pub archived_at: DateTime<Utc>,
    pub deletion_scheduled: DateTime<Utc>,
}

/// Children detached by an archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveReceipt {
    pub unassigned_children: Vec<String>,
}

/// Result of archiving one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveOutcome {
    pub entity_type: ArchiveEntity,
    pub entity_id: String,
    pub archived_at: DateTime<Utc>,
    pub deletion_scheduled: DateTime<Utc>,
    pub reason: String,
    pub unassigned_children: usize,
}

/// Result of restoring one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RestoreOutcome {
    pub entity_type: ArchiveEntity,
    pub entity_id: String,
    pub restored_at: DateTime<Utc>,
    pub restored_by: String,
}

/// Archived entity as listed for administrators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedEntity {
    pub entity_type: ArchiveEntity,
    pub entity_id: String,
    pub name: String,
    pub archived_at: DateTime<Utc>,
    pub archived_by: Option<String>,
    pub archive_reason: Option<String>,
    pub deletion_scheduled: Option<DateTime<Utc>>,
}

/// Parent link captured at archive time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveRelationship {
    pub entity_type: String,
    pub entity_id: String,
    pub parent_type: String,
    pub parent_id: String,
    #[schema(value_type = Object)]
    pub relationship_data: Value,
    pub archived_by: Option<String>,
    pub archived_at: DateTime<Utc>,
    pub restored: bool,
}

/// What a hard delete found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardDeleteOutcome {
    Deleted,
    NotFound,
    NotArchived,
    ActiveChildren(i64),
}

/// Result of purging entities past their scheduled deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurgeReport {
    pub deleted: u64,
}

/// Confirmation flag for permanent deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HardDeleteRequest {
    #[serde(default)]
    pub confirm: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(" Center ", ArchiveEntity::Center)]
    #[case("crew", ArchiveEntity::Crew)]
    #[case("FEEDBACK", ArchiveEntity::Feedback)]
    fn entity_names_parse(#[case] raw: &str, #[case] expected: ArchiveEntity) {
        assert_eq!(raw.parse::<ArchiveEntity>(), Ok(expected));
    }

    #[rstest]
    fn plural_names_are_rejected() {
        assert_eq!(
            "centers".parse::<ArchiveEntity>(),
            Err(UnknownArchiveEntity("centers".to_owned()))
        );
    }

    #[rstest]
    fn hierarchy_links_are_symmetric() {
        for entity in ArchiveEntity::ALL {
            if let Some(child) = entity.child() {
                let parent = child.entity.parent().expect("child has a parent");
                assert_eq!(parent.entity, entity);
                assert_eq!(parent.column, child.column);
            }
        }
    }

    #[rstest]
    #[case(ArchiveEntity::Crew, "crew", "crew_id")]
    #[case(ArchiveEntity::Feedback, "feedback", "feedback_id")]
    #[case(ArchiveEntity::Warehouse, "warehouses", "warehouse_id")]
    fn irregular_tables(
        #[case] entity: ArchiveEntity,
        #[case] table: &str,
        #[case] column: &str,
    ) {
        assert_eq!(entity.table(), table);
        assert_eq!(entity.id_column(), column);
    }
}
