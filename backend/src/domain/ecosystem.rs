//! Ownership links between hub entities.
//!
//! A manager owns contractors, customers, and centers; crew hang off an
//! assigned center. Orders and reports copy these links onto their rows so
//! hub listings can filter by column instead of walking the hierarchy.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Role;

/// Entity codes linked to one hub account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EcosystemLinks {
    pub manager_id: Option<String>,
    pub contractor_id: Option<String>,
    pub customer_id: Option<String>,
    pub center_id: Option<String>,
    pub crew_id: Option<String>,
}

impl EcosystemLinks {
    /// Links of an entity that only knows itself.
    ///
    /// # Examples
    /// ```
    /// use cks_backend::domain::{EcosystemLinks, Role};
    ///
    /// let links = EcosystemLinks::of_self(Role::Manager, "MGR-001");
    /// assert_eq!(links.manager_id.as_deref(), Some("MGR-001"));
    /// assert!(links.center_id.is_none());
    /// ```
    #[must_use]
    pub fn of_self(role: Role, code: &str) -> Self {
        let mut links = Self::default();
        links.set_self(role, code);
        links
    }

    /// Record `code` in the column matching `role`; other roles are ignored.
    pub fn set_self(&mut self, role: Role, code: &str) {
        let slot = match role {
            Role::Manager => &mut self.manager_id,
            Role::Contractor => &mut self.contractor_id,
            Role::Customer => &mut self.customer_id,
            Role::Center => &mut self.center_id,
            Role::Crew => &mut self.crew_id,
            Role::Admin | Role::Warehouse => return,
        };
        *slot = Some(code.to_owned());
    }

    /// Links of a crew member.
    ///
    /// An assigned center decides the whole chain, its manager included. The
    /// crew row's own `cks_manager` only counts while no center is assigned.
    ///
    /// # Examples
    /// ```
    /// use cks_backend::domain::EcosystemLinks;
    ///
    /// let center = EcosystemLinks {
    ///     manager_id: Some("MGR-002".to_owned()),
    ///     center_id: Some("CEN-010".to_owned()),
    ///     ..EcosystemLinks::default()
    /// };
    /// let links = EcosystemLinks::for_crew("CRW-004", Some("MGR-001".to_owned()), Some(center));
    /// assert_eq!(links.manager_id.as_deref(), Some("MGR-002"));
    /// ```
    #[must_use]
    pub fn for_crew(code: &str, own_manager: Option<String>, center: Option<Self>) -> Self {
        let mut links = Self::of_self(Role::Crew, code);
        match center {
            Some(center) => links.or(center),
            None => {
                links.manager_id = own_manager;
                links
            }
        }
    }

    /// Fill unset links from `other`.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self {
            manager_id: self.manager_id.or(other.manager_id),
            contractor_id: self.contractor_id.or(other.contractor_id),
            customer_id: self.customer_id.or(other.customer_id),
            center_id: self.center_id.or(other.center_id),
            crew_id: self.crew_id.or(other.crew_id),
        }
    }
}
