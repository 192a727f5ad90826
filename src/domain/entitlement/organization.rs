//! Organization of tenants sharing an umbrella subscription.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::foundation::{OrganizationId, TenantId, ValidationError};

/// A group of schools owned by one group administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
    pub owner: TenantId,
    members: BTreeSet<TenantId>,
}

impl Organization {
    pub fn new(
        id: OrganizationId,
        name: impl Into<String>,
        owner: TenantId,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        Ok(Self {
            id,
            name,
            owner,
            members: BTreeSet::new(),
        })
    }

    pub fn with_members(mut self, members: impl IntoIterator<Item = TenantId>) -> Self {
        self.members.extend(members);
        self
    }

    /// Returns false if the tenant was already a member.
    pub fn add_member(&mut self, tenant: TenantId) -> bool {
        self.members.insert(tenant)
    }

    pub fn remove_member(&mut self, tenant: &TenantId) -> bool {
        self.members.remove(tenant)
    }

    pub fn is_member(&self, tenant: &TenantId) -> bool {
        self.members.contains(tenant)
    }

    pub fn members(&self) -> impl Iterator<Item = &TenantId> {
        self.members.iter()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_empty_name() {
        assert!(Organization::new(OrganizationId::new(), " ", TenantId::new()).is_err());
    }

    #[test]
    fn membership_is_a_set() {
        let mut org = Organization::new(OrganizationId::new(), "Valley Schools", TenantId::new())
            .unwrap();
        let school = TenantId::new();

        assert!(org.add_member(school));
        assert!(!org.add_member(school));
        assert_eq!(org.member_count(), 1);
        assert!(org.is_member(&school));

        assert!(org.remove_member(&school));
        assert!(!org.is_member(&school));
    }

    #[test]
    fn owner_is_not_implicitly_a_member() {
        let owner = TenantId::new();
        let org = Organization::new(OrganizationId::new(), "Valley Schools", owner).unwrap();
        assert!(!org.is_member(&owner));
    }
}
