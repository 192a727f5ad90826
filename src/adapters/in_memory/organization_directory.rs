//! In-memory organization directory.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::entitlement::Organization;
use crate::domain::foundation::{DomainError, ErrorCode, OrganizationId, TenantId};
use crate::ports::OrganizationReader;

#[derive(Debug, Default)]
struct Directory {
    organizations: HashMap<OrganizationId, Organization>,
    member_of: HashMap<TenantId, OrganizationId>,
}

/// Organizations with a reverse index from member to organization.
#[derive(Debug, Default)]
pub struct InMemoryOrganizationDirectory {
    inner: RwLock<Directory>,
}

fn poisoned() -> DomainError {
    DomainError::new(ErrorCode::InternalError, "Organization directory lock poisoned")
}

impl InMemoryOrganizationDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an organization.
    ///
    /// Fails if any member already belongs to a different organization.
    pub fn insert(&self, organization: Organization) -> Result<(), DomainError> {
        let mut dir = self.inner.write().map_err(|_| poisoned())?;

        if let Some(tenant) = organization.members().find(|t| {
            dir.member_of
                .get(*t)
                .is_some_and(|existing| *existing != organization.id)
        }) {
            return Err(DomainError::new(
                ErrorCode::ValidationFailed,
                format!("Tenant {} already belongs to another organization", tenant),
            )
            .with_detail("field", "members"));
        }

        if let Some(previous) = dir.organizations.remove(&organization.id) {
            for tenant in previous.members() {
                dir.member_of.remove(tenant);
            }
        }
        for tenant in organization.members() {
            dir.member_of.insert(*tenant, organization.id);
        }
        dir.organizations.insert(organization.id, organization);
        Ok(())
    }

    pub fn get(&self, id: &OrganizationId) -> Result<Option<Organization>, DomainError> {
        let dir = self.inner.read().map_err(|_| poisoned())?;
        Ok(dir.organizations.get(id).cloned())
    }
}

#[async_trait]
impl OrganizationReader for InMemoryOrganizationDirectory {
    async fn organization_of(
        &self,
        tenant: &TenantId,
    ) -> Result<Option<OrganizationId>, DomainError> {
        let dir = self.inner.read().map_err(|_| poisoned())?;
        Ok(dir.member_of.get(tenant).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn org(members: &[TenantId]) -> Organization {
        Organization::new(OrganizationId::new(), "Valley Schools", TenantId::new())
            .unwrap()
            .with_members(members.iter().copied())
    }

    #[tokio::test]
    async fn member_resolves_to_organization() {
        let dir = InMemoryOrganizationDirectory::new();
        let school = TenantId::new();
        let valley = org(&[school]);
        let id = valley.id;
        dir.insert(valley).unwrap();

        assert_eq!(dir.organization_of(&school).await.unwrap(), Some(id));
        assert_eq!(dir.organization_of(&TenantId::new()).await.unwrap(), None);
    }

    #[test]
    fn tenant_cannot_join_two_organizations() {
        let dir = InMemoryOrganizationDirectory::new();
        let school = TenantId::new();
        dir.insert(org(&[school])).unwrap();

        let err = dir.insert(org(&[school])).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn replacing_organization_drops_removed_members() {
        let dir = InMemoryOrganizationDirectory::new();
        let (kept, dropped) = (TenantId::new(), TenantId::new());
        let mut valley = org(&[kept, dropped]);
        dir.insert(valley.clone()).unwrap();

        valley.remove_member(&dropped);
        dir.insert(valley).unwrap();

        assert!(dir.organization_of(&kept).await.unwrap().is_some());
        assert!(dir.organization_of(&dropped).await.unwrap().is_none());
    }
}
