//! Organization membership port.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, OrganizationId, TenantId};

/// Looks up which organization a tenant belongs to.
#[async_trait]
pub trait OrganizationReader: Send + Sync {
    /// Returns the tenant's organization, or `None` for standalone tenants.
    ///
    /// A tenant belongs to at most one organization.
    async fn organization_of(&self, tenant: &TenantId)
        -> Result<Option<OrganizationId>, DomainError>;
}
