//! Resource counter port.
//!
//! Hard caps are checked against live counts owned by other parts of the
//! product (open job postings, user seats). The gate never counts anything
//! itself; it asks through this port, and only when the cap is finite.

use async_trait::async_trait;

use crate::domain::entitlement::CappedResource;
use crate::domain::foundation::{DomainError, TenantId};

#[async_trait]
pub trait ResourceCounter: Send + Sync {
    /// Current number of `resource` held by the tenant.
    async fn current_count(
        &self,
        tenant: &TenantId,
        resource: CappedResource,
    ) -> Result<u32, DomainError>;
}
