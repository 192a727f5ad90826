//! Settable resource counts.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::entitlement::CappedResource;
use crate::domain::foundation::{DomainError, TenantId};
use crate::ports::ResourceCounter;

/// Counts set explicitly by the owner. Unknown pairs count as zero.
#[derive(Debug, Default)]
pub struct InMemoryResourceCounter {
    counts: RwLock<HashMap<(TenantId, CappedResource), u32>>,
}

impl InMemoryResourceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, tenant: TenantId, resource: CappedResource, count: u32) {
        self.counts.write().await.insert((tenant, resource), count);
    }
}

#[async_trait]
impl ResourceCounter for InMemoryResourceCounter {
    async fn current_count(
        &self,
        tenant: &TenantId,
        resource: CappedResource,
    ) -> Result<u32, DomainError> {
        Ok(self
            .counts
            .read()
            .await
            .get(&(*tenant, resource))
            .copied()
            .unwrap_or(0))
    }
}
