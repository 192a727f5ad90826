//! PostgreSQL implementation of OrganizationReader.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, OrganizationId, TenantId};
use crate::ports::OrganizationReader;

pub struct PostgresOrganizationReader {
    pool: PgPool,
}

impl PostgresOrganizationReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrganizationReader for PostgresOrganizationReader {
    async fn organization_of(
        &self,
        tenant: &TenantId,
    ) -> Result<Option<OrganizationId>, DomainError> {
        let id: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT organization_id
            FROM organization_members
            WHERE tenant_id = $1
            "#,
        )
        .bind(tenant.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to fetch organization membership", e))?;

        Ok(id.map(OrganizationId::from_uuid))
    }
}
