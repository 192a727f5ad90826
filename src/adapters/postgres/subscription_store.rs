//! PostgreSQL subscription store.
//!
//! One row per subject. Partial unique indexes on `tenant_id` and
//! `organization_id` back the upsert, so the conflict target depends on the
//! subject kind.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entitlement::{Subscription, SubscriptionStatus, SubscriptionSubject};
use crate::domain::foundation::{
    DomainError, ErrorCode, OrganizationId, SubscriptionId, TenantId, Timestamp,
};
use crate::ports::{SubscriptionReader, SubscriptionRepository};

/// PostgreSQL implementation of the subscription ports.
pub struct PostgresSubscriptionStore {
    pool: PgPool,
}

impl PostgresSubscriptionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    tenant_id: Option<Uuid>,
    organization_id: Option<Uuid>,
    plan_name: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    status: String,
    payment_reference: Option<String>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let subject = match (row.tenant_id, row.organization_id) {
            (Some(tenant), None) => SubscriptionSubject::Tenant(TenantId::from_uuid(tenant)),
            (None, Some(org)) => SubscriptionSubject::Organization(OrganizationId::from_uuid(org)),
            _ => {
                return Err(DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Subscription {} must have exactly one subject", row.id),
                ))
            }
        };
        let status: SubscriptionStatus = row.status.parse().map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid status value: {}", e),
            )
        })?;

        Ok(Subscription {
            id: SubscriptionId::from_uuid(row.id),
            subject,
            plan_name: row.plan_name,
            start_date: Timestamp::from_datetime(row.start_date),
            end_date: Timestamp::from_datetime(row.end_date),
            status,
            payment_reference: row.payment_reference,
        })
    }
}

fn subject_columns(subject: &SubscriptionSubject) -> (Option<Uuid>, Option<Uuid>) {
    match subject {
        SubscriptionSubject::Tenant(tenant) => (Some(*tenant.as_uuid()), None),
        SubscriptionSubject::Organization(org) => (None, Some(*org.as_uuid())),
    }
}

fn upsert_sql(subject: &SubscriptionSubject) -> String {
    let conflict = match subject {
        SubscriptionSubject::Tenant(_) => "(tenant_id) WHERE tenant_id IS NOT NULL",
        SubscriptionSubject::Organization(_) => {
            "(organization_id) WHERE organization_id IS NOT NULL"
        }
    };
    format!(
        r#"
        INSERT INTO subscriptions (
            id, tenant_id, organization_id, plan_name,
            start_date, end_date, status, payment_reference, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
        ON CONFLICT {conflict} DO UPDATE SET
            id = EXCLUDED.id,
            plan_name = EXCLUDED.plan_name,
            start_date = EXCLUDED.start_date,
            end_date = EXCLUDED.end_date,
            status = EXCLUDED.status,
            payment_reference = EXCLUDED.payment_reference,
            updated_at = NOW()
        "#
    )
}

#[async_trait]
impl SubscriptionReader for PostgresSubscriptionStore {
    async fn find_by_subject(
        &self,
        subject: &SubscriptionSubject,
    ) -> Result<Option<Subscription>, DomainError> {
        let (sql, key) = match subject {
            SubscriptionSubject::Tenant(tenant) => (
                r#"
                SELECT id, tenant_id, organization_id, plan_name,
                       start_date, end_date, status, payment_reference
                FROM subscriptions
                WHERE tenant_id = $1
                "#,
                *tenant.as_uuid(),
            ),
            SubscriptionSubject::Organization(org) => (
                r#"
                SELECT id, tenant_id, organization_id, plan_name,
                       start_date, end_date, status, payment_reference
                FROM subscriptions
                WHERE organization_id = $1
                "#,
                *org.as_uuid(),
            ),
        };

        let row: Option<SubscriptionRow> = sqlx::query_as(sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to fetch subscription", e))?;

        row.map(Subscription::try_from).transpose()
    }
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionStore {
    async fn upsert(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let (tenant_id, organization_id) = subject_columns(&subscription.subject);

        sqlx::query(&upsert_sql(&subscription.subject))
            .bind(subscription.id.as_uuid())
            .bind(tenant_id)
            .bind(organization_id)
            .bind(&subscription.plan_name)
            .bind(subscription.start_date.as_datetime())
            .bind(subscription.end_date.as_datetime())
            .bind(subscription.status.as_str())
            .bind(&subscription.payment_reference)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to upsert subscription", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(tenant_id: Option<Uuid>, organization_id: Option<Uuid>, status: &str) -> SubscriptionRow {
        let start = Utc::now();
        SubscriptionRow {
            id: Uuid::new_v4(),
            tenant_id,
            organization_id,
            plan_name: "Premium".to_string(),
            start_date: start,
            end_date: start + chrono::Duration::days(30),
            status: status.to_string(),
            payment_reference: None,
        }
    }

    #[test]
    fn tenant_row_maps_to_tenant_subject() {
        let tenant = Uuid::new_v4();
        let sub = Subscription::try_from(row(Some(tenant), None, "active")).unwrap();
        assert_eq!(sub.subject, SubscriptionSubject::Tenant(TenantId::from_uuid(tenant)));
        assert_eq!(sub.status, SubscriptionStatus::Active);
    }

    #[test]
    fn row_with_both_subjects_is_rejected() {
        let err = Subscription::try_from(row(Some(Uuid::new_v4()), Some(Uuid::new_v4()), "active"))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(Subscription::try_from(row(Some(Uuid::new_v4()), None, "paused")).is_err());
    }

    #[test]
    fn upsert_targets_subject_index() {
        let sql = upsert_sql(&SubscriptionSubject::Organization(OrganizationId::new()));
        assert!(sql.contains("ON CONFLICT (organization_id) WHERE organization_id IS NOT NULL"));
    }
}
