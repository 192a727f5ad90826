//! PostgreSQL usage ledger.
//!
//! Each operation is one statement. `try_consume` is a conditional upsert:
//! the row is created, reset for a newer window, or has one unit reserved,
//! all inside `INSERT ... ON CONFLICT DO UPDATE ... WHERE`. When the `WHERE`
//! rejects the update no row comes back and the quota is exhausted. Row
//! locking on the conflict target serializes concurrent callers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::entitlement::{
    ConsumeOutcome, MeteredFeature, SettleOutcome, UsageLedgerEntry, UsageReservation,
    UsageSnapshot,
};
use crate::domain::foundation::{TenantId, Timestamp};
use crate::ports::{UsageLedger, UsageLedgerError};

/// PostgreSQL implementation of the UsageLedger port.
pub struct PostgresUsageLedger {
    pool: PgPool,
}

impl PostgresUsageLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a ledger entry.
#[derive(Debug, sqlx::FromRow)]
struct LedgerRow {
    window_start: DateTime<Utc>,
    used: i32,
    reserved: i32,
}

impl LedgerRow {
    fn into_entry(
        self,
        tenant: TenantId,
        feature: MeteredFeature,
    ) -> Result<UsageLedgerEntry, UsageLedgerError> {
        Ok(UsageLedgerEntry {
            tenant_id: tenant,
            feature,
            window_start: Timestamp::from_datetime(self.window_start),
            used: to_count("used", self.used)?,
            reserved: to_count("reserved", self.reserved)?,
        })
    }
}

fn to_count(column: &str, value: i32) -> Result<u32, UsageLedgerError> {
    u32::try_from(value)
        .map_err(|_| UsageLedgerError::Corrupt(format!("negative {}: {}", column, value)))
}

fn db_error(e: sqlx::Error) -> UsageLedgerError {
    UsageLedgerError::Database(e.to_string())
}

#[async_trait]
impl UsageLedger for PostgresUsageLedger {
    async fn try_consume(
        &self,
        tenant: &TenantId,
        feature: MeteredFeature,
        limit: u32,
        window_start: Timestamp,
    ) -> Result<ConsumeOutcome, UsageLedgerError> {
        if limit == 0 {
            return Ok(ConsumeOutcome::Exhausted);
        }
        let limit = i32::try_from(limit).unwrap_or(i32::MAX);

        let row: Option<LedgerRow> = sqlx::query_as(
            r#"
            INSERT INTO usage_ledger (tenant_id, feature, window_start, used, reserved, updated_at)
            VALUES ($1, $2, $3, 0, 1, NOW())
            ON CONFLICT (tenant_id, feature) DO UPDATE SET
                window_start = GREATEST(usage_ledger.window_start, EXCLUDED.window_start),
                used = CASE
                    WHEN usage_ledger.window_start < EXCLUDED.window_start THEN 0
                    ELSE usage_ledger.used
                END,
                reserved = CASE
                    WHEN usage_ledger.window_start < EXCLUDED.window_start THEN 1
                    ELSE usage_ledger.reserved + 1
                END,
                updated_at = NOW()
            WHERE usage_ledger.window_start < EXCLUDED.window_start
               OR usage_ledger.used + usage_ledger.reserved < $4
            RETURNING window_start, used, reserved
            "#,
        )
        .bind(tenant.as_uuid())
        .bind(feature.as_str())
        .bind(window_start.as_datetime())
        .bind(limit)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(match row {
            Some(row) => ConsumeOutcome::Reserved(UsageReservation {
                tenant_id: *tenant,
                feature,
                window_start: Timestamp::from_datetime(row.window_start),
            }),
            None => ConsumeOutcome::Exhausted,
        })
    }

    async fn commit(&self, reservation: &UsageReservation) -> Result<SettleOutcome, UsageLedgerError> {
        let result = sqlx::query(
            r#"
            UPDATE usage_ledger SET
                used = used + 1,
                reserved = reserved - 1,
                updated_at = NOW()
            WHERE tenant_id = $1 AND feature = $2 AND window_start = $3 AND reserved > 0
            "#,
        )
        .bind(reservation.tenant_id.as_uuid())
        .bind(reservation.feature.as_str())
        .bind(reservation.window_start.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(settle_outcome(result.rows_affected()))
    }

    async fn release(&self, reservation: &UsageReservation) -> Result<SettleOutcome, UsageLedgerError> {
        let result = sqlx::query(
            r#"
            UPDATE usage_ledger SET
                reserved = reserved - 1,
                updated_at = NOW()
            WHERE tenant_id = $1 AND feature = $2 AND window_start = $3 AND reserved > 0
            "#,
        )
        .bind(reservation.tenant_id.as_uuid())
        .bind(reservation.feature.as_str())
        .bind(reservation.window_start.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(settle_outcome(result.rows_affected()))
    }

    async fn snapshot(
        &self,
        tenant: &TenantId,
        feature: MeteredFeature,
        window_start: Timestamp,
    ) -> Result<UsageSnapshot, UsageLedgerError> {
        let row: Option<LedgerRow> = sqlx::query_as(
            r#"
            SELECT window_start, used, reserved
            FROM usage_ledger
            WHERE tenant_id = $1 AND feature = $2
            "#,
        )
        .bind(tenant.as_uuid())
        .bind(feature.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        match row {
            Some(row) => Ok(row.into_entry(*tenant, feature)?.snapshot(window_start)),
            None => Ok(UsageSnapshot::empty(window_start)),
        }
    }
}

fn settle_outcome(rows_affected: u64) -> SettleOutcome {
    if rows_affected == 0 {
        SettleOutcome::WindowRolledOver
    } else {
        SettleOutcome::Recorded
    }
}
