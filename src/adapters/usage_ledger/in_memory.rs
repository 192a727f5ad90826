//! In-memory usage ledger for testing and single-process deployments.
//!
//! Every operation runs the pure `UsageLedgerEntry` transition inside one
//! critical section, which is what makes it atomic. Counts are lost on
//! restart, so this is not suitable for multi-server deployments.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::domain::entitlement::{
    ConsumeOutcome, MeteredFeature, SettleOutcome, UsageLedgerEntry, UsageReservation,
    UsageSnapshot,
};
use crate::domain::foundation::{TenantId, Timestamp};
use crate::ports::{UsageLedger, UsageLedgerError};

type EntryKey = (TenantId, MeteredFeature);

/// In-memory usage ledger.
#[derive(Debug, Default)]
pub struct InMemoryUsageLedger {
    entries: Mutex<HashMap<EntryKey, UsageLedgerEntry>>,
}

impl InMemoryUsageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the raw entry, stale or not.
    pub async fn entry(&self, tenant: &TenantId, feature: MeteredFeature) -> Option<UsageLedgerEntry> {
        self.entries.lock().await.get(&(*tenant, feature)).cloned()
    }
}

#[async_trait]
impl UsageLedger for InMemoryUsageLedger {
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
        let mut entries = self.entries.lock().await;
        let entry = entries
            .entry((*tenant, feature))
            .or_insert_with(|| UsageLedgerEntry::new(*tenant, feature, window_start));

        Ok(match entry.try_reserve(limit, window_start) {
            Some(reservation) => ConsumeOutcome::Reserved(reservation),
            None => ConsumeOutcome::Exhausted,
        })
    }

    async fn commit(&self, reservation: &UsageReservation) -> Result<SettleOutcome, UsageLedgerError> {
        let mut entries = self.entries.lock().await;
        Ok(entries
            .get_mut(&(reservation.tenant_id, reservation.feature))
            .map(|entry| entry.commit(reservation.window_start))
            .unwrap_or(SettleOutcome::WindowRolledOver))
    }

    async fn release(&self, reservation: &UsageReservation) -> Result<SettleOutcome, UsageLedgerError> {
        let mut entries = self.entries.lock().await;
        Ok(entries
            .get_mut(&(reservation.tenant_id, reservation.feature))
            .map(|entry| entry.release(reservation.window_start))
            .unwrap_or(SettleOutcome::WindowRolledOver))
    }

    async fn snapshot(
        &self,
        tenant: &TenantId,
        feature: MeteredFeature,
        window_start: Timestamp,
    ) -> Result<UsageSnapshot, UsageLedgerError> {
        let entries = self.entries.lock().await;
        Ok(entries
            .get(&(*tenant, feature))
            .map(|entry| entry.snapshot(window_start))
            .unwrap_or_else(|| UsageSnapshot::empty(window_start)))
    }
}
