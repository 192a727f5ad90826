//! UsageLedger port - atomic per-window counters for metered features.
//!
//! Every operation is a single atomic step against storage. Implementations
//! must never read a counter and write it back in two steps: two requests
//! racing for the last unit must see exactly one reservation succeed.
//!
//! # Protocol
//!
//! 1. `try_consume` reserves one unit if `used + reserved < limit`, resetting
//!    an entry whose window is older than `window_start`
//! 2. `commit` moves the unit to `used` once the protected operation succeeded
//! 3. `release` hands it back if the operation failed
//!
//! Commit and release are no-ops once the entry has rolled into a newer
//! window.

use async_trait::async_trait;

use crate::domain::entitlement::{
    ConsumeOutcome, MeteredFeature, SettleOutcome, UsageReservation, UsageSnapshot,
};
use crate::domain::foundation::{TenantId, Timestamp};

/// Port for the metered usage ledger.
#[async_trait]
pub trait UsageLedger: Send + Sync {
    /// Atomically reserves one unit within `window_start`'s window.
    ///
    /// A `limit` of zero is always exhausted.
    async fn try_consume(
        &self,
        tenant: &TenantId,
        feature: MeteredFeature,
        limit: u32,
        window_start: Timestamp,
    ) -> Result<ConsumeOutcome, UsageLedgerError>;

    /// Records a reserved unit as used.
    async fn commit(&self, reservation: &UsageReservation) -> Result<SettleOutcome, UsageLedgerError>;

    /// Returns a reserved unit unused.
    async fn release(
        &self,
        reservation: &UsageReservation,
    ) -> Result<SettleOutcome, UsageLedgerError>;

    /// Current counts as seen from `window_start`; stale entries read as zero.
    async fn snapshot(
        &self,
        tenant: &TenantId,
        feature: MeteredFeature,
        window_start: Timestamp,
    ) -> Result<UsageSnapshot, UsageLedgerError>;
}

/// Errors from the usage ledger.
#[derive(Debug, thiserror::Error)]
pub enum UsageLedgerError {
    /// Database error.
    #[error("database error: {0}")]
    Database(String),

    /// Cache (Redis) error.
    #[error("cache error: {0}")]
    Cache(String),

    /// Storage returned something the ledger cannot interpret.
    #[error("corrupt ledger entry: {0}")]
    Corrupt(String),
}
