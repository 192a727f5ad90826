//! Usage ledger entry and the two-phase reservation protocol.
//!
//! A metered use is first *reserved* when the gate allows it, then either
//! *committed* (the protected operation succeeded) or *released* (it
//! failed). The quota check counts `used + reserved`, so two concurrent
//! requests for the last unit cannot both be allowed, while `used` only ever
//! counts successful operations.
//!
//! The logic here is storage-agnostic. The in-memory ledger runs it directly
//! under a lock; the Postgres and Redis ledgers express the same transitions
//! as single atomic statements.

use serde::{Deserialize, Serialize};

use super::{Limit, MeteredFeature};
use crate::domain::foundation::{TenantId, Timestamp};

/// Handle for one reserved unit of a metered feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageReservation {
    pub tenant_id: TenantId,
    pub feature: MeteredFeature,
    pub window_start: Timestamp,
}

/// Result of an attempt to reserve one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumeOutcome {
    Reserved(UsageReservation),
    Exhausted,
}

/// Result of committing or releasing a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleOutcome {
    Recorded,
    /// The entry moved to a newer window; nothing was changed.
    WindowRolledOver,
}

/// Read-only view of an entry within a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub window_start: Timestamp,
    pub used: u32,
    pub reserved: u32,
}

impl UsageSnapshot {
    pub fn empty(window_start: Timestamp) -> Self {
        Self {
            window_start,
            used: 0,
            reserved: 0,
        }
    }

    /// Units still available; `None` when unlimited.
    pub fn remaining(&self, limit: Limit) -> Option<u32> {
        limit.remaining(self.used.saturating_add(self.reserved))
    }
}

/// Ledger entry for one (tenant, feature) pair.
///
/// # Invariants
///
/// - `used + reserved <= limit` for the limit in force when units were reserved
/// - `window_start` never moves backwards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageLedgerEntry {
    pub tenant_id: TenantId,
    pub feature: MeteredFeature,
    pub window_start: Timestamp,
    pub used: u32,
    pub reserved: u32,
}

impl UsageLedgerEntry {
    pub fn new(tenant_id: TenantId, feature: MeteredFeature, window_start: Timestamp) -> Self {
        Self {
            tenant_id,
            feature,
            window_start,
            used: 0,
            reserved: 0,
        }
    }

    /// Reserves one unit in `window_start`, resetting a stale entry first.
    ///
    /// Returns `None` without mutating anything when the quota is exhausted.
    pub fn try_reserve(&mut self, limit: u32, window_start: Timestamp) -> Option<UsageReservation> {
        if limit == 0 {
            return None;
        }
        if self.window_start < window_start {
            self.window_start = window_start;
            self.used = 0;
            self.reserved = 0;
        }
        if self.used.saturating_add(self.reserved) >= limit {
            return None;
        }
        self.reserved += 1;
        Some(UsageReservation {
            tenant_id: self.tenant_id,
            feature: self.feature,
            window_start: self.window_start,
        })
    }

    /// Moves one unit from reserved to used if still in the same window.
    pub fn commit(&mut self, window_start: Timestamp) -> SettleOutcome {
        if self.window_start != window_start || self.reserved == 0 {
            return SettleOutcome::WindowRolledOver;
        }
        self.reserved -= 1;
        self.used += 1;
        SettleOutcome::Recorded
    }

    /// Returns one reserved unit if still in the same window.
    pub fn release(&mut self, window_start: Timestamp) -> SettleOutcome {
        if self.window_start != window_start || self.reserved == 0 {
            return SettleOutcome::WindowRolledOver;
        }
        self.reserved -= 1;
        SettleOutcome::Recorded
    }

    /// Counts as seen from `window_start`; a stale entry reads as empty.
    pub fn snapshot(&self, window_start: Timestamp) -> UsageSnapshot {
        if self.window_start < window_start {
            return UsageSnapshot::empty(window_start);
        }
        UsageSnapshot {
            window_start: self.window_start,
            used: self.used,
            reserved: self.reserved,
        }
    }
}
