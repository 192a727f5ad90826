//! Numeric plan limit with an explicit "unlimited" case.
//!
//! Persisted and serialized as a signed integer where `-1` means unlimited,
//! which is what the plan seed data and API clients use.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ValidationError;

/// A cap or quota size on a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Limit {
    /// No ceiling.
    Unlimited,
    /// At most this many.
    Max(u32),
}

impl Limit {
    /// Wire/database sentinel for [`Limit::Unlimited`].
    pub const UNLIMITED_SENTINEL: i64 = -1;

    pub fn is_unlimited(&self) -> bool {
        matches!(self, Limit::Unlimited)
    }

    /// Returns the ceiling, or `None` when unlimited.
    pub fn max(&self) -> Option<u32> {
        match self {
            Limit::Unlimited => None,
            Limit::Max(n) => Some(*n),
        }
    }

    /// True when one more unit may be added on top of `current`.
    pub fn allows(&self, current: u32) -> bool {
        match self {
            Limit::Unlimited => true,
            Limit::Max(max) => current < *max,
        }
    }

    /// Units still available given `current` usage; `None` when unlimited.
    pub fn remaining(&self, current: u32) -> Option<u32> {
        self.max().map(|max| max.saturating_sub(current))
    }

    /// Parses the persisted representation.
    pub fn from_db(value: i64) -> Result<Self, ValidationError> {
        Self::try_from(value)
    }

    /// Persisted representation.
    pub fn to_db(&self) -> i64 {
        i64::from(*self)
    }
}

impl TryFrom<i64> for Limit {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value == Self::UNLIMITED_SENTINEL {
            return Ok(Limit::Unlimited);
        }
        u32::try_from(value)
            .map(Limit::Max)
            .map_err(|_| ValidationError::out_of_range("limit", -1, i64::from(u32::MAX), value))
    }
}

impl From<Limit> for i64 {
    fn from(limit: Limit) -> Self {
        match limit {
            Limit::Unlimited => Limit::UNLIMITED_SENTINEL,
            Limit::Max(n) => i64::from(n),
        }
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::Unlimited => f.write_str("unlimited"),
            Limit::Max(n) => write!(f, "{}", n),
        }
    }
}
