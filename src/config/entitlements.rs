//! Entitlement engine configuration

use chrono::Weekday;
use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;
use crate::domain::entitlement::{WindowPolicy, DEFAULT_PLAN_NAME};

/// Where usage ledger rows live.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LedgerBackend {
    #[default]
    Postgres,
    Redis,
    /// Process-local; counts are lost on restart.
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntitlementsConfig {
    /// Plan handed to tenants with no active subscription
    #[serde(default = "default_plan")]
    pub default_plan: String,

    /// YAML catalog file; the `plans` table is used when unset
    pub catalog_path: Option<PathBuf>,

    /// First day of a usage window
    #[serde(default = "default_week_start")]
    pub week_starts_on: String,

    /// Fixed offset windows are computed in, in minutes east of UTC
    #[serde(default)]
    pub window_utc_offset_minutes: i32,

    #[serde(default)]
    pub ledger_backend: LedgerBackend,
}

impl EntitlementsConfig {
    pub fn week_start(&self) -> Result<Weekday, ValidationError> {
        self.week_starts_on
            .parse::<Weekday>()
            .map_err(|_| ValidationError::InvalidWeekday(self.week_starts_on.clone()))
    }

    pub fn window_policy(&self) -> Result<WindowPolicy, ValidationError> {
        WindowPolicy::new(self.week_start()?, self.window_utc_offset_minutes)
            .map_err(|_| ValidationError::InvalidUtcOffset(self.window_utc_offset_minutes))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.default_plan.trim().is_empty() {
            return Err(ValidationError::EmptyDefaultPlan);
        }
        self.window_policy()?;
        Ok(())
    }
}

impl Default for EntitlementsConfig {
    fn default() -> Self {
        Self {
            default_plan: default_plan(),
            catalog_path: None,
            week_starts_on: default_week_start(),
            window_utc_offset_minutes: 0,
            ledger_backend: LedgerBackend::default(),
        }
    }
}

fn default_plan() -> String {
    DEFAULT_PLAN_NAME.to_string()
}

fn default_week_start() -> String {
    "sunday".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_basic_sunday_utc_postgres() {
        let config = EntitlementsConfig::default();
        assert_eq!(config.default_plan, "Basic");
        assert_eq!(config.ledger_backend, LedgerBackend::Postgres);
        assert_eq!(config.window_policy().unwrap(), WindowPolicy::default());
    }

    #[test]
    fn weekday_names_are_case_insensitive() {
        let config = EntitlementsConfig {
            week_starts_on: "Monday".to_string(),
            ..Default::default()
        };
        assert_eq!(config.week_start().unwrap(), Weekday::Mon);
    }

    #[test]
    fn rejects_unknown_weekday() {
        let config = EntitlementsConfig {
            week_starts_on: "someday".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidWeekday("someday".to_string()))
        );
    }

    #[test]
    fn rejects_offset_beyond_a_day() {
        let config = EntitlementsConfig {
            window_utc_offset_minutes: 1440,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidUtcOffset(1440)));
    }

    #[test]
    fn rejects_blank_default_plan() {
        let config = EntitlementsConfig {
            default_plan: "  ".to_string(),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::EmptyDefaultPlan));
    }
}
