//! Application configuration module
//!
//! Configuration is read from environment variables with the
//! `ENTITLEMENT_GATE` prefix; nested values use `__` as separator.
//!
//! # Example
//!
//! ```no_run
//! use entitlement_gate::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod entitlements;
mod error;
mod redis;
mod server;

pub use database::DatabaseConfig;
pub use entitlements::{EntitlementsConfig, LedgerBackend};
pub use error::{ConfigError, ValidationError};
pub use self::redis::RedisConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    pub database: DatabaseConfig,

    /// Only required for the Redis usage ledger
    #[serde(default)]
    pub redis: Option<RedisConfig>,

    #[serde(default)]
    pub entitlements: EntitlementsConfig,
}

impl AppConfig {
    /// Load configuration from `.env` and the environment.
    ///
    /// - `ENTITLEMENT_GATE__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `ENTITLEMENT_GATE__ENTITLEMENTS__LEDGER_BACKEND=redis`
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("ENTITLEMENT_GATE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Semantic validation across sections.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.entitlements.validate()?;
        match (&self.redis, self.entitlements.ledger_backend) {
            (Some(redis), _) => redis.validate()?,
            (None, LedgerBackend::Redis) => return Err(ValidationError::RedisRequired),
            (None, _) => {}
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
