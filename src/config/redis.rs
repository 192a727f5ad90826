//! Redis configuration
//!
//! Only needed when the usage ledger runs on Redis.

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,

    /// Connect timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl RedisConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            return Err(ValidationError::MissingRequired("REDIS__URL"));
        }
        if !self.url.starts_with("redis://") && !self.url.starts_with("rediss://") {
            return Err(ValidationError::InvalidRedisUrl);
        }
        Ok(())
    }
}

fn default_timeout() -> u64 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_url(url: &str) -> RedisConfig {
        RedisConfig {
            url: url.to_string(),
            timeout_secs: default_timeout(),
        }
    }

    #[test]
    fn accepts_plain_and_tls_schemes() {
        assert!(with_url("redis://localhost:6379").validate().is_ok());
        assert!(with_url("rediss://cache.internal:6380").validate().is_ok());
    }

    #[test]
    fn rejects_other_schemes() {
        assert_eq!(
            with_url("http://localhost:6379").validate(),
            Err(ValidationError::InvalidRedisUrl)
        );
        assert_eq!(
            with_url("").validate(),
            Err(ValidationError::MissingRequired("REDIS__URL"))
        );
    }
}
