//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `postgres` - Plans, subscriptions and organization membership
//! - `usage_ledger` - Usage ledger backends (Postgres, Redis, in-memory)
//! - `in_memory` - In-memory stores for tests and local runs
//! - `catalog_file` - YAML plan catalog
//! - `http` - Axum routes and the feature gate middleware

pub mod catalog_file;
pub mod http;
pub mod in_memory;
pub mod postgres;
pub mod usage_ledger;

pub use catalog_file::YamlPlanSource;
pub use usage_ledger::{InMemoryUsageLedger, PostgresUsageLedger, RedisUsageLedger};
