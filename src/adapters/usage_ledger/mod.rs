//! Usage ledger adapters.
//!
//! Implementations of the UsageLedger port for different backends.
//!
//! ## Available Adapters
//!
//! - `InMemoryUsageLedger` - In-memory for testing and single-process
//! - `PostgresUsageLedger` - Conditional upsert, default for production
//! - `RedisUsageLedger` - Lua scripts, for Redis-backed deployments

mod in_memory;
mod postgres;
mod redis;

pub use self::in_memory::InMemoryUsageLedger;
pub use self::postgres::PostgresUsageLedger;
pub use self::redis::RedisUsageLedger;
