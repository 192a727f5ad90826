//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresPlanSource` - Loads the plan catalog at startup
//! - `PostgresSubscriptionStore` - Subscriptions keyed by subject
//! - `PostgresOrganizationReader` - Tenant to organization lookup
//!
//! The usage ledger lives in `adapters::usage_ledger`.

mod organization_reader;
mod plan_source;
mod subscription_store;

pub use organization_reader::PostgresOrganizationReader;
pub use plan_source::PostgresPlanSource;
pub use subscription_store::PostgresSubscriptionStore;
