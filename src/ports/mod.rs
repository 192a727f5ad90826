//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Entitlement Ports
//!
//! - `PlanSource` - Loads plan definitions at startup
//! - `SubscriptionReader` / `SubscriptionRepository` - Subscription rows by subject
//! - `OrganizationReader` - Tenant to organization membership
//! - `UsageLedger` - Atomic per-window counters for metered features
//! - `ResourceCounter` - Live counts behind hard caps

mod organization_reader;
mod plan_source;
mod resource_counter;
mod subscription_reader;
mod subscription_repository;
mod usage_ledger;

pub use organization_reader::OrganizationReader;
pub use plan_source::PlanSource;
pub use resource_counter::ResourceCounter;
pub use subscription_reader::SubscriptionReader;
pub use subscription_repository::SubscriptionRepository;
pub use usage_ledger::{UsageLedger, UsageLedgerError};
