//! In-memory adapters for tests and single-process deployments.
//!
//! - `InMemorySubscriptionStore` - subscriptions keyed by subject
//! - `InMemoryOrganizationDirectory` - organizations and their members
//! - `InMemoryResourceCounter` - settable resource counts

mod organization_directory;
mod resource_counter;
mod subscription_store;

pub use organization_directory::InMemoryOrganizationDirectory;
pub use resource_counter::InMemoryResourceCounter;
pub use subscription_store::InMemorySubscriptionStore;
