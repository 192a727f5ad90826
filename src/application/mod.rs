//! Application layer - Resolution, gating, and query handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! `EntitlementService` is the entry point for other parts of the product;
//! the query handlers back the HTTP surface.

mod catalog_loader;
mod entitlements;
mod feature_gate;
pub mod handlers;
mod resolver;

pub use catalog_loader::load_catalog;
pub use entitlements::{EntitlementService, UsageSummary};
pub use feature_gate::{FeatureGate, MeteredUsage};
pub use resolver::{
    DirectSubscriptionStrategy, EntitlementResolver, OrganizationSubscriptionStrategy,
    ResolutionStrategy, StaffOverride,
};
