//! Entitlement domain.
//!
//! Plans, subscriptions, organizations and the usage ledger: everything
//! needed to answer "which plan governs this tenant" and "may this tenant
//! use this feature right now".

mod catalog;
mod decision;
mod errors;
mod feature;
mod ledger_entry;
mod limit;
mod organization;
mod plan;
mod status;
mod subscription;
mod usage_window;

pub use catalog::{seed_plans, CatalogError, PlanCatalog, DEFAULT_PLAN_NAME};
pub use decision::{
    AccessDeniedReason, EntitlementSource, GateContext, GateOutcome, GateResult, ResolvedPlan,
};
pub use errors::EntitlementError;
pub use feature::{CappedResource, Feature, FlagFeature, MeteredFeature};
pub use ledger_entry::{
    ConsumeOutcome, SettleOutcome, UsageLedgerEntry, UsageReservation, UsageSnapshot,
};
pub use limit::Limit;
pub use organization::Organization;
pub use plan::{MeteredQuota, Plan, STAFF_PLAN_NAME, WEEKLY_WINDOW_DAYS};
pub use status::SubscriptionStatus;
pub use subscription::{BillingCycle, Subscription, SubscriptionSubject};
pub use usage_window::WindowPolicy;
