//! Query handlers for the entitlement HTTP surface.

mod get_active_plan;
mod get_usage_summary;
mod list_plans;

pub use get_active_plan::{GetActivePlanHandler, GetActivePlanQuery};
pub use get_usage_summary::{GetUsageSummaryHandler, GetUsageSummaryQuery};
pub use list_plans::{ListPlansHandler, ListPlansQuery, ListPlansResult};
