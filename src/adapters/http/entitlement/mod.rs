//! HTTP adapter for entitlement endpoints.
//!
//! - `GET /api/plans` - Plan catalog
//! - `GET /api/entitlements/plan` - Caller's plan in force
//! - `GET /api/entitlements/usage` - Caller's metered usage

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use handlers::{EntitlementApiError, EntitlementAppState};
pub use routes::{entitlement_router, entitlement_routes};
