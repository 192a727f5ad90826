//! Axum router configuration for entitlement endpoints.

use axum::{routing::get, Router};

use super::handlers::{get_active_plan, get_usage, list_plans, EntitlementAppState};

/// Routes for the caller's own entitlements.
///
/// - `GET /plan` - Resolved plan and where it came from
/// - `GET /usage` - Metered usage for the current window
pub fn entitlement_routes() -> Router<EntitlementAppState> {
    Router::new()
        .route("/plan", get(get_active_plan))
        .route("/usage", get(get_usage))
}

/// Create the complete entitlement module router.
///
/// Mount at `/api`:
///
/// ```ignore
/// let app = Router::new()
///     .nest("/api", entitlement_router())
///     .with_state(EntitlementAppState::new(service));
/// ```
pub fn entitlement_router() -> Router<EntitlementAppState> {
    Router::new()
        .route("/plans", get(list_plans))
        .nest("/entitlements", entitlement_routes())
}
