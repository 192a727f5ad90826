//! HTTP adapters - REST API implementations.

pub mod entitlement;
pub mod middleware;

pub use entitlement::{entitlement_router, EntitlementAppState};
pub use middleware::{require_feature, FeatureRequirement, RequireCaller};

use axum::Router;

/// Entitlement API mounted at `/api`, with state applied.
pub fn api_router(state: EntitlementAppState) -> Router {
    Router::new()
        .nest("/api", entitlement_router())
        .with_state(state)
}
