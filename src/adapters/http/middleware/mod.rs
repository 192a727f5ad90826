//! HTTP middleware for axum.
//!
//! - `caller` - Caller identity extractor
//! - `feature_gate` - Per-route plan enforcement

pub mod caller;
pub mod feature_gate;

pub use caller::{resolve_caller, CallerRejection, RequireCaller, TENANT_ID_HEADER, TENANT_ROLE_HEADER};
pub use feature_gate::{require_feature, FeatureRequirement};
