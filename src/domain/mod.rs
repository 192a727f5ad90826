//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, caller identity, errors)
//! - `entitlement` - Plans, subscriptions, organizations and usage metering

pub mod entitlement;
pub mod foundation;
