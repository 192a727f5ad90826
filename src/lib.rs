//! Entitlement Gate - plan resolution and feature gating for tenant accounts.
//!
//! Determines which billing plan governs a tenant (own subscription, parent
//! organization subscription, or the free default) and enforces that plan's
//! hard caps, feature flags and time-windowed metered quotas.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
