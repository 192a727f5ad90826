//! Resolution and gate results.
//!
//! Denials are values, not errors: a denied check still succeeds and carries
//! an [`AccessDeniedReason`] with a user-facing upgrade prompt.

use serde::Serialize;
use std::sync::Arc;

use super::{CappedResource, FlagFeature, MeteredFeature, Plan, UsageReservation};
use crate::domain::foundation::{OrganizationId, SubscriptionId, Timestamp};

/// Where a tenant's plan came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntitlementSource {
    /// Staff role; synthetic unlimited plan.
    Staff,
    DirectSubscription {
        subscription_id: SubscriptionId,
        ends_at: Timestamp,
    },
    OrganizationSubscription {
        organization_id: OrganizationId,
        subscription_id: SubscriptionId,
        ends_at: Timestamp,
    },
    /// Catalog default plan.
    Default,
}

/// The plan in force for a caller and its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPlan {
    pub plan: Arc<Plan>,
    pub source: EntitlementSource,
}

impl ResolvedPlan {
    pub fn new(plan: Arc<Plan>, source: EntitlementSource) -> Self {
        Self { plan, source }
    }

    pub fn plan_name(&self) -> &str {
        &self.plan.name
    }
}

/// Extra input for a gate check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GateContext {
    /// Current count of the capped resource, when the caller already knows it.
    pub current_count: Option<u32>,
}

impl GateContext {
    pub fn with_count(count: u32) -> Self {
        Self {
            current_count: Some(count),
        }
    }
}

/// Why access was denied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AccessDeniedReason {
    ResourceCapReached {
        plan: String,
        resource: CappedResource,
        limit: u32,
        current: u32,
    },
    FeatureNotIncluded {
        plan: String,
        feature: FlagFeature,
    },
    QuotaExhausted {
        plan: String,
        feature: MeteredFeature,
        limit: u32,
        window_days: u32,
        resets_at: Timestamp,
    },
    /// The ledger could not be reached; metered access fails closed.
    UsageUnavailable {
        plan: String,
        feature: MeteredFeature,
    },
}

impl AccessDeniedReason {
    /// Upgrade prompt naming the plan and the limit that was hit.
    pub fn user_message(&self) -> String {
        match self {
            AccessDeniedReason::ResourceCapReached {
                plan,
                resource,
                limit,
                ..
            } => format!(
                "Your '{}' plan allows for {} {}. Please upgrade to add more.",
                plan,
                limit,
                resource.noun()
            ),
            AccessDeniedReason::FeatureNotIncluded { plan, feature } => format!(
                "The '{}' plan does not include {}. Please upgrade.",
                plan,
                feature.display_name()
            ),
            AccessDeniedReason::QuotaExhausted {
                plan,
                feature,
                limit,
                window_days,
                ..
            } => {
                let period = if *window_days == 7 {
                    "week".to_string()
                } else {
                    format!("{}-day period", window_days)
                };
                format!(
                    "You have used all {} of your {} for this {} on the '{}' plan. Upgrade your plan for more.",
                    limit,
                    feature.noun(),
                    period,
                    plan
                )
            }
            AccessDeniedReason::UsageUnavailable { plan, feature } => format!(
                "We could not verify your remaining {} on the '{}' plan. Please try again shortly.",
                feature.noun(),
                plan
            ),
        }
    }

    /// Machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            AccessDeniedReason::ResourceCapReached { .. } => "RESOURCE_CAP_REACHED",
            AccessDeniedReason::FeatureNotIncluded { .. } => "FEATURE_NOT_INCLUDED",
            AccessDeniedReason::QuotaExhausted { .. } => "QUOTA_EXHAUSTED",
            AccessDeniedReason::UsageUnavailable { .. } => "USAGE_UNAVAILABLE",
        }
    }
}

/// Outcome of a gate check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    Allowed,
    /// Allowed, with one metered unit reserved until settled.
    Reserved(UsageReservation),
    Denied(AccessDeniedReason),
}

/// A gate decision for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateResult {
    pub plan_name: String,
    pub outcome: GateOutcome,
}

impl GateResult {
    pub fn allowed(plan_name: impl Into<String>) -> Self {
        Self {
            plan_name: plan_name.into(),
            outcome: GateOutcome::Allowed,
        }
    }

    pub fn reserved(plan_name: impl Into<String>, reservation: UsageReservation) -> Self {
        Self {
            plan_name: plan_name.into(),
            outcome: GateOutcome::Reserved(reservation),
        }
    }

    pub fn denied(plan_name: impl Into<String>, reason: AccessDeniedReason) -> Self {
        Self {
            plan_name: plan_name.into(),
            outcome: GateOutcome::Denied(reason),
        }
    }

    pub fn is_allowed(&self) -> bool {
        !matches!(self.outcome, GateOutcome::Denied(_))
    }

    pub fn reason(&self) -> Option<&AccessDeniedReason> {
        match &self.outcome {
            GateOutcome::Denied(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn reservation(&self) -> Option<&UsageReservation> {
        match &self.outcome {
            GateOutcome::Reserved(reservation) => Some(reservation),
            _ => None,
        }
    }

    /// The denial's upgrade prompt, if denied.
    pub fn user_message(&self) -> Option<String> {
        self.reason().map(AccessDeniedReason::user_message)
    }
}
