//! HTTP DTOs for entitlement endpoints.
//!
//! Limits serialize as integers with `-1` meaning unlimited.

use serde::Serialize;

use crate::application::handlers::ListPlansResult;
use crate::application::{MeteredUsage, UsageSummary};
use crate::domain::entitlement::{
    AccessDeniedReason, EntitlementSource, Limit, MeteredFeature, Plan, ResolvedPlan,
};

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// One plan as shown to clients.
#[derive(Debug, Clone, Serialize)]
pub struct PlanResponse {
    pub name: String,
    pub price: u32,
    pub annual_price: u32,
    pub features: Vec<String>,
    pub max_jobs: Limit,
    pub max_users: Limit,
    pub candidate_matches_limit: Limit,
    pub can_view_full_profile: bool,
    pub has_advanced_analytics: bool,
    pub weekly_profile_views: Limit,
    pub profile_views_window_days: u32,
}

impl From<&Plan> for PlanResponse {
    fn from(plan: &Plan) -> Self {
        Self {
            name: plan.name.clone(),
            price: plan.price,
            annual_price: plan.annual_price,
            features: plan.features.clone(),
            max_jobs: plan.max_jobs,
            max_users: plan.max_users,
            candidate_matches_limit: plan.candidate_matches_limit,
            can_view_full_profile: plan.can_view_full_profile,
            has_advanced_analytics: plan.has_advanced_analytics,
            weekly_profile_views: plan.weekly_profile_views.limit,
            profile_views_window_days: plan.weekly_profile_views.window_days,
        }
    }
}

/// Response for `GET /api/plans`.
#[derive(Debug, Clone, Serialize)]
pub struct PlanListResponse {
    pub plans: Vec<PlanResponse>,
    pub default_plan: String,
}

impl From<ListPlansResult> for PlanListResponse {
    fn from(result: ListPlansResult) -> Self {
        Self {
            plans: result.plans.iter().map(|p| PlanResponse::from(p.as_ref())).collect(),
            default_plan: result.default_plan,
        }
    }
}

/// Response for `GET /api/entitlements/plan`.
#[derive(Debug, Clone, Serialize)]
pub struct ActivePlanResponse {
    pub plan: PlanResponse,
    pub source: EntitlementSource,
}

impl From<ResolvedPlan> for ActivePlanResponse {
    fn from(resolved: ResolvedPlan) -> Self {
        Self {
            plan: PlanResponse::from(resolved.plan.as_ref()),
            source: resolved.source,
        }
    }
}

/// Usage of one metered feature in the current window.
#[derive(Debug, Clone, Serialize)]
pub struct MeteredUsageResponse {
    pub feature: MeteredFeature,
    pub limit: Limit,
    pub used: u32,
    pub reserved: u32,
    /// Null when unlimited.
    pub remaining: Option<u32>,
    /// Window start (ISO 8601).
    pub window_start: String,
    /// When the window resets (ISO 8601).
    pub resets_at: String,
}

impl From<MeteredUsage> for MeteredUsageResponse {
    fn from(usage: MeteredUsage) -> Self {
        Self {
            feature: usage.feature,
            limit: usage.limit,
            used: usage.used,
            reserved: usage.reserved,
            remaining: usage.remaining,
            window_start: usage.window_start.as_datetime().to_rfc3339(),
            resets_at: usage.resets_at.as_datetime().to_rfc3339(),
        }
    }
}

/// Response for `GET /api/entitlements/usage`.
#[derive(Debug, Clone, Serialize)]
pub struct UsageSummaryResponse {
    pub plan_name: String,
    pub source: EntitlementSource,
    pub usage: Vec<MeteredUsageResponse>,
}

impl From<UsageSummary> for UsageSummaryResponse {
    fn from(summary: UsageSummary) -> Self {
        Self {
            plan_name: summary.plan_name,
            source: summary.source,
            usage: summary.usage.into_iter().map(MeteredUsageResponse::from).collect(),
        }
    }
}

/// Body of a 403 from the feature gate.
#[derive(Debug, Clone, Serialize)]
pub struct AccessDeniedResponse {
    pub code: String,
    pub message: String,
    pub plan: String,
    pub reason: AccessDeniedReason,
}

impl AccessDeniedResponse {
    pub fn new(plan: impl Into<String>, reason: AccessDeniedReason) -> Self {
        Self {
            code: reason.code().to_string(),
            message: reason.user_message(),
            plan: plan.into(),
            reason,
        }
    }
}

/// Error response body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entitlement::PlanCatalog;

    #[test]
    fn plan_response_serializes_unlimited_as_minus_one() {
        let catalog = PlanCatalog::seeded();
        let premium = catalog.get("Premium").unwrap();
        let json = serde_json::to_value(PlanResponse::from(premium.as_ref())).unwrap();

        assert_eq!(json["candidate_matches_limit"], -1);
        assert_eq!(json["max_jobs"], 5);
        assert_eq!(json["profile_views_window_days"], 7);
    }

    #[test]
    fn denied_response_carries_code_and_message() {
        let reason = AccessDeniedReason::FeatureNotIncluded {
            plan: "Basic".to_string(),
            feature: crate::domain::entitlement::FlagFeature::AdvancedAnalytics,
        };
        let body = AccessDeniedResponse::new("Basic", reason);

        assert_eq!(body.code, "FEATURE_NOT_INCLUDED");
        assert!(body.message.contains("'Basic'"));
    }
}
