//! Billing plan definition.
//!
//! A plan is the unit of entitlement: a named bundle of hard caps, boolean
//! feature flags and metered quotas. Plans are immutable once loaded and are
//! shared between requests as `Arc<Plan>`.

use serde::{Deserialize, Serialize};

use super::{CappedResource, FlagFeature, Limit, MeteredFeature};
use crate::domain::foundation::ValidationError;

/// Length of the profile view quota window.
pub const WEEKLY_WINDOW_DAYS: u32 = 7;

/// Name of the synthetic plan handed to staff callers.
pub const STAFF_PLAN_NAME: &str = "Admin Access";

/// A quota that resets every `window_days`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeteredQuota {
    pub limit: Limit,
    #[serde(default = "default_window_days")]
    pub window_days: u32,
}

fn default_window_days() -> u32 {
    WEEKLY_WINDOW_DAYS
}

impl MeteredQuota {
    pub fn weekly(limit: Limit) -> Self {
        Self {
            limit,
            window_days: WEEKLY_WINDOW_DAYS,
        }
    }
}

/// Billing plan.
///
/// # Invariants
///
/// - `name` is non-empty and unique within a catalog
/// - every quota has `window_days >= 1`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub name: String,

    /// Monthly price in whole currency units. Display only.
    #[serde(default)]
    pub price: u32,

    /// Annual price in whole currency units. Display only.
    #[serde(default)]
    pub annual_price: u32,

    /// Marketing bullet points. Display only.
    #[serde(default)]
    pub features: Vec<String>,

    pub max_jobs: Limit,
    pub max_users: Limit,
    pub candidate_matches_limit: Limit,

    pub can_view_full_profile: bool,
    pub has_advanced_analytics: bool,

    pub weekly_profile_views: MeteredQuota,
}

impl Plan {
    /// Synthetic plan with every cap and quota unlimited and every flag on.
    ///
    /// Handed to staff callers; never stored.
    pub fn unlimited(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price: 0,
            annual_price: 0,
            features: Vec::new(),
            max_jobs: Limit::Unlimited,
            max_users: Limit::Unlimited,
            candidate_matches_limit: Limit::Unlimited,
            can_view_full_profile: true,
            has_advanced_analytics: true,
            weekly_profile_views: MeteredQuota::weekly(Limit::Unlimited),
        }
    }

    /// The hard cap for a resource.
    pub fn cap(&self, resource: CappedResource) -> Limit {
        match resource {
            CappedResource::JobPostings => self.max_jobs,
            CappedResource::Users => self.max_users,
            CappedResource::CandidateMatches => self.candidate_matches_limit,
        }
    }

    /// Whether a boolean feature is included.
    pub fn flag(&self, feature: FlagFeature) -> bool {
        match feature {
            FlagFeature::FullProfileView => self.can_view_full_profile,
            FlagFeature::AdvancedAnalytics => self.has_advanced_analytics,
        }
    }

    /// The quota for a metered feature.
    pub fn quota(&self, feature: MeteredFeature) -> MeteredQuota {
        match feature {
            MeteredFeature::ProfileViews => self.weekly_profile_views,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        for feature in MeteredFeature::ALL {
            let quota = self.quota(feature);
            if quota.window_days == 0 {
                return Err(ValidationError::out_of_range(
                    format!("{}.window_days", feature.as_str()),
                    1,
                    i64::from(u32::MAX),
                    0,
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic() -> Plan {
        Plan {
            name: "Basic".to_string(),
            price: 0,
            annual_price: 0,
            features: vec![],
            max_jobs: Limit::Max(1),
            max_users: Limit::Max(1),
            candidate_matches_limit: Limit::Max(5),
            can_view_full_profile: false,
            has_advanced_analytics: false,
            weekly_profile_views: MeteredQuota::weekly(Limit::Max(5)),
        }
    }

    #[test]
    fn cap_maps_each_resource() {
        let plan = basic();
        assert_eq!(plan.cap(CappedResource::JobPostings), Limit::Max(1));
        assert_eq!(plan.cap(CappedResource::Users), Limit::Max(1));
        assert_eq!(plan.cap(CappedResource::CandidateMatches), Limit::Max(5));
    }

    #[test]
    fn flag_maps_each_feature() {
        let mut plan = basic();
        plan.has_advanced_analytics = true;
        assert!(!plan.flag(FlagFeature::FullProfileView));
        assert!(plan.flag(FlagFeature::AdvancedAnalytics));
    }

    #[test]
    fn unlimited_plan_grants_everything() {
        let plan = Plan::unlimited(STAFF_PLAN_NAME);
        for r in CappedResource::ALL {
            assert!(plan.cap(r).is_unlimited());
        }
        for f in FlagFeature::ALL {
            assert!(plan.flag(f));
        }
        for m in MeteredFeature::ALL {
            assert!(plan.quota(m).limit.is_unlimited());
        }
    }

    #[test]
    fn validate_rejects_blank_name() {
        let mut plan = basic();
        plan.name = "  ".to_string();
        assert!(plan.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_day_window() {
        let mut plan = basic();
        plan.weekly_profile_views.window_days = 0;
        assert!(plan.validate().is_err());
    }

    #[test]
    fn deserializes_camel_case_with_defaults() {
        let json = r#"{
            "name": "Starter",
            "maxJobs": 2,
            "maxUsers": -1,
            "candidateMatchesLimit": 10,
            "canViewFullProfile": false,
            "hasAdvancedAnalytics": false,
            "weeklyProfileViews": { "limit": 3 }
        }"#;
        let plan: Plan = serde_json::from_str(json).unwrap();
        assert_eq!(plan.max_users, Limit::Unlimited);
        assert_eq!(plan.weekly_profile_views.window_days, WEEKLY_WINDOW_DAYS);
        assert_eq!(plan.price, 0);
        assert!(plan.features.is_empty());
    }
}
