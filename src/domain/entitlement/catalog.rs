//! Immutable plan catalog.
//!
//! Built once at startup from a [`PlanSource`](crate::ports::PlanSource) and
//! injected as `Arc<PlanCatalog>`. Construction fails if the configured
//! default plan is absent, so a running service always has a fallback plan.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use super::{Limit, MeteredQuota, Plan};

/// Name of the free plan every tenant falls back to.
pub const DEFAULT_PLAN_NAME: &str = "Basic";

/// Errors building the catalog. All of them are fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("default plan '{name}' is not present in the plan catalog")]
    DefaultPlanMissing { name: String },

    #[error("plan '{0}' is defined more than once")]
    DuplicatePlan(String),

    #[error("plan '{name}' is invalid: {reason}")]
    InvalidPlan { name: String, reason: String },

    #[error("failed to load plans: {0}")]
    Source(String),
}

/// The set of known plans plus the designated default.
#[derive(Debug, Clone)]
pub struct PlanCatalog {
    plans: HashMap<String, Arc<Plan>>,
    default_plan: Arc<Plan>,
}

impl PlanCatalog {
    /// Builds a catalog, validating every plan and resolving the default.
    pub fn new(plans: Vec<Plan>, default_plan: &str) -> Result<Self, CatalogError> {
        let mut by_name = HashMap::with_capacity(plans.len());
        for plan in plans {
            plan.validate().map_err(|e| CatalogError::InvalidPlan {
                name: plan.name.clone(),
                reason: e.to_string(),
            })?;
            let name = plan.name.clone();
            if by_name.insert(name.clone(), Arc::new(plan)).is_some() {
                return Err(CatalogError::DuplicatePlan(name));
            }
        }

        let default_plan = by_name
            .get(default_plan)
            .cloned()
            .ok_or_else(|| CatalogError::DefaultPlanMissing {
                name: default_plan.to_string(),
            })?;

        Ok(Self {
            plans: by_name,
            default_plan,
        })
    }

    /// Catalog of the three stock plans with `Basic` as default.
    pub fn seeded() -> Self {
        let default_plan = Arc::new(basic_plan());
        let mut by_name = HashMap::with_capacity(3);
        by_name.insert(default_plan.name.clone(), Arc::clone(&default_plan));
        for plan in [premium_plan(), enterprise_plan()] {
            by_name.insert(plan.name.clone(), Arc::new(plan));
        }
        Self {
            plans: by_name,
            default_plan,
        }
    }

    pub fn default_plan(&self) -> &Arc<Plan> {
        &self.default_plan
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Plan>> {
        self.plans.get(name)
    }

    /// All plans, cheapest first, ties broken by name.
    pub fn plans(&self) -> Vec<Arc<Plan>> {
        let mut plans: Vec<Arc<Plan>> = self.plans.values().cloned().collect();
        plans.sort_by(|a, b| a.price.cmp(&b.price).then_with(|| a.name.cmp(&b.name)));
        plans
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

fn basic_plan() -> Plan {
    Plan {
        name: DEFAULT_PLAN_NAME.to_string(),
        price: 0,
        annual_price: 0,
        features: vec![
            "1 active job posting".to_string(),
            "5 candidate matches".to_string(),
            "5 profile views per week".to_string(),
        ],
        max_jobs: Limit::Max(1),
        max_users: Limit::Max(1),
        candidate_matches_limit: Limit::Max(5),
        can_view_full_profile: false,
        has_advanced_analytics: false,
        weekly_profile_views: MeteredQuota::weekly(Limit::Max(5)),
    }
}

fn premium_plan() -> Plan {
    Plan {
        name: "Premium".to_string(),
        price: 1999,
        annual_price: 19999,
        features: vec![
            "5 active job postings".to_string(),
            "Unlimited candidate matches".to_string(),
            "Full candidate profiles".to_string(),
            "Advanced analytics".to_string(),
        ],
        max_jobs: Limit::Max(5),
        max_users: Limit::Max(5),
        candidate_matches_limit: Limit::Unlimited,
        can_view_full_profile: true,
        has_advanced_analytics: true,
        weekly_profile_views: MeteredQuota::weekly(Limit::Unlimited),
    }
}

fn enterprise_plan() -> Plan {
    Plan {
        name: "Enterprise".to_string(),
        price: 4999,
        annual_price: 49999,
        features: vec![
            "Unlimited job postings".to_string(),
            "Unlimited users".to_string(),
            "Full candidate profiles".to_string(),
            "Advanced analytics".to_string(),
        ],
        max_jobs: Limit::Unlimited,
        max_users: Limit::Unlimited,
        candidate_matches_limit: Limit::Unlimited,
        can_view_full_profile: true,
        has_advanced_analytics: true,
        weekly_profile_views: MeteredQuota::weekly(Limit::Unlimited),
    }
}

/// The stock plans: Basic, Premium and Enterprise.
pub fn seed_plans() -> Vec<Plan> {
    vec![basic_plan(), premium_plan(), enterprise_plan()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_catalog_defaults_to_basic() {
        let catalog = PlanCatalog::seeded();
        assert_eq!(catalog.default_plan().name, "Basic");
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn seeded_basic_matches_stock_limits() {
        let catalog = PlanCatalog::seeded();
        let basic = catalog.get("Basic").unwrap();
        assert_eq!(basic.max_jobs, Limit::Max(1));
        assert_eq!(basic.weekly_profile_views.limit, Limit::Max(5));
        assert!(!basic.can_view_full_profile);
    }

    #[test]
    fn new_matches_seeded() {
        let catalog = PlanCatalog::new(seed_plans(), DEFAULT_PLAN_NAME).unwrap();
        let seeded = PlanCatalog::seeded();
        for plan in seeded.plans() {
            assert_eq!(catalog.get(&plan.name).map(|p| p.as_ref()), Some(plan.as_ref()));
        }
    }

    #[test]
    fn missing_default_is_rejected() {
        let plans: Vec<Plan> = seed_plans().into_iter().filter(|p| p.name != "Basic").collect();
        let err = PlanCatalog::new(plans, "Basic").unwrap_err();
        assert_eq!(
            err,
            CatalogError::DefaultPlanMissing {
                name: "Basic".to_string()
            }
        );
    }

    #[test]
    fn duplicate_plan_is_rejected() {
        let mut plans = seed_plans();
        plans.push(basic_plan());
        let err = PlanCatalog::new(plans, "Basic").unwrap_err();
        assert_eq!(err, CatalogError::DuplicatePlan("Basic".to_string()));
    }

    #[test]
    fn invalid_plan_is_rejected() {
        let mut plans = seed_plans();
        plans[1].weekly_profile_views.window_days = 0;
        assert!(matches!(
            PlanCatalog::new(plans, "Basic"),
            Err(CatalogError::InvalidPlan { .. })
        ));
    }

    #[test]
    fn plans_are_listed_cheapest_first() {
        let names: Vec<String> = PlanCatalog::seeded()
            .plans()
            .iter()
            .map(|p| p.name.clone())
            .collect();
        assert_eq!(names, vec!["Basic", "Premium", "Enterprise"]);
    }
}
