//! Entitlement resolver.
//!
//! Picks the single plan in force for a caller by asking an ordered list of
//! strategies. The first strategy that produces a plan wins; if none does,
//! the catalog's default plan applies. Default order:
//!
//! 1. `StaffOverride` - non-billable roles get an unlimited synthetic plan
//! 2. `DirectSubscriptionStrategy` - the tenant's own active subscription
//! 3. `OrganizationSubscriptionStrategy` - the tenant's organization's active subscription
//!
//! Resolution is a pure read and nothing is cached between tiers.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::domain::entitlement::{
    EntitlementError, EntitlementSource, Plan, PlanCatalog, ResolvedPlan, Subscription,
    SubscriptionSubject, STAFF_PLAN_NAME,
};
use crate::domain::foundation::{Caller, Timestamp};
use crate::ports::{OrganizationReader, SubscriptionReader};

/// One tier of plan resolution.
#[async_trait]
pub trait ResolutionStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Returns a plan if this tier applies to the caller, `None` to fall through.
    async fn resolve(
        &self,
        caller: &Caller,
        now: Timestamp,
    ) -> Result<Option<ResolvedPlan>, EntitlementError>;
}

/// Looks up the catalog plan a subscription names.
fn plan_for(catalog: &PlanCatalog, subscription: &Subscription) -> Result<Arc<Plan>, EntitlementError> {
    catalog
        .get(&subscription.plan_name)
        .cloned()
        .ok_or_else(|| EntitlementError::plan_not_found(&subscription.plan_name))
}

// ════════════════════════════════════════════════════════════════════════════════
// Strategies
// ════════════════════════════════════════════════════════════════════════════════

/// Staff callers bypass every limit.
pub struct StaffOverride {
    plan: Arc<Plan>,
}

impl StaffOverride {
    pub fn new() -> Self {
        Self {
            plan: Arc::new(Plan::unlimited(STAFF_PLAN_NAME)),
        }
    }
}

impl Default for StaffOverride {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResolutionStrategy for StaffOverride {
    fn name(&self) -> &'static str {
        "staff_override"
    }

    async fn resolve(
        &self,
        caller: &Caller,
        _now: Timestamp,
    ) -> Result<Option<ResolvedPlan>, EntitlementError> {
        if caller.role.is_billable() {
            return Ok(None);
        }
        Ok(Some(ResolvedPlan::new(
            Arc::clone(&self.plan),
            EntitlementSource::Staff,
        )))
    }
}

/// The tenant's own subscription.
pub struct DirectSubscriptionStrategy {
    catalog: Arc<PlanCatalog>,
    subscriptions: Arc<dyn SubscriptionReader>,
}

impl DirectSubscriptionStrategy {
    pub fn new(catalog: Arc<PlanCatalog>, subscriptions: Arc<dyn SubscriptionReader>) -> Self {
        Self {
            catalog,
            subscriptions,
        }
    }
}

#[async_trait]
impl ResolutionStrategy for DirectSubscriptionStrategy {
    fn name(&self) -> &'static str {
        "direct_subscription"
    }

    async fn resolve(
        &self,
        caller: &Caller,
        now: Timestamp,
    ) -> Result<Option<ResolvedPlan>, EntitlementError> {
        let subject = SubscriptionSubject::Tenant(caller.tenant_id);
        let Some(subscription) = self.subscriptions.find_by_subject(&subject).await? else {
            return Ok(None);
        };
        if !subscription.is_effectively_active(now) {
            debug!(
                tenant_id = %caller.tenant_id,
                status = %subscription.effective_status(now),
                "Direct subscription not in force"
            );
            return Ok(None);
        }
        let plan = plan_for(&self.catalog, &subscription)?;
        Ok(Some(ResolvedPlan::new(
            plan,
            EntitlementSource::DirectSubscription {
                subscription_id: subscription.id,
                ends_at: subscription.end_date,
            },
        )))
    }
}

/// The subscription of the organization the tenant belongs to.
pub struct OrganizationSubscriptionStrategy {
    catalog: Arc<PlanCatalog>,
    organizations: Arc<dyn OrganizationReader>,
    subscriptions: Arc<dyn SubscriptionReader>,
}

impl OrganizationSubscriptionStrategy {
    pub fn new(
        catalog: Arc<PlanCatalog>,
        organizations: Arc<dyn OrganizationReader>,
        subscriptions: Arc<dyn SubscriptionReader>,
    ) -> Self {
        Self {
            catalog,
            organizations,
            subscriptions,
        }
    }
}

#[async_trait]
impl ResolutionStrategy for OrganizationSubscriptionStrategy {
    fn name(&self) -> &'static str {
        "organization_subscription"
    }

    async fn resolve(
        &self,
        caller: &Caller,
        now: Timestamp,
    ) -> Result<Option<ResolvedPlan>, EntitlementError> {
        let Some(organization_id) = self.organizations.organization_of(&caller.tenant_id).await?
        else {
            return Ok(None);
        };
        let subject = SubscriptionSubject::Organization(organization_id);
        let Some(subscription) = self.subscriptions.find_by_subject(&subject).await? else {
            return Ok(None);
        };
        if !subscription.is_effectively_active(now) {
            debug!(
                tenant_id = %caller.tenant_id,
                organization_id = %organization_id,
                status = %subscription.effective_status(now),
                "Organization subscription not in force"
            );
            return Ok(None);
        }
        let plan = plan_for(&self.catalog, &subscription)?;
        Ok(Some(ResolvedPlan::new(
            plan,
            EntitlementSource::OrganizationSubscription {
                organization_id,
                subscription_id: subscription.id,
                ends_at: subscription.end_date,
            },
        )))
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Resolver
// ════════════════════════════════════════════════════════════════════════════════

/// Resolves the plan in force for a caller.
pub struct EntitlementResolver {
    catalog: Arc<PlanCatalog>,
    strategies: Vec<Box<dyn ResolutionStrategy>>,
}

impl EntitlementResolver {
    /// Resolver with the standard precedence: staff, direct, organization, default.
    pub fn new(
        catalog: Arc<PlanCatalog>,
        subscriptions: Arc<dyn SubscriptionReader>,
        organizations: Arc<dyn OrganizationReader>,
    ) -> Self {
        let strategies: Vec<Box<dyn ResolutionStrategy>> = vec![
            Box::new(StaffOverride::new()),
            Box::new(DirectSubscriptionStrategy::new(
                Arc::clone(&catalog),
                Arc::clone(&subscriptions),
            )),
            Box::new(OrganizationSubscriptionStrategy::new(
                Arc::clone(&catalog),
                organizations,
                subscriptions,
            )),
        ];
        Self::with_strategies(catalog, strategies)
    }

    /// Resolver with a custom strategy order. The catalog default still
    /// terminates the chain.
    pub fn with_strategies(
        catalog: Arc<PlanCatalog>,
        strategies: Vec<Box<dyn ResolutionStrategy>>,
    ) -> Self {
        Self {
            catalog,
            strategies,
        }
    }

    pub fn catalog(&self) -> &Arc<PlanCatalog> {
        &self.catalog
    }

    pub async fn resolve(
        &self,
        caller: &Caller,
        now: Timestamp,
    ) -> Result<ResolvedPlan, EntitlementError> {
        for strategy in &self.strategies {
            if let Some(resolved) = strategy.resolve(caller, now).await? {
                debug!(
                    tenant_id = %caller.tenant_id,
                    strategy = strategy.name(),
                    plan = %resolved.plan.name,
                    "Resolved plan"
                );
                return Ok(resolved);
            }
            debug!(
                tenant_id = %caller.tenant_id,
                strategy = strategy.name(),
                "No plan from strategy, falling through"
            );
        }

        Ok(ResolvedPlan::new(
            Arc::clone(self.catalog.default_plan()),
            EntitlementSource::Default,
        ))
    }
}
