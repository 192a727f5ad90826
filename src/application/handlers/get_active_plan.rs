//! GetActivePlanHandler - Query handler for the caller's plan in force.

use std::sync::Arc;

use crate::application::EntitlementService;
use crate::domain::entitlement::{EntitlementError, ResolvedPlan};
use crate::domain::foundation::{Caller, Timestamp};

/// Query for the plan governing a caller.
#[derive(Debug, Clone)]
pub struct GetActivePlanQuery {
    pub caller: Caller,
    /// Evaluation instant; defaults to now.
    pub at: Option<Timestamp>,
}

impl GetActivePlanQuery {
    pub fn now(caller: Caller) -> Self {
        Self { caller, at: None }
    }
}

/// Handler for resolving the caller's plan.
pub struct GetActivePlanHandler {
    service: Arc<EntitlementService>,
}

impl GetActivePlanHandler {
    pub fn new(service: Arc<EntitlementService>) -> Self {
        Self { service }
    }

    pub async fn handle(&self, query: GetActivePlanQuery) -> Result<ResolvedPlan, EntitlementError> {
        let at = query.at.unwrap_or_else(Timestamp::now);
        self.service.resolve_plan_at(&query.caller, at).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::in_memory::{InMemoryOrganizationDirectory, InMemorySubscriptionStore};
    use crate::adapters::usage_ledger::InMemoryUsageLedger;
    use crate::application::{EntitlementResolver, FeatureGate};
    use crate::domain::entitlement::{
        BillingCycle, EntitlementSource, PlanCatalog, Subscription, SubscriptionSubject,
        WindowPolicy,
    };
    use crate::domain::foundation::TenantId;

    fn handler(subscriptions: InMemorySubscriptionStore) -> GetActivePlanHandler {
        let resolver = EntitlementResolver::new(
            Arc::new(PlanCatalog::seeded()),
            Arc::new(subscriptions),
            Arc::new(InMemoryOrganizationDirectory::new()),
        );
        let gate = FeatureGate::new(Arc::new(InMemoryUsageLedger::new()), WindowPolicy::default());
        GetActivePlanHandler::new(Arc::new(EntitlementService::new(resolver, gate)))
    }

    #[tokio::test]
    async fn returns_direct_subscription_plan() {
        let tenant = TenantId::new();
        let start = Timestamp::from_unix_secs(1_704_067_200).unwrap();
        let store = InMemorySubscriptionStore::with_subscriptions(vec![Subscription::activate(
            SubscriptionSubject::Tenant(tenant),
            "Enterprise",
            start,
            BillingCycle::Monthly,
        )
        .unwrap()]);

        let resolved = handler(store)
            .handle(GetActivePlanQuery {
                caller: Caller::school(tenant),
                at: Some(start.add_days(10)),
            })
            .await
            .unwrap();

        assert_eq!(resolved.plan.name, "Enterprise");
        assert!(matches!(resolved.source, EntitlementSource::DirectSubscription { .. }));
    }

    #[tokio::test]
    async fn returns_default_after_expiry() {
        let tenant = TenantId::new();
        let start = Timestamp::from_unix_secs(1_704_067_200).unwrap();
        let store = InMemorySubscriptionStore::with_subscriptions(vec![Subscription::activate(
            SubscriptionSubject::Tenant(tenant),
            "Enterprise",
            start,
            BillingCycle::Monthly,
        )
        .unwrap()]);

        let resolved = handler(store)
            .handle(GetActivePlanQuery {
                caller: Caller::school(tenant),
                at: Some(start.add_days(31)),
            })
            .await
            .unwrap();

        assert_eq!(resolved.plan.name, "Basic");
    }
}
