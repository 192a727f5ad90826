//! In-memory subscription store.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::entitlement::{Subscription, SubscriptionSubject};
use crate::domain::foundation::DomainError;
use crate::ports::{SubscriptionReader, SubscriptionRepository};

/// Holds at most one subscription per subject, like the unique index in
/// Postgres.
#[derive(Debug, Default)]
pub struct InMemorySubscriptionStore {
    rows: RwLock<HashMap<SubscriptionSubject, Subscription>>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store pre-populated with the given rows. Later rows replace
    /// earlier rows of the same subject.
    pub fn with_subscriptions(subscriptions: Vec<Subscription>) -> Self {
        let rows = subscriptions
            .into_iter()
            .map(|s| (s.subject, s))
            .collect::<HashMap<_, _>>();
        Self {
            rows: RwLock::new(rows),
        }
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }
}

#[async_trait]
impl SubscriptionReader for InMemorySubscriptionStore {
    async fn find_by_subject(
        &self,
        subject: &SubscriptionSubject,
    ) -> Result<Option<Subscription>, DomainError> {
        Ok(self.rows.read().await.get(subject).cloned())
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionStore {
    async fn upsert(&self, subscription: &Subscription) -> Result<(), DomainError> {
        self.rows
            .write()
            .await
            .insert(subscription.subject, subscription.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entitlement::{BillingCycle, SubscriptionStatus};
    use crate::domain::foundation::{TenantId, Timestamp};

    fn subscription(tenant: TenantId, plan: &str) -> Subscription {
        Subscription::activate(
            SubscriptionSubject::Tenant(tenant),
            plan,
            Timestamp::now(),
            BillingCycle::Monthly,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn upsert_replaces_row_of_same_subject() {
        let store = InMemorySubscriptionStore::new();
        let tenant = TenantId::new();

        store.upsert(&subscription(tenant, "Premium")).await.unwrap();
        store.upsert(&subscription(tenant, "Enterprise")).await.unwrap();

        let found = store
            .find_by_subject(&SubscriptionSubject::Tenant(tenant))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.plan_name, "Enterprise");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn unknown_subject_is_none() {
        let store = InMemorySubscriptionStore::new();
        let found = store
            .find_by_subject(&SubscriptionSubject::Tenant(TenantId::new()))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn returns_stored_status_untouched() {
        let tenant = TenantId::new();
        let mut cancelled = subscription(tenant, "Premium");
        cancelled.cancel().unwrap();
        let store = InMemorySubscriptionStore::with_subscriptions(vec![cancelled]);

        let found = store
            .find_by_subject(&SubscriptionSubject::Tenant(tenant))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.status, SubscriptionStatus::Cancelled);
    }
}
