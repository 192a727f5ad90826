//! Subscription repository port (write side).
//!
//! Written by the billing flow after a verified payment. Subscriptions are
//! keyed by subject, so saving replaces whatever row the subject had.

use async_trait::async_trait;

use super::SubscriptionReader;
use crate::domain::entitlement::Subscription;
use crate::domain::foundation::DomainError;

/// Write access to subscription rows.
#[async_trait]
pub trait SubscriptionRepository: SubscriptionReader {
    /// Inserts the subscription, replacing any existing row for its subject.
    async fn upsert(&self, subscription: &Subscription) -> Result<(), DomainError>;
}
