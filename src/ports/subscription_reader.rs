//! Subscription reader port.
//!
//! The resolver only ever asks one question of subscription storage: what is
//! the subscription row for this subject. Whether that row is effectively
//! active is decided in the domain, not in storage.

use async_trait::async_trait;

use crate::domain::entitlement::{Subscription, SubscriptionSubject};
use crate::domain::foundation::DomainError;

/// Read access to subscription rows.
#[async_trait]
pub trait SubscriptionReader: Send + Sync {
    /// Returns the subscription row for a subject, whatever its status.
    ///
    /// Returns `None` if the subject never subscribed.
    async fn find_by_subject(
        &self,
        subject: &SubscriptionSubject,
    ) -> Result<Option<Subscription>, DomainError>;
}
