//! Subscription record.
//!
//! A subscription binds exactly one subject (a tenant or an organization) to a
//! plan for a bounded period. Rows are written by the billing flow; the
//! resolver only reads them.
//!
//! # Design Decisions
//!
//! - **One subject per row**: `SubscriptionSubject` makes tenant/organization
//!   mutually exclusive by construction
//! - **One row per subject**: storage upserts by subject, a renewal replaces
//!   the prior row
//! - **Effective activeness is computed**: a row left `active` after its end
//!   date grants nothing

use serde::{Deserialize, Serialize};

use super::SubscriptionStatus;
use crate::domain::foundation::{
    OrganizationId, StateMachine, SubscriptionId, TenantId, Timestamp, ValidationError,
};

/// Who a subscription belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum SubscriptionSubject {
    Tenant(TenantId),
    Organization(OrganizationId),
}

/// Length of a paid period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    Monthly,
    Annual,
}

impl BillingCycle {
    pub fn days(&self) -> i64 {
        match self {
            BillingCycle::Monthly => 30,
            BillingCycle::Annual => 365,
        }
    }
}

/// Subscription row.
///
/// # Invariants
///
/// - `start_date < end_date`
/// - status only moves along [`SubscriptionStatus`] edges
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub subject: SubscriptionSubject,
    pub plan_name: String,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
    pub status: SubscriptionStatus,

    /// Gateway payment/order reference, if the billing flow recorded one.
    pub payment_reference: Option<String>,
}

impl Subscription {
    /// Starts a new active subscription for one billing cycle.
    pub fn activate(
        subject: SubscriptionSubject,
        plan_name: impl Into<String>,
        start: Timestamp,
        cycle: BillingCycle,
    ) -> Result<Self, ValidationError> {
        let plan_name = plan_name.into();
        if plan_name.trim().is_empty() {
            return Err(ValidationError::empty_field("plan_name"));
        }
        Ok(Self {
            id: SubscriptionId::new(),
            subject,
            plan_name,
            start_date: start,
            end_date: start.add_days(cycle.days()),
            status: SubscriptionStatus::Active,
            payment_reference: None,
        })
    }

    pub fn with_payment_reference(mut self, reference: impl Into<String>) -> Self {
        self.payment_reference = Some(reference.into());
        self
    }

    /// Status as of `now`: an `Active` row past its end date reads as `Expired`.
    pub fn effective_status(&self, now: Timestamp) -> SubscriptionStatus {
        match self.status {
            SubscriptionStatus::Active if !now.is_before(&self.end_date) => {
                SubscriptionStatus::Expired
            }
            status => status,
        }
    }

    /// True iff status is active and `now < end_date`.
    pub fn is_effectively_active(&self, now: Timestamp) -> bool {
        self.effective_status(now) == SubscriptionStatus::Active
    }

    pub fn cancel(&mut self) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(SubscriptionStatus::Cancelled)?;
        Ok(())
    }

    pub fn expire(&mut self) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(SubscriptionStatus::Expired)?;
        Ok(())
    }

    /// Extends an active subscription by one cycle from its current end.
    pub fn renew(&mut self, cycle: BillingCycle) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(SubscriptionStatus::Active)?;
        self.end_date = self.end_date.add_days(cycle.days());
        Ok(())
    }
}
