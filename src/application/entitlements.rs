//! EntitlementService - the public face of plan resolution and gating.
//!
//! Callers guard a protected operation in three steps:
//!
//! ```ignore
//! let decision = service.check_feature(&caller, feature, GateContext::default()).await?;
//! if let Some(message) = decision.user_message() {
//!     return Err(forbidden(message));
//! }
//! let outcome = protected_operation().await;
//! service.settle(&decision, &outcome).await?;
//! ```
//!
//! `settle` commits the metered unit on success and releases it on failure,
//! so usage only counts operations that actually happened.

use serde::Serialize;
use std::sync::Arc;

use super::feature_gate::{FeatureGate, MeteredUsage};
use super::resolver::EntitlementResolver;
use crate::domain::entitlement::{
    EntitlementError, EntitlementSource, Feature, GateContext, GateResult, MeteredFeature,
    PlanCatalog, ResolvedPlan, SettleOutcome, UsageReservation,
};
use crate::domain::foundation::{Caller, Timestamp};

/// Metered usage for a caller's resolved plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageSummary {
    pub plan_name: String,
    pub source: EntitlementSource,
    pub usage: Vec<MeteredUsage>,
}

/// Facade over the resolver and the feature gate.
pub struct EntitlementService {
    resolver: EntitlementResolver,
    gate: FeatureGate,
}

impl EntitlementService {
    pub fn new(resolver: EntitlementResolver, gate: FeatureGate) -> Self {
        Self { resolver, gate }
    }

    pub fn catalog(&self) -> &Arc<PlanCatalog> {
        self.resolver.catalog()
    }

    /// The plan currently in force for the caller.
    pub async fn resolve_plan(&self, caller: &Caller) -> Result<ResolvedPlan, EntitlementError> {
        self.resolve_plan_at(caller, Timestamp::now()).await
    }

    pub async fn resolve_plan_at(
        &self,
        caller: &Caller,
        now: Timestamp,
    ) -> Result<ResolvedPlan, EntitlementError> {
        self.resolver.resolve(caller, now).await
    }

    /// Resolves the caller's plan and checks one feature against it.
    ///
    /// An allowed metered check holds a reservation that must be settled.
    pub async fn check_feature(
        &self,
        caller: &Caller,
        feature: Feature,
        ctx: GateContext,
    ) -> Result<GateResult, EntitlementError> {
        self.check_feature_at(caller, feature, ctx, Timestamp::now())
            .await
    }

    pub async fn check_feature_at(
        &self,
        caller: &Caller,
        feature: Feature,
        ctx: GateContext,
        now: Timestamp,
    ) -> Result<GateResult, EntitlementError> {
        let resolved = self.resolver.resolve(caller, now).await?;
        self.gate
            .check(&caller.tenant_id, &resolved, feature, ctx, now)
            .await
    }

    /// Records the reserved unit as used. Call after the operation succeeded.
    pub async fn commit_metered_use(
        &self,
        reservation: &UsageReservation,
    ) -> Result<SettleOutcome, EntitlementError> {
        self.gate.commit(reservation).await
    }

    /// Hands the reserved unit back. Call after the operation failed.
    pub async fn release_metered_use(
        &self,
        reservation: &UsageReservation,
    ) -> Result<SettleOutcome, EntitlementError> {
        self.gate.release(reservation).await
    }

    /// Commits or releases the decision's reservation depending on how the
    /// protected operation ended.
    ///
    /// Returns `None` when the decision held no reservation.
    pub async fn settle<T, E>(
        &self,
        decision: &GateResult,
        outcome: &Result<T, E>,
    ) -> Result<Option<SettleOutcome>, EntitlementError> {
        let Some(reservation) = decision.reservation() else {
            return Ok(None);
        };
        let settled = match outcome {
            Ok(_) => self.commit_metered_use(reservation).await?,
            Err(_) => self.release_metered_use(reservation).await?,
        };
        Ok(Some(settled))
    }

    /// Current-window usage of every metered feature under the caller's plan.
    pub async fn usage_summary(&self, caller: &Caller) -> Result<UsageSummary, EntitlementError> {
        self.usage_summary_at(caller, Timestamp::now()).await
    }

    pub async fn usage_summary_at(
        &self,
        caller: &Caller,
        now: Timestamp,
    ) -> Result<UsageSummary, EntitlementError> {
        let resolved = self.resolver.resolve(caller, now).await?;
        let mut usage = Vec::with_capacity(MeteredFeature::ALL.len());
        for feature in MeteredFeature::ALL {
            usage.push(
                self.gate
                    .usage(&caller.tenant_id, &resolved, feature, now)
                    .await?,
            );
        }
        Ok(UsageSummary {
            plan_name: resolved.plan.name.clone(),
            source: resolved.source,
            usage,
        })
    }
}
