//! Feature gate.
//!
//! Decides whether a tenant may use one feature under an already-resolved
//! plan:
//!
//! - **Capped** resources compare a live count against the plan's cap
//! - **Flags** are read straight off the plan
//! - **Metered** features reserve one unit in the usage ledger
//!
//! The gate is fail-closed for metered features: if the ledger cannot be
//! reached the request is denied, never waved through.

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::domain::entitlement::{
    AccessDeniedReason, CappedResource, ConsumeOutcome, EntitlementError, Feature, FlagFeature,
    GateContext, GateResult, Limit, MeteredFeature, ResolvedPlan, SettleOutcome,
    UsageReservation, UsageSnapshot, WindowPolicy,
};
use crate::domain::foundation::{TenantId, Timestamp};
use crate::ports::{ResourceCounter, UsageLedger, UsageLedgerError};

/// Usage of one metered feature in the current window.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MeteredUsage {
    pub feature: MeteredFeature,
    pub limit: Limit,
    pub used: u32,
    pub reserved: u32,
    /// `None` when unlimited.
    pub remaining: Option<u32>,
    pub window_start: Timestamp,
    pub resets_at: Timestamp,
}

/// Evaluates feature access for a resolved plan.
pub struct FeatureGate {
    ledger: Arc<dyn UsageLedger>,
    counter: Option<Arc<dyn ResourceCounter>>,
    window: WindowPolicy,
}

impl FeatureGate {
    pub fn new(ledger: Arc<dyn UsageLedger>, window: WindowPolicy) -> Self {
        Self {
            ledger,
            counter: None,
            window,
        }
    }

    /// Counter consulted for capped checks that arrive without a count.
    pub fn with_counter(mut self, counter: Arc<dyn ResourceCounter>) -> Self {
        self.counter = Some(counter);
        self
    }

    pub fn window_policy(&self) -> &WindowPolicy {
        &self.window
    }

    pub async fn check(
        &self,
        tenant: &TenantId,
        resolved: &ResolvedPlan,
        feature: Feature,
        ctx: GateContext,
        now: Timestamp,
    ) -> Result<GateResult, EntitlementError> {
        match feature {
            Feature::Capped(resource) => self.check_capped(tenant, resolved, resource, ctx).await,
            Feature::Flag(flag) => Ok(self.check_flag(tenant, resolved, flag)),
            Feature::Metered(metered) => Ok(self.check_metered(tenant, resolved, metered, now).await),
        }
    }

    async fn check_capped(
        &self,
        tenant: &TenantId,
        resolved: &ResolvedPlan,
        resource: CappedResource,
        ctx: GateContext,
    ) -> Result<GateResult, EntitlementError> {
        let plan = &resolved.plan;
        let Limit::Max(max) = plan.cap(resource) else {
            return Ok(GateResult::allowed(&plan.name));
        };

        let current = match (ctx.current_count, &self.counter) {
            (Some(count), _) => count,
            (None, Some(counter)) => counter.current_count(tenant, resource).await?,
            (None, None) => return Err(EntitlementError::MissingResourceCount(resource)),
        };

        if current < max {
            return Ok(GateResult::allowed(&plan.name));
        }

        info!(
            tenant_id = %tenant,
            plan = %plan.name,
            feature = resource.as_str(),
            limit = max,
            current,
            "Resource cap reached"
        );
        Ok(GateResult::denied(
            &plan.name,
            AccessDeniedReason::ResourceCapReached {
                plan: plan.name.clone(),
                resource,
                limit: max,
                current,
            },
        ))
    }

    fn check_flag(&self, tenant: &TenantId, resolved: &ResolvedPlan, flag: FlagFeature) -> GateResult {
        let plan = &resolved.plan;
        if plan.flag(flag) {
            return GateResult::allowed(&plan.name);
        }

        info!(
            tenant_id = %tenant,
            plan = %plan.name,
            feature = flag.as_str(),
            "Feature not included in plan"
        );
        GateResult::denied(
            &plan.name,
            AccessDeniedReason::FeatureNotIncluded {
                plan: plan.name.clone(),
                feature: flag,
            },
        )
    }

    async fn check_metered(
        &self,
        tenant: &TenantId,
        resolved: &ResolvedPlan,
        feature: MeteredFeature,
        now: Timestamp,
    ) -> GateResult {
        let plan = &resolved.plan;
        let quota = plan.quota(feature);
        let Limit::Max(limit) = quota.limit else {
            return GateResult::allowed(&plan.name);
        };

        let window_start = self.window.window_start(now, quota.window_days);
        let exhausted = || {
            info!(
                tenant_id = %tenant,
                plan = %plan.name,
                feature = feature.as_str(),
                limit,
                "Metered quota exhausted"
            );
            GateResult::denied(
                &plan.name,
                AccessDeniedReason::QuotaExhausted {
                    plan: plan.name.clone(),
                    feature,
                    limit,
                    window_days: quota.window_days,
                    resets_at: self.window.window_end(now, quota.window_days),
                },
            )
        };

        if limit == 0 {
            return exhausted();
        }

        match self
            .ledger
            .try_consume(tenant, feature, limit, window_start)
            .await
        {
            Ok(ConsumeOutcome::Reserved(reservation)) => GateResult::reserved(&plan.name, reservation),
            Ok(ConsumeOutcome::Exhausted) => exhausted(),
            Err(e) => {
                error!(
                    tenant_id = %tenant,
                    plan = %plan.name,
                    feature = feature.as_str(),
                    error = %e,
                    "Usage ledger unavailable, denying metered access"
                );
                GateResult::denied(
                    &plan.name,
                    AccessDeniedReason::UsageUnavailable {
                        plan: plan.name.clone(),
                        feature,
                    },
                )
            }
        }
    }

    /// Records a reserved unit as used.
    pub async fn commit(&self, reservation: &UsageReservation) -> Result<SettleOutcome, EntitlementError> {
        let outcome = self
            .ledger
            .commit(reservation)
            .await
            .map_err(|e| settle_error("commit", reservation, e))?;
        if outcome == SettleOutcome::WindowRolledOver {
            warn!(
                tenant_id = %reservation.tenant_id,
                feature = reservation.feature.as_str(),
                window_start = %reservation.window_start,
                "Window rolled over before commit; use not recorded"
            );
        }
        Ok(outcome)
    }

    /// Returns a reserved unit after the protected operation failed.
    pub async fn release(&self, reservation: &UsageReservation) -> Result<SettleOutcome, EntitlementError> {
        self.ledger
            .release(reservation)
            .await
            .map_err(|e| settle_error("release", reservation, e))
    }

    /// Current window usage of one metered feature under a plan.
    pub async fn usage(
        &self,
        tenant: &TenantId,
        resolved: &ResolvedPlan,
        feature: MeteredFeature,
        now: Timestamp,
    ) -> Result<MeteredUsage, EntitlementError> {
        let quota = resolved.plan.quota(feature);
        let window_start = self.window.window_start(now, quota.window_days);
        let snapshot = match quota.limit {
            Limit::Unlimited => UsageSnapshot::empty(window_start),
            Limit::Max(_) => self
                .ledger
                .snapshot(tenant, feature, window_start)
                .await
                .map_err(|e| EntitlementError::infrastructure(e.to_string()))?,
        };
        Ok(MeteredUsage {
            feature,
            limit: quota.limit,
            used: snapshot.used,
            reserved: snapshot.reserved,
            remaining: snapshot.remaining(quota.limit),
            window_start,
            resets_at: self.window.window_end(now, quota.window_days),
        })
    }
}

fn settle_error(action: &str, reservation: &UsageReservation, e: UsageLedgerError) -> EntitlementError {
    error!(
        tenant_id = %reservation.tenant_id,
        feature = reservation.feature.as_str(),
        error = %e,
        "Failed to {} metered use",
        action
    );
    EntitlementError::infrastructure(e.to_string())
}
