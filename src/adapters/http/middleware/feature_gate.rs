//! Feature gate middleware.
//!
//! Wraps a route so it only runs when the caller's plan allows the feature:
//!
//! ```text
//! Request → resolve caller → check_feature ─ denied ──→ 403 + upgrade message
//!                                  │
//!                               allowed
//!                                  ↓
//!                               handler → 2xx: commit reservation
//!                                       → otherwise: release reservation
//!                                       → dropped: release reservation
//! ```
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, routing::get, middleware};
//!
//! let gate = FeatureRequirement::new(service.clone(), MeteredFeature::ProfileViews.into());
//! let app = Router::new()
//!     .route("/candidates/:id", get(view_profile))
//!     .route_layer(middleware::from_fn_with_state(gate, require_feature));
//! ```
//!
//! The gate decision is placed in the request extensions so handlers can read
//! the plan name.

use std::sync::Arc;

use tokio::runtime::Handle;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use super::caller::resolve_caller;
use crate::adapters::http::entitlement::{AccessDeniedResponse, EntitlementApiError};
use crate::application::EntitlementService;
use crate::domain::entitlement::{Feature, GateContext, GateOutcome, UsageReservation};

/// Middleware state: which feature a route needs.
#[derive(Clone)]
pub struct FeatureRequirement {
    service: Arc<EntitlementService>,
    feature: Feature,
}

impl FeatureRequirement {
    pub fn new(service: Arc<EntitlementService>, feature: Feature) -> Self {
        Self { service, feature }
    }

    pub fn feature(&self) -> Feature {
        self.feature
    }
}

/// Gates the wrapped handler on `requirement.feature`.
pub async fn require_feature(
    State(requirement): State<FeatureRequirement>,
    mut request: Request,
    next: Next,
) -> Response {
    let caller = match resolve_caller(request.extensions(), request.headers()) {
        Ok(caller) => caller,
        Err(rejection) => return rejection.into_response(),
    };

    let decision = match requirement
        .service
        .check_feature(&caller, requirement.feature, GateContext::default())
        .await
    {
        Ok(decision) => decision,
        Err(e) => return EntitlementApiError(e).into_response(),
    };

    let mut pending = match &decision.outcome {
        GateOutcome::Denied(reason) => {
            let body = AccessDeniedResponse::new(decision.plan_name.clone(), reason.clone());
            return (StatusCode::FORBIDDEN, Json(body)).into_response();
        }
        GateOutcome::Allowed => None,
        GateOutcome::Reserved(reservation) => Some(ReservationGuard::new(
            requirement.service.clone(),
            reservation.clone(),
        )),
    };

    request.extensions_mut().insert(decision);
    let response = next.run(request).await;

    if let Some(guard) = pending.take() {
        guard.settle(response.status()).await;
    }

    response
}

/// A reservation that has not been settled yet.
///
/// Dropping the guard (the request future was cancelled by a timeout or a
/// client disconnect) releases the unit on the runtime.
struct ReservationGuard {
    service: Arc<EntitlementService>,
    reservation: Option<UsageReservation>,
}

impl ReservationGuard {
    fn new(service: Arc<EntitlementService>, reservation: UsageReservation) -> Self {
        Self {
            service,
            reservation: Some(reservation),
        }
    }

    /// Commits on 2xx, releases otherwise. Disarms the guard.
    async fn settle(mut self, status: StatusCode) {
        let Some(reservation) = self.reservation.take() else {
            return;
        };
        let settled = if status.is_success() {
            self.service.commit_metered_use(&reservation).await
        } else {
            self.service.release_metered_use(&reservation).await
        };
        if let Err(e) = settled {
            tracing::error!(
                tenant_id = %reservation.tenant_id,
                feature = reservation.feature.as_str(),
                status = status.as_u16(),
                error = %e,
                "Failed to settle metered use"
            );
        }
    }
}

impl Drop for ReservationGuard {
    fn drop(&mut self) {
        let Some(reservation) = self.reservation.take() else {
            return;
        };
        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!(
                tenant_id = %reservation.tenant_id,
                feature = reservation.feature.as_str(),
                "No runtime to release abandoned reservation"
            );
            return;
        };
        let service = self.service.clone();
        runtime.spawn(async move {
            if let Err(e) = service.release_metered_use(&reservation).await {
                tracing::error!(
                    tenant_id = %reservation.tenant_id,
                    feature = reservation.feature.as_str(),
                    error = %e,
                    "Failed to release abandoned reservation"
                );
            }
        });
    }
}
