//! HTTP handlers for entitlement endpoints.

use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::handlers::{
    GetActivePlanHandler, GetActivePlanQuery, GetUsageSummaryHandler, GetUsageSummaryQuery,
    ListPlansHandler, ListPlansQuery,
};
use crate::application::EntitlementService;
use crate::domain::entitlement::EntitlementError;

use super::dto::{ActivePlanResponse, ErrorResponse, PlanListResponse, UsageSummaryResponse};
use crate::adapters::http::middleware::RequireCaller;

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for entitlement routes.
#[derive(Clone)]
pub struct EntitlementAppState {
    pub service: Arc<EntitlementService>,
}

impl EntitlementAppState {
    pub fn new(service: Arc<EntitlementService>) -> Self {
        Self { service }
    }

    pub fn list_plans_handler(&self) -> ListPlansHandler {
        ListPlansHandler::new(self.service.catalog().clone())
    }

    pub fn active_plan_handler(&self) -> GetActivePlanHandler {
        GetActivePlanHandler::new(self.service.clone())
    }

    pub fn usage_summary_handler(&self) -> GetUsageSummaryHandler {
        GetUsageSummaryHandler::new(self.service.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Query Handlers (GET endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/plans - List every plan on offer
pub async fn list_plans(State(state): State<EntitlementAppState>) -> impl IntoResponse {
    let result = state.list_plans_handler().handle(ListPlansQuery);
    Json(PlanListResponse::from(result))
}

/// GET /api/entitlements/plan - Plan in force for the caller
pub async fn get_active_plan(
    State(state): State<EntitlementAppState>,
    RequireCaller(caller): RequireCaller,
) -> Result<impl IntoResponse, EntitlementApiError> {
    let resolved = state
        .active_plan_handler()
        .handle(GetActivePlanQuery::now(caller))
        .await?;
    Ok(Json(ActivePlanResponse::from(resolved)))
}

/// GET /api/entitlements/usage - Metered usage in the current window
pub async fn get_usage(
    State(state): State<EntitlementAppState>,
    RequireCaller(caller): RequireCaller,
) -> Result<impl IntoResponse, EntitlementApiError> {
    let summary = state
        .usage_summary_handler()
        .handle(GetUsageSummaryQuery::now(caller))
        .await?;
    Ok(Json(UsageSummaryResponse::from(summary)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts entitlement errors to HTTP responses.
#[derive(Debug)]
pub struct EntitlementApiError(pub EntitlementError);

impl From<EntitlementError> for EntitlementApiError {
    fn from(err: EntitlementError) -> Self {
        Self(err)
    }
}

impl From<crate::domain::foundation::DomainError> for EntitlementApiError {
    fn from(err: crate::domain::foundation::DomainError) -> Self {
        Self(EntitlementError::from(err))
    }
}

impl IntoResponse for EntitlementApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_code) = match &self.0 {
            EntitlementError::Unauthenticated => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            EntitlementError::ValidationFailed { .. } => {
                (StatusCode::BAD_REQUEST, "VALIDATION_FAILED")
            }
            EntitlementError::PlanNotFound(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "PLAN_NOT_FOUND")
            }
            EntitlementError::MissingResourceCount(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "MISSING_RESOURCE_COUNT")
            }
            EntitlementError::Infrastructure(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        if status.is_server_error() {
            tracing::error!(code = error_code, error = %self.0, "Entitlement request failed");
        }

        let body = ErrorResponse::new(error_code, self.0.message());
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entitlement::CappedResource;

    #[test]
    fn plan_not_found_is_server_error() {
        let response = EntitlementApiError(EntitlementError::plan_not_found("Gold")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn validation_is_bad_request() {
        let response =
            EntitlementApiError(EntitlementError::validation("tenant_id", "bad")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn missing_count_is_server_error() {
        let response =
            EntitlementApiError(EntitlementError::MissingResourceCount(CappedResource::Users))
                .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unauthenticated_is_401() {
        let response = EntitlementApiError(EntitlementError::Unauthenticated).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
