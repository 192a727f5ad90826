//! HTTP integration tests: entitlement routes and the feature gate middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::Path;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use axum::{middleware, Router};
use serde_json::Value;
use tower::ServiceExt;

use entitlement_gate::adapters::http::{
    api_router, require_feature, EntitlementAppState, FeatureRequirement,
};
use entitlement_gate::adapters::in_memory::{
    InMemoryOrganizationDirectory, InMemorySubscriptionStore,
};
use entitlement_gate::adapters::InMemoryUsageLedger;
use entitlement_gate::application::{EntitlementResolver, EntitlementService, FeatureGate};
use entitlement_gate::domain::entitlement::{Feature, MeteredFeature, PlanCatalog, WindowPolicy};
use entitlement_gate::domain::foundation::{Caller, Role, TenantId};

// =============================================================================
// Test Infrastructure
// =============================================================================

async fn view_candidate(Path(id): Path<String>) -> Result<&'static str, StatusCode> {
    match id.as_str() {
        "missing" => Err(StatusCode::NOT_FOUND),
        "slow" => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("candidate profile")
        }
        _ => Ok("candidate profile"),
    }
}

fn app() -> Router {
    let resolver = EntitlementResolver::new(
        Arc::new(PlanCatalog::seeded()),
        Arc::new(InMemorySubscriptionStore::new()),
        Arc::new(InMemoryOrganizationDirectory::new()),
    );
    let gate = FeatureGate::new(Arc::new(InMemoryUsageLedger::new()), WindowPolicy::default());
    let service = Arc::new(EntitlementService::new(resolver, gate));

    let requirement = FeatureRequirement::new(
        service.clone(),
        Feature::Metered(MeteredFeature::ProfileViews),
    );
    let protected = Router::new()
        .route("/candidates/:id", get(view_candidate))
        .route_layer(middleware::from_fn_with_state(requirement, require_feature));

    api_router(EntitlementAppState::new(service)).merge(protected)
}

fn get_as(uri: &str, tenant: Option<TenantId>, role: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(tenant) = tenant {
        builder = builder.header("X-Tenant-Id", tenant.to_string());
    }
    if let Some(role) = role {
        builder = builder.header("X-Tenant-Role", role);
    }
    builder.body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

// =============================================================================
// Entitlement Routes
// =============================================================================

#[tokio::test]
async fn lists_plans_cheapest_first() {
    let app = app();
    let (status, body) = send(&app, get_as("/api/plans", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["default_plan"], "Basic");
    let names: Vec<&str> = body["plans"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Basic", "Premium", "Enterprise"]);
}

#[tokio::test]
async fn active_plan_requires_identity() {
    let app = app();
    let (status, body) = send(&app, get_as("/api/entitlements/plan", None, None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn tenant_without_subscription_gets_default_plan() {
    let app = app();
    let (status, body) = send(
        &app,
        get_as("/api/entitlements/plan", Some(TenantId::new()), None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["plan"]["name"], "Basic");
    assert_eq!(body["source"]["type"], "default");
}

#[tokio::test]
async fn staff_caller_from_auth_layer_gets_unlimited_plan() {
    let app = app();
    let mut request = get_as("/api/entitlements/plan", None, None);
    request
        .extensions_mut()
        .insert(Caller::new(TenantId::new(), Role::Admin));
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["plan"]["name"], "Admin Access");
    assert_eq!(body["plan"]["weekly_profile_views"], -1);
    assert_eq!(body["source"]["type"], "staff");
}

// =============================================================================
// Feature Gate Middleware
// =============================================================================

#[tokio::test]
async fn sixth_profile_view_is_forbidden_with_upgrade_prompt() {
    let app = app();
    let tenant = TenantId::new();

    for _ in 0..5 {
        let (status, _) = send(&app, get_as("/candidates/42", Some(tenant), None)).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, body) = send(&app, get_as("/candidates/42", Some(tenant), None)).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "QUOTA_EXHAUSTED");
    assert_eq!(body["plan"], "Basic");
    assert!(body["message"].as_str().unwrap().contains("'Basic'"));

    let (_, usage) = send(&app, get_as("/api/entitlements/usage", Some(tenant), None)).await;
    assert_eq!(usage["usage"][0]["used"], 5);
    assert_eq!(usage["usage"][0]["remaining"], 0);
}

#[tokio::test]
async fn failed_handler_releases_the_reservation() {
    let app = app();
    let tenant = TenantId::new();

    let (status, _) = send(&app, get_as("/candidates/missing", Some(tenant), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, usage) = send(&app, get_as("/api/entitlements/usage", Some(tenant), None)).await;
    assert_eq!(usage["usage"][0]["used"], 0);
    assert_eq!(usage["usage"][0]["reserved"], 0);
    assert_eq!(usage["usage"][0]["remaining"], 5);
}

#[tokio::test]
async fn staff_role_header_is_refused() {
    let app = app();
    let (status, body) = send(
        &app,
        get_as("/candidates/42", Some(TenantId::new()), Some("admin")),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "UNTRUSTED_ROLE");
}

#[tokio::test]
async fn cancelled_requests_give_their_reservation_back() {
    let app = app();
    let tenant = TenantId::new();

    for _ in 0..5 {
        let request = app
            .clone()
            .oneshot(get_as("/candidates/slow", Some(tenant), None));
        let timed_out = tokio::time::timeout(Duration::from_millis(20), request).await;
        assert!(timed_out.is_err());
    }
    // Releases run as spawned tasks once the request futures are dropped.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let (_, usage) = send(&app, get_as("/api/entitlements/usage", Some(tenant), None)).await;
    assert_eq!(usage["usage"][0]["used"], 0);
    assert_eq!(usage["usage"][0]["reserved"], 0);

    let (status, _) = send(&app, get_as("/candidates/42", Some(tenant), None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn gate_rejects_anonymous_requests() {
    let app = app();
    let (status, _) = send(&app, get_as("/candidates/42", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
