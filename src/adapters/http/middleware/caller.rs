//! Caller identity extraction.
//!
//! Authentication runs upstream. It either inserts a [`Caller`] into the
//! request extensions or forwards the identity in headers:
//!
//! - `X-Tenant-Id` - tenant UUID (required)
//! - `X-Tenant-Role` - role name, defaults to `school`
//!
//! Extensions win over headers. Headers are whatever the client sent, so
//! they can only name the billable `school` role; staff identities must come
//! through extensions.

use axum::{
    http::{Extensions, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::domain::foundation::{Caller, Role, TenantId};

pub const TENANT_ID_HEADER: &str = "X-Tenant-Id";
pub const TENANT_ROLE_HEADER: &str = "X-Tenant-Role";

/// Reads the caller from extensions, falling back to identity headers.
pub fn resolve_caller(
    extensions: &Extensions,
    headers: &HeaderMap,
) -> Result<Caller, CallerRejection> {
    if let Some(caller) = extensions.get::<Caller>() {
        return Ok(*caller);
    }

    let tenant_id = headers
        .get(TENANT_ID_HEADER)
        .ok_or(CallerRejection::Unauthenticated)?
        .to_str()
        .map_err(|_| CallerRejection::InvalidHeader(TENANT_ID_HEADER))?
        .parse::<TenantId>()
        .map_err(|_| CallerRejection::InvalidHeader(TENANT_ID_HEADER))?;

    let role = match headers.get(TENANT_ROLE_HEADER) {
        None => Role::School,
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|s| s.parse::<Role>().ok())
            .ok_or(CallerRejection::InvalidHeader(TENANT_ROLE_HEADER))?,
    };
    if !role.is_billable() {
        return Err(CallerRejection::UntrustedRole(role));
    }

    Ok(Caller::new(tenant_id, role))
}

/// Extractor that requires a caller identity.
///
/// ```ignore
/// async fn my_handler(RequireCaller(caller): RequireCaller) -> impl IntoResponse {
///     format!("tenant {}", caller.tenant_id)
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RequireCaller(pub Caller);

impl<S> axum::extract::FromRequestParts<S> for RequireCaller
where
    S: Send + Sync,
{
    type Rejection = CallerRejection;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut axum::http::request::Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move { resolve_caller(&parts.extensions, &parts.headers).map(RequireCaller) })
    }
}

/// Rejection type for missing or malformed caller identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallerRejection {
    /// Neither extensions nor headers carried an identity.
    Unauthenticated,
    /// An identity header was present but unparseable.
    InvalidHeader(&'static str),
    /// A non-billable role was asserted through a header.
    UntrustedRole(Role),
}

impl IntoResponse for CallerRejection {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            CallerRejection::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHENTICATED",
                "Authentication required".to_string(),
            ),
            CallerRejection::InvalidHeader(header) => (
                StatusCode::BAD_REQUEST,
                "INVALID_IDENTITY",
                format!("Invalid {} header", header),
            ),
            CallerRejection::UntrustedRole(role) => (
                StatusCode::FORBIDDEN,
                "UNTRUSTED_ROLE",
                format!("Role '{}' cannot be asserted by header", role),
            ),
        };

        (
            status,
            Json(serde_json::json!({
                "code": code,
                "message": message
            })),
        )
            .into_response()
    }
}
