//! Entitlement-specific error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | Unauthenticated | 401 |
//! | PlanNotFound | 500 |
//! | MissingResourceCount | 500 |
//! | ValidationFailed | 400 |
//! | Infrastructure | 500 |
//!
//! A subscription naming an unknown plan is a data error on our side, hence
//! 500 rather than 404.

use crate::domain::foundation::{DomainError, ErrorCode};

use super::CappedResource;

/// Entitlement errors. Denials are not errors; see `GateResult`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntitlementError {
    /// No caller identity on the request.
    Unauthenticated,

    /// A subscription references a plan the catalog does not know.
    PlanNotFound(String),

    /// A capped check had neither a supplied count nor a counter.
    MissingResourceCount(CappedResource),

    ValidationFailed { field: String, message: String },

    Infrastructure(String),
}

impl EntitlementError {
    pub fn plan_not_found(name: impl Into<String>) -> Self {
        EntitlementError::PlanNotFound(name.into())
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        EntitlementError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        EntitlementError::Infrastructure(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            EntitlementError::Unauthenticated => ErrorCode::Unauthorized,
            EntitlementError::PlanNotFound(_) => ErrorCode::PlanNotFound,
            EntitlementError::MissingResourceCount(_) => ErrorCode::MissingResourceCount,
            EntitlementError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            EntitlementError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    pub fn message(&self) -> String {
        match self {
            EntitlementError::Unauthenticated => "Authentication required".to_string(),
            EntitlementError::PlanNotFound(name) => {
                format!("Plan '{}' is not in the plan catalog", name)
            }
            EntitlementError::MissingResourceCount(resource) => {
                format!("No current count available for '{}'", resource.as_str())
            }
            EntitlementError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            EntitlementError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }
}

impl std::fmt::Display for EntitlementError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for EntitlementError {}

impl From<DomainError> for EntitlementError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::PlanNotFound => EntitlementError::PlanNotFound(
                err.details
                    .get("plan")
                    .cloned()
                    .unwrap_or_else(|| err.message.clone()),
            ),
            ErrorCode::Unauthorized => EntitlementError::Unauthenticated,
            ErrorCode::ValidationFailed
            | ErrorCode::EmptyField
            | ErrorCode::OutOfRange
            | ErrorCode::InvalidFormat => EntitlementError::ValidationFailed {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            _ => EntitlementError::Infrastructure(err.to_string()),
        }
    }
}

impl From<EntitlementError> for DomainError {
    fn from(err: EntitlementError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}
