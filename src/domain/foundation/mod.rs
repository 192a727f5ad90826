//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, and error types
//! that form the vocabulary of the entitlement domain.

mod caller;
mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use caller::{Caller, Role};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{OrganizationId, SubscriptionId, TenantId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
