//! Plan source port.
//!
//! Plans are loaded once at startup and frozen into a `PlanCatalog`; sources
//! are never consulted per request.

use async_trait::async_trait;

use crate::domain::entitlement::{CatalogError, Plan};

/// Somewhere plan definitions can be loaded from.
#[async_trait]
pub trait PlanSource: Send + Sync {
    async fn load_plans(&self) -> Result<Vec<Plan>, CatalogError>;
}
