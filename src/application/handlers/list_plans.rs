//! ListPlansHandler - Query handler for the plan catalog.

use std::sync::Arc;

use crate::domain::entitlement::{Plan, PlanCatalog};

/// Query for every plan on offer.
#[derive(Debug, Clone, Default)]
pub struct ListPlansQuery;

/// Plans, cheapest first, plus the default plan's name.
#[derive(Debug, Clone)]
pub struct ListPlansResult {
    pub plans: Vec<Arc<Plan>>,
    pub default_plan: String,
}

/// Handler for listing plans. Reads the in-memory catalog only.
pub struct ListPlansHandler {
    catalog: Arc<PlanCatalog>,
}

impl ListPlansHandler {
    pub fn new(catalog: Arc<PlanCatalog>) -> Self {
        Self { catalog }
    }

    pub fn handle(&self, _query: ListPlansQuery) -> ListPlansResult {
        ListPlansResult {
            plans: self.catalog.plans(),
            default_plan: self.catalog.default_plan().name.clone(),
        }
    }
}
