//! GetUsageSummaryHandler - Query handler for current-window metered usage.

use std::sync::Arc;

use crate::application::{EntitlementService, UsageSummary};
use crate::domain::entitlement::EntitlementError;
use crate::domain::foundation::{Caller, Timestamp};

/// Query for the caller's metered usage.
#[derive(Debug, Clone)]
pub struct GetUsageSummaryQuery {
    pub caller: Caller,
    pub at: Option<Timestamp>,
}

impl GetUsageSummaryQuery {
    pub fn now(caller: Caller) -> Self {
        Self { caller, at: None }
    }
}

/// Handler for usage summaries. Read-only: never reserves or commits.
pub struct GetUsageSummaryHandler {
    service: Arc<EntitlementService>,
}

impl GetUsageSummaryHandler {
    pub fn new(service: Arc<EntitlementService>) -> Self {
        Self { service }
    }

    pub async fn handle(&self, query: GetUsageSummaryQuery) -> Result<UsageSummary, EntitlementError> {
        let at = query.at.unwrap_or_else(Timestamp::now);
        self.service.usage_summary_at(&query.caller, at).await
    }
}
