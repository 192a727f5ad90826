//! PostgreSQL plan source.
//!
//! Reads the `plans` table once at startup.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::entitlement::{CatalogError, Limit, MeteredQuota, Plan};
use crate::ports::PlanSource;

pub struct PostgresPlanSource {
    pool: PgPool,
}

impl PostgresPlanSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a plan.
#[derive(Debug, sqlx::FromRow)]
struct PlanRow {
    name: String,
    price: i32,
    annual_price: i32,
    features: Vec<String>,
    max_jobs: i32,
    max_users: i32,
    candidate_matches_limit: i32,
    can_view_full_profile: bool,
    has_advanced_analytics: bool,
    weekly_profile_views: i32,
    profile_views_window_days: i32,
}

impl TryFrom<PlanRow> for Plan {
    type Error = CatalogError;

    fn try_from(row: PlanRow) -> Result<Self, Self::Error> {
        let invalid = |reason: String| CatalogError::InvalidPlan {
            name: row.name.clone(),
            reason,
        };
        let limit = |column: &str, value: i32| {
            Limit::from_db(i64::from(value)).map_err(|e| invalid(format!("{}: {}", column, e)))
        };
        let unsigned = |column: &str, value: i32| {
            u32::try_from(value).map_err(|_| invalid(format!("{} is negative: {}", column, value)))
        };

        Ok(Plan {
            price: unsigned("price", row.price)?,
            annual_price: unsigned("annual_price", row.annual_price)?,
            max_jobs: limit("max_jobs", row.max_jobs)?,
            max_users: limit("max_users", row.max_users)?,
            candidate_matches_limit: limit("candidate_matches_limit", row.candidate_matches_limit)?,
            can_view_full_profile: row.can_view_full_profile,
            has_advanced_analytics: row.has_advanced_analytics,
            weekly_profile_views: MeteredQuota {
                limit: limit("weekly_profile_views", row.weekly_profile_views)?,
                window_days: unsigned("profile_views_window_days", row.profile_views_window_days)?,
            },
            features: row.features.clone(),
            name: row.name.clone(),
        })
    }
}

#[async_trait]
impl PlanSource for PostgresPlanSource {
    async fn load_plans(&self) -> Result<Vec<Plan>, CatalogError> {
        let rows: Vec<PlanRow> = sqlx::query_as(
            r#"
            SELECT name, price, annual_price, features,
                   max_jobs, max_users, candidate_matches_limit,
                   can_view_full_profile, has_advanced_analytics,
                   weekly_profile_views, profile_views_window_days
            FROM plans
            ORDER BY price, name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CatalogError::Source(format!("Failed to load plans: {}", e)))?;

        rows.into_iter().map(Plan::try_from).collect()
    }
}
