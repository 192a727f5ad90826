//! Startup catalog loading.

use tracing::info;

use crate::domain::entitlement::{CatalogError, PlanCatalog};
use crate::ports::PlanSource;

/// Loads plans from `source` and freezes them into a catalog.
///
/// Fails if the source fails or `default_plan` is not among the loaded plans.
pub async fn load_catalog(
    source: &dyn PlanSource,
    default_plan: &str,
) -> Result<PlanCatalog, CatalogError> {
    let plans = source.load_plans().await?;
    let catalog = PlanCatalog::new(plans, default_plan)?;
    info!(
        plans = catalog.len(),
        default_plan = %catalog.default_plan().name,
        "Plan catalog loaded"
    );
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entitlement::{seed_plans, Plan};
    use async_trait::async_trait;

    struct StaticSource(Vec<Plan>);

    #[async_trait]
    impl PlanSource for StaticSource {
        async fn load_plans(&self) -> Result<Vec<Plan>, CatalogError> {
            Ok(self.0.clone())
        }
    }

    struct BrokenSource;

    #[async_trait]
    impl PlanSource for BrokenSource {
        async fn load_plans(&self) -> Result<Vec<Plan>, CatalogError> {
            Err(CatalogError::Source("relation \"plans\" does not exist".to_string()))
        }
    }

    #[tokio::test]
    async fn loads_catalog_with_default() {
        let catalog = load_catalog(&StaticSource(seed_plans()), "Basic").await.unwrap();
        assert_eq!(catalog.default_plan().name, "Basic");
    }

    #[tokio::test]
    async fn missing_default_fails_startup() {
        let err = load_catalog(&StaticSource(seed_plans()), "Free").await.unwrap_err();
        assert_eq!(
            err,
            CatalogError::DefaultPlanMissing {
                name: "Free".to_string()
            }
        );
    }

    #[tokio::test]
    async fn source_failure_propagates() {
        let err = load_catalog(&BrokenSource, "Basic").await.unwrap_err();
        assert!(matches!(err, CatalogError::Source(_)));
    }
}
