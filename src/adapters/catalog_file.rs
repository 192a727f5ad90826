//! YAML plan catalog file.
//!
//! ```yaml
//! plans:
//!   - name: Basic
//!     maxJobs: 1
//!     maxUsers: 1
//!     candidateMatchesLimit: 5
//!     canViewFullProfile: false
//!     hasAdvancedAnalytics: false
//!     weeklyProfileViews: { limit: 5 }
//! ```
//!
//! Limits use `-1` for unlimited, as in the database.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;

use crate::domain::entitlement::{CatalogError, Plan};
use crate::ports::PlanSource;

#[derive(Debug, Deserialize)]
struct CatalogFile {
    plans: Vec<Plan>,
}

/// Loads plans from a YAML file.
#[derive(Debug, Clone)]
pub struct YamlPlanSource {
    path: PathBuf,
}

impl YamlPlanSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn parse(contents: &str) -> Result<Vec<Plan>, CatalogError> {
        let file: CatalogFile = serde_yaml::from_str(contents)
            .map_err(|e| CatalogError::Source(format!("Invalid catalog file: {}", e)))?;
        Ok(file.plans)
    }
}

#[async_trait]
impl PlanSource for YamlPlanSource {
    async fn load_plans(&self) -> Result<Vec<Plan>, CatalogError> {
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            CatalogError::Source(format!(
                "Failed to read catalog file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        Self::parse(&contents)
    }
}
