//! Gated feature identifiers.
//!
//! Every gated operation names exactly one feature, and the feature's kind
//! decides how the gate evaluates it: hard caps compare a live resource
//! count, flags are plain booleans, metered features go through the usage
//! ledger.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Resources limited by a hard cap on concurrent count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CappedResource {
    /// Open job postings.
    JobPostings,
    /// User seats on the tenant account.
    Users,
    /// Candidate matches surfaced per requirement.
    CandidateMatches,
}

impl CappedResource {
    pub const ALL: [CappedResource; 3] = [
        CappedResource::JobPostings,
        CappedResource::Users,
        CappedResource::CandidateMatches,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CappedResource::JobPostings => "job_postings",
            CappedResource::Users => "users",
            CappedResource::CandidateMatches => "candidate_matches",
        }
    }

    /// Noun phrase used in upgrade prompts ("allows for 1 active job posting(s)").
    pub fn noun(&self) -> &'static str {
        match self {
            CappedResource::JobPostings => "active job posting(s)",
            CappedResource::Users => "user account(s)",
            CappedResource::CandidateMatches => "candidate match(es)",
        }
    }
}

/// Boolean plan features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagFeature {
    /// Unrestricted access to full candidate profiles.
    FullProfileView,
    /// Advanced analytics dashboard.
    AdvancedAnalytics,
}

impl FlagFeature {
    pub const ALL: [FlagFeature; 2] = [FlagFeature::FullProfileView, FlagFeature::AdvancedAnalytics];

    pub fn as_str(&self) -> &'static str {
        match self {
            FlagFeature::FullProfileView => "full_profile_view",
            FlagFeature::AdvancedAnalytics => "advanced_analytics",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            FlagFeature::FullProfileView => "full candidate profiles",
            FlagFeature::AdvancedAnalytics => "the advanced analytics dashboard",
        }
    }
}

/// Features metered against a quota that resets every window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeteredFeature {
    /// Candidate profile views.
    ProfileViews,
}

impl MeteredFeature {
    pub const ALL: [MeteredFeature; 1] = [MeteredFeature::ProfileViews];

    /// Ledger key segment; stable, persisted.
    pub fn as_str(&self) -> &'static str {
        match self {
            MeteredFeature::ProfileViews => "profile_views",
        }
    }

    pub fn noun(&self) -> &'static str {
        match self {
            MeteredFeature::ProfileViews => "profile views",
        }
    }
}

impl FromStr for MeteredFeature {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MeteredFeature::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| {
                ValidationError::invalid_format("metered_feature", format!("unknown '{}'", s))
            })
    }
}

/// A gated feature of any kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum Feature {
    Capped(CappedResource),
    Flag(FlagFeature),
    Metered(MeteredFeature),
}

impl Feature {
    pub fn is_metered(&self) -> bool {
        matches!(self, Feature::Metered(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Feature::Capped(r) => r.as_str(),
            Feature::Flag(f) => f.as_str(),
            Feature::Metered(m) => m.as_str(),
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<CappedResource> for Feature {
    fn from(resource: CappedResource) -> Self {
        Feature::Capped(resource)
    }
}

impl From<FlagFeature> for Feature {
    fn from(flag: FlagFeature) -> Self {
        Feature::Flag(flag)
    }
}

impl From<MeteredFeature> for Feature {
    fn from(metered: MeteredFeature) -> Self {
        Feature::Metered(metered)
    }
}

impl FromStr for Feature {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(r) = CappedResource::ALL.into_iter().find(|r| r.as_str() == s) {
            return Ok(Feature::Capped(r));
        }
        if let Some(f) = FlagFeature::ALL.into_iter().find(|f| f.as_str() == s) {
            return Ok(Feature::Flag(f));
        }
        s.parse::<MeteredFeature>()
            .map(Feature::Metered)
            .map_err(|_| ValidationError::invalid_format("feature", format!("unknown '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_names_are_unique() {
        let mut names: Vec<&str> = CappedResource::ALL.iter().map(|r| r.as_str()).collect();
        names.extend(FlagFeature::ALL.iter().map(|f| f.as_str()));
        names.extend(MeteredFeature::ALL.iter().map(|m| m.as_str()));
        let count = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), count);
    }

    #[test]
    fn feature_parses_every_kind() {
        assert_eq!(
            "job_postings".parse::<Feature>().unwrap(),
            Feature::Capped(CappedResource::JobPostings)
        );
        assert_eq!(
            "advanced_analytics".parse::<Feature>().unwrap(),
            Feature::Flag(FlagFeature::AdvancedAnalytics)
        );
        assert_eq!(
            "profile_views".parse::<Feature>().unwrap(),
            Feature::Metered(MeteredFeature::ProfileViews)
        );
        assert!("teleportation".parse::<Feature>().is_err());
    }

    #[test]
    fn only_metered_is_metered() {
        assert!(Feature::from(MeteredFeature::ProfileViews).is_metered());
        assert!(!Feature::from(CappedResource::Users).is_metered());
        assert!(!Feature::from(FlagFeature::FullProfileView).is_metered());
    }

    #[test]
    fn feature_serializes_with_kind_tag() {
        let json = serde_json::to_string(&Feature::Capped(CappedResource::JobPostings)).unwrap();
        assert_eq!(json, r#"{"kind":"capped","name":"job_postings"}"#);
    }
}
