//! Audience reach estimation with persona overlap modelling.

pub mod categories;
pub mod config;
pub mod estimator;
pub mod multipliers;
pub mod relevance;
pub mod resolver;

pub use categories::{CategoryKeywords, PairOverlapFactors, RelevanceOverlapTable};
pub use config::{DemographicShares, MassTargetingBase, ReachConfig};
pub use estimator::{PersonaReach, ReachEstimate, ReachEstimator, ReachRequest};
pub use relevance::{rank_sites, SiteRelevance};
pub use resolver::{PersonaResolution, PersonaTable};
