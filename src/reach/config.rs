use crate::models::{Generation, IncomeGroup, Race};
use crate::reach::categories::{CategoryKeywords, PairOverlapFactors, RelevanceOverlapTable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// National population share of each demographic bucket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemographicShares {
    pub race: BTreeMap<Race, f64>,
    pub generation: BTreeMap<Generation, f64>,
    pub income: BTreeMap<IncomeGroup, f64>,
}

impl Default for DemographicShares {
    fn default() -> Self {
        Self {
            race: BTreeMap::from([
                (Race::Malay, 0.697),
                (Race::Chinese, 0.228),
                (Race::Indian, 0.067),
            ]),
            generation: BTreeMap::from([
                (Generation::GenZ, 0.254),
                (Generation::Millennials, 0.303),
                (Generation::GenX, 0.245),
                (Generation::Boomers, 0.198),
            ]),
            income: BTreeMap::from([
                (IncomeGroup::B40, 0.40),
                (IncomeGroup::M40, 0.40),
                (IncomeGroup::T20, 0.20),
            ]),
        }
    }
}

/// National base case used when mass targeting replaces persona selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MassTargetingBase {
    pub raw_reach: u64,
    pub unique_reach: u64,
}

impl Default for MassTargetingBase {
    fn default() -> Self {
        Self {
            raw_reach: 86_375_180,
            unique_reach: 16_150_000,
        }
    }
}

/// Heuristic tables driving the reach estimator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReachConfig {
    pub demographic_shares: DemographicShares,
    pub mass_targeting: MassTargetingBase,
    pub pair_overlap: PairOverlapFactors,
    pub relevance_overlap: RelevanceOverlapTable,
    pub categories: CategoryKeywords,
}
