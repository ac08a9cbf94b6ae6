//! Ambient configuration: the recognized keys from §6 "Options", collected
//! into one serializable struct following `gat-algo`'s config-struct
//! convention (e.g. its `NkScreeningConfig`).

use crate::rng::{RandomDistribution, RandomEngine};
use serde::{Deserialize, Serialize};

/// Options consumed by HSS compression and the sampling driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HssOptions {
    /// Target leaf size for HSS partition-tree refinement (§4.9).
    pub leaf_size: usize,
    /// Initial random sample batch width (§4.6 step 2).
    pub d0: usize,
    /// Sample batch increment (§4.4 step 2).
    pub dd: usize,
    pub random_engine: RandomEngine,
    pub random_distribution: RandomDistribution,
    /// Whether the caller-provided RNG stream is reused across fronts so
    /// that sampling history can be replayed indirectly (§4.4, §4.5, §6b).
    pub indirect_sampling: bool,
    /// 0 = local separator neighbors only, 1 = one-hop extended (§4.9a).
    pub separator_ordering_level: u8,
    /// True once a front's compression has consumed at least one round of
    /// caller-seeded random columns (set internally by the orchestrator,
    /// §4.6 step 2 "mark the HSS compressor to consume the caller's RNG").
    pub user_defined_random: bool,
    /// Task-recursion depth beyond which `rayon::join` stops being used and
    /// the tree is walked sequentially (§5, `task_recursion_cutoff_level`).
    pub cutoff_depth: usize,
}

impl Default for HssOptions {
    fn default() -> Self {
        HssOptions {
            leaf_size: 128,
            d0: 128,
            dd: 64,
            random_engine: RandomEngine::default(),
            random_distribution: RandomDistribution::default(),
            indirect_sampling: false,
            separator_ordering_level: 0,
            user_defined_random: false,
            cutoff_depth: 4,
        }
    }
}

impl HssOptions {
    pub fn with_leaf_size(mut self, leaf_size: usize) -> Self {
        self.leaf_size = leaf_size;
        self
    }

    pub fn with_indirect_sampling(mut self, enabled: bool) -> Self {
        self.indirect_sampling = enabled;
        self
    }
}
