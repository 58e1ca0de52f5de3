//! Node configuration.
//!
//! `NodeConfig` carries every tunable of a node. Binaries build it from
//! command-line flags; tests usually start from `NodeConfig::default()` and
//! lower the difficulty.

use std::time::Duration;

use crate::constants::{FETCH_TIMEOUT_SECS, POW_TARGET_DIFFICULTY};

/// How the proof-of-work search is run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MiningStrategy {
    /// Count up from zero on a single thread.
    Sequential,
    /// Split the nonce space across the rayon thread pool.
    #[default]
    Parallel,
}

#[derive(Clone, Debug)]
pub struct NodeConfig {
    /// Required number of leading zero bits in a proof hash. Fixed for the
    /// lifetime of the network.
    pub difficulty: u32,
    /// Upper bound for a single peer-chain fetch during resolution.
    pub fetch_timeout: Duration,
    /// Whether `mine()` may seal a block without transactions.
    pub allow_empty_blocks: bool,
    pub mining: MiningStrategy,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            difficulty: POW_TARGET_DIFFICULTY,
            fetch_timeout: Duration::from_secs(FETCH_TIMEOUT_SECS),
            allow_empty_blocks: true,
            mining: MiningStrategy::default(),
        }
    }
}

impl NodeConfig {
    pub fn with_difficulty(mut self, difficulty: u32) -> Self {
        self.difficulty = difficulty;
        self
    }
}
