use std::time::Duration;

use chia_consensus::consensus_constants::ConsensusConstants;
use chia_mempool_types::MAX_BLOCK_COST_CLVM;

/// Limits used when admitting items and building blocks out of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MempoolConfig {
    pub max_block_clvm_cost: u64,
    pub max_tx_clvm_cost: u64,

    /// How many items may be skipped for not fitting before block creation stops.
    pub max_skipped_items: usize,

    /// After this many skipped items, items with deduplication or fast forward spends are no
    /// longer considered.
    pub priority_tx_threshold: usize,

    /// Block creation stops once less than this much cost is left.
    pub min_cost_threshold: u64,

    pub bundle_creation_timeout: Duration,
}

impl Default for MempoolConfig {
    fn default() -> Self {
        Self {
            max_block_clvm_cost: MAX_BLOCK_COST_CLVM,
            max_tx_clvm_cost: MAX_BLOCK_COST_CLVM / 2,
            max_skipped_items: 10,
            priority_tx_threshold: 3,
            min_cost_threshold: 6_000_000,
            bundle_creation_timeout: Duration::from_secs(1),
        }
    }
}

impl MempoolConfig {
    pub fn from_constants(constants: &ConsensusConstants) -> Self {
        Self {
            max_block_clvm_cost: constants.max_block_cost_clvm,
            max_tx_clvm_cost: constants.max_block_cost_clvm / 2,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use chia_consensus::consensus_constants::TEST_CONSTANTS;

    use super::*;

    #[test]
    fn test_from_constants() {
        let config = MempoolConfig::from_constants(&TEST_CONSTANTS);
        assert_eq!(config.max_block_clvm_cost, TEST_CONSTANTS.max_block_cost_clvm);
        assert_eq!(config.max_tx_clvm_cost * 2, TEST_CONSTANTS.max_block_cost_clvm);
        assert_eq!(config.max_skipped_items, 10);
    }
}
