use chia_consensus::consensus_constants::ConsensusConstants;
use chia_mempool_driver::{perform_the_fast_forward, set_next_singleton_version};
use chia_mempool_types::{
    run_for_cost, BundleCoinSpend, DedupCoinSpend, InternalMempoolItem, LineageLedger,
};
use chia_protocol::{Bytes32, Coin, CoinSpend};
use indexmap::IndexMap;
use tracing::debug;

use crate::{spend_bundle_conditions, MempoolError, UnspentLineageLookup};

/// The result of deduplicating a mempool item against the spends already chosen for a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupInfo {
    /// The coin spends of the item that are not already in the block.
    pub unique_coin_spends: Vec<CoinSpend>,

    /// The cost of the spends that were left out, to be subtracted from the item's cost.
    pub cost_saving: u64,

    /// The additions of the unique coin spends.
    pub unique_additions: Vec<Coin>,
}

/// Per-block state for identical spend deduplication and singleton fast forward.
///
/// A new instance should be created for each block being built.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EligibleCoinSpends {
    /// The solution that each dedup eligible coin is being deduplicated on.
    pub eligible_spends: IndexMap<Bytes32, DedupCoinSpend>,

    /// The latest unspent version of each singleton lineage, by puzzle hash.
    pub fast_forward_spends: LineageLedger,
}

impl EligibleCoinSpends {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks all the coin spends of a mempool item against the spends already chosen for the
    /// block, and returns the ones that are unique.
    ///
    /// A dedup eligible spend whose coin hasn't been seen before becomes the solution that later
    /// items are deduplicated on. A spend of a known coin with an identical solution is left out,
    /// and its cost is credited back. A spend of a known coin with a different solution means
    /// the whole item can't be included.
    ///
    /// Nothing is recorded in `eligible_spends` unless the whole item passes, including newly
    /// computed costs. Costs are always cached on the item's own [`BundleCoinSpend`]s.
    pub fn get_deduplication_info(
        &mut self,
        bundle_coin_spends: &mut IndexMap<Bytes32, BundleCoinSpend>,
        max_cost: u64,
    ) -> Result<DedupInfo, MempoolError> {
        let mut unique_coin_spends = Vec::new();
        let mut unique_additions = Vec::new();
        let mut new_eligible_spends = IndexMap::new();
        let mut cost_saving = 0;

        for (coin_id, spend_data) in bundle_coin_spends.iter_mut() {
            if !spend_data.eligible_for_dedup {
                unique_coin_spends.push(spend_data.coin_spend.clone());
                unique_additions.extend_from_slice(&spend_data.additions);
                continue;
            }

            let Some(dedup_coin_spend) = self.eligible_spends.get(coin_id) else {
                new_eligible_spends.insert(
                    *coin_id,
                    DedupCoinSpend::new(spend_data.coin_spend.solution.clone(), None),
                );
                unique_coin_spends.push(spend_data.coin_spend.clone());
                unique_additions.extend_from_slice(&spend_data.additions);
                continue;
            };

            if dedup_coin_spend.solution != spend_data.coin_spend.solution {
                return Err(MempoolError::ConflictingDedupSolution(*coin_id));
            }

            let cost = match dedup_coin_spend.cost.or(spend_data.cost) {
                Some(cost) => cost,
                None => run_for_cost(
                    &spend_data.coin_spend.puzzle_reveal,
                    &spend_data.coin_spend.solution,
                    spend_data.additions.len(),
                    max_cost,
                )?,
            };

            if dedup_coin_spend.cost.is_none() {
                new_eligible_spends.insert(
                    *coin_id,
                    DedupCoinSpend::new(dedup_coin_spend.solution.clone(), Some(cost)),
                );
            }

            spend_data.cost = Some(cost);
            cost_saving += cost;
        }

        self.eligible_spends.extend(new_eligible_spends);

        Ok(DedupInfo {
            unique_coin_spends,
            cost_saving,
            unique_additions,
        })
    }

    /// Rebases the fast forward eligible spends of a mempool item onto the latest unspent
    /// version of their singletons, and records the versions they create.
    ///
    /// The latest version of a lineage is taken from the ledger if an earlier item in the block
    /// already spent it, and from `lookup` otherwise. If any spend was rewritten, the item's
    /// spend bundle is rebuilt and validated again, and its cost is updated. On error, the
    /// ledger is left as it was before the call and the item is unchanged.
    pub async fn process_fast_forward_spends<L>(
        &mut self,
        mempool_item: &mut InternalMempoolItem,
        lookup: &L,
        height: u32,
        constants: &ConsensusConstants,
    ) -> Result<(), MempoolError>
    where
        L: UnspentLineageLookup,
    {
        if !mempool_item
            .bundle_coin_spends
            .values()
            .any(|spend| spend.eligible_for_fast_forward)
        {
            return Ok(());
        }

        let snapshot = self.fast_forward_spends.clone();

        let result = self
            .fast_forward_item(mempool_item, lookup, height, constants)
            .await;

        if result.is_err() {
            self.fast_forward_spends = snapshot;
        }

        result
    }

    async fn fast_forward_item<L>(
        &mut self,
        mempool_item: &mut InternalMempoolItem,
        lookup: &L,
        height: u32,
        constants: &ConsensusConstants,
    ) -> Result<(), MempoolError>
    where
        L: UnspentLineageLookup,
    {
        let mut new_bundle_coin_spends =
            IndexMap::with_capacity(mempool_item.bundle_coin_spends.len());
        let mut rewritten = false;

        for (coin_id, spend_data) in &mempool_item.bundle_coin_spends {
            if !spend_data.eligible_for_fast_forward {
                new_bundle_coin_spends.insert(*coin_id, spend_data.clone());
                continue;
            }

            let puzzle_hash = spend_data.coin_spend.coin.puzzle_hash;

            let unspent_lineage_info = match self.fast_forward_spends.get(puzzle_hash) {
                Some(info) => info,
                None => lookup
                    .get_unspent_lineage_info_for_puzzle_hash(puzzle_hash)
                    .await
                    .ok_or(MempoolError::UnknownFastForwardTarget(puzzle_hash))?,
            };

            if unspent_lineage_info.coin_id == *coin_id {
                set_next_singleton_version(
                    &spend_data.coin_spend.coin,
                    &spend_data.additions,
                    &mut self.fast_forward_spends,
                )?;
                new_bundle_coin_spends.insert(*coin_id, spend_data.clone());
                continue;
            }

            let (new_coin_spend, patched_additions) = perform_the_fast_forward(
                &unspent_lineage_info,
                spend_data,
                &mut self.fast_forward_spends,
            )?;

            rewritten = true;

            // The cached cost belongs to the old solution.
            new_bundle_coin_spends.insert(
                new_coin_spend.coin.coin_id(),
                BundleCoinSpend {
                    coin_spend: new_coin_spend,
                    eligible_for_dedup: spend_data.eligible_for_dedup,
                    eligible_for_fast_forward: true,
                    additions: patched_additions,
                    cost: None,
                },
            );
        }

        if !rewritten {
            return Ok(());
        }

        let mut new_item = mempool_item.clone();
        new_item.replace_bundle_coin_spends(new_bundle_coin_spends);

        let conds = spend_bundle_conditions(
            &new_item.spend_bundle,
            constants.max_block_cost_clvm,
            height,
            constants,
        )?;

        new_item.cost = conds.cost;

        debug!(
            "Fast forwarded mempool item {} to {}, cost {} -> {}",
            mempool_item.name(),
            new_item.name(),
            mempool_item.cost,
            new_item.cost
        );

        *mempool_item = new_item;

        Ok(())
    }
}
