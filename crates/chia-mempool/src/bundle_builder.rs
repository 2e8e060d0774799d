use std::time::Instant;

use chia_bls::Signature;
use chia_consensus::consensus_constants::ConsensusConstants;
use chia_mempool_types::InternalMempoolItem;
use chia_protocol::{Coin, SpendBundle};
use tracing::{debug, info};

use crate::{DedupInfo, EligibleCoinSpends, MempoolConfig, MempoolError, UnspentLineageLookup};

/// Builds the spend bundle for a new block out of mempool items, in the order given.
///
/// Items are fast forwarded and deduplicated against the ones before them. Items that can't be
/// included, or that would go over the cost budget, are skipped. Each included item is written
/// back into `items` as it was included, which may be a fast forwarded version of it. Skipped
/// items are left as they were.
///
/// Returns the spend bundle along with its additions, or [`None`] if no item was included.
pub async fn create_bundle_from_mempool_items<L>(
    items: &mut [InternalMempoolItem],
    lookup: &L,
    config: &MempoolConfig,
    constants: &ConsensusConstants,
    height: u32,
) -> Option<(SpendBundle, Vec<Coin>)>
where
    L: UnspentLineageLookup,
{
    let start = Instant::now();

    let mut eligible_coin_spends = EligibleCoinSpends::new();
    let mut coin_spends = Vec::new();
    let mut additions = Vec::new();
    let mut aggregated_signature = Signature::default();

    let mut cost_sum: u64 = 0;
    let mut fee_sum: u64 = 0;
    let mut processed_items = 0;
    let mut skipped_items = 0;

    info!(
        "Starting to make block, max cost: {}",
        config.max_block_clvm_cost
    );

    for slot in items.iter_mut() {
        if start.elapsed() > config.bundle_creation_timeout {
            info!("Exiting early, bundle creation took too long");
            break;
        }

        let snapshot = eligible_coin_spends.clone();
        let mut item = slot.clone();

        let dedup_info = if skipped_items >= config.priority_tx_threshold {
            if item.has_dedup_or_fast_forward_spends() {
                debug!(
                    "Skipping item {} with dedup or fast forward spends",
                    item.name()
                );
                continue;
            }

            DedupInfo {
                unique_coin_spends: item.spend_bundle.coin_spends.clone(),
                cost_saving: 0,
                unique_additions: item.additions().copied().collect(),
            }
        } else {
            match dedup_item(&mut eligible_coin_spends, &mut item, lookup, height, constants).await
            {
                Ok(dedup_info) => dedup_info,
                Err(error) => {
                    info!(
                        "Skipping item {} while checking for deduplication: {error}",
                        item.name()
                    );
                    eligible_coin_spends = snapshot;
                    continue;
                }
            }
        };

        let item_cost = item.cost.saturating_sub(dedup_info.cost_saving);

        let Some(new_fee_sum) = fee_sum
            .checked_add(item.fee)
            .filter(|fee_sum| *fee_sum <= constants.max_coin_amount)
        else {
            info!("Exiting early, fee sum would overflow the maximum coin amount");
            break;
        };

        let new_cost_sum = cost_sum.saturating_add(item_cost);

        if new_cost_sum > config.max_block_clvm_cost {
            info!(
                "Skipping item {} with cost {item_cost}, block cost would be {new_cost_sum}",
                item.name()
            );

            eligible_coin_spends = snapshot;
            skipped_items += 1;

            if skipped_items < config.max_skipped_items {
                continue;
            }

            break;
        }

        coin_spends.extend(dedup_info.unique_coin_spends);
        additions.extend(dedup_info.unique_additions);
        aggregated_signature += &item.spend_bundle.aggregated_signature;
        cost_sum = new_cost_sum;
        fee_sum = new_fee_sum;
        processed_items += 1;
        *slot = item;

        if config.max_block_clvm_cost - cost_sum < config.min_cost_threshold {
            break;
        }
    }

    if processed_items == 0 {
        return None;
    }

    info!(
        "Cumulative cost of block (real cost should be less) {cost_sum}, fees {fee_sum}, \
         {processed_items} items in {:?}",
        start.elapsed()
    );

    Some((SpendBundle::new(coin_spends, aggregated_signature), additions))
}

async fn dedup_item<L>(
    eligible_coin_spends: &mut EligibleCoinSpends,
    item: &mut InternalMempoolItem,
    lookup: &L,
    height: u32,
    constants: &ConsensusConstants,
) -> Result<DedupInfo, MempoolError>
where
    L: UnspentLineageLookup,
{
    eligible_coin_spends
        .process_fast_forward_spends(item, lookup, height, constants)
        .await?;

    eligible_coin_spends.get_deduplication_info(&mut item.bundle_coin_spends, item.cost)
}

#[cfg(test)]
mod tests {
    use std::future::ready;

    use chia_consensus::consensus_constants::TEST_CONSTANTS;
    use chia_mempool_test::{test_mempool_item, to_program, to_puzzle, Simulator, TestSingleton};
    use chia_mempool_types::BundleCoinSpend;
    use chia_protocol::{Bytes32, CoinSpend};

    use crate::new_mempool_item;

    use super::*;

    fn config() -> MempoolConfig {
        MempoolConfig::from_constants(&TEST_CONSTANTS)
    }

    fn plain_item(
        sim: &mut Simulator,
        amount: u64,
        fee: u64,
    ) -> anyhow::Result<InternalMempoolItem> {
        let (puzzle_hash, puzzle_reveal) = to_puzzle(1)?;
        let coin = sim.new_coin(puzzle_hash, amount);
        let solution = to_program(vec![(51, (puzzle_hash, (amount - fee, ())))])?;

        let spend_bundle = SpendBundle::new(
            vec![CoinSpend::new(coin, puzzle_reveal, solution)],
            Signature::default(),
        );

        Ok(new_mempool_item(
            spend_bundle,
            sim.height(),
            &config(),
            &TEST_CONSTANTS,
        )?)
    }

    fn singleton_item(
        sim: &Simulator,
        singleton: &TestSingleton,
        child_amount: u64,
    ) -> anyhow::Result<InternalMempoolItem> {
        let spend_bundle =
            SpendBundle::new(vec![singleton.spend(child_amount)?], Signature::default());
        let mut item = new_mempool_item(spend_bundle, sim.height(), &config(), &TEST_CONSTANTS)?;

        // Pinned so the scenario doesn't depend on how consensus flags the spend.
        for spend in item.bundle_coin_spends.values_mut() {
            spend.eligible_for_dedup = false;
            spend.eligible_for_fast_forward = true;
        }

        Ok(item)
    }

    #[tokio::test]
    async fn test_chained_fast_forward() -> anyhow::Result<()> {
        let mut sim = Simulator::new();
        let singleton = sim.new_singleton(1337);

        let mut items = vec![
            singleton_item(&sim, &singleton, 21)?,
            singleton_item(&sim, &singleton, 17)?,
            singleton_item(&sim, &singleton, 11)?,
        ];

        sim.farm(&SpendBundle::new(
            vec![singleton.spend(1337)?],
            Signature::default(),
        ))?;

        let latest = singleton.child(1337);

        let (spend_bundle, additions) = {
            let lookup = |puzzle_hash: Bytes32| ready(sim.unspent_lineage_info(puzzle_hash));
            create_bundle_from_mempool_items(
                &mut items,
                &lookup,
                &config(),
                &TEST_CONSTANTS,
                sim.height(),
            )
            .await
            .expect("no bundle was created")
        };

        assert_eq!(
            spend_bundle.coin_spends,
            vec![
                latest.spend(21)?,
                latest.child(21).spend(17)?,
                latest.child(21).child(17).spend(11)?,
            ]
        );
        assert_eq!(
            additions,
            vec![
                latest.child(21).coin,
                latest.child(21).child(17).coin,
                latest.child(21).child(17).child(11).coin,
            ]
        );

        assert_eq!(items[0].spend_bundle.coin_spends, vec![latest.spend(21)?]);

        sim.farm(&spend_bundle)?;

        let info = sim
            .unspent_lineage_info(singleton.puzzle_hash())
            .expect("singleton has no unspent lineage");

        assert_eq!(info.coin_amount, 11);
        assert_eq!(info.parent_amount, 17);
        assert_eq!(info.coin_id, latest.child(21).child(17).child(11).coin.coin_id());

        Ok(())
    }

    #[tokio::test]
    async fn test_failing_item_is_skipped() -> anyhow::Result<()> {
        let mut sim = Simulator::new();
        let unknown = Simulator::with_seed(42).new_singleton(1337);

        let plain = plain_item(&mut sim, 1000, 100)?;
        let mut items = vec![singleton_item(&sim, &unknown, 11)?, plain.clone()];

        let lookup = |puzzle_hash: Bytes32| ready(sim.unspent_lineage_info(puzzle_hash));
        let (spend_bundle, additions) = create_bundle_from_mempool_items(
            &mut items,
            &lookup,
            &config(),
            &TEST_CONSTANTS,
            sim.height(),
        )
        .await
        .expect("no bundle was created");

        assert_eq!(spend_bundle.coin_spends, plain.spend_bundle.coin_spends);
        assert_eq!(additions, plain.additions().copied().collect::<Vec<_>>());

        Ok(())
    }

    #[tokio::test]
    async fn test_rejected_item_is_not_rewritten() -> anyhow::Result<()> {
        let mut sim = Simulator::new();
        let singleton = sim.new_singleton(1337);

        let (puzzle_hash, puzzle_reveal) = to_puzzle(1)?;
        let coin = sim.new_coin(puzzle_hash, 100);

        let dedup_spend = |amount: u64| -> anyhow::Result<BundleCoinSpend> {
            let solution = to_program(vec![(51, (puzzle_hash, (amount, ())))])?;
            Ok(BundleCoinSpend::new(
                CoinSpend::new(coin, puzzle_reveal.clone(), solution),
                true,
                false,
                vec![Coin::new(coin.coin_id(), puzzle_hash, amount)],
            ))
        };

        let stale = singleton.bundle_coin_spend(11)?;

        sim.farm(&SpendBundle::new(vec![singleton.spend(21)?], Signature::default()))?;

        // The second item fast forwards cleanly, then conflicts with the first on deduplication.
        let mut items = vec![
            test_mempool_item(vec![dedup_spend(100)?], 0),
            test_mempool_item(vec![stale, dedup_spend(50)?], 0),
        ];
        let original = items[1].clone();

        let lookup = |puzzle_hash: Bytes32| ready(sim.unspent_lineage_info(puzzle_hash));
        let (spend_bundle, _additions) = create_bundle_from_mempool_items(
            &mut items,
            &lookup,
            &config(),
            &TEST_CONSTANTS,
            sim.height(),
        )
        .await
        .expect("no bundle was created");

        assert_eq!(spend_bundle.coin_spends, items[0].spend_bundle.coin_spends);
        assert_eq!(items[1], original);

        Ok(())
    }

    #[tokio::test]
    async fn test_no_items_included() -> anyhow::Result<()> {
        let sim = Simulator::new();
        let unknown = Simulator::with_seed(42).new_singleton(1337);

        let mut items = vec![singleton_item(&sim, &unknown, 11)?];

        let lookup = |puzzle_hash: Bytes32| ready(sim.unspent_lineage_info(puzzle_hash));
        let result = create_bundle_from_mempool_items(
            &mut items,
            &lookup,
            &config(),
            &TEST_CONSTANTS,
            sim.height(),
        )
        .await;

        assert_eq!(result, None);

        Ok(())
    }

    #[tokio::test]
    async fn test_cost_budget() -> anyhow::Result<()> {
        let mut sim = Simulator::new();

        let first = plain_item(&mut sim, 1000, 100)?;
        let mut second = plain_item(&mut sim, 2000, 200)?;
        let third = plain_item(&mut sim, 3000, 300)?;

        // Only the second item is too expensive to fit next to the first.
        second.cost = third.cost + 1;

        let config = MempoolConfig {
            max_block_clvm_cost: first.cost + third.cost,
            min_cost_threshold: 0,
            ..config()
        };

        let mut items = vec![first.clone(), second, third.clone()];

        let lookup = |puzzle_hash: Bytes32| ready(sim.unspent_lineage_info(puzzle_hash));
        let (spend_bundle, _additions) = create_bundle_from_mempool_items(
            &mut items,
            &lookup,
            &config,
            &TEST_CONSTANTS,
            sim.height(),
        )
        .await
        .expect("no bundle was created");

        let mut expected = first.spend_bundle.coin_spends;
        expected.extend(third.spend_bundle.coin_spends);

        assert_eq!(spend_bundle.coin_spends, expected);

        Ok(())
    }

    #[tokio::test]
    async fn test_priority_threshold() -> anyhow::Result<()> {
        let mut sim = Simulator::new();
        let singleton = sim.new_singleton(1337);

        let plain = plain_item(&mut sim, 1000, 100)?;
        let mut items = vec![singleton_item(&sim, &singleton, 11)?, plain.clone()];

        let config = MempoolConfig {
            priority_tx_threshold: 0,
            ..config()
        };

        let lookup = |puzzle_hash: Bytes32| ready(sim.unspent_lineage_info(puzzle_hash));
        let (spend_bundle, _additions) = create_bundle_from_mempool_items(
            &mut items,
            &lookup,
            &config,
            &TEST_CONSTANTS,
            sim.height(),
        )
        .await
        .expect("no bundle was created");

        assert_eq!(spend_bundle.coin_spends, plain.spend_bundle.coin_spends);

        Ok(())
    }
}
