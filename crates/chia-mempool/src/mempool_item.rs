use chia_consensus::{
    conditions::{ELIGIBLE_FOR_DEDUP, ELIGIBLE_FOR_FF},
    consensus_constants::ConsensusConstants,
    owned_conditions::OwnedSpendBundleConditions,
    spendbundle_conditions::get_conditions_from_spendbundle,
    validation_error::ErrorCode,
};
use chia_mempool_types::{BundleCoinSpend, InternalMempoolItem};
use chia_protocol::{Bytes32, Coin, SpendBundle};
use clvmr::Allocator;
use indexmap::IndexMap;

use crate::{MempoolConfig, MempoolError};

/// Runs a spend bundle through consensus validation, without checking its signature.
pub fn spend_bundle_conditions(
    spend_bundle: &SpendBundle,
    max_cost: u64,
    height: u32,
    constants: &ConsensusConstants,
) -> Result<OwnedSpendBundleConditions, MempoolError> {
    let mut allocator = Allocator::new();

    let conds = get_conditions_from_spendbundle(
        &mut allocator,
        spend_bundle,
        max_cost,
        height,
        constants,
    )
    .map_err(|error| MempoolError::Validation(error.1))?;

    Ok(OwnedSpendBundleConditions::from(&allocator, conds))
}

/// Validates a spend bundle and classifies each of its coin spends for deduplication and
/// singleton fast forward, producing the item that gets stored in the mempool.
pub fn new_mempool_item(
    spend_bundle: SpendBundle,
    height: u32,
    config: &MempoolConfig,
    constants: &ConsensusConstants,
) -> Result<InternalMempoolItem, MempoolError> {
    let conds = spend_bundle_conditions(&spend_bundle, config.max_tx_clvm_cost, height, constants)?;

    let spends: IndexMap<Bytes32, _> = conds
        .spends
        .iter()
        .map(|spend| (spend.coin_id, spend))
        .collect();

    let mut bundle_coin_spends = IndexMap::with_capacity(spend_bundle.coin_spends.len());

    for coin_spend in &spend_bundle.coin_spends {
        let coin_id = coin_spend.coin.coin_id();

        let Some(spend) = spends.get(&coin_id) else {
            return Err(MempoolError::Validation(ErrorCode::InvalidSpendBundle));
        };

        let mut additions: Vec<Coin> = spend
            .create_coin
            .iter()
            .map(|(puzzle_hash, amount, _hint)| Coin::new(coin_id, *puzzle_hash, *amount))
            .collect();

        // The conditions don't keep the order the coins were created in.
        additions.sort_by_cached_key(Coin::coin_id);

        bundle_coin_spends.insert(
            coin_id,
            BundleCoinSpend::new(
                coin_spend.clone(),
                spend.flags & ELIGIBLE_FOR_DEDUP != 0,
                spend.flags & ELIGIBLE_FOR_FF != 0,
                additions,
            ),
        );
    }

    let fee = conds
        .removal_amount
        .checked_sub(conds.addition_amount)
        .and_then(|fee| u64::try_from(fee).ok())
        .ok_or(MempoolError::InvalidFee)?;

    Ok(InternalMempoolItem {
        spend_bundle,
        cost: conds.cost,
        fee,
        height_added_to_mempool: height,
        bundle_coin_spends,
    })
}
