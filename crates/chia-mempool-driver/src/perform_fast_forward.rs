use chia_mempool_types::{BundleCoinSpend, LineageLedger, UnspentLineageInfo};
use chia_protocol::{Coin, CoinSpend, Program};
use clvm_traits::{FromClvm, ToClvm};
use clvmr::Allocator;
use tracing::debug;

use crate::{fast_forward_singleton, DriverError};

/// Rebases a spend of a stale singleton coin onto the latest unspent version of its lineage.
///
/// Returns the rewritten coin spend and its additions, which keep their puzzle hashes and amounts
/// but are now created by the latest version. On success, the ledger is advanced to the singleton
/// child that the rewritten spend will create. On failure, the ledger is left untouched.
///
/// Callers are expected to have checked that the spend is actually stale beforehand.
pub fn perform_the_fast_forward(
    unspent_lineage_info: &UnspentLineageInfo,
    bundle_coin_spend: &BundleCoinSpend,
    fast_forward_spends: &mut LineageLedger,
) -> Result<(CoinSpend, Vec<Coin>), DriverError> {
    let coin_spend = &bundle_coin_spend.coin_spend;
    let puzzle_hash = coin_spend.coin.puzzle_hash;

    let new_coin = unspent_lineage_info.coin(puzzle_hash);
    let new_parent = unspent_lineage_info.parent_coin(puzzle_hash);

    if new_coin.coin_id() != unspent_lineage_info.coin_id
        || new_parent.coin_id() != unspent_lineage_info.parent_id
    {
        return Err(DriverError::LineageMismatch(unspent_lineage_info.coin_id));
    }

    let mut allocator = Allocator::new();
    let puzzle = coin_spend.puzzle_reveal.to_clvm(&mut allocator)?;
    let solution = coin_spend.solution.to_clvm(&mut allocator)?;

    let new_solution = fast_forward_singleton(
        &mut allocator,
        puzzle,
        solution,
        &coin_spend.coin,
        &new_coin,
        &new_parent,
    )?;
    let new_solution = Program::from_clvm(&allocator, new_solution)?;

    let new_coin_id = new_coin.coin_id();
    let patched_additions: Vec<Coin> = bundle_coin_spend
        .additions
        .iter()
        .map(|addition| Coin::new(new_coin_id, addition.puzzle_hash, addition.amount))
        .collect();

    set_next_singleton_version(&new_coin, &patched_additions, fast_forward_spends)?;

    debug!(
        "fast forwarded spend of {} onto {}",
        coin_spend.coin.coin_id(),
        new_coin_id
    );

    Ok((
        CoinSpend::new(new_coin, coin_spend.puzzle_reveal.clone(), new_solution),
        patched_additions,
    ))
}

/// Records the singleton child created by spending `current_singleton` as the latest version of
/// its lineage.
///
/// The child is the addition that keeps the puzzle hash of the singleton with an odd amount.
pub fn set_next_singleton_version(
    current_singleton: &Coin,
    singleton_additions: &[Coin],
    fast_forward_spends: &mut LineageLedger,
) -> Result<(), DriverError> {
    let Some(singleton_child) = singleton_additions.iter().find(|addition| {
        addition.puzzle_hash == current_singleton.puzzle_hash && addition.amount % 2 == 1
    }) else {
        return Err(DriverError::MissingSingletonChild(
            current_singleton.coin_id(),
        ));
    };

    let info = UnspentLineageInfo::from_parent_and_child(current_singleton, singleton_child);

    debug!(
        "latest version of singleton {} is now {}",
        current_singleton.puzzle_hash, info.coin_id
    );

    fast_forward_spends.set(current_singleton.puzzle_hash, info);

    Ok(())
}
