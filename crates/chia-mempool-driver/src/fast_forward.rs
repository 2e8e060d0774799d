use chia_protocol::{Bytes32, Coin};
use chia_puzzle_types::{
    singleton::{SingletonArgs, SingletonSolution},
    LineageProof, Proof,
};
use chia_puzzles::{SINGLETON_LAUNCHER_HASH, SINGLETON_TOP_LAYER_V1_1_HASH};
use clvm_traits::{FromClvm, ToClvm};
use clvm_utils::{tree_hash, CurriedProgram, TreeHash};
use clvmr::{Allocator, NodePtr};

use crate::DriverError;

/// Rewrites the solution of a singleton spend of `coin` so that it spends `new_coin` instead.
///
/// The solution is decoded as a [`SingletonSolution`], and only its lineage proof and amount are
/// replaced. The inner solution is reused as is, so the conditions the spender asked for don't
/// change. The puzzle itself is never modified, since every coin in the lineage shares it.
///
/// Eve spends carry no lineage proof to patch and are rejected.
pub fn fast_forward_singleton(
    allocator: &mut Allocator,
    puzzle: NodePtr,
    solution: NodePtr,
    coin: &Coin,
    new_coin: &Coin,
    new_parent: &Coin,
) -> Result<NodePtr, DriverError> {
    if coin.amount % 2 == 0 || new_coin.amount % 2 == 0 || new_parent.amount % 2 == 0 {
        return Err(DriverError::EvenAmount);
    }

    if coin.puzzle_hash != new_coin.puzzle_hash || coin.puzzle_hash != new_parent.puzzle_hash {
        return Err(DriverError::PuzzleHashMismatch);
    }

    if new_coin.parent_coin_info != new_parent.coin_id() {
        return Err(DriverError::ParentCoinMismatch);
    }

    let singleton = CurriedProgram::<NodePtr, SingletonArgs<NodePtr>>::from_clvm(allocator, puzzle)
        .map_err(|_| DriverError::NotSingleton)?;

    if tree_hash(allocator, singleton.program) != TreeHash::new(SINGLETON_TOP_LAYER_V1_1_HASH) {
        return Err(DriverError::NotSingleton);
    }

    let singleton_struct = singleton.args.singleton_struct;

    if singleton_struct.mod_hash != Bytes32::new(SINGLETON_TOP_LAYER_V1_1_HASH)
        || singleton_struct.launcher_puzzle_hash != Bytes32::new(SINGLETON_LAUNCHER_HASH)
    {
        return Err(DriverError::InvalidSingletonStruct);
    }

    let launcher_id = singleton_struct.launcher_id;
    let inner_puzzle_hash = tree_hash(allocator, singleton.args.inner_puzzle);

    let puzzle_hash: Bytes32 = SingletonArgs::curry_tree_hash(launcher_id, inner_puzzle_hash).into();

    if puzzle_hash != coin.puzzle_hash {
        return Err(DriverError::CoinMismatch);
    }

    let solution = SingletonSolution::<NodePtr>::from_clvm(allocator, solution)?;

    let Proof::Lineage(lineage_proof) = solution.lineage_proof else {
        return Err(DriverError::ExpectedLineageProof);
    };

    if solution.amount != coin.amount {
        return Err(DriverError::CoinMismatch);
    }

    let parent_puzzle_hash = SingletonArgs::curry_tree_hash(
        launcher_id,
        TreeHash::new(lineage_proof.parent_inner_puzzle_hash.to_bytes()),
    );

    let parent = Coin::new(
        lineage_proof.parent_parent_coin_info,
        parent_puzzle_hash.into(),
        lineage_proof.parent_amount,
    );

    if parent.coin_id() != coin.parent_coin_info {
        return Err(DriverError::ParentCoinMismatch);
    }

    // The new parent shares the puzzle hash of the coin, so its inner puzzle is the same one.
    let new_solution = SingletonSolution {
        lineage_proof: Proof::Lineage(LineageProof {
            parent_parent_coin_info: new_parent.parent_coin_info,
            parent_inner_puzzle_hash: inner_puzzle_hash.into(),
            parent_amount: new_parent.amount,
        }),
        amount: new_coin.amount,
        inner_solution: solution.inner_solution,
    };

    Ok(new_solution.to_clvm(allocator)?)
}
