use chia_mempool_types::BundleCoinSpend;
use chia_protocol::{Bytes32, Coin, CoinSpend, Program};
use chia_puzzle_types::{
    singleton::{SingletonArgs, SingletonSolution},
    LineageProof, Proof,
};
use chia_puzzles::SINGLETON_TOP_LAYER_V1_1;
use clvm_traits::{FromClvm, ToClvm};
use clvm_utils::{tree_hash_atom, CurriedProgram, TreeHash};
use clvmr::{serde::node_from_bytes, Allocator};

use crate::SimulatorError;

/// A singleton whose inner puzzle is `1`, so its inner solution is the list of conditions to output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestSingleton {
    pub launcher_id: Bytes32,
    pub coin: Coin,
    pub proof: LineageProof,
}

impl TestSingleton {
    pub fn inner_puzzle_hash() -> TreeHash {
        tree_hash_atom(&[1])
    }

    pub fn puzzle_hash_for(launcher_id: Bytes32) -> Bytes32 {
        SingletonArgs::curry_tree_hash(launcher_id, Self::inner_puzzle_hash()).into()
    }

    pub fn puzzle_hash(&self) -> Bytes32 {
        self.coin.puzzle_hash
    }

    pub fn puzzle_reveal(&self) -> Result<Program, SimulatorError> {
        let mut allocator = Allocator::new();
        let program = node_from_bytes(&mut allocator, &SINGLETON_TOP_LAYER_V1_1)?;
        let puzzle = CurriedProgram {
            program,
            args: SingletonArgs::new(self.launcher_id, 1),
        }
        .to_clvm(&mut allocator)?;
        Ok(Program::from_clvm(&allocator, puzzle)?)
    }

    /// Spends the singleton, recreating it with the given amount, which must be odd.
    pub fn spend(&self, child_amount: u64) -> Result<CoinSpend, SimulatorError> {
        let mut allocator = Allocator::new();

        let inner_puzzle_hash: Bytes32 = Self::inner_puzzle_hash().into();
        let solution = SingletonSolution {
            lineage_proof: Proof::Lineage(self.proof),
            amount: self.coin.amount,
            inner_solution: vec![(51, (inner_puzzle_hash, (child_amount, ())))],
        }
        .to_clvm(&mut allocator)?;

        Ok(CoinSpend::new(
            self.coin,
            self.puzzle_reveal()?,
            Program::from_clvm(&allocator, solution)?,
        ))
    }

    /// A fast forward eligible [`BundleCoinSpend`] recreating the singleton with the given amount.
    pub fn bundle_coin_spend(&self, child_amount: u64) -> Result<BundleCoinSpend, SimulatorError> {
        Ok(BundleCoinSpend::new(
            self.spend(child_amount)?,
            false,
            true,
            vec![self.child(child_amount).coin],
        ))
    }

    #[must_use]
    pub fn child(&self, amount: u64) -> Self {
        Self {
            launcher_id: self.launcher_id,
            coin: Coin::new(self.coin.coin_id(), self.coin.puzzle_hash, amount),
            proof: LineageProof {
                parent_parent_coin_info: self.coin.parent_coin_info,
                parent_inner_puzzle_hash: Self::inner_puzzle_hash().into(),
                parent_amount: self.coin.amount,
            },
        }
    }
}
