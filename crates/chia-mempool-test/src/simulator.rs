use chia_consensus::{
    consensus_constants::TEST_CONSTANTS, owned_conditions::OwnedSpendBundleConditions,
    spendbundle_conditions::get_conditions_from_spendbundle, validation_error::ErrorCode,
};
use chia_mempool_types::{UnspentLineageInfo, MAX_BLOCK_COST_CLVM};
use chia_protocol::{Bytes32, Coin, CoinState, SpendBundle};
use chia_puzzle_types::LineageProof;
use clvmr::Allocator;
use indexmap::IndexMap;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{SimulatorError, TestSingleton};

/// An in-memory coin store standing in for the full node's coin records.
///
/// Spend bundles are run through consensus validation before being farmed, but signatures are
/// not checked.
#[derive(Debug, Clone)]
pub struct Simulator {
    rng: ChaCha8Rng,
    height: u32,
    coin_states: IndexMap<Bytes32, CoinState>,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::with_seed(1337)
    }
}

impl Simulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            height: 0,
            coin_states: IndexMap::new(),
        }
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn insert_coin(&mut self, coin: Coin) {
        self.coin_states
            .insert(coin.coin_id(), CoinState::new(coin, None, Some(self.height)));
    }

    /// Creates a new unspent coin with a random parent.
    pub fn new_coin(&mut self, puzzle_hash: Bytes32, amount: u64) -> Coin {
        let coin = Coin::new(Bytes32::new(self.rng.gen()), puzzle_hash, amount);
        self.insert_coin(coin);
        coin
    }

    /// Creates a singleton whose spent parent is also known to the simulator, so that its
    /// lineage can be looked up right away.
    pub fn new_singleton(&mut self, amount: u64) -> TestSingleton {
        let launcher_id = Bytes32::new(self.rng.gen());
        let puzzle_hash = TestSingleton::puzzle_hash_for(launcher_id);

        let parent = Coin::new(Bytes32::new(self.rng.gen()), puzzle_hash, amount);
        self.coin_states.insert(
            parent.coin_id(),
            CoinState::new(parent, Some(self.height), Some(self.height)),
        );

        let coin = Coin::new(parent.coin_id(), puzzle_hash, amount);
        self.insert_coin(coin);

        TestSingleton {
            launcher_id,
            coin,
            proof: LineageProof {
                parent_parent_coin_info: parent.parent_coin_info,
                parent_inner_puzzle_hash: TestSingleton::inner_puzzle_hash().into(),
                parent_amount: parent.amount,
            },
        }
    }

    pub fn coin_state(&self, coin_id: Bytes32) -> Option<CoinState> {
        self.coin_states.get(&coin_id).copied()
    }

    pub fn unspent_coins(&self, puzzle_hash: Bytes32) -> Vec<Coin> {
        self.coin_states
            .values()
            .filter(|cs| cs.spent_height.is_none() && cs.coin.puzzle_hash == puzzle_hash)
            .map(|cs| cs.coin)
            .collect()
    }

    /// Looks up the only unspent coin with the given puzzle hash, as long as its parent has the
    /// same puzzle hash and has been spent.
    pub fn unspent_lineage_info(&self, puzzle_hash: Bytes32) -> Option<UnspentLineageInfo> {
        let coins = self.unspent_coins(puzzle_hash);

        let [coin] = coins.as_slice() else {
            return None;
        };

        let parent = self.coin_states.get(&coin.parent_coin_info)?;

        if parent.spent_height.is_none() || parent.coin.puzzle_hash != puzzle_hash {
            return None;
        }

        Some(UnspentLineageInfo::from_parent_and_child(&parent.coin, coin))
    }

    /// Validates the spend bundle, then spends its removals and creates its additions in a new
    /// block. Coins created and spent in the same bundle are allowed.
    pub fn farm(&mut self, spend_bundle: &SpendBundle) -> Result<Vec<Coin>, SimulatorError> {
        if spend_bundle.coin_spends.is_empty() {
            return Err(SimulatorError::Validation(ErrorCode::InvalidSpendBundle));
        }

        let mut allocator = Allocator::new();

        let conds = get_conditions_from_spendbundle(
            &mut allocator,
            spend_bundle,
            MAX_BLOCK_COST_CLVM,
            self.height,
            &TEST_CONSTANTS,
        )
        .map_err(|error| SimulatorError::Validation(error.1))?;

        let conds = OwnedSpendBundleConditions::from(&allocator, conds);

        let mut additions = IndexMap::new();

        for spend in &conds.spends {
            for (puzzle_hash, amount, _hint) in &spend.create_coin {
                let coin = Coin::new(spend.coin_id, *puzzle_hash, *amount);
                additions.insert(coin.coin_id(), coin);
            }
        }

        let mut removals = Vec::new();

        for spend in &conds.spends {
            if !additions.contains_key(&spend.coin_id) {
                let Some(coin_state) = self.coin_states.get(&spend.coin_id) else {
                    return Err(SimulatorError::UnknownCoin(spend.coin_id));
                };

                if coin_state.spent_height.is_some() {
                    return Err(SimulatorError::DoubleSpend(spend.coin_id));
                }
            }

            removals.push(spend.coin_id);
        }

        for coin in additions.values() {
            self.insert_coin(*coin);
        }

        for coin_id in removals {
            if let Some(coin_state) = self.coin_states.get_mut(&coin_id) {
                coin_state.spent_height = Some(self.height);
            }
        }

        self.height += 1;

        Ok(additions.into_values().collect())
    }
}
