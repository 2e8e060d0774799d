use chia_protocol::{Bytes32, Coin, CoinSpend, Program, SpendBundle};
use indexmap::IndexMap;

/// A single coin spend within a mempool item, along with what the mempool knows about it.
///
/// The eligibility flags are computed when the item enters the mempool and are taken as given
/// by everything downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleCoinSpend {
    pub coin_spend: CoinSpend,
    pub eligible_for_dedup: bool,
    pub eligible_for_fast_forward: bool,
    pub additions: Vec<Coin>,

    /// The cost of running this spend on its own, if it has been computed before.
    pub cost: Option<u64>,
}

impl BundleCoinSpend {
    pub fn new(
        coin_spend: CoinSpend,
        eligible_for_dedup: bool,
        eligible_for_fast_forward: bool,
        additions: Vec<Coin>,
    ) -> Self {
        Self {
            coin_spend,
            eligible_for_dedup,
            eligible_for_fast_forward,
            additions,
            cost: None,
        }
    }

    pub fn coin(&self) -> Coin {
        self.coin_spend.coin
    }

    #[must_use]
    pub fn with_cost(self, cost: u64) -> Self {
        Self {
            cost: Some(cost),
            ..self
        }
    }
}

/// A solution that an eligible coin is being deduplicated on, and its cost once known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupCoinSpend {
    pub solution: Program,
    pub cost: Option<u64>,
}

impl DedupCoinSpend {
    pub fn new(solution: Program, cost: Option<u64>) -> Self {
        Self { solution, cost }
    }
}

/// A pending transaction in the mempool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalMempoolItem {
    pub spend_bundle: SpendBundle,
    pub cost: u64,
    pub fee: u64,
    pub height_added_to_mempool: u32,

    /// Every coin spend in the bundle, keyed by the id of the coin being spent.
    pub bundle_coin_spends: IndexMap<Bytes32, BundleCoinSpend>,
}

impl InternalMempoolItem {
    pub fn name(&self) -> Bytes32 {
        self.spend_bundle.name()
    }

    /// Replaces the coin spends of this item, rebuilding the spend bundle in the same order.
    /// The aggregated signature is kept as is.
    pub fn replace_bundle_coin_spends(
        &mut self,
        bundle_coin_spends: IndexMap<Bytes32, BundleCoinSpend>,
    ) {
        self.spend_bundle = SpendBundle::new(
            bundle_coin_spends
                .values()
                .map(|spend| spend.coin_spend.clone())
                .collect(),
            self.spend_bundle.aggregated_signature.clone(),
        );
        self.bundle_coin_spends = bundle_coin_spends;
    }

    pub fn has_dedup_or_fast_forward_spends(&self) -> bool {
        self.bundle_coin_spends
            .values()
            .any(|spend| spend.eligible_for_dedup || spend.eligible_for_fast_forward)
    }

    pub fn additions(&self) -> impl Iterator<Item = &Coin> {
        self.bundle_coin_spends
            .values()
            .flat_map(|spend| spend.additions.iter())
    }
}
