use chia_protocol::{Bytes32, Coin};
use indexmap::IndexMap;

/// Identifies the current unspent coin of a singleton lineage, along with enough of its
/// parent to rebuild a lineage proof for spending it.
///
/// The puzzle hash is not stored, since a lineage is always keyed by it and fast forwarding
/// never changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnspentLineageInfo {
    pub coin_id: Bytes32,
    pub coin_amount: u64,
    pub parent_id: Bytes32,
    pub parent_amount: u64,
    pub parent_parent_id: Bytes32,
}

impl UnspentLineageInfo {
    pub fn new(
        coin_id: Bytes32,
        coin_amount: u64,
        parent_id: Bytes32,
        parent_amount: u64,
        parent_parent_id: Bytes32,
    ) -> Self {
        Self {
            coin_id,
            coin_amount,
            parent_id,
            parent_amount,
            parent_parent_id,
        }
    }

    /// The lineage info of `child`, once `parent` has been spent to create it.
    pub fn from_parent_and_child(parent: &Coin, child: &Coin) -> Self {
        Self {
            coin_id: child.coin_id(),
            coin_amount: child.amount,
            parent_id: parent.coin_id(),
            parent_amount: parent.amount,
            parent_parent_id: parent.parent_coin_info,
        }
    }

    /// Rebuilds the unspent coin, given the puzzle hash of the lineage.
    pub fn coin(&self, puzzle_hash: Bytes32) -> Coin {
        Coin::new(self.parent_id, puzzle_hash, self.coin_amount)
    }

    /// Rebuilds the parent of the unspent coin, given the puzzle hash of the lineage.
    pub fn parent_coin(&self, puzzle_hash: Bytes32) -> Coin {
        Coin::new(self.parent_parent_id, puzzle_hash, self.parent_amount)
    }
}

/// The latest known unspent descendant of each singleton lineage, keyed by puzzle hash.
///
/// A ledger lives for a single pass over a batch of mempool items and is discarded afterward.
/// It doesn't check that a new entry is actually more recent than the one it replaces.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LineageLedger {
    latest: IndexMap<Bytes32, UnspentLineageInfo>,
}

impl LineageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, puzzle_hash: Bytes32) -> Option<UnspentLineageInfo> {
        self.latest.get(&puzzle_hash).copied()
    }

    /// Replaces the latest known version of the lineage with the given puzzle hash.
    pub fn set(&mut self, puzzle_hash: Bytes32, info: UnspentLineageInfo) {
        self.latest.insert(puzzle_hash, info);
    }

    pub fn len(&self) -> usize {
        self.latest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Bytes32, &UnspentLineageInfo)> {
        self.latest.iter()
    }
}
