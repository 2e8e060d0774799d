use std::future::Future;

use chia_mempool_types::UnspentLineageInfo;
use chia_protocol::Bytes32;

/// Looks up the latest confirmed unspent coin of a singleton lineage.
///
/// This should reflect the coin records of the blockchain only, never pending mempool state.
/// Any async function or closure from a puzzle hash to an optional [`UnspentLineageInfo`]
/// implements it.
pub trait UnspentLineageLookup {
    fn get_unspent_lineage_info_for_puzzle_hash(
        &self,
        puzzle_hash: Bytes32,
    ) -> impl Future<Output = Option<UnspentLineageInfo>>;
}

impl<F, Fut> UnspentLineageLookup for F
where
    F: Fn(Bytes32) -> Fut,
    Fut: Future<Output = Option<UnspentLineageInfo>>,
{
    fn get_unspent_lineage_info_for_puzzle_hash(
        &self,
        puzzle_hash: Bytes32,
    ) -> impl Future<Output = Option<UnspentLineageInfo>> {
        self(puzzle_hash)
    }
}
