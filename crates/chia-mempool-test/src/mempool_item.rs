use chia_bls::Signature;
use chia_mempool_types::{BundleCoinSpend, InternalMempoolItem};
use chia_protocol::SpendBundle;

/// Wraps a list of coin spends in a mempool item with an empty signature, without running them.
pub fn test_mempool_item(bundle_coin_spends: Vec<BundleCoinSpend>, cost: u64) -> InternalMempoolItem {
    let spend_bundle = SpendBundle::new(
        bundle_coin_spends
            .iter()
            .map(|spend| spend.coin_spend.clone())
            .collect(),
        Signature::default(),
    );

    InternalMempoolItem {
        spend_bundle,
        cost,
        fee: 0,
        height_added_to_mempool: 0,
        bundle_coin_spends: bundle_coin_spends
            .into_iter()
            .map(|spend| (spend.coin_spend.coin.coin_id(), spend))
            .collect(),
    }
}
