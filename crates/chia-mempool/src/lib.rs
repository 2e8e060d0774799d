mod bundle_builder;
mod config;
mod eligible_coin_spends;
mod error;
mod lineage_lookup;
mod mempool_item;

pub use bundle_builder::*;
pub use config::*;
pub use eligible_coin_spends::*;
pub use error::*;
pub use lineage_lookup::*;
pub use mempool_item::*;
