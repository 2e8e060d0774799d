mod costs;
mod lineage;
mod mempool_item;
mod run_puzzle;

pub use costs::*;
pub use lineage::*;
pub use mempool_item::*;
pub use run_puzzle::*;
