pub use chia_mempool::*;
pub use chia_mempool_driver::*;
pub use chia_mempool_types::*;

#[cfg(feature = "test")]
pub use chia_mempool_test as test;
