use chia_consensus::validation_error::ErrorCode;
use chia_mempool_driver::DriverError;
use chia_mempool_types::CostError;
use chia_protocol::Bytes32;
use thiserror::Error;

/// Errors that cause a mempool item to be left out of the block being built.
///
/// None of these are fatal to the pass as a whole. The caller drops the item and moves on.
#[derive(Debug, Error)]
pub enum MempoolError {
    #[error("cannot proceed with singleton spend fast forward, no unspent lineage for {0}")]
    UnknownFastForwardTarget(Bytes32),

    #[error("solution for {0} is different from what we're deduplicating on")]
    ConflictingDedupSolution(Bytes32),

    #[error("cost error: {0}")]
    Cost(#[from] CostError),

    #[error("driver error: {0}")]
    Driver(#[from] DriverError),

    #[error("validation error: {0:?}")]
    Validation(ErrorCode),

    #[error("spend bundle creates more value than it spends")]
    InvalidFee,
}
