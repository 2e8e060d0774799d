use chia_protocol::Bytes32;
use clvm_traits::{FromClvmError, ToClvmError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to serialize clvm value: {0}")]
    ToClvm(#[from] ToClvmError),

    #[error("failed to deserialize clvm value: {0}")]
    FromClvm(#[from] FromClvmError),

    #[error("puzzle is not a singleton top layer")]
    NotSingleton,

    #[error("invalid singleton struct")]
    InvalidSingletonStruct,

    #[error("expected a lineage proof, but the singleton is an eve spend")]
    ExpectedLineageProof,

    #[error("singleton coins must have an odd amount")]
    EvenAmount,

    #[error("fast forward can't change the puzzle hash of a singleton")]
    PuzzleHashMismatch,

    #[error("lineage proof doesn't match the parent of the coin")]
    ParentCoinMismatch,

    #[error("singleton spend doesn't match the coin being spent")]
    CoinMismatch,

    #[error("unspent lineage info for {0} is inconsistent")]
    LineageMismatch(Bytes32),

    #[error("spend of {0} doesn't recreate the singleton")]
    MissingSingletonChild(Bytes32),
}
