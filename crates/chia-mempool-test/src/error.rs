use std::io;

use chia_consensus::validation_error::ErrorCode;
use chia_protocol::Bytes32;
use clvm_traits::{FromClvmError, ToClvmError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to serialize clvm value: {0}")]
    ToClvm(#[from] ToClvmError),

    #[error("failed to deserialize clvm value: {0}")]
    FromClvm(#[from] FromClvmError),

    #[error("validation error: {0:?}")]
    Validation(ErrorCode),

    #[error("unknown coin {0}")]
    UnknownCoin(Bytes32),

    #[error("coin {0} has already been spent")]
    DoubleSpend(Bytes32),
}
