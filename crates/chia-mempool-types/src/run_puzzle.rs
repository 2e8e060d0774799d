use chia_protocol::Program;
use clvm_traits::{ToClvm, ToClvmError};
use clvmr::{
    reduction::{EvalErr, Reduction},
    run_program, Allocator, ChiaDialect, NodePtr, MEMPOOL_MODE,
};
use thiserror::Error;

use crate::CREATE_COIN_COST;

#[derive(Debug, Error)]
pub enum CostError {
    #[error("failed to serialize clvm value: {0}")]
    ToClvm(#[from] ToClvmError),

    #[error("clvm eval error: {0}")]
    Eval(#[from] EvalErr),

    #[error("cost {cost} exceeds the maximum of {max_cost}")]
    CostExceeded { cost: u64, max_cost: u64 },
}

pub fn run_puzzle_with_cost(
    allocator: &mut Allocator,
    puzzle: NodePtr,
    solution: NodePtr,
    max_cost: u64,
    mempool_mode: bool,
) -> Result<Reduction, EvalErr> {
    let flags = if mempool_mode { MEMPOOL_MODE } else { 0 };
    run_program(
        allocator,
        &ChiaDialect::new(flags),
        puzzle,
        solution,
        max_cost,
    )
}

/// Computes the cost of a single coin spend, for crediting deduplicated spends.
///
/// The puzzle is run in mempool mode under `max_cost`, and a flat [`CREATE_COIN_COST`] is added
/// for each of the `additions_count` coins it's known to create. If the puzzle itself runs out
/// of cost, the interpreter's error is returned unchanged.
pub fn run_for_cost(
    puzzle_reveal: &Program,
    solution: &Program,
    additions_count: usize,
    max_cost: u64,
) -> Result<u64, CostError> {
    let mut allocator = Allocator::new();
    let puzzle = puzzle_reveal.to_clvm(&mut allocator)?;
    let solution = solution.to_clvm(&mut allocator)?;

    let Reduction(clvm_cost, _) =
        run_puzzle_with_cost(&mut allocator, puzzle, solution, max_cost, true)?;

    let create_coins_cost = additions_count as u64 * CREATE_COIN_COST;
    let cost = clvm_cost + create_coins_cost;

    if cost > max_cost {
        return Err(CostError::CostExceeded { cost, max_cost });
    }

    Ok(cost)
}
