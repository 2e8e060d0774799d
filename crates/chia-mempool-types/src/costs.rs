/// The flat cost charged for every `CREATE_COIN` condition.
pub const CREATE_COIN_COST: u64 = 1_800_000;

/// The cost limit used when nothing more specific is known.
pub const MAX_BLOCK_COST_CLVM: u64 = 11_000_000_000;
