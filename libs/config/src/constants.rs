//! Protocol defaults
//!
//! Values used when a configuration file or runtime override does not
//! provide one.

/// Swap queue batch sizing
pub mod queue {
    /// Lower bound on swaps executed per block
    pub const MIN_SWAPS_PER_BLOCK: u64 = 10;

    /// Upper bound on swaps executed per block
    pub const MAX_SWAPS_PER_BLOCK: u64 = 100;

    /// Blocks between pool rebalancing cycles; the queue does not run on these
    pub const POOL_CYCLE: u64 = 43_200;
}

/// Minimum slip floors in basis points, per asset class
pub mod slip {
    pub const LAYER1_MIN_SLIP_BPS: u64 = 0;
    pub const SYNTH_MIN_SLIP_BPS: u64 = 0;
    pub const TRADE_MIN_SLIP_BPS: u64 = 0;
    pub const SECURED_MIN_SLIP_BPS: u64 = 5;
    pub const DERIVED_MIN_SLIP_BPS: u64 = 0;
}

/// Pricing parameters
pub mod pricing {
    /// Depth multiplier for synthetic and derived swaps (20000 = 2x)
    pub const VIRTUAL_MULT_SYNTHS_BPS: u64 = 20_000;

    /// Flat fee, in native units, withheld from refunds and outbounds
    pub const NATIVE_OUTBOUND_FEE: u64 = 2_000_000;
}

/// Streaming swap limits
pub mod streaming {
    /// Blocks per day at a six second block time
    pub const BLOCKS_PER_DAY: u64 = 14_400;

    /// Longest cross-chain streaming swap, in blocks
    pub const MAX_LENGTH: u64 = BLOCKS_PER_DAY;

    /// Longest streaming swap between ledger-native assets, in blocks
    pub const MAX_LENGTH_NATIVE: u64 = BLOCKS_PER_DAY * 365;
}
