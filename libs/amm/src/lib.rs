//! # AMM Library - Constant-Product Pool Mathematics
//!
//! ## Purpose
//!
//! Deterministic math for native-paired constant-product pools: liquidity unit
//! issuance and redemption, swap pricing with slip floors and virtual depth,
//! double-swap routing, and streaming swap sizing. Every function is pure; it
//! takes pool snapshots and returns updated copies for the caller to persist.
//!
//! ## Integration Points
//!
//! - **Input Sources**: pool snapshots through [`PoolSource`], parameters from
//!   [`engine_config::EngineConfig`]
//! - **Output Destinations**: the liquidity ledger and the swap queue
//! - **Precision**: 256-bit integers, truncating division, no floating point
//! - **Validation**: zero depths, zero amounts and invalid basis points are
//!   reported as [`AmmError`] values, never panics
//!
//! ## Architecture Role
//!
//! ```text
//! units ──────────┐
//! withdraw ───────┤
//! swap_math ──> router ──> swap queue execution / scoring
//! streaming ──────┘
//! ```

pub mod errors;
pub mod pool_traits;
pub mod router;
pub mod streaming;
pub mod swap_math;
pub mod units;
pub mod withdraw;

pub use errors::AmmError;
pub use pool_traits::PoolSource;
pub use router::{swap, SwapOutcome};
pub use streaming::{max_swap_quantity, next_sub_swap};
pub use swap_math::{min_slip_bps, swap_one, uses_virtual_depth, LegOutcome, SwapMath, SwapQuote};
pub use units::{add_liquidity, issue_units, issue_vault_units, AddLiquidityOutcome, Deposit};
pub use withdraw::{
    calculate_vault_withdraw, calculate_withdraw, withdraw_liquidity, Redemption, WithdrawOutcome, WithdrawSide,
};

/// Common types for AMM calculations
pub use rust_decimal::Decimal;
