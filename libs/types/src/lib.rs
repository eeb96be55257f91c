//! # Liquidity Engine Types Library
//!
//! Ledger entities and deterministic arithmetic shared by every crate in the
//! liquidity engine.
//!
//! ## Design Philosophy
//!
//! - **Bit-identical results**: all consensus values are 256-bit integers with
//!   truncating division; no floating point anywhere
//! - **Never panic**: subtraction saturates, division reports an error value
//! - **Owned values**: entities are plain data; pure functions return updated
//!   copies and the caller decides what to persist
//! - **Clear Boundaries**: `rust_decimal::Decimal` appears only for
//!   human-facing ratios such as LUVI
//!
//! ## Quick Start
//!
//! ```rust
//! use types::{Asset, Pool, PoolStatus, Uint};
//!
//! let mut pool = Pool::new("BTC.BTC".parse().unwrap());
//! pool.balance_native = Uint::from(1_000u64);
//! pool.balance_asset = Uint::from(1_000u64);
//! pool.lp_units = Uint::from(1_000u64);
//! pool.status = PoolStatus::Available;
//!
//! assert_eq!(pool.asset_value_in_native(Uint::from(10u64)), Uint::from(10u64));
//! assert!(Asset::native().is_native());
//! ```
//!
//! ## Integration Points
//!
//! - **amm**: unit issuance, swap pricing and streaming sizing over [`Pool`]
//! - **state**: persistence traits keyed by [`Asset`] and [`SwapKey`]
//! - **swap-queue**: block-driven scheduling of [`PendingSwap`] values

pub mod common;

pub mod liquidity_provider;
pub mod pool;
pub mod swap;

pub use common::{
    get_safe_share, get_uncapped_share, Address, Asset, AssetClass, AssetKind, Coin, Dec, MathError, TxId, Uint,
    ValidationError, NATIVE_CHAIN, NATIVE_SYMBOL,
};
pub use liquidity_provider::LiquidityProvider;
pub use pool::{calculate_synth_units, Pool, PoolStatus};
pub use swap::{Affiliate, PendingSwap, StreamingSwap, SwapKey, SwapType, TradePair};

/// One whole unit of an 8-decimal asset
pub const ONE: u64 = 100_000_000;

/// Denominator for every basis-point quantity
pub const MAX_BASIS_POINTS: u64 = 10_000;
