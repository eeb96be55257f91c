//! Constant-product swap pricing
//!
//! For an input `x` into a pool with input-side depth `X` and output-side
//! depth `Y`:
//!
//! ```text
//! emit = x * X * Y / (x + X)^2
//! fee  = x^2 * Y   / (x + X)^2
//! slip = x * 10000 / (x + X)          (basis points, truncated)
//! ```
//!
//! `emit + fee` is exactly what a fee-less constant-product swap would pay;
//! the fee stays in the pool. Per-asset-class slip floors raise the fee for
//! small swaps, and synthetic or derived swaps price against a virtually
//! deepened pool.

use crate::errors::AmmError;
use engine_config::EngineConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use types::{get_safe_share, get_uncapped_share, Asset, Pool, Uint, MAX_BASIS_POINTS};

/// Emission, fee and slip for a single pool leg
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SwapQuote {
    pub emit: Uint,
    pub liquidity_fee: Uint,
    pub slip_bps: Uint,
}

/// Stateless pricing functions
pub struct SwapMath;

impl SwapMath {
    /// `x * X * Y / (x + X)^2`
    pub fn calc_asset_emission(x_depth: Uint, x: Uint, y_depth: Uint) -> Uint {
        let denominator = (x + x_depth) * (x + x_depth);
        (x * x_depth * y_depth).quo_or_zero(denominator)
    }

    /// `x^2 * Y / (x + X)^2`, denominated in the output asset
    pub fn calc_liquidity_fee(x_depth: Uint, x: Uint, y_depth: Uint) -> Uint {
        let denominator = (x + x_depth) * (x + x_depth);
        (x * x * y_depth).quo_or_zero(denominator)
    }

    /// `x * 10000 / (x + X)`
    pub fn calc_swap_slip(x_depth: Uint, x: Uint) -> Uint {
        (x * Uint::from(MAX_BASIS_POINTS)).quo_or_zero(x + x_depth)
    }

    /// Fee charged when the slip floor applies: `floor * x * Y / (10000 * (x + X))`
    pub fn calc_min_liquidity_fee(x_depth: Uint, x: Uint, y_depth: Uint, min_slip_bps: Uint) -> Uint {
        get_safe_share(min_slip_bps, Uint::from(MAX_BASIS_POINTS), x * y_depth).quo_or_zero(x + x_depth)
    }

    /// Emission the pool would pay with no fee at all, `x * Y / (x + X)`
    pub fn calc_max_asset_emission(x_depth: Uint, x: Uint, y_depth: Uint) -> Uint {
        (x * y_depth).quo_or_zero(x + x_depth)
    }

    /// Price one leg, applying the slip floor when it exceeds the nominal slip
    pub fn get_swap_calc(x_depth: Uint, x: Uint, y_depth: Uint, min_slip_bps: Uint) -> SwapQuote {
        let slip_bps = Self::calc_swap_slip(x_depth, x);
        if min_slip_bps > slip_bps {
            let liquidity_fee = Self::calc_min_liquidity_fee(x_depth, x, y_depth, min_slip_bps);
            let emit = Self::calc_max_asset_emission(x_depth, x, y_depth).safe_sub(liquidity_fee);
            return SwapQuote {
                emit,
                liquidity_fee,
                slip_bps: min_slip_bps,
            };
        }
        SwapQuote {
            emit: Self::calc_asset_emission(x_depth, x, y_depth),
            liquidity_fee: Self::calc_liquidity_fee(x_depth, x, y_depth),
            slip_bps,
        }
    }

    /// Scale a depth by a basis-point multiplier (20000 doubles it)
    pub fn virtual_depth(depth: Uint, mult_bps: u64) -> Uint {
        get_uncapped_share(Uint::from(mult_bps), Uint::from(MAX_BASIS_POINTS), depth)
    }
}

/// Slip floor for a leg: the non-native side decides the asset class
pub fn min_slip_bps(source: &Asset, target: &Asset, config: &EngineConfig) -> u64 {
    let asset = if source.is_native() { target } else { source };
    config.slip_floors.for_class(asset.class())
}

/// Whether a leg trades against a virtually deepened pool
pub fn uses_virtual_depth(source: &Asset, target: &Asset, pool: &Pool) -> bool {
    source.is_synthetic() || target.is_synthetic() || pool.asset.is_derived()
}

/// Result of one executed leg
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegOutcome {
    /// Pool after the leg
    pub pool: Pool,
    pub source: Asset,
    pub target: Asset,
    pub input: Uint,
    pub emit: Uint,
    /// Fee in the leg's output asset
    pub liquidity_fee: Uint,
    pub liquidity_fee_in_native: Uint,
    /// Slip actually charged (floor applied)
    pub swap_slip_bps: Uint,
    /// Nominal slip from the depth alone
    pub pool_slip_bps: Uint,
}

/// Execute one leg against a pool without persisting anything
///
/// Exactly one of `source` and `target` must be native. Synthetic outputs
/// are minted rather than taken from the pool's asset depth, and synthetic
/// inputs are burned rather than added to it.
pub fn swap_one(
    pool: &Pool,
    source: &Asset,
    target: &Asset,
    amount: Uint,
    config: &EngineConfig,
) -> Result<LegOutcome, AmmError> {
    if pool.asset.is_synthetic() {
        return Err(AmmError::SyntheticPool(pool.asset.to_string()));
    }
    // synths may be redeemed regardless of pool status
    if !source.is_synthetic() && !pool.is_available() {
        return Err(AmmError::PoolNotAvailable(pool.asset.to_string()));
    }

    let (mut x_depth, mut y_depth) = if source.is_native() {
        (pool.balance_native, pool.balance_asset)
    } else {
        (pool.balance_asset, pool.balance_native)
    };
    if uses_virtual_depth(source, target, pool) {
        let mult = config.pricing.virtual_mult_synths_bps;
        x_depth = SwapMath::virtual_depth(x_depth, mult);
        y_depth = SwapMath::virtual_depth(y_depth, mult);
    }

    if amount.is_zero() {
        return Err(AmmError::InvalidAmount);
    }
    if x_depth.is_zero() || y_depth.is_zero() {
        return Err(AmmError::InvalidBalance);
    }

    let pool_slip_bps = SwapMath::calc_swap_slip(x_depth, amount);
    let floor = Uint::from(min_slip_bps(source, target, config));
    let quote = SwapMath::get_swap_calc(x_depth, amount, y_depth, floor);

    if quote.emit >= y_depth {
        return Err(AmmError::NotEnoughBalance);
    }

    debug!(
        pool = %pool.asset,
        native = %pool.balance_native,
        asset = %pool.balance_asset,
        lp_units = %pool.lp_units,
        synth_units = %pool.synth_units,
        "pre swap"
    );

    // pool fields rather than the virtual depths are adjusted
    let mut next = pool.clone();
    if source.is_native() {
        next.balance_native += amount;
        if !target.is_synthetic() {
            next.balance_asset = next.balance_asset.safe_sub(quote.emit);
        }
    } else {
        next.balance_native = next.balance_native.safe_sub(quote.emit);
        if !source.is_synthetic() {
            next.balance_asset += amount;
        }
    }

    let liquidity_fee_in_native = if target.is_native() {
        quote.liquidity_fee
    } else {
        next.asset_value_in_native(quote.liquidity_fee)
    };

    info!(
        pool = %next.asset,
        native = %next.balance_native,
        asset = %next.balance_asset,
        emit = %quote.emit,
        fee = %quote.liquidity_fee,
        slip_bps = %quote.slip_bps,
        "post swap"
    );

    Ok(LegOutcome {
        pool: next,
        source: source.clone(),
        target: target.clone(),
        input: amount,
        emit: quote.emit,
        liquidity_fee: quote.liquidity_fee,
        liquidity_fee_in_native,
        swap_slip_bps: quote.slip_bps,
        pool_slip_bps,
    })
}
