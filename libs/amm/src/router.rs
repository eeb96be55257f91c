//! Single and double swap routing
//!
//! Every pool pairs the native asset with one other asset, so a swap between
//! two non-native assets runs as two legs: source to native in the source
//! pool, then native to target in the target pool. The first leg carries no
//! trade target; the limit applies to the final emission only.

use crate::errors::AmmError;
use crate::pool_traits::PoolSource;
use crate::swap_math::{swap_one, LegOutcome};
use engine_config::EngineConfig;
use types::{Asset, Pool, Uint};

/// Priced swap, with the updated pool of every leg
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapOutcome {
    pub legs: Vec<LegOutcome>,
    /// Final amount of the target asset
    pub emit: Uint,
    /// Liquidity fee across all legs, in native terms
    pub liquidity_fee_in_native: Uint,
}

impl SwapOutcome {
    pub fn is_double(&self) -> bool {
        self.legs.len() > 1
    }

    /// Final state of every pool touched, in leg order without duplicates
    pub fn pools(&self) -> Vec<Pool> {
        let mut pools: Vec<Pool> = Vec::with_capacity(self.legs.len());
        for leg in &self.legs {
            match pools.iter_mut().find(|p| p.asset == leg.pool.asset) {
                Some(existing) => *existing = leg.pool.clone(),
                None => pools.push(leg.pool.clone()),
            }
        }
        pools
    }
}

/// Price a swap against the given pools without persisting anything
///
/// Fails with [`AmmError::PriceLimit`] when a non-zero `trade_target` is not
/// met and with [`AmmError::ZeroEmission`] when nothing would be paid out.
pub fn swap(
    pools: &impl PoolSource,
    source: &Asset,
    target: &Asset,
    amount: Uint,
    trade_target: Uint,
    config: &EngineConfig,
) -> Result<SwapOutcome, AmmError> {
    if source == target {
        return Err(AmmError::SameAsset(source.to_string()));
    }
    let native = Asset::native();
    let load = |asset: &Asset| -> Result<Pool, AmmError> {
        let pool = pools
            .pool(asset)
            .ok_or_else(|| AmmError::PoolNotFound(asset.layer1().to_string()))?;
        Ok(pool.calc_units(pools.synth_supply(asset)))
    };

    let mut legs = Vec::with_capacity(2);
    let mut amount = amount;
    if !source.is_native() && !target.is_native() {
        let first = swap_one(&load(source)?, source, &native, amount, config)?;
        if first.emit.is_zero() {
            return Err(AmmError::ZeroEmission);
        }
        amount = first.emit;
        legs.push(first);
    }

    let pool_asset = if target.is_native() { source } else { target };
    let pool = match legs.first() {
        // both legs through the same pool (layer-1 to its synth)
        Some(first) if first.pool.asset == pool_asset.layer1() => first.pool.clone(),
        _ => load(pool_asset)?,
    };
    let leg_source = if target.is_native() { source } else { &native };
    let last = swap_one(&pool, leg_source, target, amount, config)?;
    legs.push(last);

    let emit = legs.last().map(|leg| leg.emit).unwrap_or(Uint::ZERO);
    if !trade_target.is_zero() && emit < trade_target {
        return Err(AmmError::PriceLimit {
            emitted: emit.to_string(),
            limit: trade_target.to_string(),
        });
    }
    if emit.is_zero() {
        return Err(AmmError::ZeroEmission);
    }

    let liquidity_fee_in_native = legs.iter().map(|leg| leg.liquidity_fee_in_native).sum();
    Ok(SwapOutcome {
        legs,
        emit,
        liquidity_fee_in_native,
    })
}
