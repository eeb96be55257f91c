//! Streaming swap sizing
//!
//! A streaming swap is split into sub-swaps no smaller than the size at which
//! the slip floor starts to bind. Splitting below that point only pays the
//! floor fee repeatedly, so the floor-sized sub-swap sets the maximum number
//! of slices.

use crate::errors::AmmError;
use crate::pool_traits::PoolSource;
use engine_config::{EngineConfig, StreamingSizer};
use tracing::{debug, warn};
use types::{get_safe_share, get_uncapped_share, Asset, Pool, StreamingSwap, Uint, MAX_BASIS_POINTS};

/// Largest number of sub-swaps a streaming swap of `deposit` may use
///
/// Returns zero for a non-streaming request (`interval == 0`).
pub fn max_swap_quantity(
    pools: &impl PoolSource,
    source: &Asset,
    target: &Asset,
    deposit: Uint,
    interval: u64,
    config: &EngineConfig,
) -> Result<u64, AmmError> {
    if interval == 0 {
        return Ok(0);
    }

    let mut legs: Vec<(Asset, Pool)> = Vec::with_capacity(2);
    for asset in [source, target] {
        if asset.is_native() {
            continue;
        }
        let pool = pools
            .pool(asset)
            .ok_or_else(|| AmmError::PoolNotFound(asset.layer1().to_string()))?;
        legs.push((asset.clone(), pool));
    }
    let Some((_, source_pool)) = legs.first() else {
        return Err(AmmError::NoPoolsSelected);
    };

    let min_size = match config.streaming.sizer {
        StreamingSizer::PerLegFloor => per_leg_floor_size(&legs, config),
        StreamingSizer::VirtualDepth => virtual_depth_floor_size(&legs, config)?,
    };
    // floor size is in native terms; convert to the deposited asset
    let min_size = if source.is_native() {
        min_size
    } else {
        get_uncapped_share(min_size, source_pool.balance_native, source_pool.balance_asset)
    };

    if min_size.is_zero() {
        debug!(%source, %target, "no slip floor configured, streaming in a single sub-swap");
        return Ok(1);
    }

    let max_length = if source.is_ledger_native() && target.is_ledger_native() {
        config.streaming.max_length_native
    } else {
        config.streaming.max_length
    };
    let max_in_length = max_length / interval;
    let mut quantity = deposit.quo_or_zero(min_size).to_u64().unwrap_or(u64::MAX);
    // the stream length clamp is final
    if quantity > max_in_length {
        return Ok(max_in_length);
    }
    if quantity == 0 {
        quantity = 1;
    }

    if let Some(derived_cap) = derived_quantity_cap(pools, &legs) {
        quantity = quantity.min(derived_cap);
    }
    Ok(quantity)
}

/// Smallest non-zero floor size across legs, from each leg's own native depth
fn per_leg_floor_size(legs: &[(Asset, Pool)], config: &EngineConfig) -> Uint {
    legs.iter()
        .filter_map(|(asset, pool)| {
            let floor = config.slip_floors.for_class(asset.class());
            if floor == 0 {
                return None;
            }
            Some(get_safe_share(
                Uint::from(floor),
                Uint::from(MAX_BASIS_POINTS),
                pool.balance_native,
            ))
        })
        .min()
        .unwrap_or(Uint::ZERO)
}

/// Lowest non-zero floor applied to the harmonic mean of both legs' depth
fn virtual_depth_floor_size(legs: &[(Asset, Pool)], config: &EngineConfig) -> Result<Uint, AmmError> {
    let depth = match legs {
        [(_, only)] => only.balance_native,
        [(_, first), (_, second)] => {
            let (r1, r2) = (first.balance_native, second.balance_native);
            (r1 * r2 * Uint::from(2u64)).quo(r1 + r2)?
        }
        _ => return Err(AmmError::NoPoolsSelected),
    };
    let floor = legs
        .iter()
        .map(|(asset, _)| config.slip_floors.for_class(asset.class()))
        .filter(|floor| *floor > 0)
        .min()
        .unwrap_or(0);
    Ok(get_safe_share(Uint::from(floor), Uint::from(MAX_BASIS_POINTS), depth))
}

/// `10000 / (10000 - dbps)` where `dbps` is a derived pool's native depth as
/// a share of its anchor's, smallest across derived legs
fn derived_quantity_cap(pools: &impl PoolSource, legs: &[(Asset, Pool)]) -> Option<u64> {
    let max = Uint::from(MAX_BASIS_POINTS);
    let dbps = legs
        .iter()
        .filter(|(asset, _)| asset.is_derived())
        .map(|(asset, pool)| {
            let anchor_depth = pools.anchor_native_depth(asset);
            if anchor_depth.is_zero() {
                warn!(asset = %asset, "derived asset has no anchor depth");
            }
            get_uncapped_share(pool.balance_native, anchor_depth, max)
        })
        .filter(|dbps| !dbps.is_zero())
        .min()?;
    let diff = max.safe_sub(dbps);
    if diff.is_zero() {
        return None;
    }
    max.quo_or_zero(diff).to_u64()
}

/// Sub-swap to run next, or an error once every slice has been used
pub fn next_sub_swap(swp: &StreamingSwap) -> Result<(Uint, Uint), AmmError> {
    if (swp.quantity > 0 && swp.is_done()) || swp.input >= swp.deposit {
        return Err(AmmError::StreamingSwapCompleted);
    }
    Ok(swp.next_size())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use types::{PoolStatus, TxId};

    fn u(v: u64) -> Uint {
        Uint::from(v)
    }

    fn add_pool(map: &mut BTreeMap<Asset, Pool>, asset: &str, native: u64, depth: u64) {
        let mut pool = Pool::new(asset.parse().unwrap());
        pool.balance_native = u(native);
        pool.balance_asset = u(depth);
        pool.lp_units = u(native);
        pool.status = PoolStatus::Available;
        map.insert(pool.asset.clone(), pool);
    }

    fn config_with_l1_floor(floor: u64) -> EngineConfig {
        let mut config = EngineConfig::default();
        config.slip_floors.layer1 = floor;
        config
    }

    #[test]
    fn test_zero_interval_is_not_streaming() {
        let pools = BTreeMap::new();
        let btc: Asset = "BTC.BTC".parse().unwrap();
        let config = config_with_l1_floor(10);
        assert_eq!(max_swap_quantity(&pools, &Asset::native(), &btc, u(1_000), 0, &config), Ok(0));
    }

    #[test]
    fn test_native_source_quantity() {
        let mut pools = BTreeMap::new();
        add_pool(&mut pools, "BTC.BTC", 1_000_000_000, 500_000_000);
        let btc: Asset = "BTC.BTC".parse().unwrap();
        // floor 10 bps of 1e9 native = 1e6 per sub-swap
        let config = config_with_l1_floor(10);
        assert_eq!(max_swap_quantity(&pools, &Asset::native(), &btc, u(50_000_000), 1, &config), Ok(50));
        // clamped by max length / interval = 14400 / 1000
        assert_eq!(max_swap_quantity(&pools, &Asset::native(), &btc, u(50_000_000), 1_000, &config), Ok(14));
    }

    #[test]
    fn test_asset_source_converts_floor() {
        let mut pools = BTreeMap::new();
        add_pool(&mut pools, "BTC.BTC", 1_000_000_000, 500_000_000);
        let btc: Asset = "BTC.BTC".parse().unwrap();
        let config = config_with_l1_floor(10);
        // 1e6 native floor is 5e5 asset
        assert_eq!(max_swap_quantity(&pools, &btc, &Asset::native(), u(50_000_000), 1, &config), Ok(100));
    }

    #[test]
    fn test_smaller_leg_wins() {
        let mut pools = BTreeMap::new();
        add_pool(&mut pools, "BTC.BTC", 1_000_000_000, 1_000_000_000);
        add_pool(&mut pools, "ETH.ETH", 100_000_000, 100_000_000);
        let btc: Asset = "BTC.BTC".parse().unwrap();
        let eth: Asset = "ETH.ETH".parse().unwrap();
        let config = config_with_l1_floor(10);
        // ETH leg floor = 1e5 native = 1e5 BTC: 10_000_000 / 100_000
        assert_eq!(max_swap_quantity(&pools, &btc, &eth, u(10_000_000), 1, &config), Ok(100));
    }

    #[test]
    fn test_no_floor_means_single_sub_swap() {
        let mut pools = BTreeMap::new();
        add_pool(&mut pools, "BTC.BTC", 1_000_000_000, 1_000_000_000);
        let btc: Asset = "BTC.BTC".parse().unwrap();
        let config = config_with_l1_floor(0);
        assert_eq!(max_swap_quantity(&pools, &Asset::native(), &btc, u(10_000_000), 1, &config), Ok(1));
    }

    #[test]
    fn test_tiny_deposit_still_gets_one() {
        let mut pools = BTreeMap::new();
        add_pool(&mut pools, "BTC.BTC", 1_000_000_000, 1_000_000_000);
        let btc: Asset = "BTC.BTC".parse().unwrap();
        let config = config_with_l1_floor(10);
        assert_eq!(max_swap_quantity(&pools, &Asset::native(), &btc, u(10), 1, &config), Ok(1));
    }

    #[test]
    fn test_native_only_uses_long_max_length() {
        let mut pools = BTreeMap::new();
        add_pool(&mut pools, "BTC.BTC", 1_000_000_000, 1_000_000_000);
        let synth: Asset = "BTC/BTC".parse().unwrap();
        let mut config = EngineConfig::default();
        config.slip_floors.synth = 10;
        // 1e6 per sub-swap, interval 14400: cross-chain would cap at 1
        let quantity = max_swap_quantity(&pools, &Asset::native(), &synth, u(50_000_000), 14_400, &config);
        assert_eq!(quantity, Ok(50));
    }

    #[test]
    fn test_derived_asset_reduces_quantity() {
        let mut pools = BTreeMap::new();
        add_pool(&mut pools, "BTC.BTC", 1_000_000_000, 1_000_000_000);
        add_pool(&mut pools, "THOR.BTC", 500_000_000, 500_000_000);
        let derived: Asset = "THOR.BTC".parse().unwrap();
        let mut config = EngineConfig::default();
        config.slip_floors.derived = 10;
        // dbps = 5000, cap = 10000 / 5000 = 2
        assert_eq!(max_swap_quantity(&pools, &Asset::native(), &derived, u(50_000_000), 1, &config), Ok(2));
    }

    #[test]
    fn test_length_clamp_skips_derived_cap() {
        let mut pools = BTreeMap::new();
        add_pool(&mut pools, "BTC.BTC", 1_000_000_000, 1_000_000_000);
        add_pool(&mut pools, "THOR.BTC", 500_000_000, 500_000_000);
        let derived: Asset = "THOR.BTC".parse().unwrap();
        let mut config = EngineConfig::default();
        config.slip_floors.derived = 10;
        config.streaming.max_length = 10;
        config.streaming.max_length_native = 10;
        // 100 floor-sized slices clamp to 10; the derived cap of 2 does not apply
        assert_eq!(max_swap_quantity(&pools, &Asset::native(), &derived, u(50_000_000), 1, &config), Ok(10));
    }

    #[test]
    fn test_virtual_depth_sizer() {
        let mut pools = BTreeMap::new();
        add_pool(&mut pools, "BTC.BTC", 3_000_000_000, 3_000_000_000);
        add_pool(&mut pools, "ETH.ETH", 1_000_000_000, 1_000_000_000);
        let btc: Asset = "BTC.BTC".parse().unwrap();
        let eth: Asset = "ETH.ETH".parse().unwrap();
        let mut config = config_with_l1_floor(10);
        config.streaming.sizer = StreamingSizer::VirtualDepth;
        // harmonic depth 2*3e9*1e9/4e9 = 1.5e9, floor 1.5e6
        assert_eq!(max_swap_quantity(&pools, &btc, &eth, u(15_000_000), 1, &config), Ok(10));
    }

    #[test]
    fn test_missing_pool_is_an_error() {
        let pools = BTreeMap::new();
        let btc: Asset = "BTC.BTC".parse().unwrap();
        let config = config_with_l1_floor(10);
        assert!(matches!(
            max_swap_quantity(&pools, &Asset::native(), &btc, u(10), 1, &config),
            Err(AmmError::PoolNotFound(_))
        ));
    }

    #[test]
    fn test_next_sub_swap_rejects_completed() {
        let mut swp = StreamingSwap::new(TxId::from_bytes([2; 32]), 1, 2, Uint::ZERO, u(100));
        assert_eq!(next_sub_swap(&swp), Ok((u(50), Uint::ZERO)));
        swp.record_sub_swap(1, u(50), u(1)).unwrap();
        swp.record_sub_swap(2, u(50), u(1)).unwrap();
        assert_eq!(next_sub_swap(&swp), Err(AmmError::StreamingSwapCompleted));
    }
}
