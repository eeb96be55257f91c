//! Liquidity redemption
//!
//! A withdrawal claims `bps / 10000` of a provider's units and pays out the
//! same fraction of the pool's depth on both sides. An asymmetric withdrawal
//! to a single side swaps the other side's share through what remains of the
//! pool.

use crate::errors::AmmError;
use crate::swap_math::SwapMath;
use engine_config::EngineConfig;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use types::{get_safe_share, Asset, LiquidityProvider, Pool, PoolStatus, Uint, MAX_BASIS_POINTS};

/// Side to receive a withdrawal on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawSide {
    #[default]
    Both,
    NativeOnly,
    AssetOnly,
}

/// Amounts released by a redemption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Redemption {
    pub native: Uint,
    pub asset: Uint,
    /// Units the provider keeps
    pub units_after: Uint,
}

fn check_basis_points(basis_points: u64) -> Result<(), AmmError> {
    if basis_points == 0 || basis_points > MAX_BASIS_POINTS {
        return Err(AmmError::InvalidWithdrawBasisPoints(basis_points));
    }
    Ok(())
}

/// Redeem `basis_points` of `lp_units` from a pool
#[allow(clippy::too_many_arguments)]
pub fn calculate_withdraw(
    pool_asset: &Asset,
    pool_units: Uint,
    pool_native: Uint,
    pool_depth: Uint,
    lp_units: Uint,
    basis_points: u64,
    side: WithdrawSide,
    config: &EngineConfig,
) -> Result<Redemption, AmmError> {
    let pool = pool_asset.to_string();
    if pool_units.is_zero() {
        return Err(AmmError::ZeroPoolUnits { pool });
    }
    if pool_native.is_zero() {
        return Err(AmmError::ZeroPoolBalance { pool, side: "native" });
    }
    if pool_depth.is_zero() {
        return Err(AmmError::ZeroPoolBalance { pool, side: "asset" });
    }
    if lp_units.is_zero() {
        return Err(AmmError::NoUnitsLeft);
    }
    check_basis_points(basis_points)?;

    let units_to_claim = get_safe_share(Uint::from(basis_points), Uint::from(MAX_BASIS_POINTS), lp_units);
    let units_after = lp_units.safe_sub(units_to_claim);
    let native = get_safe_share(units_to_claim, pool_units, pool_native);
    let asset = get_safe_share(units_to_claim, pool_units, pool_depth);

    let remaining_native = pool_native.safe_sub(native);
    let remaining_asset = pool_depth.safe_sub(asset);
    let floor = Uint::from(config.slip_floors.for_class(pool_asset.class()));

    match side {
        WithdrawSide::Both => Ok(Redemption {
            native,
            asset,
            units_after,
        }),
        WithdrawSide::NativeOnly => {
            let quote = SwapMath::get_swap_calc(remaining_asset, asset, remaining_native, floor);
            Ok(Redemption {
                native: native + quote.emit,
                asset: Uint::ZERO,
                units_after,
            })
        }
        WithdrawSide::AssetOnly => {
            let quote = SwapMath::get_swap_calc(remaining_native, native, remaining_asset, floor);
            Ok(Redemption {
                native: Uint::ZERO,
                asset: asset + quote.emit,
                units_after,
            })
        }
    }
}

/// Redeem `basis_points` of a single-sided vault position
///
/// Degenerate inputs redeem nothing.
pub fn calculate_vault_withdraw(vault_units: Uint, vault_depth: Uint, lp_units: Uint, basis_points: u64) -> Redemption {
    if vault_units.is_zero() || lp_units.is_zero() || vault_depth.is_zero() || basis_points == 0 {
        return Redemption::default();
    }
    let units_to_claim = get_safe_share(
        Uint::from(basis_points.min(MAX_BASIS_POINTS)),
        Uint::from(MAX_BASIS_POINTS),
        lp_units,
    );
    Redemption {
        native: Uint::ZERO,
        asset: get_safe_share(units_to_claim, vault_units, vault_depth),
        units_after: lp_units.safe_sub(units_to_claim),
    }
}

/// Updated pool and provider after a withdrawal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawOutcome {
    pub pool: Pool,
    pub provider: LiquidityProvider,
    pub native: Uint,
    pub asset: Uint,
    pub units_redeemed: Uint,
    /// The withdrawal emptied a side and moved the pool to staged
    pub pool_staged: bool,
}

/// Apply a withdrawal to a pool and provider
///
/// A provider holding only pending funds gets them back in full regardless
/// of `basis_points`.
pub fn withdraw_liquidity(
    pool: &Pool,
    provider: &LiquidityProvider,
    synth_supply: Uint,
    basis_points: u64,
    side: WithdrawSide,
    height: u64,
    config: &EngineConfig,
) -> Result<WithdrawOutcome, AmmError> {
    check_basis_points(basis_points)?;
    let mut pool = pool.clone().calc_units(synth_supply);
    let mut provider = provider.clone();

    if provider.units.is_zero() {
        if !provider.has_pending() {
            return Err(AmmError::NoUnitsLeft);
        }
        pool.pending_inbound_native = pool.pending_inbound_native.safe_sub(provider.pending_native);
        pool.pending_inbound_asset = pool.pending_inbound_asset.safe_sub(provider.pending_asset);
        let (native, asset) = provider.take_pending();
        provider.last_withdraw_height = height;
        return Ok(WithdrawOutcome {
            pool,
            provider,
            native,
            asset,
            units_redeemed: Uint::ZERO,
            pool_staged: false,
        });
    }

    let pool_native = pool.balance_native;
    let pool_depth = pool.balance_asset;
    let original_units = provider.units;

    if pool.is_available() && provider.native_deposit_value.is_zero() && provider.asset_deposit_value.is_zero() {
        let units = pool.pool_units();
        provider.native_deposit_value = get_safe_share(original_units, units, pool_native);
        provider.asset_deposit_value = get_safe_share(original_units, units, pool_depth);
    }

    info!(
        pool = %pool.asset,
        pool_units = %pool.pool_units(),
        native = %pool_native,
        asset = %pool_depth,
        provider_units = %original_units,
        "pool before withdraw"
    );

    let redemption = calculate_withdraw(
        &pool.asset,
        pool.pool_units(),
        pool_native,
        pool_depth,
        original_units,
        basis_points,
        side,
        config,
    )?;

    let drains_native = redemption.native == pool_native;
    let drains_asset = redemption.asset == pool_depth;
    if drains_native != drains_asset {
        error!(pool = %pool.asset, "cannot withdraw 100% of only one side of the pool");
        return Err(AmmError::OneSidedFullWithdraw);
    }
    if redemption.units_after >= original_units {
        return Err(AmmError::UnitsIncreased {
            before: original_units.to_string(),
            after: redemption.units_after.to_string(),
        });
    }

    let units_redeemed = original_units.safe_sub(redemption.units_after);
    pool.lp_units = pool.lp_units.safe_sub(units_redeemed);
    pool.balance_native = pool_native.safe_sub(redemption.native);
    pool.balance_asset = pool_depth.safe_sub(redemption.asset);
    let pool_staged = pool.balance_native.is_zero() || pool.balance_asset.is_zero();
    if pool_staged {
        pool.status = PoolStatus::Staged;
    }
    let pool = pool.calc_units(synth_supply);

    let bps = Uint::from(basis_points);
    let max = Uint::from(MAX_BASIS_POINTS);
    provider.native_deposit_value = provider
        .native_deposit_value
        .safe_sub(get_safe_share(bps, max, provider.native_deposit_value));
    provider.asset_deposit_value = provider
        .asset_deposit_value
        .safe_sub(get_safe_share(bps, max, provider.asset_deposit_value));
    provider.units = redemption.units_after;
    provider.last_withdraw_height = height;

    info!(
        pool = %pool.asset,
        pool_units = %pool.pool_units(),
        native = %pool.balance_native,
        asset = %pool.balance_asset,
        paid_native = %redemption.native,
        paid_asset = %redemption.asset,
        "pool after withdraw"
    );

    Ok(WithdrawOutcome {
        pool,
        provider,
        native: redemption.native,
        asset: redemption.asset,
        units_redeemed,
        pool_staged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::Address;

    fn u(v: u64) -> Uint {
        Uint::from(v)
    }

    fn btc() -> Asset {
        "BTC.BTC".parse().unwrap()
    }

    fn setup(native: u64, depth: u64, units: u64, provider_units: u64) -> (Pool, LiquidityProvider) {
        let mut pool = Pool::new(btc());
        pool.balance_native = u(native);
        pool.balance_asset = u(depth);
        pool.lp_units = u(units);
        pool.status = PoolStatus::Available;
        let mut provider = LiquidityProvider::new(btc(), Address::new("thor1lp").unwrap());
        provider.units = u(provider_units);
        (pool, provider)
    }

    #[test]
    fn test_half_withdraw() {
        let config = EngineConfig::default();
        let r = calculate_withdraw(&btc(), u(1_000), u(1_000), u(2_000), u(500), 5_000, WithdrawSide::Both, &config)
            .unwrap();
        assert_eq!(r, Redemption { native: u(250), asset: u(500), units_after: u(250) });
    }

    #[test]
    fn test_withdraw_guards() {
        let config = EngineConfig::default();
        let call = |units, native, depth, lp, bps| {
            calculate_withdraw(&btc(), u(units), u(native), u(depth), u(lp), bps, WithdrawSide::Both, &config)
        };
        assert!(matches!(call(0, 10, 10, 10, 100), Err(AmmError::ZeroPoolUnits { .. })));
        assert!(matches!(call(10, 0, 10, 10, 100), Err(AmmError::ZeroPoolBalance { side: "native", .. })));
        assert!(matches!(call(10, 10, 0, 10, 100), Err(AmmError::ZeroPoolBalance { side: "asset", .. })));
        assert_eq!(call(10, 10, 10, 0, 100), Err(AmmError::NoUnitsLeft));
        assert_eq!(call(10, 10, 10, 10, 0), Err(AmmError::InvalidWithdrawBasisPoints(0)));
        assert_eq!(call(10, 10, 10, 10, 10_001), Err(AmmError::InvalidWithdrawBasisPoints(10_001)));
    }

    #[test]
    fn test_asymmetric_withdraw_swaps_other_side() {
        let config = EngineConfig::default();
        let both = calculate_withdraw(&btc(), u(1_000), u(1_000), u(1_000), u(100), 10_000, WithdrawSide::Both, &config)
            .unwrap();
        let native_only =
            calculate_withdraw(&btc(), u(1_000), u(1_000), u(1_000), u(100), 10_000, WithdrawSide::NativeOnly, &config)
                .unwrap();
        // 100 asset swapped into 900/900 remaining: 100*900*900/1000^2 = 81
        assert_eq!(native_only.native, both.native + u(81));
        assert_eq!(native_only.asset, Uint::ZERO);
    }

    #[test]
    fn test_vault_withdraw() {
        assert_eq!(
            calculate_vault_withdraw(u(1_000), u(500), u(200), 5_000),
            Redemption { native: Uint::ZERO, asset: u(50), units_after: u(100) }
        );
        assert_eq!(calculate_vault_withdraw(u(0), u(500), u(200), 5_000), Redemption::default());
    }

    #[test]
    fn test_full_withdraw_stages_pool() {
        let config = EngineConfig::default();
        let (pool, provider) = setup(1_000, 1_000, 1_000, 1_000);
        let out = withdraw_liquidity(&pool, &provider, Uint::ZERO, 10_000, WithdrawSide::Both, 9, &config).unwrap();
        assert_eq!(out.native, u(1_000));
        assert_eq!(out.asset, u(1_000));
        assert_eq!(out.units_redeemed, u(1_000));
        assert!(out.pool_staged);
        assert_eq!(out.pool.status, PoolStatus::Staged);
        assert_eq!(out.pool.lp_units, Uint::ZERO);
        assert!(out.provider.is_closed());
        assert_eq!(out.provider.last_withdraw_height, 9);
    }

    #[test]
    fn test_deposit_value_reduced_pro_rata() {
        let config = EngineConfig::default();
        let (pool, mut provider) = setup(1_000, 1_000, 1_000, 500);
        provider.native_deposit_value = u(400);
        provider.asset_deposit_value = u(600);
        let out = withdraw_liquidity(&pool, &provider, Uint::ZERO, 2_500, WithdrawSide::Both, 9, &config).unwrap();
        assert_eq!(out.provider.native_deposit_value, u(300));
        assert_eq!(out.provider.asset_deposit_value, u(450));
        assert_eq!(out.provider.units, u(375));
        assert_eq!(out.pool.lp_units, u(875));
    }

    #[test]
    fn test_pending_only_provider_gets_pending_back() {
        let config = EngineConfig::default();
        let (mut pool, mut provider) = setup(1_000, 1_000, 1_000, 0);
        pool.pending_inbound_asset = u(70);
        provider.pending_asset = u(70);
        let out = withdraw_liquidity(&pool, &provider, Uint::ZERO, 100, WithdrawSide::Both, 3, &config).unwrap();
        assert_eq!(out.asset, u(70));
        assert_eq!(out.pool.pending_inbound_asset, Uint::ZERO);
        assert!(out.provider.is_closed());

        let (pool, provider) = setup(1_000, 1_000, 1_000, 0);
        assert_eq!(
            withdraw_liquidity(&pool, &provider, Uint::ZERO, 100, WithdrawSide::Both, 3, &config).unwrap_err(),
            AmmError::NoUnitsLeft
        );
    }

    #[test]
    fn test_one_sided_drain_rejected() {
        let config = EngineConfig::default();
        // sole provider asks for everything as native: native side would be emptied alone
        let (pool, provider) = setup(1_000, 1_000, 1_000, 1_000);
        let result = withdraw_liquidity(&pool, &provider, Uint::ZERO, 10_000, WithdrawSide::AssetOnly, 1, &config);
        assert_eq!(result.unwrap_err(), AmmError::OneSidedFullWithdraw);
    }
}
