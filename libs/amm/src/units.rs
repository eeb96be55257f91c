//! Liquidity unit issuance
//!
//! Units are issued so that a deposit's share of the pool after the deposit
//! equals its share of the combined value, with asymmetric deposits paying an
//! implicit swap into the pool:
//!
//! ```text
//!          P * (r*A + a*R + 2*r*a)
//! units = -------------------------
//!          r*A + a*R + 2*R*A
//! ```
//!
//! where `P` is the pool's current units, `R`/`A` its native/asset depth and
//! `r`/`a` the deposit. The first deposit into an empty pool bootstraps units
//! at native scale.

use crate::errors::AmmError;
use tracing::{debug, info};
use types::{get_safe_share, get_uncapped_share, Dec, LiquidityProvider, Pool, TxId, Uint};

/// Units issued by a pool deposit
///
/// Returns `(new_pool_units, issued)`.
pub fn issue_units(
    pool_units: Uint,
    pool_native: Uint,
    pool_asset: Uint,
    add_native: Uint,
    add_asset: Uint,
) -> Result<(Uint, Uint), AmmError> {
    if (add_native + pool_native).is_zero() {
        return Err(AmmError::ZeroTotalNative);
    }
    if (add_asset + pool_asset).is_zero() {
        return Err(AmmError::ZeroTotalAsset);
    }

    if pool_native.is_zero() || pool_asset.is_zero() || pool_units.is_zero() {
        let issued = if !add_native.is_zero() {
            add_native
        } else if !pool_asset.is_zero() {
            // keep native scale for new units where possible
            get_uncapped_share(add_asset, pool_asset, pool_native)
        } else {
            add_asset
        };
        return Ok((pool_units + issued, issued));
    }

    let two = Uint::from(2u64);
    let cross = add_native.checked_mul(pool_asset)?.checked_add(add_asset.checked_mul(pool_native)?)?;
    let numerator = pool_units.checked_mul(cross.checked_add(two.checked_mul(add_native)?.checked_mul(add_asset)?)?)?;
    let denominator = cross.checked_add(two.checked_mul(pool_asset)?.checked_mul(pool_native)?)?;
    if denominator.is_zero() {
        return Err(AmmError::ZeroUnitDenominator);
    }

    let issued = Dec::from_ratio(numerator, denominator)?.truncate();
    Ok((pool_units + issued, issued))
}

/// Units issued by a single-sided vault deposit
///
/// Returns `(new_pool_units, issued)`.
pub fn issue_vault_units(pool_units: Uint, pool_amount: Uint, add_amount: Uint) -> (Uint, Uint) {
    if pool_units.is_zero() || pool_amount.is_zero() {
        return (add_amount, add_amount);
    }
    if add_amount.is_zero() {
        return (pool_units, Uint::ZERO);
    }
    let issued = get_uncapped_share(add_amount, pool_amount, pool_units);
    (pool_units + issued, issued)
}

/// A liquidity deposit into a pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deposit {
    pub native: Uint,
    pub asset: Uint,
    pub tx_id: TxId,
    /// Hold one-sided funds as pending until the other side arrives
    pub stage: bool,
    pub height: u64,
}

/// Updated pool and provider after a deposit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddLiquidityOutcome {
    pub pool: Pool,
    pub provider: LiquidityProvider,
    pub units_issued: Uint,
    /// Native credited to the pool, including previously pending funds
    pub native_added: Uint,
    /// Asset credited to the pool, including previously pending funds
    pub asset_added: Uint,
    /// Funds were held as pending and no units were issued
    pub staged: bool,
    /// The pool had no units before this deposit
    pub first_deposit: bool,
}

/// Apply a deposit to a pool and provider
///
/// Inputs are not modified; the caller persists the returned values.
pub fn add_liquidity(
    pool: &Pool,
    provider: &LiquidityProvider,
    synth_supply: Uint,
    deposit: &Deposit,
) -> Result<AddLiquidityOutcome, AmmError> {
    let mut pool = pool.clone().calc_units(synth_supply);
    let mut provider = provider.clone();
    let original_units = pool.pool_units();
    provider.last_add_height = deposit.height;

    let pending_native = provider.pending_native + deposit.native;
    let pending_asset = provider.pending_asset + deposit.asset;

    if deposit.stage && (pending_asset.is_zero() || pending_native.is_zero()) {
        pool.pending_inbound_native += deposit.native;
        pool.pending_inbound_asset += deposit.asset;
        provider.pending_native = pending_native;
        provider.pending_asset = pending_asset;
        provider.pending_tx = Some(deposit.tx_id.clone());
        debug!(
            pool = %pool.asset,
            native = %deposit.native,
            asset = %deposit.asset,
            "staged pending liquidity"
        );
        return Ok(AddLiquidityOutcome {
            pool,
            provider,
            units_issued: Uint::ZERO,
            native_added: Uint::ZERO,
            asset_added: Uint::ZERO,
            staged: true,
            first_deposit: false,
        });
    }

    pool.pending_inbound_native = pool.pending_inbound_native.safe_sub(provider.pending_native);
    pool.pending_inbound_asset = pool.pending_inbound_asset.safe_sub(provider.pending_asset);
    provider.take_pending();

    info!(
        pool = %pool.asset,
        native = %pool.balance_native,
        asset = %pool.balance_asset,
        lp_units = %pool.lp_units,
        synth_units = %pool.synth_units,
        "pre add liquidity"
    );

    let (_, issued) = issue_units(
        original_units,
        pool.balance_native,
        pool.balance_asset,
        pending_native,
        pending_asset,
    )?;

    pool.lp_units += issued;
    pool.balance_native += pending_native;
    pool.balance_asset += pending_asset;
    if pool.balance_native.is_zero() || pool.balance_asset.is_zero() {
        return Err(AmmError::InvalidBalance);
    }
    let pool = pool.calc_units(synth_supply);

    provider.units += issued;
    let units = pool.pool_units();
    provider.native_deposit_value += get_safe_share(issued, units, pool.balance_native);
    provider.asset_deposit_value += get_safe_share(issued, units, pool.balance_asset);

    info!(
        pool = %pool.asset,
        native = %pool.balance_native,
        asset = %pool.balance_asset,
        lp_units = %pool.lp_units,
        issued = %issued,
        "post add liquidity"
    );

    Ok(AddLiquidityOutcome {
        first_deposit: original_units.is_zero(),
        pool,
        provider,
        units_issued: issued,
        native_added: pending_native,
        asset_added: pending_asset,
        staged: false,
    })
}
