//! Pool ledger entity
//!
//! A pool pairs the native settlement asset with one external asset. Liquidity
//! providers own `lp_units`; outstanding synthetic supply is represented by
//! derived `synth_units` so that
//!
//! ```text
//! pool_units = lp_units + synth_units
//! ```
//!
//! `synth_units` is never persisted authoritatively. Callers recompute it with
//! [`Pool::calc_units`] from the current synthetic supply before reading
//! [`Pool::pool_units`].

use crate::common::errors::ValidationError;
use crate::common::fixed_point::{get_uncapped_share, Dec, Uint};
use crate::common::identifiers::Asset;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoolStatus {
    /// Open for swaps and liquidity
    Available,
    /// Accepting liquidity only; swaps are refused
    Staged,
    /// Frozen
    Suspended,
}

impl fmt::Display for PoolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PoolStatus::Available => "Available",
            PoolStatus::Staged => "Staged",
            PoolStatus::Suspended => "Suspended",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub asset: Asset,
    pub balance_native: Uint,
    pub balance_asset: Uint,
    pub lp_units: Uint,
    #[serde(skip)]
    pub synth_units: Uint,
    pub pending_inbound_native: Uint,
    pub pending_inbound_asset: Uint,
    pub status: PoolStatus,
    pub decimals: u8,
}

impl Pool {
    /// Empty pool for `asset`, staged until liquidity arrives
    pub fn new(asset: Asset) -> Self {
        Self {
            asset: asset.layer1(),
            balance_native: Uint::ZERO,
            balance_asset: Uint::ZERO,
            lp_units: Uint::ZERO,
            synth_units: Uint::ZERO,
            pending_inbound_native: Uint::ZERO,
            pending_inbound_asset: Uint::ZERO,
            status: PoolStatus::Staged,
            decimals: 8,
        }
    }

    pub fn pool_units(&self) -> Uint {
        self.lp_units + self.synth_units
    }

    pub fn is_available(&self) -> bool {
        self.status == PoolStatus::Available
    }

    /// Both sides drained
    pub fn is_empty(&self) -> bool {
        self.balance_native.is_zero() && self.balance_asset.is_zero()
    }

    /// Recompute `synth_units` from the outstanding synthetic supply
    pub fn calc_units(mut self, synth_supply: Uint) -> Self {
        self.synth_units = calculate_synth_units(self.balance_asset, synth_supply, self.lp_units);
        self
    }

    /// Native value of `amount` of the pool asset at the current depth ratio
    pub fn asset_value_in_native(&self, amount: Uint) -> Uint {
        get_uncapped_share(self.balance_native, self.balance_asset, amount)
    }

    /// Asset value of `amount` of native at the current depth ratio
    pub fn native_value_in_asset(&self, amount: Uint) -> Uint {
        get_uncapped_share(self.balance_asset, self.balance_native, amount)
    }

    /// Liquidity unit value index, `sqrt(native * asset) / pool_units`
    ///
    /// Reporting value only; `None` for a pool without units.
    pub fn luvi(&self) -> Option<Decimal> {
        let units = self.pool_units();
        if units.is_zero() {
            return None;
        }
        let depth = (self.balance_native * self.balance_asset).isqrt();
        Dec::from_ratio(depth, units).ok()?.to_decimal()
    }

    /// Check the balance and unit invariants
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.pool_units().is_zero() {
            return Ok(());
        }
        if self.balance_asset.is_zero() {
            return Err(ValidationError::Custom {
                message: format!("pool {} has units but zero asset balance", self.asset),
            });
        }
        if self.balance_native.is_zero() && self.synth_units.is_zero() {
            return Err(ValidationError::Custom {
                message: format!("pool {} has units but zero native balance", self.asset),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] native={} asset={} lp_units={} synth_units={}",
            self.asset,
            self.status,
            self.balance_native,
            self.balance_asset,
            self.lp_units,
            self.synth_units
        )
    }
}

/// Units attributable to outstanding synthetic supply
///
/// `lp_units * supply / (2 * asset_depth - supply)`; zero when there is no
/// supply or the denominator vanishes.
pub fn calculate_synth_units(asset_depth: Uint, synth_supply: Uint, lp_units: Uint) -> Uint {
    if synth_supply.is_zero() {
        return Uint::ZERO;
    }
    let denominator = (asset_depth * Uint::from(2u64)).safe_sub(synth_supply);
    if denominator.is_zero() {
        return Uint::ZERO;
    }
    (lp_units * synth_supply).quo_or_zero(denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn btc_pool(native: u64, asset: u64, units: u64) -> Pool {
        let mut pool = Pool::new("BTC.BTC".parse().unwrap());
        pool.balance_native = Uint::from(native);
        pool.balance_asset = Uint::from(asset);
        pool.lp_units = Uint::from(units);
        pool.status = PoolStatus::Available;
        pool
    }

    #[test]
    fn test_synth_units() {
        // 1000 units, 100 asset, 50 synth: 1000 * 50 / (200 - 50) = 333
        let pool = btc_pool(100, 100, 1_000).calc_units(Uint::from(50u64));
        assert_eq!(pool.synth_units, Uint::from(333u64));
        assert_eq!(pool.pool_units(), Uint::from(1_333u64));

        assert_eq!(calculate_synth_units(Uint::from(100u64), Uint::ZERO, Uint::from(1_000u64)), Uint::ZERO);
        assert_eq!(calculate_synth_units(Uint::from(100u64), Uint::from(200u64), Uint::from(1_000u64)), Uint::ZERO);
    }

    #[test]
    fn test_value_conversions() {
        let pool = btc_pool(2_000, 1_000, 1_000);
        assert_eq!(pool.asset_value_in_native(Uint::from(10u64)), Uint::from(20u64));
        assert_eq!(pool.native_value_in_asset(Uint::from(10u64)), Uint::from(5u64));

        let empty = Pool::new("ETH.ETH".parse().unwrap());
        assert_eq!(empty.asset_value_in_native(Uint::from(10u64)), Uint::ZERO);
    }

    #[test]
    fn test_luvi() {
        let pool = btc_pool(400, 100, 100);
        assert_eq!(pool.luvi(), Some(dec!(2)));
        assert_eq!(Pool::new("BTC.BTC".parse().unwrap()).luvi(), None);
    }

    #[test]
    fn test_validate_invariants() {
        assert!(btc_pool(100, 100, 100).validate().is_ok());
        assert!(btc_pool(0, 0, 0).validate().is_ok());
        assert!(btc_pool(100, 0, 100).validate().is_err());
        assert!(btc_pool(0, 100, 100).validate().is_err());
    }

    #[test]
    fn test_serde_skips_synth_units() {
        let pool = btc_pool(100, 100, 100).calc_units(Uint::from(10u64));
        let json = serde_json::to_string(&pool).unwrap();
        let back: Pool = serde_json::from_str(&json).unwrap();
        assert_eq!(back.synth_units, Uint::ZERO);
        assert_eq!(back.lp_units, pool.lp_units);
    }
}
