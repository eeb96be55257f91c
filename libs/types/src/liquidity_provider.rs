//! Liquidity provider position in a single pool

use crate::common::fixed_point::Uint;
use crate::common::identifiers::{Address, Asset, TxId};
use serde::{Deserialize, Serialize};

/// Position of one owner in one pool
///
/// Records are never deleted; a position with zero units and nothing
/// pending is closed but stays addressable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityProvider {
    pub asset: Asset,
    pub owner: Address,
    pub units: Uint,
    pub pending_native: Uint,
    pub pending_asset: Uint,
    pub pending_tx: Option<TxId>,
    pub native_deposit_value: Uint,
    pub asset_deposit_value: Uint,
    pub last_add_height: u64,
    pub last_withdraw_height: u64,
}

impl LiquidityProvider {
    pub fn new(asset: Asset, owner: Address) -> Self {
        Self {
            asset: asset.layer1(),
            owner,
            units: Uint::ZERO,
            pending_native: Uint::ZERO,
            pending_asset: Uint::ZERO,
            pending_tx: None,
            native_deposit_value: Uint::ZERO,
            asset_deposit_value: Uint::ZERO,
            last_add_height: 0,
            last_withdraw_height: 0,
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.pending_native.is_zero() || !self.pending_asset.is_zero()
    }

    pub fn is_closed(&self) -> bool {
        self.units.is_zero() && !self.has_pending()
    }

    /// Drop the staged deposit, returning `(native, asset)` that was pending
    pub fn take_pending(&mut self) -> (Uint, Uint) {
        let taken = (self.pending_native, self.pending_asset);
        self.pending_native = Uint::ZERO;
        self.pending_asset = Uint::ZERO;
        self.pending_tx = None;
        taken
    }
}
