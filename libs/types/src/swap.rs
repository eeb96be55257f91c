//! Queued swap requests and streaming swap progress

use crate::common::errors::ValidationError;
use crate::common::fixed_point::{get_safe_share, Uint};
use crate::common::identifiers::{Address, Asset, Coin, TxId};
use crate::MAX_BASIS_POINTS;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwapType {
    /// Execute at whatever the pool pays, subject to the trade target
    Market,
    /// Rest in the order book until the pool pays more than the trade target
    Limit,
}

/// Queue key: the originating transaction and the swap's position in it
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SwapKey {
    pub tx_id: TxId,
    pub index: u32,
}

impl fmt::Display for SwapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.tx_id, self.index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Affiliate {
    pub address: Address,
    pub basis_points: u64,
}

/// Swap waiting in the queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSwap {
    pub tx_id: TxId,
    pub index: u32,
    pub from_address: Address,
    pub source: Coin,
    pub target_asset: Asset,
    pub destination: Address,
    /// Minimum acceptable emission
    pub trade_target: Uint,
    pub swap_type: SwapType,
    pub stream_interval: u64,
    pub stream_quantity: u64,
    pub affiliate: Option<Affiliate>,
    /// Block at which the swap entered the queue
    pub initial_height: u64,
}

impl PendingSwap {
    pub fn key(&self) -> SwapKey {
        SwapKey {
            tx_id: self.tx_id.clone(),
            index: self.index,
        }
    }

    pub fn pair(&self) -> TradePair {
        TradePair::new(self.source.asset.clone(), self.target_asset.clone())
    }

    pub fn is_limit(&self) -> bool {
        self.swap_type == SwapType::Limit
    }

    pub fn is_streaming(&self) -> bool {
        self.stream_interval > 0
    }

    /// Source amount forwarded to the affiliate
    pub fn affiliate_amount(&self) -> Uint {
        match &self.affiliate {
            Some(affiliate) if affiliate.basis_points > 0 => get_safe_share(
                Uint::from(affiliate.basis_points),
                Uint::from(MAX_BASIS_POINTS),
                self.source.amount,
            ),
            _ => Uint::ZERO,
        }
    }

    /// Source amount left for the primary swap after the affiliate share
    pub fn primary_amount(&self) -> Uint {
        self.source.amount.safe_sub(self.affiliate_amount())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.source.amount.is_zero() {
            return Err(ValidationError::ZeroAmount { field: "source" });
        }
        if self.source.asset == self.target_asset {
            return Err(ValidationError::Custom {
                message: format!("source and target are both {}", self.target_asset),
            });
        }
        if self.is_limit() && self.trade_target.is_zero() {
            return Err(ValidationError::ZeroAmount {
                field: "limit trade target",
            });
        }
        if let Some(affiliate) = &self.affiliate {
            if affiliate.basis_points > MAX_BASIS_POINTS {
                return Err(ValidationError::InvalidBasisPoints {
                    value: affiliate.basis_points,
                    min: 0,
                    max: MAX_BASIS_POINTS,
                });
            }
        }
        Ok(())
    }
}

/// Directional asset pair keying the limit order book
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TradePair {
    pub source: Asset,
    pub target: Asset,
}

impl TradePair {
    pub fn new(source: Asset, target: Asset) -> Self {
        Self { source, target }
    }

    /// One side is the native asset, so the pair trades through a single pool
    pub fn has_native(&self) -> bool {
        self.source.is_native() || self.target.is_native()
    }
}

impl fmt::Display for TradePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}>{}", self.source, self.target)
    }
}

/// Progress of a swap split into sub-swaps across blocks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamingSwap {
    pub tx_id: TxId,
    pub interval: u64,
    pub quantity: u64,
    pub count: u64,
    pub last_height: u64,
    pub trade_target: Uint,
    pub deposit: Uint,
    #[serde(rename = "in")]
    pub input: Uint,
    #[serde(rename = "out")]
    pub output: Uint,
    pub failed_swaps: Vec<u64>,
    pub failed_swap_reasons: Vec<String>,
}

impl StreamingSwap {
    pub fn new(tx_id: TxId, interval: u64, quantity: u64, trade_target: Uint, deposit: Uint) -> Self {
        Self {
            tx_id,
            interval,
            quantity,
            count: 0,
            last_height: 0,
            trade_target,
            deposit,
            input: Uint::ZERO,
            output: Uint::ZERO,
            failed_swaps: Vec::new(),
            failed_swap_reasons: Vec::new(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.count >= self.quantity || self.input >= self.deposit
    }

    /// Whether a sub-swap is due at `height`
    ///
    /// The first sub-swap runs as soon as it is seen; later ones wait a
    /// whole number of intervals since the last attempt.
    pub fn is_due(&self, height: u64) -> bool {
        if self.count == 0 {
            return true;
        }
        if self.interval == 0 || self.last_height >= height {
            return false;
        }
        (height - self.last_height) % self.interval == 0
    }

    /// Deposit and trade target slice for the next sub-swap
    ///
    /// Slices are `deposit / quantity`; the final slice takes whatever
    /// remains so the full deposit is consumed.
    pub fn next_size(&self) -> (Uint, Uint) {
        if self.is_done() || self.quantity == 0 {
            return (Uint::ZERO, Uint::ZERO);
        }
        if self.count + 1 >= self.quantity {
            return (
                self.deposit.safe_sub(self.input),
                self.trade_target.safe_sub(self.output),
            );
        }
        let quantity = Uint::from(self.quantity);
        let size = self.deposit.quo_or_zero(quantity);
        let target = self.trade_target.quo_or_zero(quantity);
        (size, target)
    }

    /// Record a completed sub-swap
    pub fn record_sub_swap(&mut self, height: u64, input: Uint, output: Uint) -> Result<(), ValidationError> {
        if self.is_done() {
            return Err(ValidationError::Custom {
                message: "streaming swap is completed, cannot continue to swap again".to_string(),
            });
        }
        self.input += input;
        self.output += output;
        self.count += 1;
        self.last_height = height;
        Ok(())
    }

    /// Record a failed sub-swap attempt; the slot counts as used
    pub fn record_failure(&mut self, height: u64, reason: impl Into<String>) {
        self.failed_swaps.push(self.count);
        self.failed_swap_reasons.push(reason.into());
        self.count += 1;
        self.last_height = height;
    }

    /// Deposit not consumed by executed sub-swaps
    pub fn remainder(&self) -> Uint {
        self.deposit.safe_sub(self.input)
    }
}
