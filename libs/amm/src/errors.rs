//! Error types for pool math
//!
//! Every failure is a value; nothing in this crate panics on bad input.

use thiserror::Error;
use types::{MathError, ValidationError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmmError {
    /// Pool plus deposit would hold no native
    #[error("total native in the pool is zero")]
    ZeroTotalNative,

    /// Pool plus deposit would hold no asset
    #[error("total asset in the pool is zero")]
    ZeroTotalAsset,

    /// Weighted unit formula has a zero denominator
    #[error("liquidity unit denominator is zero")]
    ZeroUnitDenominator,

    #[error("withdraw basis points {0} is not valid, needs to be in (0, 10000]")]
    InvalidWithdrawBasisPoints(u64),

    #[error("{pool} pool units is zero, cannot withdraw")]
    ZeroPoolUnits { pool: String },

    #[error("{pool} pool {side} balance is zero and can't withdraw")]
    ZeroPoolBalance { pool: String, side: &'static str },

    #[error("liquidity provider has zero units, cannot withdraw")]
    NoUnitsLeft,

    #[error("cannot withdraw 100% of one side of the pool")]
    OneSidedFullWithdraw,

    /// Withdrawal would have increased the provider's units
    #[error("liquidity provider units increased from {before} to {after}")]
    UnitsIncreased { before: String, after: String },

    #[error("pool {0} doesn't exist")]
    PoolNotFound(String),

    #[error("pool({0}) is not available")]
    PoolNotAvailable(String),

    #[error("swapping with a synthetic pool({0}) is not allowed")]
    SyntheticPool(String),

    #[error("amount is invalid")]
    InvalidAmount,

    #[error("invalid balance")]
    InvalidBalance,

    #[error("not enough balance")]
    NotEnoughBalance,

    #[error("zero emit asset")]
    ZeroEmission,

    /// Emission fell short of the requested trade target
    #[error("emit asset {emitted} less than price limit {limit}")]
    PriceLimit { emitted: String, limit: String },

    #[error("cannot swap from {0} --> {0}, assets match")]
    SameAsset(String),

    #[error("no pools selected during a streaming swap")]
    NoPoolsSelected,

    #[error("streaming swap is completed, cannot continue to swap again")]
    StreamingSwapCompleted,

    #[error(transparent)]
    Math(#[from] MathError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl AmmError {
    /// Failures that may succeed in a later block without any change to the
    /// request itself
    pub fn is_transient(&self) -> bool {
        matches!(self, AmmError::PriceLimit { .. })
    }
}
