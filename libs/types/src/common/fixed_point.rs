//! Deterministic wide-integer and fixed-point arithmetic
//!
//! Every consensus value in the ledger (balances, units, fees, emissions) is a
//! [`Uint`], a 256-bit unsigned integer. Division always truncates and no
//! operation panics: subtraction saturates at zero, multiplication saturates
//! at `Uint::MAX`, and division reports [`MathError::DivisionByZero`].
//!
//! ## Design Principles
//!
//! - **No Floats**: every replica computes bit-identical results
//! - **Truncating Division**: the remainder is always discarded toward zero
//! - **Safe Subtraction**: `a.safe_sub(b)` is zero when `b > a`
//! - **Clear Boundaries**: [`rust_decimal::Decimal`] is only produced for
//!   human-facing ratios, never fed back into ledger state
//!
//! [`Dec`] is an 18-decimal fixed-point view used where a ratio has to be
//! carried before truncating back to an integer (liquidity unit issuance).

use crate::common::errors::MathError;
use ethnum::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul};
use std::str::FromStr;

/// 256-bit unsigned ledger amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uint(U256);

impl Uint {
    pub const ZERO: Self = Self(U256::ZERO);
    pub const ONE: Self = Self(U256::ONE);
    pub const MAX: Self = Self(U256::MAX);

    /// Create from a 128-bit value (usable in const context)
    pub const fn new(value: u128) -> Self {
        Self(U256::new(value))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == U256::ZERO
    }

    /// Subtraction that floors at zero instead of wrapping or panicking
    pub fn safe_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    pub fn checked_add(self, rhs: Self) -> Result<Self, MathError> {
        self.0
            .checked_add(rhs.0)
            .map(Self)
            .ok_or(MathError::Overflow { operation: "add" })
    }

    pub fn checked_mul(self, rhs: Self) -> Result<Self, MathError> {
        self.0
            .checked_mul(rhs.0)
            .map(Self)
            .ok_or(MathError::Overflow { operation: "mul" })
    }

    /// Truncating division
    pub fn quo(self, rhs: Self) -> Result<Self, MathError> {
        if rhs.is_zero() {
            return Err(MathError::DivisionByZero { operation: "quo" });
        }
        Ok(Self(self.0 / rhs.0))
    }

    /// Truncating division returning zero for a zero divisor
    pub fn quo_or_zero(self, rhs: Self) -> Self {
        self.quo(rhs).unwrap_or(Self::ZERO)
    }

    pub fn rem(self, rhs: Self) -> Result<Self, MathError> {
        if rhs.is_zero() {
            return Err(MathError::DivisionByZero { operation: "rem" });
        }
        Ok(Self(self.0 % rhs.0))
    }

    /// Integer square root, truncated
    pub fn isqrt(self) -> Self {
        let x = self.0;
        if x < U256::new(2) {
            return self;
        }
        let mut z = x;
        let mut y = (x >> 1u32) + (x & U256::ONE);
        while y < z {
            z = y;
            y = (x / y + y) >> 1u32;
        }
        Self(z)
    }

    pub fn to_u64(&self) -> Option<u64> {
        self.to_u128().and_then(|v| u64::try_from(v).ok())
    }

    pub fn to_u128(&self) -> Option<u128> {
        let (high, low) = self.0.into_words();
        if high == 0 {
            Some(low)
        } else {
            None
        }
    }

    /// Human-facing decimal view; `None` beyond `Decimal`'s 96-bit range
    pub fn to_decimal(&self) -> Option<Decimal> {
        Decimal::from_str(&self.to_string()).ok()
    }
}

impl Default for Uint {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<u64> for Uint {
    fn from(value: u64) -> Self {
        Self(U256::from(value))
    }
}

impl From<u128> for Uint {
    fn from(value: u128) -> Self {
        Self(U256::new(value))
    }
}

impl From<u32> for Uint {
    fn from(value: u32) -> Self {
        Self(U256::from(value))
    }
}

/// Saturating addition
impl Add for Uint {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Uint {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Saturating multiplication
impl Mul for Uint {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self(self.0.saturating_mul(rhs.0))
    }
}

impl Sum for Uint {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, v| acc + v)
    }
}

impl fmt::Display for Uint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Uint {
    type Err = MathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        U256::from_str_radix(s.trim(), 10)
            .map(Self)
            .map_err(|_| MathError::InvalidNumber {
                input: s.to_string(),
            })
    }
}

// Amounts serialize as decimal strings so values above 2^53 survive JSON.
impl Serialize for Uint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Uint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// `allocation * part / total` with `part` capped at `total`
///
/// Returns zero when `total` or `part` is zero.
pub fn get_safe_share(part: Uint, total: Uint, allocation: Uint) -> Uint {
    if total.is_zero() || part.is_zero() {
        return Uint::ZERO;
    }
    get_uncapped_share(part.min(total), total, allocation)
}

/// `allocation * part / total` without capping `part`
///
/// Returns zero when `total` is zero.
pub fn get_uncapped_share(part: Uint, total: Uint, allocation: Uint) -> Uint {
    if total.is_zero() || part.is_zero() || allocation.is_zero() {
        return Uint::ZERO;
    }
    (part * allocation).quo_or_zero(total)
}

/// Fixed-point decimal with 18 fractional digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Dec(Uint);

impl Dec {
    pub const PRECISION: u32 = 18;
    pub const SCALE: Uint = Uint::new(1_000_000_000_000_000_000);

    pub fn from_uint(value: Uint) -> Result<Self, MathError> {
        value.checked_mul(Self::SCALE).map(Self)
    }

    /// `numerator / denominator` carried to 18 digits, truncated
    pub fn from_ratio(numerator: Uint, denominator: Uint) -> Result<Self, MathError> {
        let whole = numerator.quo(denominator)?;
        let remainder = numerator.rem(denominator)?;
        let fraction = remainder.checked_mul(Self::SCALE)?.quo(denominator)?;
        Ok(Self(whole.checked_mul(Self::SCALE)?.checked_add(fraction)?))
    }

    /// Integer part, discarding the fraction
    pub fn truncate(&self) -> Uint {
        self.0.quo_or_zero(Self::SCALE)
    }

    pub fn raw(&self) -> Uint {
        self.0
    }

    pub fn to_decimal(&self) -> Option<Decimal> {
        Decimal::from_str(&self.to_string()).ok()
    }
}

impl fmt::Display for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.truncate();
        let fraction = self.0.safe_sub(whole * Self::SCALE);
        write!(
            f,
            "{}.{:0>width$}",
            whole,
            fraction.to_string(),
            width = Self::PRECISION as usize
        )
    }
}
