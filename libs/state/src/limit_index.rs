//! Limit order index keys
//!
//! Resting limit swaps are bucketed by pair and by the rate they ask for,
//! `source_amount * 1e8 / trade_target`. A higher ratio means the swapper
//! offers more input per unit of output, so it clears first; keys order
//! descending by ratio within a pair so a walk meets the best bucket first.
//!
//! The textual form pads the ratio to a fixed 18 digits so that byte order
//! and numeric order agree:
//!
//! ```text
//! BTC.BTC>THOR.RUNE/000000000150000000/
//! ```

use crate::traits::StateError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use types::{PendingSwap, TradePair, Uint, ONE};

/// Fixed width of an encoded ratio
pub const RATIO_DIGITS: usize = 18;

/// Largest ratio that fits the encoding; larger ratios saturate here
pub const MAX_RATIO: u64 = 999_999_999_999_999_999;

/// Input per unit of output, scaled by 1e8
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Ratio(u64);

impl Ratio {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(MAX_RATIO);

    /// `input * 1e8 / output`, zero when `output` is zero
    pub fn of(input: Uint, output: Uint) -> Self {
        if output.is_zero() {
            return Self::ZERO;
        }
        let scaled = (input * Uint::from(ONE)).quo_or_zero(output);
        let value = scaled.to_u64().unwrap_or(MAX_RATIO).min(MAX_RATIO);
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn as_uint(&self) -> Uint {
        Uint::from(self.0)
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$}", self.0, width = RATIO_DIGITS)
    }
}

impl FromStr for Ratio {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != RATIO_DIGITS || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(StateError::Serialization(format!("invalid ratio segment: {s}")));
        }
        s.parse::<u64>()
            .map(Self)
            .map_err(|e| StateError::Serialization(format!("invalid ratio segment {s}: {e}")))
    }
}

/// Bucket key of the limit order index
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LimitIndexKey {
    pub pair: TradePair,
    pub ratio: Ratio,
}

impl LimitIndexKey {
    pub fn new(pair: TradePair, ratio: Ratio) -> Self {
        Self { pair, ratio }
    }

    /// Bucket a limit swap rests in
    pub fn for_swap(swap: &PendingSwap) -> Self {
        Self::new(swap.pair(), Ratio::of(swap.source.amount, swap.trade_target))
    }

    /// First key of `pair` in index order
    pub fn best(pair: TradePair) -> Self {
        Self::new(pair, Ratio::MAX)
    }

    /// Last key of `pair` in index order
    pub fn worst(pair: TradePair) -> Self {
        Self::new(pair, Ratio::ZERO)
    }
}

impl Ord for LimitIndexKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.pair
            .cmp(&other.pair)
            .then_with(|| other.ratio.cmp(&self.ratio))
    }
}

impl PartialOrd for LimitIndexKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for LimitIndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/", self.pair, self.ratio)
    }
}

impl FromStr for LimitIndexKey {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || StateError::Serialization(format!("invalid limit index key: {s}"));
        // synthetic assets contain '/', so split from the right
        let body = s.strip_suffix('/').ok_or_else(invalid)?;
        let (pair, ratio) = body.rsplit_once('/').ok_or_else(invalid)?;
        let (source, target) = pair.split_once('>').ok_or_else(invalid)?;
        Ok(Self::new(
            TradePair::new(source.parse()?, target.parse()?),
            ratio.parse()?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn pair(source: &str, target: &str) -> TradePair {
        TradePair::new(source.parse().unwrap(), target.parse().unwrap())
    }

    #[test]
    fn test_ratio_scaling_and_saturation() {
        assert_eq!(Ratio::of(Uint::from(150u64), Uint::from(100u64)).value(), 150_000_000);
        assert_eq!(Ratio::of(Uint::from(1u64), Uint::ZERO), Ratio::ZERO);
        assert_eq!(Ratio::of(Uint::from(u64::MAX), Uint::ONE), Ratio::MAX);
    }

    #[test]
    fn test_encoding_is_fixed_width() {
        let key = LimitIndexKey::new(pair("BTC.BTC", "THOR.RUNE"), Ratio(150_000_000));
        assert_eq!(key.to_string(), "BTC.BTC>THOR.RUNE/000000000150000000/");
        assert_eq!(key.to_string().parse::<LimitIndexKey>().unwrap(), key);

        let synth = LimitIndexKey::new(pair("BTC/BTC", "ETH.ETH"), Ratio(7));
        assert_eq!(synth.to_string().parse::<LimitIndexKey>().unwrap(), synth);
    }

    #[test]
    fn test_malformed_keys_rejected() {
        assert!("BTC.BTC>THOR.RUNE/123/".parse::<LimitIndexKey>().is_err());
        assert!("BTC.BTC>THOR.RUNE/000000000150000000".parse::<LimitIndexKey>().is_err());
        assert!("BTC.BTC/000000000150000000/".parse::<LimitIndexKey>().is_err());
    }

    #[test]
    fn test_best_ratio_sorts_first_within_pair() {
        let btc_rune = pair("BTC.BTC", "THOR.RUNE");
        let keys: BTreeSet<LimitIndexKey> = [5u64, 500, 50]
            .into_iter()
            .map(|r| LimitIndexKey::new(btc_rune.clone(), Ratio(r)))
            .collect();
        let ratios: Vec<u64> = keys.iter().map(|k| k.ratio.value()).collect();
        assert_eq!(ratios, vec![500, 50, 5]);

        assert!(LimitIndexKey::best(btc_rune.clone()) <= *keys.iter().next().unwrap());
        assert!(LimitIndexKey::worst(btc_rune) >= *keys.iter().last().unwrap());
    }

    #[test]
    fn test_textual_order_matches_numeric_order() {
        let p = pair("THOR.RUNE", "ETH.ETH");
        let low = LimitIndexKey::new(p.clone(), Ratio(9)).to_string();
        let high = LimitIndexKey::new(p, Ratio(10)).to_string();
        assert!(low < high);
    }
}
