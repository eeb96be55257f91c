//! Typed identifiers for assets, transactions and addresses
//!
//! Assets are written `CHAIN<sep>SYMBOL` where the separator selects the
//! asset class:
//!
//! | Separator | Class     | Example      |
//! |-----------|-----------|--------------|
//! | `.`       | Layer-1   | `BTC.BTC`    |
//! | `/`       | Synthetic | `BTC/BTC`    |
//! | `~`       | Trade     | `BTC~BTC`    |
//! | `-`       | Secured   | `BTC-BTC`    |
//!
//! A layer-1 asset on the native chain other than the native asset itself
//! (for example `THOR.BTC`) is a derived asset.

use crate::common::errors::ValidationError;
use crate::common::fixed_point::Uint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Chain that hosts the native settlement asset
pub const NATIVE_CHAIN: &str = "THOR";

/// Symbol of the native settlement asset
pub const NATIVE_SYMBOL: &str = "RUNE";

/// How an asset is held on the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    Layer1,
    Synth,
    Trade,
    Secured,
}

impl AssetKind {
    fn separator(self) -> char {
        match self {
            AssetKind::Layer1 => '.',
            AssetKind::Synth => '/',
            AssetKind::Trade => '~',
            AssetKind::Secured => '-',
        }
    }

    fn from_separator(c: char) -> Option<Self> {
        match c {
            '.' => Some(AssetKind::Layer1),
            '/' => Some(AssetKind::Synth),
            '~' => Some(AssetKind::Trade),
            '-' => Some(AssetKind::Secured),
            _ => None,
        }
    }
}

/// Classes that carry their own minimum slip floor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetClass {
    Synthetic,
    Trade,
    Derived,
    Secured,
    Layer1,
}

/// Ledger asset identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Asset {
    pub chain: String,
    pub symbol: String,
    pub kind: AssetKind,
}

impl Asset {
    pub fn new(chain: &str, symbol: &str, kind: AssetKind) -> Self {
        Self {
            chain: chain.to_ascii_uppercase(),
            symbol: symbol.to_ascii_uppercase(),
            kind,
        }
    }

    /// The native settlement asset (`THOR.RUNE`)
    pub fn native() -> Self {
        Self::new(NATIVE_CHAIN, NATIVE_SYMBOL, AssetKind::Layer1)
    }

    pub fn is_native(&self) -> bool {
        self.kind == AssetKind::Layer1 && self.chain == NATIVE_CHAIN && self.symbol == NATIVE_SYMBOL
    }

    pub fn is_synthetic(&self) -> bool {
        self.kind == AssetKind::Synth
    }

    pub fn is_trade(&self) -> bool {
        self.kind == AssetKind::Trade
    }

    pub fn is_secured(&self) -> bool {
        self.kind == AssetKind::Secured
    }

    /// Layer-1 asset minted on the native chain that tracks an external pool
    pub fn is_derived(&self) -> bool {
        self.kind == AssetKind::Layer1 && self.chain == NATIVE_CHAIN && self.symbol != NATIVE_SYMBOL
    }

    /// Held entirely on the native ledger (no external chain settlement)
    pub fn is_ledger_native(&self) -> bool {
        self.chain == NATIVE_CHAIN || self.kind != AssetKind::Layer1
    }

    pub fn class(&self) -> AssetClass {
        match self.kind {
            AssetKind::Synth => AssetClass::Synthetic,
            AssetKind::Trade => AssetClass::Trade,
            AssetKind::Secured => AssetClass::Secured,
            AssetKind::Layer1 if self.is_derived() => AssetClass::Derived,
            AssetKind::Layer1 => AssetClass::Layer1,
        }
    }

    /// Layer-1 form of the asset; pools are keyed by this
    pub fn layer1(&self) -> Self {
        Self {
            chain: self.chain.clone(),
            symbol: self.symbol.clone(),
            kind: AssetKind::Layer1,
        }
    }

    pub fn synthetic(&self) -> Self {
        Self {
            chain: self.chain.clone(),
            symbol: self.symbol.clone(),
            kind: AssetKind::Synth,
        }
    }

    /// Layer-1 asset a derived asset tracks (`THOR.BTC` -> `BTC.BTC`)
    pub fn anchor(&self) -> Option<Self> {
        if !self.is_derived() {
            return None;
        }
        Some(Self::new(&self.symbol, &self.symbol, AssetKind::Layer1))
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.chain, self.kind.separator(), self.symbol)
    }
}

impl FromStr for Asset {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidAsset {
            input: s.to_string(),
        };
        // The chain is alphanumeric, so the first other character is the separator.
        let (idx, sep) = s
            .char_indices()
            .find(|(_, c)| !c.is_ascii_alphanumeric())
            .ok_or_else(invalid)?;
        let kind = AssetKind::from_separator(sep).ok_or_else(invalid)?;
        let chain = &s[..idx];
        let symbol = &s[idx + sep.len_utf8()..];
        if chain.is_empty() || symbol.is_empty() {
            return Err(invalid());
        }
        Ok(Self::new(chain, symbol, kind))
    }
}

impl Serialize for Asset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Asset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Reference to the transaction that carried a request
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TxId(String);

impl TxId {
    pub const LENGTH: usize = 64;

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build from raw 32 bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(hex::encode_upper(bytes))
    }
}

impl FromStr for TxId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != Self::LENGTH || hex::decode(s).is_err() {
            return Err(ValidationError::InvalidTxId {
                input: s.to_string(),
            });
        }
        Ok(Self(s.to_ascii_uppercase()))
    }
}

impl TryFrom<String> for TxId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TxId> for String {
    fn from(value: TxId) -> Self {
        value.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Account address on any chain
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::EmptyAddress);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An amount of one asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub asset: Asset,
    pub amount: Uint,
}

impl Coin {
    pub fn new(asset: Asset, amount: Uint) -> Self {
        Self { asset, amount }
    }

    pub fn is_empty(&self) -> bool {
        self.amount.is_zero()
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.asset)
    }
}
