//! Arithmetic primitives, identifiers and error types shared by every crate

pub mod errors;
pub mod fixed_point;
pub mod identifiers;

pub use errors::{MathError, ValidationError};
pub use fixed_point::{get_safe_share, get_uncapped_share, Dec, Uint};
pub use identifiers::{Address, Asset, AssetClass, AssetKind, Coin, TxId, NATIVE_CHAIN, NATIVE_SYMBOL};
