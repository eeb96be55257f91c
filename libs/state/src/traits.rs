//! State Store Traits
//!
//! The engine reads and writes ledger entities through [`StateStore`] and
//! reports what happened through [`EventSink`]. Both traits are object safe so
//! the swap queue can work against `&mut dyn` references to whatever store a
//! node provides.

use crate::events::Event;
use crate::limit_index::LimitIndexKey;
use amm::{AmmError, PoolSource};
use thiserror::Error;
use types::{
    Address, Asset, LiquidityProvider, PendingSwap, Pool, StreamingSwap, SwapKey, TradePair, TxId, Uint,
    ValidationError,
};

/// Error types for state management operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    #[error("State validation failed: {reason}")]
    ValidationFailed { reason: String },

    #[error("State operation failed: {reason}")]
    OperationFailed { reason: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Amm(#[from] AmmError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl From<serde_json::Error> for StateError {
    fn from(err: serde_json::Error) -> Self {
        StateError::Serialization(err.to_string())
    }
}

/// Ledger storage consumed by the engine
///
/// Iterators are finite and restart from the beginning on every call. Pools
/// iterate in asset order, queue items in key order, and limit index buckets
/// best rate first.
pub trait StateStore {
    fn pool(&self, asset: &Asset) -> Option<Pool>;
    fn set_pool(&mut self, pool: Pool);
    fn pools(&self) -> Box<dyn Iterator<Item = Pool> + '_>;

    fn liquidity_provider(&self, pool: &Asset, owner: &Address) -> Option<LiquidityProvider>;
    fn set_liquidity_provider(&mut self, provider: LiquidityProvider);
    fn liquidity_providers(&self, pool: &Asset) -> Box<dyn Iterator<Item = LiquidityProvider> + '_>;

    /// Outstanding supply of a pool's synthetic asset
    fn synth_supply(&self, pool: &Asset) -> Uint;
    fn set_synth_supply(&mut self, pool: &Asset, supply: Uint);

    fn queue_item(&self, key: &SwapKey) -> Option<PendingSwap>;
    fn set_queue_item(&mut self, item: PendingSwap);
    fn remove_queue_item(&mut self, key: &SwapKey) -> Option<PendingSwap>;
    fn queue_items(&self) -> Box<dyn Iterator<Item = PendingSwap> + '_>;

    /// Add `swap` to a limit index bucket; a swap is indexed at most once
    fn insert_limit_index(&mut self, key: LimitIndexKey, swap: SwapKey);
    fn remove_limit_index(&mut self, key: &LimitIndexKey, swap: &SwapKey);
    fn limit_index(&self, pair: &TradePair) -> Box<dyn Iterator<Item = (LimitIndexKey, Vec<SwapKey>)> + '_>;

    /// Pairs flagged for a limit walk, aligned to the block's pair list
    fn pair_bitset(&self) -> Vec<bool>;
    fn set_pair_bitset(&mut self, bits: Vec<bool>);

    fn streaming_swap(&self, tx_id: &TxId) -> Option<StreamingSwap>;
    fn set_streaming_swap(&mut self, swp: StreamingSwap);
    fn remove_streaming_swap(&mut self, tx_id: &TxId);
}

/// Receiver of engine notifications
///
/// Delivery is best effort: callers log a failed emit and carry on.
pub trait EventSink {
    fn emit(&mut self, event: Event) -> Result<(), StateError>;
}

/// Stores that can be captured and rebuilt, e.g. to seed a new replica
pub trait Snapshot {
    fn snapshot(&self) -> Result<Vec<u8>, StateError>;
    fn restore(&mut self, snapshot: &[u8]) -> Result<(), StateError>;
}

/// Pricing view over any state store
pub struct PoolView<'a, S: ?Sized>(pub &'a S);

impl<S: StateStore + ?Sized> PoolSource for PoolView<'_, S> {
    fn pool(&self, asset: &Asset) -> Option<Pool> {
        self.0.pool(&asset.layer1())
    }

    fn synth_supply(&self, asset: &Asset) -> Uint {
        self.0.synth_supply(&asset.layer1())
    }
}
