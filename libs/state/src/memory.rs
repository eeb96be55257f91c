//! In-memory state store
//!
//! Ordered maps throughout, so every iteration is deterministic. Used by
//! tests and by tools that replay blocks outside a node.

use crate::limit_index::LimitIndexKey;
use crate::traits::{Snapshot, StateError, StateStore};
use amm::PoolSource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;
use types::{Address, Asset, LiquidityProvider, PendingSwap, Pool, StreamingSwap, SwapKey, TradePair, TxId, Uint};

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    pools: BTreeMap<Asset, Pool>,
    providers: BTreeMap<(Asset, Address), LiquidityProvider>,
    synth_supply: BTreeMap<Asset, Uint>,
    queue: BTreeMap<SwapKey, PendingSwap>,
    limit_index: BTreeMap<LimitIndexKey, Vec<SwapKey>>,
    pair_bitset: Vec<bool>,
    streaming: BTreeMap<TxId, StreamingSwap>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the given pools
    pub fn with_pools(pools: impl IntoIterator<Item = Pool>) -> Self {
        let mut store = Self::new();
        for pool in pools {
            store.set_pool(pool);
        }
        store
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Number of swaps resting in the limit index across all pairs
    pub fn limit_index_len(&self) -> usize {
        self.limit_index.values().map(Vec::len).sum()
    }
}

impl StateStore for MemoryStore {
    fn pool(&self, asset: &Asset) -> Option<Pool> {
        self.pools.get(&asset.layer1()).cloned()
    }

    fn set_pool(&mut self, pool: Pool) {
        self.pools.insert(pool.asset.clone(), pool);
    }

    fn pools(&self) -> Box<dyn Iterator<Item = Pool> + '_> {
        Box::new(self.pools.values().cloned())
    }

    fn liquidity_provider(&self, pool: &Asset, owner: &Address) -> Option<LiquidityProvider> {
        self.providers.get(&(pool.layer1(), owner.clone())).cloned()
    }

    fn set_liquidity_provider(&mut self, provider: LiquidityProvider) {
        self.providers
            .insert((provider.asset.clone(), provider.owner.clone()), provider);
    }

    fn liquidity_providers(&self, pool: &Asset) -> Box<dyn Iterator<Item = LiquidityProvider> + '_> {
        let pool = pool.layer1();
        Box::new(
            self.providers
                .values()
                .filter(move |provider| provider.asset == pool)
                .cloned(),
        )
    }

    fn synth_supply(&self, pool: &Asset) -> Uint {
        self.synth_supply.get(&pool.layer1()).copied().unwrap_or(Uint::ZERO)
    }

    fn set_synth_supply(&mut self, pool: &Asset, supply: Uint) {
        self.synth_supply.insert(pool.layer1(), supply);
    }

    fn queue_item(&self, key: &SwapKey) -> Option<PendingSwap> {
        self.queue.get(key).cloned()
    }

    fn set_queue_item(&mut self, item: PendingSwap) {
        self.queue.insert(item.key(), item);
    }

    fn remove_queue_item(&mut self, key: &SwapKey) -> Option<PendingSwap> {
        self.queue.remove(key)
    }

    fn queue_items(&self) -> Box<dyn Iterator<Item = PendingSwap> + '_> {
        Box::new(self.queue.values().cloned())
    }

    fn insert_limit_index(&mut self, key: LimitIndexKey, swap: SwapKey) {
        let bucket = self.limit_index.entry(key).or_default();
        if !bucket.contains(&swap) {
            bucket.push(swap);
        }
    }

    fn remove_limit_index(&mut self, key: &LimitIndexKey, swap: &SwapKey) {
        if let Some(bucket) = self.limit_index.get_mut(key) {
            bucket.retain(|existing| existing != swap);
            if bucket.is_empty() {
                self.limit_index.remove(key);
            }
        }
    }

    fn limit_index(&self, pair: &TradePair) -> Box<dyn Iterator<Item = (LimitIndexKey, Vec<SwapKey>)> + '_> {
        let range = LimitIndexKey::best(pair.clone())..=LimitIndexKey::worst(pair.clone());
        Box::new(
            self.limit_index
                .range(range)
                .map(|(key, swaps)| (key.clone(), swaps.clone())),
        )
    }

    fn pair_bitset(&self) -> Vec<bool> {
        self.pair_bitset.clone()
    }

    fn set_pair_bitset(&mut self, bits: Vec<bool>) {
        self.pair_bitset = bits;
    }

    fn streaming_swap(&self, tx_id: &TxId) -> Option<StreamingSwap> {
        self.streaming.get(tx_id).cloned()
    }

    fn set_streaming_swap(&mut self, swp: StreamingSwap) {
        self.streaming.insert(swp.tx_id.clone(), swp);
    }

    fn remove_streaming_swap(&mut self, tx_id: &TxId) {
        self.streaming.remove(tx_id);
    }
}

impl PoolSource for MemoryStore {
    fn pool(&self, asset: &Asset) -> Option<Pool> {
        StateStore::pool(self, asset)
    }

    fn synth_supply(&self, asset: &Asset) -> Uint {
        StateStore::synth_supply(self, asset)
    }
}

/// Serialized form of a [`MemoryStore`]
#[derive(Serialize, Deserialize)]
struct SnapshotData {
    pools: Vec<Pool>,
    providers: Vec<LiquidityProvider>,
    synth_supply: Vec<(Asset, Uint)>,
    queue: Vec<PendingSwap>,
    limit_index: Vec<(String, Vec<SwapKey>)>,
    pair_bitset: Vec<bool>,
    streaming: Vec<StreamingSwap>,
}

impl Snapshot for MemoryStore {
    fn snapshot(&self) -> Result<Vec<u8>, StateError> {
        let data = SnapshotData {
            pools: self.pools.values().cloned().collect(),
            providers: self.providers.values().cloned().collect(),
            synth_supply: self
                .synth_supply
                .iter()
                .map(|(asset, supply)| (asset.clone(), *supply))
                .collect(),
            queue: self.queue.values().cloned().collect(),
            limit_index: self
                .limit_index
                .iter()
                .map(|(key, swaps)| (key.to_string(), swaps.clone()))
                .collect(),
            pair_bitset: self.pair_bitset.clone(),
            streaming: self.streaming.values().cloned().collect(),
        };
        Ok(serde_json::to_vec(&data)?)
    }

    fn restore(&mut self, snapshot: &[u8]) -> Result<(), StateError> {
        let data: SnapshotData = serde_json::from_slice(snapshot)?;

        // parse everything before touching the current state
        let mut limit_index = BTreeMap::new();
        for (key, swaps) in data.limit_index {
            limit_index.insert(key.parse::<LimitIndexKey>()?, swaps);
        }

        *self = Self::new();
        self.limit_index = limit_index;
        for pool in data.pools {
            self.set_pool(pool);
        }
        for provider in data.providers {
            self.set_liquidity_provider(provider);
        }
        self.synth_supply = data.synth_supply.into_iter().collect();
        for item in data.queue {
            self.set_queue_item(item);
        }
        self.pair_bitset = data.pair_bitset;
        for swp in data.streaming {
            self.set_streaming_swap(swp);
        }

        info!(
            pools = self.pools.len(),
            queue = self.queue.len(),
            limit_orders = self.limit_index_len(),
            "restored state snapshot"
        );
        Ok(())
    }
}
