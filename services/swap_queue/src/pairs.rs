//! Trade Pair Index
//!
//! Every block the live pool set is expanded into all directional pairs
//! between the native asset and the available layer-1 pools. The list order
//! is stable (native first, then pools in asset order) so that the persisted
//! bitset, one flag per pair, lines up with the same pairs next block as long
//! as no pool was added or removed in between.

use state::StateStore;
use tracing::debug;
use types::{Asset, TradePair};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairIndex {
    pairs: Vec<TradePair>,
}

impl PairIndex {
    /// Pairs between native and every available, non-synthetic pool
    pub fn build(store: &dyn StateStore) -> Self {
        let mut assets = vec![Asset::native()];
        assets.extend(
            store
                .pools()
                .filter(|pool| pool.is_available() && !pool.asset.is_synthetic())
                .map(|pool| pool.asset),
        );
        Self::from_assets(&assets)
    }

    /// Every ordered pair of distinct assets, in list order
    pub fn from_assets(assets: &[Asset]) -> Self {
        let mut pairs = Vec::with_capacity(assets.len() * assets.len().saturating_sub(1));
        for source in assets {
            for target in assets {
                if source != target {
                    pairs.push(TradePair::new(source.clone(), target.clone()));
                }
            }
        }
        Self { pairs }
    }

    pub fn pairs(&self) -> &[TradePair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Pairs flagged in `bits`, or `None` when the bitset was written for a
    /// different pair list
    pub fn decode(&self, bits: &[bool]) -> Option<Vec<TradePair>> {
        if bits.len() != self.pairs.len() {
            debug!(stored = bits.len(), live = self.pairs.len(), "pair bitset length mismatch");
            return None;
        }
        Some(
            self.pairs
                .iter()
                .zip(bits)
                .filter(|(_, flagged)| **flagged)
                .map(|(pair, _)| pair.clone())
                .collect(),
        )
    }

    /// One flag per indexed pair, set when the pair is in `flagged`
    pub fn encode(&self, flagged: &[TradePair]) -> Vec<bool> {
        self.pairs.iter().map(|pair| flagged.contains(pair)).collect()
    }

    /// Flag the pairs whose limit orders may have become fillable after
    /// `trade` executed
    ///
    /// A trade into native moves its source pool, so pairs that buy that
    /// asset back are rechecked; a trade out of native moves its target pool,
    /// so pairs selling that asset are rechecked. A double swap moves both.
    pub fn flag_matching(&self, flagged: &mut Vec<TradePair>, trade: &TradePair) {
        let matches = |pair: &TradePair| -> bool {
            if trade.source.is_native() {
                pair.source == trade.target
            } else if trade.target.is_native() {
                pair.target == trade.source
            } else {
                pair.source == trade.target || pair.target == trade.source
            }
        };
        for pair in self.pairs.iter().filter(|pair| matches(pair)) {
            if !flagged.contains(pair) {
                flagged.push(pair.clone());
            }
        }
    }
}
