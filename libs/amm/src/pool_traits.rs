//! Read access to pool state for pricing and sizing

use std::collections::BTreeMap;
use types::{Asset, Pool, Uint};

/// Source of pool snapshots
///
/// Implemented by the state store and by plain maps in tests. Lookups are
/// keyed by the layer-1 form of the asset.
pub trait PoolSource {
    fn pool(&self, asset: &Asset) -> Option<Pool>;

    /// Outstanding supply of the asset's synthetic form
    fn synth_supply(&self, _asset: &Asset) -> Uint {
        Uint::ZERO
    }

    /// Native depth of the pool(s) a derived asset tracks
    fn anchor_native_depth(&self, derived: &Asset) -> Uint {
        derived
            .anchor()
            .and_then(|anchor| self.pool(&anchor))
            .map(|pool| pool.balance_native)
            .unwrap_or(Uint::ZERO)
    }
}

impl PoolSource for BTreeMap<Asset, Pool> {
    fn pool(&self, asset: &Asset) -> Option<Pool> {
        self.get(&asset.layer1()).cloned()
    }
}
