//! Order Book Fetch
//!
//! Gathers the candidate swaps for a block. Market swaps are always
//! candidates. Limit swaps are found by walking the limit index of each
//! flagged pair from the best rate down; each bucket first faces a cheap
//! fee-less rate check, and the first bucket that fails ends the walk for
//! that pair since every later bucket asks for an even better rate.
//! Survivors of the rate check are re-priced with fees before admission.

use amm::{PoolSource, SwapMath};
use engine_config::EngineConfig;
use state::{PoolView, Ratio, StateStore};
use tracing::{debug, warn};
use types::{get_uncapped_share, PendingSwap, StreamingSwap, SwapType, TradePair, Uint, ONE};

/// A queued swap with its per-block score
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapItem {
    pub swap: PendingSwap,
    /// Liquidity fee across all legs, in native terms
    pub fee: Uint,
    /// Nominal slip across all legs, in basis points
    pub slip: Uint,
}

impl SwapItem {
    pub fn new(swap: PendingSwap) -> Self {
        Self {
            swap,
            fee: Uint::ZERO,
            slip: Uint::ZERO,
        }
    }
}

/// Whether a queued swap may run at `height`
///
/// Streaming swaps only run on their interval and never while streaming is
/// paused.
pub fn is_ready(store: &dyn StateStore, swap: &PendingSwap, height: u64, config: &EngineConfig) -> bool {
    if !swap.is_streaming() {
        return true;
    }
    if config.streaming.pause {
        return false;
    }
    let progress = store.streaming_swap(&swap.tx_id).unwrap_or_else(|| {
        StreamingSwap::new(
            swap.tx_id.clone(),
            swap.stream_interval,
            swap.stream_quantity,
            swap.trade_target,
            swap.primary_amount(),
        )
    });
    progress.is_due(height)
}

/// Candidates for this block: every ready market swap plus the limit swaps
/// of the flagged pairs that would clear at current depths
pub fn fetch_queue(
    store: &dyn StateStore,
    flagged: &[TradePair],
    height: u64,
    config: &EngineConfig,
) -> Vec<SwapItem> {
    let mut items: Vec<SwapItem> = store
        .queue_items()
        .filter(|swap| swap.swap_type == SwapType::Market)
        .filter(|swap| is_ready(store, swap, height, config))
        .map(SwapItem::new)
        .collect();
    let markets = items.len();

    for pair in flagged {
        items.extend(discover_limit_swaps(store, pair, height, config));
    }
    debug!(height, markets, limits = items.len() - markets, pairs = flagged.len(), "fetched swap queue");
    items
}

/// Walk one pair's limit index best rate first
pub fn discover_limit_swaps(
    store: &dyn StateStore,
    pair: &TradePair,
    height: u64,
    config: &EngineConfig,
) -> Vec<SwapItem> {
    let pools = PoolView(store);
    let mut items = Vec::new();

    for (key, swaps) in store.limit_index(pair) {
        if !check_feeless_swap(&pools, pair, key.ratio) {
            debug!(%key, "limit walk stopped, bucket rate no longer clears");
            break;
        }
        for swap_key in swaps {
            let Some(swap) = store.queue_item(&swap_key) else {
                warn!(%swap_key, %key, "limit index entry without queue item");
                continue;
            };
            if !is_ready(store, &swap, height, config) || !check_with_fee_swap(&pools, &swap) {
                continue;
            }
            items.push(SwapItem::new(swap));
        }
    }
    items
}

/// Fee-less rate check: the bucket's asking rate beats what the pools pay
///
/// Rates are input per unit of output scaled by 1e8, so a bucket clears when
/// its ratio exceeds the pools' ratio.
pub fn check_feeless_swap(pools: &impl PoolSource, pair: &TradePair, bucket: Ratio) -> bool {
    let pool_ratio = if pair.source.is_native() {
        let Some(pool) = pools.pool(&pair.target) else {
            return false;
        };
        Ratio::of(pool.balance_native, pool.balance_asset)
    } else if pair.target.is_native() {
        let Some(pool) = pools.pool(&pair.source) else {
            return false;
        };
        Ratio::of(pool.balance_asset, pool.balance_native)
    } else {
        let (Some(source_pool), Some(target_pool)) = (pools.pool(&pair.source), pools.pool(&pair.target)) else {
            return false;
        };
        let one = Uint::from(ONE);
        let native = get_uncapped_share(one, source_pool.balance_asset, source_pool.balance_native);
        let emit = get_uncapped_share(native, target_pool.balance_native, target_pool.balance_asset);
        Ratio::of(one, emit)
    };
    bucket > pool_ratio
}

/// Constant-product emission with fees, after the affiliate share, must
/// exceed the trade target
pub fn check_with_fee_swap(pools: &impl PoolSource, swap: &PendingSwap) -> bool {
    let source = &swap.source.asset;
    let target = &swap.target_asset;
    let amount = swap.primary_amount();

    let emit = if source.is_native() {
        let Some(pool) = pools.pool(target) else {
            return false;
        };
        SwapMath::calc_asset_emission(pool.balance_native, amount, pool.balance_asset)
    } else if target.is_native() {
        let Some(pool) = pools.pool(source) else {
            return false;
        };
        SwapMath::calc_asset_emission(pool.balance_asset, amount, pool.balance_native)
    } else {
        let (Some(source_pool), Some(target_pool)) = (pools.pool(source), pools.pool(target)) else {
            return false;
        };
        let native = SwapMath::calc_asset_emission(source_pool.balance_asset, amount, source_pool.balance_native);
        SwapMath::calc_asset_emission(target_pool.balance_native, native, target_pool.balance_asset)
    };
    emit > swap.trade_target
}
