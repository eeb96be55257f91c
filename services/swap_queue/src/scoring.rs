//! Candidate scoring and ordering
//!
//! Each candidate is scored by the liquidity fee it would pay, in native
//! terms, summed over its legs. Synthetic and derived legs price against the
//! virtually deepened pool just as execution does. Candidates whose pool is
//! missing, drained or unavailable keep a zero score and sink to the back;
//! execution reports the real failure.

use crate::order_book::SwapItem;
use amm::{PoolSource, SwapMath};
use engine_config::EngineConfig;
use std::cmp::Ordering;
use tracing::debug;
use types::{Asset, Pool, Uint, MAX_BASIS_POINTS};

/// Fee and slip of one leg priced at current depths
fn leg_score(pool: &Pool, source: &Asset, target: &Asset, amount: Uint, config: &EngineConfig) -> (Uint, Uint) {
    let (mut x_depth, mut y_depth) = if source.is_native() {
        (pool.balance_native, pool.balance_asset)
    } else {
        (pool.balance_asset, pool.balance_native)
    };
    let mult = if amm::uses_virtual_depth(source, target, pool) {
        config.pricing.virtual_mult_synths_bps
    } else {
        MAX_BASIS_POINTS
    };
    x_depth = SwapMath::virtual_depth(x_depth, mult);
    y_depth = SwapMath::virtual_depth(y_depth, mult);

    let fee = SwapMath::calc_liquidity_fee(x_depth, amount, y_depth);
    // a native input pays its fee in the pool asset
    let fee = if source.is_native() { pool.asset_value_in_native(fee) } else { fee };
    (fee, SwapMath::calc_swap_slip(x_depth, amount))
}

fn scorable(pool: Option<Pool>) -> Option<Pool> {
    pool.filter(|pool| pool.is_available() && !pool.balance_native.is_zero() && !pool.balance_asset.is_zero())
}

/// Fill in `fee` and `slip` for every item
pub fn score_items(pools: &impl PoolSource, items: &mut [SwapItem], config: &EngineConfig) {
    let native = Asset::native();
    for item in items.iter_mut() {
        item.fee = Uint::ZERO;
        item.slip = Uint::ZERO;
        let source = &item.swap.source.asset;
        let target = &item.swap.target_asset;
        let amount = item.swap.source.amount;

        let first_pool_asset = if source.is_native() { target } else { source };
        let Some(pool) = scorable(pools.pool(first_pool_asset)) else {
            debug!(swap = %item.swap.key(), pool = %first_pool_asset, "skip scoring, pool not usable");
            continue;
        };
        let first_target = if source.is_native() || target.is_native() { target } else { &native };
        let (fee, slip) = leg_score(&pool, source, first_target, amount, config);
        item.fee += fee;
        item.slip += slip;

        if source.is_native() || target.is_native() {
            continue;
        }
        let native_amount = pool.asset_value_in_native(amount);
        let Some(pool) = scorable(pools.pool(target)) else {
            debug!(swap = %item.swap.key(), pool = %target, "skip scoring second leg, pool not usable");
            continue;
        };
        let (fee, slip) = leg_score(&pool, &native, target, native_amount, config);
        item.fee += fee;
        item.slip += slip;
    }
}

/// Execution order: fee descending, then swap key ascending
pub fn compare_items(a: &SwapItem, b: &SwapItem) -> Ordering {
    b.fee
        .cmp(&a.fee)
        .then_with(|| a.swap.tx_id.cmp(&b.swap.tx_id))
        .then_with(|| a.swap.index.cmp(&b.swap.index))
}

pub fn sort_items(items: &mut [SwapItem]) {
    items.sort_by(compare_items);
}

/// How many of `queue_len` candidates run this block
///
/// Half the backlog, or all of it when the backlog is no larger than `min`,
/// capped at `max`.
pub fn todo_count(queue_len: usize, min: u64, max: u64) -> usize {
    let min = usize::try_from(min).unwrap_or(usize::MAX);
    let max = usize::try_from(max).unwrap_or(usize::MAX);
    let todo = if min >= queue_len { queue_len } else { queue_len / 2 };
    todo.min(max)
}
