//! # Swap Queue Manager - Block-Driven Order Book Execution
//!
//! ## Purpose
//!
//! Owns the per-block swap schedule. Swaps are queued as they arrive; at the
//! end of every block the manager selects which of them run, orders them
//! deterministically and executes them one at a time against the ledger,
//! so every swap prices against the depth left by the one before it.
//!
//! ## Block Pipeline
//!
//! ```text
//! pool cycle guard → pair index + stored bitset → fetch (markets, flagged limit walks,
//!       ↓                                                new limits this block)
//! score (fee in native) → sort (fee desc, reference asc) → truncate to todo count
//!       ↓
//! execute each: single | streaming sub-swap → affiliate → outbound / refund / retain
//!       ↓
//! persist bitset of pairs touched by executed trades
//! ```
//!
//! ## Failure Handling
//!
//! - **Transient**: a limit swap that misses its price stays queued for a
//!   later block
//! - **Terminal**: anything else refunds the source coin and removes the swap
//! - **Streaming**: a failed first sub-swap refunds everything; later failures
//!   are recorded and the stream carries on
//!
//! Only store-level problems abort the block with a [`QueueError`].

use crate::errors::{QueueError, SwapFailure};
use crate::executor::{PoolSwapHandler, SwapHandler, SwapRequest, SwapResult};
use crate::order_book::{fetch_queue, is_ready, SwapItem};
use crate::pairs::PairIndex;
use crate::scoring::{score_items, sort_items, todo_count};
use crate::settlement::{outbound, refund};
use amm::{max_swap_quantity, next_sub_swap};
use engine_config::EngineConfig;
use serde::Serialize;
use state::{emit_or_log, Event, EventSink, LimitIndexKey, PoolView, StateStore};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};
use types::{Asset, Coin, PendingSwap, StreamingSwap, SwapKey, TradePair, Uint};

/// What one block of queue processing did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BlockReport {
    pub height: u64,
    /// Pool-cycle block, nothing processed
    pub skipped: bool,
    pub fetched: usize,
    pub executed: usize,
    pub retained: usize,
    pub refunded: usize,
    pub sub_swap_failures: usize,
    /// Pairs flagged for the next block's limit walk
    pub flagged_pairs: usize,
}

pub struct SwapQueueManager<H: SwapHandler = PoolSwapHandler> {
    config: EngineConfig,
    handler: H,
    /// Limit swaps queued since the last processed block
    new_limit_swaps: Vec<SwapKey>,
}

impl SwapQueueManager<PoolSwapHandler> {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_handler(config, PoolSwapHandler)
    }
}

impl<H: SwapHandler> SwapQueueManager<H> {
    pub fn with_handler(config: EngineConfig, handler: H) -> Self {
        Self {
            config,
            handler,
            new_limit_swaps: Vec::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Apply signed runtime overrides; negative values keep the current value
    pub fn apply_overrides(&mut self, overrides: &BTreeMap<String, i64>) {
        self.config = self.config.with_overrides(overrides);
    }

    /// Queue a swap for execution
    ///
    /// Streaming swaps get their sub-swap count fixed here: the requested
    /// quantity (or the maximum when zero) capped by what the pools allow.
    pub fn add_swap_queue_item(&mut self, store: &mut dyn StateStore, mut swap: PendingSwap) -> Result<(), QueueError> {
        let key = swap.key();
        swap.validate().map_err(|reason| QueueError::InvalidSwap {
            key: key.to_string(),
            reason,
        })?;
        if store.queue_item(&key).is_some() {
            return Err(QueueError::DuplicateSwap { key: key.to_string() });
        }

        if swap.is_streaming() {
            let max = max_swap_quantity(
                &PoolView(&*store),
                &swap.source.asset,
                &swap.target_asset,
                swap.primary_amount(),
                swap.stream_interval,
                &self.config,
            )?;
            swap.stream_quantity = match swap.stream_quantity {
                0 => max,
                requested => requested.min(max),
            };
            store.set_streaming_swap(StreamingSwap::new(
                swap.tx_id.clone(),
                swap.stream_interval,
                swap.stream_quantity,
                swap.trade_target,
                swap.primary_amount(),
            ));
        }

        if swap.is_limit() {
            store.insert_limit_index(LimitIndexKey::for_swap(&swap), key.clone());
            self.new_limit_swaps.push(key.clone());
        }

        info!(
            swap = %key,
            source = %swap.source,
            target = %swap.target_asset,
            swap_type = ?swap.swap_type,
            quantity = swap.stream_quantity,
            "swap queued"
        );
        store.set_queue_item(swap);
        Ok(())
    }

    /// Process the queue at the end of block `height`
    pub fn end_block(
        &mut self,
        store: &mut dyn StateStore,
        events: &mut dyn EventSink,
        height: u64,
    ) -> Result<BlockReport, QueueError> {
        let mut report = BlockReport {
            height,
            ..BlockReport::default()
        };
        let pool_cycle = self.config.queue.pool_cycle;
        if pool_cycle > 0 && height % pool_cycle == 0 {
            info!(height, "pool cycle block, skipping swap queue");
            self.new_limit_swaps.clear();
            report.skipped = true;
            return Ok(report);
        }

        let index = PairIndex::build(&*store);
        let flagged = index.decode(&store.pair_bitset()).unwrap_or_default();

        let mut items = fetch_queue(&*store, &flagged, height, &self.config);
        for key in std::mem::take(&mut self.new_limit_swaps) {
            if items.iter().any(|item| item.swap.key() == key) {
                continue;
            }
            match store.queue_item(&key) {
                Some(swap) if is_ready(&*store, &swap, height, &self.config) => items.push(SwapItem::new(swap)),
                Some(_) => {}
                None => debug!(swap = %key, "new limit swap no longer queued"),
            }
        }
        report.fetched = items.len();

        score_items(&PoolView(&*store), &mut items, &self.config);
        sort_items(&mut items);
        let todo = todo_count(items.len(), self.config.queue.min_swaps_per_block, self.config.queue.max_swaps_per_block);
        items.truncate(todo);
        debug!(height, fetched = report.fetched, todo, "swap queue scheduled");

        let mut next_flags: Vec<TradePair> = Vec::new();
        for item in items {
            let executed = if item.swap.is_streaming() {
                self.execute_streaming(store, events, &item.swap, height, &mut report)
            } else {
                self.execute_single(store, events, &item.swap, &mut report)
            };
            if executed {
                report.executed += 1;
                index.flag_matching(&mut next_flags, &item.swap.pair());
            }
        }

        report.flagged_pairs = next_flags.len();
        store.set_pair_bitset(index.encode(&next_flags));
        info!(
            height,
            executed = report.executed,
            retained = report.retained,
            refunded = report.refunded,
            "swap queue processed"
        );
        Ok(report)
    }

    fn execute_single(
        &mut self,
        store: &mut dyn StateStore,
        events: &mut dyn EventSink,
        swap: &PendingSwap,
        report: &mut BlockReport,
    ) -> bool {
        let request = SwapRequest {
            tx_id: swap.tx_id.clone(),
            source: Coin::new(swap.source.asset.clone(), swap.primary_amount()),
            target: swap.target_asset.clone(),
            trade_target: swap.trade_target,
            destination: swap.destination.clone(),
        };
        match self.handler.execute(store, events, &request, &self.config) {
            Ok(result) => {
                self.release_affiliate(store, events, swap);
                outbound(store, events, &swap.tx_id, &swap.destination, &result.emit, &self.config);
                remove_swap(store, swap);
                true
            }
            Err(err) if swap.is_limit() && err.is_transient() => {
                debug!(swap = %swap.key(), error = %err, "limit swap not fillable yet");
                report.retained += 1;
                false
            }
            Err(err) => {
                warn!(swap = %swap.key(), error = %err, "fail to execute swap, refunding");
                refund(store, events, &swap.tx_id, &swap.from_address, &swap.source, &err.to_string(), &self.config);
                report.refunded += 1;
                remove_swap(store, swap);
                false
            }
        }
    }

    fn execute_streaming(
        &mut self,
        store: &mut dyn StateStore,
        events: &mut dyn EventSink,
        swap: &PendingSwap,
        height: u64,
        report: &mut BlockReport,
    ) -> bool {
        let mut progress = store.streaming_swap(&swap.tx_id).unwrap_or_else(|| {
            StreamingSwap::new(
                swap.tx_id.clone(),
                swap.stream_interval,
                swap.stream_quantity,
                swap.trade_target,
                swap.primary_amount(),
            )
        });
        let (size, target) = match next_sub_swap(&progress) {
            Ok(next) => next,
            Err(err) => {
                debug!(swap = %swap.key(), error = %err, "streaming swap already complete, settling");
                self.settle_streaming(store, events, swap, &progress);
                return false;
            }
        };

        let request = SwapRequest {
            tx_id: swap.tx_id.clone(),
            source: Coin::new(swap.source.asset.clone(), size),
            target: swap.target_asset.clone(),
            trade_target: target,
            destination: swap.destination.clone(),
        };
        let executed = match self.handler.execute(store, events, &request, &self.config) {
            Ok(SwapResult { emit, .. }) => {
                let first = progress.input.is_zero();
                if let Err(err) = progress.record_sub_swap(height, size, emit.amount) {
                    warn!(swap = %swap.key(), error = %err, "fail to record sub-swap");
                }
                if first {
                    self.release_affiliate(store, events, swap);
                }
                true
            }
            // nothing executed yet: a limit that misses its price waits like a single limit swap
            Err(err) if progress.count == 0 && swap.is_limit() && err.is_transient() => {
                debug!(swap = %swap.key(), error = %err, "streaming limit swap not fillable yet");
                report.retained += 1;
                return false;
            }
            Err(err) if progress.input.is_zero() && progress.output.is_zero() => {
                warn!(swap = %swap.key(), error = %err, "first streaming sub-swap failed, refunding");
                refund(store, events, &swap.tx_id, &swap.from_address, &swap.source, &err.to_string(), &self.config);
                report.refunded += 1;
                remove_swap(store, swap);
                return false;
            }
            Err(err) => {
                record_sub_swap_failure(&mut progress, height, &err);
                report.sub_swap_failures += 1;
                false
            }
        };

        if progress.is_done() {
            self.settle_streaming(store, events, swap, &progress);
        } else {
            store.set_streaming_swap(progress);
        }
        executed
    }

    /// Pay out what a finished stream produced and return what it did not use
    fn settle_streaming(
        &mut self,
        store: &mut dyn StateStore,
        events: &mut dyn EventSink,
        swap: &PendingSwap,
        progress: &StreamingSwap,
    ) {
        if !progress.output.is_zero() {
            let coin = Coin::new(swap.target_asset.clone(), progress.output);
            outbound(store, events, &swap.tx_id, &swap.destination, &coin, &self.config);
        }
        let remainder = progress.remainder();
        if !remainder.is_zero() {
            let coin = Coin::new(swap.source.asset.clone(), remainder);
            refund(store, events, &swap.tx_id, &swap.from_address, &coin, "streaming partial-refund", &self.config);
        }

        info!(
            swap = %swap.key(),
            count = progress.count,
            input = %progress.input,
            output = %progress.output,
            failures = progress.failed_swaps.len(),
            "streaming swap complete"
        );
        emit_or_log(
            events,
            Event::StreamingSwap {
                tx_id: swap.tx_id.clone(),
                source: swap.source.asset.clone(),
                target: swap.target_asset.clone(),
                interval: progress.interval,
                quantity: progress.quantity,
                count: progress.count,
                deposit: progress.deposit,
                input: progress.input,
                output: progress.output,
                failed_swaps: progress.failed_swaps.clone(),
            },
        );
        remove_swap(store, swap);
    }

    /// Forward the affiliate share of a swap that just executed
    ///
    /// Native shares are paid as they are; anything else is swapped to
    /// native first. A failed affiliate swap returns the share to the sender.
    fn release_affiliate(&mut self, store: &mut dyn StateStore, events: &mut dyn EventSink, swap: &PendingSwap) {
        let Some(affiliate) = &swap.affiliate else {
            return;
        };
        let amount = swap.affiliate_amount();
        if amount.is_zero() {
            return;
        }
        let share = Coin::new(swap.source.asset.clone(), amount);

        let paid = if share.asset.is_native() {
            share
        } else {
            let request = SwapRequest {
                tx_id: swap.tx_id.clone(),
                source: share.clone(),
                target: Asset::native(),
                trade_target: Uint::ZERO,
                destination: affiliate.address.clone(),
            };
            match self.handler.execute(store, events, &request, &self.config) {
                Ok(result) => result.emit,
                Err(err) => {
                    warn!(swap = %swap.key(), error = %err, "fail to swap affiliate fee");
                    refund(store, events, &swap.tx_id, &swap.from_address, &share, "affiliate fee swap failed", &self.config);
                    return;
                }
            }
        };
        debug!(swap = %swap.key(), to = %affiliate.address, coin = %paid, "affiliate fee");
        emit_or_log(
            events,
            Event::AffiliateFee {
                tx_id: swap.tx_id.clone(),
                to: affiliate.address.clone(),
                coin: paid,
            },
        );
    }
}

fn record_sub_swap_failure(progress: &mut StreamingSwap, height: u64, err: &SwapFailure) {
    debug!(tx_id = %progress.tx_id, count = progress.count, error = %err, "streaming sub-swap failed");
    progress.record_failure(height, err.to_string());
}

/// Drop every trace of a swap from the queue
fn remove_swap(store: &mut dyn StateStore, swap: &PendingSwap) {
    let key = swap.key();
    store.remove_queue_item(&key);
    if swap.is_limit() {
        store.remove_limit_index(&LimitIndexKey::for_swap(swap), &key);
    }
    if swap.is_streaming() {
        store.remove_streaming_swap(&swap.tx_id);
    }
}
