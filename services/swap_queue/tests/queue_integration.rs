//! Swap Queue Integration Tests
//!
//! Drives the manager block by block over an in-memory store: ordering,
//! limit retention, refunds, the pair bitset, pool-cycle blocks and a
//! complete streaming swap.

use amm::{next_sub_swap, AmmError};
use engine_config::EngineConfig;
use proptest::prelude::*;
use state::{Event, EventSink, MemoryEventSink, MemoryStore, StateStore};
use swap_queue::{
    PoolSwapHandler, SwapFailure, SwapHandler, SwapQueueManager, SwapRequest, SwapResult,
};
use types::{Address, Asset, Coin, PendingSwap, Pool, PoolStatus, StreamingSwap, SwapType, TxId, Uint, ONE};

/// Records the order requests reach the pools
#[derive(Default)]
struct RecordingHandler {
    inner: PoolSwapHandler,
    seen: Vec<TxId>,
}

impl SwapHandler for RecordingHandler {
    fn execute(
        &mut self,
        store: &mut dyn StateStore,
        events: &mut dyn EventSink,
        request: &SwapRequest,
        config: &EngineConfig,
    ) -> Result<SwapResult, SwapFailure> {
        self.seen.push(request.tx_id.clone());
        self.inner.execute(store, events, request, config)
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn pool(asset: &str, depth: u64) -> Pool {
    let mut pool = Pool::new(asset.parse().unwrap());
    pool.balance_native = Uint::from(depth);
    pool.balance_asset = Uint::from(depth);
    pool.lp_units = Uint::from(depth);
    pool.status = PoolStatus::Available;
    pool
}

fn store() -> MemoryStore {
    MemoryStore::with_pools([pool("BTC.BTC", 100 * ONE)])
}

fn market(byte: u8, source: &str, target: &str, amount: u64) -> PendingSwap {
    PendingSwap {
        tx_id: TxId::from_bytes([byte; 32]),
        index: 0,
        from_address: Address::new("thor1sender").unwrap(),
        source: Coin::new(source.parse().unwrap(), Uint::from(amount)),
        target_asset: target.parse().unwrap(),
        destination: Address::new("bc1dest").unwrap(),
        trade_target: Uint::ZERO,
        swap_type: SwapType::Market,
        stream_interval: 0,
        stream_quantity: 0,
        affiliate: None,
        initial_height: 1,
    }
}

fn execution_order(swaps: &[PendingSwap]) -> Vec<TxId> {
    let mut store = store();
    let mut events = MemoryEventSink::new();
    let mut manager = SwapQueueManager::with_handler(EngineConfig::default(), RecordingHandler::default());
    for swap in swaps {
        manager.add_swap_queue_item(&mut store, swap.clone()).unwrap();
    }
    manager.end_block(&mut store, &mut events, 1).unwrap();
    manager.handler().seen.clone()
}

#[test]
fn test_execution_order_by_fee_then_reference() {
    init_tracing();
    let swaps = vec![
        market(4, "THOR.RUNE", "BTC.BTC", ONE),
        market(3, "THOR.RUNE", "BTC.BTC", 5 * ONE),
        market(2, "THOR.RUNE", "BTC.BTC", 2 * ONE),
        market(1, "THOR.RUNE", "BTC.BTC", 5 * ONE),
    ];
    let expected: Vec<TxId> = [1u8, 3, 2, 4].iter().map(|b| TxId::from_bytes([*b; 32])).collect();
    assert_eq!(execution_order(&swaps), expected);

    let mut reversed = swaps;
    reversed.reverse();
    assert_eq!(execution_order(&reversed), expected);
}

#[test]
fn test_limit_swap_missing_price_stays_queued() {
    init_tracing();
    let mut store = store();
    let mut events = MemoryEventSink::new();
    let mut manager = SwapQueueManager::new(EngineConfig::default());

    let mut limit = market(1, "THOR.RUNE", "BTC.BTC", ONE);
    limit.swap_type = SwapType::Limit;
    limit.trade_target = Uint::from(1_000 * ONE);
    manager.add_swap_queue_item(&mut store, limit.clone()).unwrap();

    let report = manager.end_block(&mut store, &mut events, 1).unwrap();
    assert_eq!(report.fetched, 1);
    assert_eq!(report.retained, 1);
    assert_eq!(report.executed, 0);
    assert!(store.queue_item(&limit.key()).is_some());
    assert_eq!(store.limit_index_len(), 1);
    assert_eq!(events.of_kind("refund").count(), 0);

    // not new and its pair is not flagged, so the next block leaves it alone
    let report = manager.end_block(&mut store, &mut events, 2).unwrap();
    assert_eq!(report.fetched, 0);
    assert!(store.queue_item(&limit.key()).is_some());
}

#[test]
fn test_failed_swap_refunded_net_of_fee() {
    init_tracing();
    let mut store = store();
    let mut events = MemoryEventSink::new();
    let mut manager = SwapQueueManager::new(EngineConfig::default());
    manager
        .add_swap_queue_item(&mut store, market(1, "THOR.RUNE", "DOGE.DOGE", ONE))
        .unwrap();

    let report = manager.end_block(&mut store, &mut events, 1).unwrap();
    assert_eq!(report.refunded, 1);
    assert_eq!(store.queue_len(), 0);

    let refunds: Vec<&Event> = events.of_kind("refund").collect();
    assert_eq!(refunds.len(), 1);
    match refunds[0] {
        Event::Refund { coin, fee, .. } => {
            assert!(coin.asset.is_native());
            assert_eq!(coin.amount, Uint::from(98_000_000u64));
            assert_eq!(*fee, Uint::from(2_000_000u64));
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn test_stale_bitset_discarded_markets_still_run() {
    init_tracing();
    let mut store = store();
    let mut events = MemoryEventSink::new();
    let mut manager = SwapQueueManager::new(EngineConfig::default());
    store.set_pair_bitset(vec![true]);
    manager
        .add_swap_queue_item(&mut store, market(1, "THOR.RUNE", "BTC.BTC", ONE))
        .unwrap();

    let report = manager.end_block(&mut store, &mut events, 1).unwrap();
    assert_eq!(report.executed, 1);
    // THOR.RUNE>BTC.BTC, BTC.BTC>THOR.RUNE; buying BTC flags the pair selling it
    assert_eq!(store.pair_bitset(), vec![false, true]);
    assert_eq!(report.flagged_pairs, 1);
}

#[test]
fn test_pool_cycle_block_skips_queue() {
    init_tracing();
    let mut store = store();
    let mut events = MemoryEventSink::new();
    let mut config = EngineConfig::default();
    config.queue.pool_cycle = 10;
    let mut manager = SwapQueueManager::new(config);
    manager
        .add_swap_queue_item(&mut store, market(1, "THOR.RUNE", "BTC.BTC", ONE))
        .unwrap();

    let report = manager.end_block(&mut store, &mut events, 20).unwrap();
    assert!(report.skipped);
    assert_eq!(store.queue_len(), 1);
    assert!(events.events().is_empty());

    let report = manager.end_block(&mut store, &mut events, 21).unwrap();
    assert_eq!(report.executed, 1);
    assert_eq!(store.queue_len(), 0);
}

#[test]
fn test_streaming_swap_end_to_end() {
    init_tracing();
    let mut store = store();
    let mut events = MemoryEventSink::new();
    let mut config = EngineConfig::default();
    config.slip_floors.layer1 = 5;
    let mut manager = SwapQueueManager::new(config);

    let mut streaming = market(7, "BTC.BTC", "THOR.RUNE", 2_123_400_000);
    streaming.stream_interval = 3;
    streaming.stream_quantity = 3;
    manager.add_swap_queue_item(&mut store, streaming.clone()).unwrap();
    assert_eq!(store.queue_item(&streaming.key()).unwrap().stream_quantity, 3);

    for (count, (height, consumed)) in [(1u64, 707_800_000u64), (4, 1_415_600_000)].into_iter().enumerate() {
        let report = manager.end_block(&mut store, &mut events, height).unwrap();
        assert_eq!(report.executed, 1);
        let progress = store.streaming_swap(&streaming.tx_id).unwrap();
        assert_eq!(progress.count, count as u64 + 1);
        assert_eq!(progress.input, Uint::from(consumed));
        assert!(store.queue_item(&streaming.key()).is_some());

        // nothing is due between intervals
        let idle = manager.end_block(&mut store, &mut events, height + 1).unwrap();
        assert_eq!(idle.fetched, 0);
    }

    manager.end_block(&mut store, &mut events, 7).unwrap();
    assert!(store.streaming_swap(&streaming.tx_id).is_none());
    assert!(store.queue_item(&streaming.key()).is_none());
    assert_eq!(events.of_kind("swap").count(), 3);
    assert_eq!(events.of_kind("outbound").count(), 1);
    assert_eq!(events.of_kind("refund").count(), 0);

    let Some(Event::StreamingSwap { count, deposit, input, output, quantity, interval, .. }) =
        events.of_kind("streaming_swap").next().cloned()
    else {
        panic!("missing streaming swap event");
    };
    assert_eq!(count, 3);
    assert_eq!(input, Uint::from(2_123_400_000u64));
    assert!(!output.is_zero());

    // a completed stream refuses a fourth sub-swap
    let mut completed = StreamingSwap::new(streaming.tx_id.clone(), interval, quantity, Uint::ZERO, deposit);
    completed.count = count;
    completed.input = input;
    completed.output = output;
    assert_eq!(next_sub_swap(&completed), Err(AmmError::StreamingSwapCompleted));
}

#[test]
fn test_first_streaming_failure_refunds_everything() {
    init_tracing();
    let mut store = MemoryStore::with_pools([pool("BTC.BTC", 100 * ONE)]);
    let mut events = MemoryEventSink::new();
    let mut manager = SwapQueueManager::new(EngineConfig::default());

    let mut streaming = market(8, "THOR.RUNE", "BTC.BTC", 10 * ONE);
    streaming.stream_interval = 1;
    streaming.stream_quantity = 2;
    manager.add_swap_queue_item(&mut store, streaming.clone()).unwrap();

    // the pool leaves before the first sub-swap runs
    let mut btc = StateStore::pool(&store, &"BTC.BTC".parse::<Asset>().unwrap()).unwrap();
    btc.status = PoolStatus::Suspended;
    store.set_pool(btc);

    let report = manager.end_block(&mut store, &mut events, 1).unwrap();
    assert_eq!(report.refunded, 1);
    assert!(store.streaming_swap(&streaming.tx_id).is_none());
    let refund = events.of_kind("refund").next().unwrap();
    match refund {
        Event::Refund { coin, .. } => assert_eq!(coin.amount, Uint::from(10 * ONE - 2_000_000)),
        other => panic!("unexpected event {other:?}"),
    }
}

proptest! {
    #[test]
    fn prop_execution_order_independent_of_arrival(amounts in prop::collection::vec(1u64..10 * ONE, 1..12)) {
        let swaps: Vec<PendingSwap> = amounts
            .iter()
            .enumerate()
            .map(|(i, amount)| market(i as u8 + 1, "THOR.RUNE", "BTC.BTC", *amount))
            .collect();
        let forward = execution_order(&swaps);

        let mut rotated = swaps.clone();
        rotated.rotate_left(swaps.len() / 2);
        prop_assert_eq!(&forward, &execution_order(&rotated));

        let mut reversed = swaps;
        reversed.reverse();
        prop_assert_eq!(forward, execution_order(&reversed));
    }
}
