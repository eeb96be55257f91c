//! Engine events
//!
//! Notifications are fire-and-forget. A sink that fails to record an event
//! never aborts the state transition that produced it; [`emit_or_log`] is the
//! one place that policy lives.

use crate::traits::{EventSink, StateError};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use types::{Address, Asset, Coin, PoolStatus, TxId, Uint};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    AddLiquidity {
        pool: Asset,
        provider: Address,
        tx_id: TxId,
        units: Uint,
        native: Uint,
        asset: Uint,
    },
    PendingLiquidity {
        pool: Asset,
        provider: Address,
        tx_id: TxId,
        native: Uint,
        asset: Uint,
    },
    Withdraw {
        pool: Asset,
        provider: Address,
        basis_points: u64,
        units: Uint,
        native: Uint,
        asset: Uint,
    },
    Swap {
        pool: Asset,
        tx_id: TxId,
        input: Coin,
        emit: Coin,
        liquidity_fee: Uint,
        liquidity_fee_in_native: Uint,
        swap_slip_bps: Uint,
    },
    Refund {
        tx_id: TxId,
        coin: Coin,
        fee: Uint,
        reason: String,
    },
    /// A refund that could not be accounted against any pool
    RefundDropped {
        tx_id: TxId,
        coin: Coin,
        reason: String,
    },
    StreamingSwap {
        tx_id: TxId,
        source: Asset,
        target: Asset,
        interval: u64,
        quantity: u64,
        count: u64,
        deposit: Uint,
        input: Uint,
        output: Uint,
        failed_swaps: Vec<u64>,
    },
    Outbound {
        tx_id: TxId,
        to: Address,
        coin: Coin,
    },
    AffiliateFee {
        tx_id: TxId,
        to: Address,
        coin: Coin,
    },
    PoolStatusChange {
        pool: Asset,
        from: PoolStatus,
        to: PoolStatus,
    },
}

impl Event {
    pub fn kind(&self) -> &'static str {
        match self {
            Event::AddLiquidity { .. } => "add_liquidity",
            Event::PendingLiquidity { .. } => "pending_liquidity",
            Event::Withdraw { .. } => "withdraw",
            Event::Swap { .. } => "swap",
            Event::Refund { .. } => "refund",
            Event::RefundDropped { .. } => "refund_dropped",
            Event::StreamingSwap { .. } => "streaming_swap",
            Event::Outbound { .. } => "outbound",
            Event::AffiliateFee { .. } => "affiliate_fee",
            Event::PoolStatusChange { .. } => "pool_status_change",
        }
    }
}

/// Emit `event`, logging instead of failing when the sink rejects it
pub fn emit_or_log(sink: &mut dyn EventSink, event: Event) {
    let kind = event.kind();
    if let Err(err) = sink.emit(event) {
        warn!(kind, error = %err, "fail to emit event");
    }
}

/// Sink that keeps every event in memory
#[derive(Debug, Default, Clone)]
pub struct MemoryEventSink {
    events: Vec<Event>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Event> + 'a {
        self.events.iter().filter(move |event| event.kind() == kind)
    }

    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

impl EventSink for MemoryEventSink {
    fn emit(&mut self, event: Event) -> Result<(), StateError> {
        self.events.push(event);
        Ok(())
    }
}

/// Sink that writes every event to the log as JSON
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&mut self, event: Event) -> Result<(), StateError> {
        let payload = serde_json::to_string(&event)?;
        info!(kind = event.kind(), %payload, "event");
        Ok(())
    }
}
