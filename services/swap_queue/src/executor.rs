//! Swap execution against the ledger
//!
//! [`SwapHandler`] is the seam between scheduling and pricing: the queue
//! decides what runs and in which order, the handler prices one request,
//! persists the touched pools and reports what was paid out. Tests swap in
//! scripted handlers to drive the queue through failure paths.

use crate::errors::SwapFailure;
use engine_config::EngineConfig;
use state::{emit_or_log, Event, EventSink, PoolView, StateStore};
use tracing::{debug, info};
use types::{Address, Asset, Coin, TxId, Uint, ValidationError};

/// One priced swap to run now
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequest {
    pub tx_id: TxId,
    pub source: Coin,
    pub target: Asset,
    /// Minimum acceptable emission, zero for none
    pub trade_target: Uint,
    pub destination: Address,
}

impl SwapRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.source.amount.is_zero() {
            return Err(ValidationError::ZeroAmount { field: "swap input" });
        }
        if self.destination.as_str().is_empty() {
            return Err(ValidationError::EmptyAddress);
        }
        Ok(())
    }
}

/// What an executed swap paid out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapResult {
    pub emit: Coin,
    pub liquidity_fee_in_native: Uint,
    /// Slip summed over legs, in basis points
    pub slip: Uint,
}

pub trait SwapHandler {
    /// Execute `request`, leaving the store untouched on failure
    fn execute(
        &mut self,
        store: &mut dyn StateStore,
        events: &mut dyn EventSink,
        request: &SwapRequest,
        config: &EngineConfig,
    ) -> Result<SwapResult, SwapFailure>;
}

/// Prices through the native-paired pools and persists the result
#[derive(Debug, Default, Clone, Copy)]
pub struct PoolSwapHandler;

impl SwapHandler for PoolSwapHandler {
    fn execute(
        &mut self,
        store: &mut dyn StateStore,
        events: &mut dyn EventSink,
        request: &SwapRequest,
        config: &EngineConfig,
    ) -> Result<SwapResult, SwapFailure> {
        request.validate()?;
        let source = &request.source.asset;
        let target = &request.target;

        let outcome = amm::swap(
            &PoolView(&*store),
            source,
            target,
            request.source.amount,
            request.trade_target,
            config,
        )?;

        for pool in outcome.pools() {
            store.set_pool(pool);
        }
        // minted synths add supply, redeemed synths burn it
        if target.is_synthetic() {
            let supply = store.synth_supply(target) + outcome.emit;
            store.set_synth_supply(target, supply);
        }
        if source.is_synthetic() {
            let supply = store.synth_supply(source).safe_sub(request.source.amount);
            store.set_synth_supply(source, supply);
        }

        let mut slip = Uint::ZERO;
        for leg in &outcome.legs {
            slip += leg.swap_slip_bps;
            debug!(pool = %leg.pool.asset, input = %leg.input, emit = %leg.emit, "leg executed");
            emit_or_log(
                events,
                Event::Swap {
                    pool: leg.pool.asset.clone(),
                    tx_id: request.tx_id.clone(),
                    input: Coin::new(leg.source.clone(), leg.input),
                    emit: Coin::new(leg.target.clone(), leg.emit),
                    liquidity_fee: leg.liquidity_fee,
                    liquidity_fee_in_native: leg.liquidity_fee_in_native,
                    swap_slip_bps: leg.swap_slip_bps,
                },
            );
        }

        info!(
            tx_id = %request.tx_id,
            input = %request.source,
            emit = %outcome.emit,
            target = %target,
            double = outcome.is_double(),
            "swap executed"
        );
        Ok(SwapResult {
            emit: Coin::new(target.clone(), outcome.emit),
            liquidity_fee_in_native: outcome.liquidity_fee_in_native,
            slip,
        })
    }
}
