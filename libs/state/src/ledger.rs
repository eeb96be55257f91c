//! Liquidity Ledger
//!
//! Read-modify-write workflows for deposits and withdrawals. The unit math is
//! pure (see [`amm::add_liquidity`] and [`amm::withdraw_liquidity`]); this
//! layer loads the records, persists the returned values once and emits the
//! matching events.

use crate::events::{emit_or_log, Event};
use crate::traits::{EventSink, StateError, StateStore};
use amm::{AddLiquidityOutcome, Deposit, WithdrawOutcome, WithdrawSide};
use engine_config::EngineConfig;
use tracing::{debug, info};
use types::{Address, Asset, LiquidityProvider, Pool, PoolStatus};

pub struct LiquidityLedger<'a> {
    store: &'a mut dyn StateStore,
    events: &'a mut dyn EventSink,
    config: &'a EngineConfig,
}

impl<'a> LiquidityLedger<'a> {
    pub fn new(store: &'a mut dyn StateStore, events: &'a mut dyn EventSink, config: &'a EngineConfig) -> Self {
        Self { store, events, config }
    }

    /// Deposit into a pool, creating the pool and the position when missing
    pub fn add_liquidity(
        &mut self,
        pool_asset: &Asset,
        owner: &Address,
        deposit: Deposit,
    ) -> Result<AddLiquidityOutcome, StateError> {
        if pool_asset.is_native() || *pool_asset != pool_asset.layer1() {
            return Err(StateError::ValidationFailed {
                reason: format!("cannot add liquidity to {pool_asset}"),
            });
        }
        let pool = self
            .store
            .pool(pool_asset)
            .unwrap_or_else(|| Pool::new(pool_asset.clone()));
        let provider = self
            .store
            .liquidity_provider(&pool.asset, owner)
            .unwrap_or_else(|| LiquidityProvider::new(pool.asset.clone(), owner.clone()));
        let supply = self.store.synth_supply(&pool.asset);

        let outcome = amm::add_liquidity(&pool, &provider, supply, &deposit)?;
        self.store.set_pool(outcome.pool.clone());
        self.store.set_liquidity_provider(outcome.provider.clone());

        let event = if outcome.staged {
            debug!(pool = %outcome.pool.asset, provider = %owner, "liquidity staged until the other side arrives");
            Event::PendingLiquidity {
                pool: outcome.pool.asset.clone(),
                provider: owner.clone(),
                tx_id: deposit.tx_id.clone(),
                native: deposit.native,
                asset: deposit.asset,
            }
        } else {
            Event::AddLiquidity {
                pool: outcome.pool.asset.clone(),
                provider: owner.clone(),
                tx_id: deposit.tx_id.clone(),
                units: outcome.units_issued,
                native: outcome.native_added,
                asset: outcome.asset_added,
            }
        };
        emit_or_log(self.events, event);
        Ok(outcome)
    }

    /// Redeem `basis_points` of a position
    pub fn withdraw_liquidity(
        &mut self,
        pool_asset: &Asset,
        owner: &Address,
        basis_points: u64,
        side: WithdrawSide,
        height: u64,
    ) -> Result<WithdrawOutcome, StateError> {
        let pool = self.store.pool(pool_asset).ok_or_else(|| StateError::NotFound {
            kind: "pool",
            key: pool_asset.to_string(),
        })?;
        let provider = self
            .store
            .liquidity_provider(&pool.asset, owner)
            .ok_or_else(|| StateError::NotFound {
                kind: "liquidity provider",
                key: format!("{}/{}", pool.asset, owner),
            })?;
        let supply = self.store.synth_supply(&pool.asset);

        let outcome =
            amm::withdraw_liquidity(&pool, &provider, supply, basis_points, side, height, self.config)?;
        self.store.set_pool(outcome.pool.clone());
        self.store.set_liquidity_provider(outcome.provider.clone());

        if outcome.pool.status != pool.status {
            info!(pool = %pool.asset, from = %pool.status, to = %outcome.pool.status, "pool status changed by withdraw");
            emit_or_log(
                self.events,
                Event::PoolStatusChange {
                    pool: pool.asset.clone(),
                    from: pool.status,
                    to: outcome.pool.status,
                },
            );
        }
        emit_or_log(
            self.events,
            Event::Withdraw {
                pool: outcome.pool.asset.clone(),
                provider: owner.clone(),
                basis_points,
                units: outcome.units_redeemed,
                native: outcome.native,
                asset: outcome.asset,
            },
        );
        Ok(outcome)
    }

    /// Move a pool to `status`
    ///
    /// A pool only becomes available once both sides hold funds.
    pub fn set_pool_status(&mut self, pool_asset: &Asset, status: PoolStatus) -> Result<Pool, StateError> {
        let mut pool = self.store.pool(pool_asset).ok_or_else(|| StateError::NotFound {
            kind: "pool",
            key: pool_asset.to_string(),
        })?;
        if status == PoolStatus::Available && (pool.balance_native.is_zero() || pool.balance_asset.is_zero()) {
            return Err(StateError::ValidationFailed {
                reason: format!("pool {} has an empty side", pool.asset),
            });
        }
        if pool.status == status {
            return Ok(pool);
        }
        let from = pool.status;
        pool.status = status;
        self.store.set_pool(pool.clone());
        emit_or_log(
            self.events,
            Event::PoolStatusChange {
                pool: pool.asset.clone(),
                from,
                to: status,
            },
        );
        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MemoryEventSink;
    use crate::memory::MemoryStore;
    use types::{TxId, Uint};

    fn deposit(native: u64, asset: u64, stage: bool, height: u64) -> Deposit {
        Deposit {
            native: Uint::from(native),
            asset: Uint::from(asset),
            tx_id: TxId::from_bytes([height as u8; 32]),
            stage,
            height,
        }
    }

    #[test]
    fn test_bootstrap_then_withdraw_everything() {
        let mut store = MemoryStore::new();
        let mut events = MemoryEventSink::new();
        let config = EngineConfig::default();
        let btc: Asset = "BTC.BTC".parse().unwrap();
        let owner = Address::new("thor1owner").unwrap();

        let mut ledger = LiquidityLedger::new(&mut store, &mut events, &config);
        let added = ledger.add_liquidity(&btc, &owner, deposit(1_000, 1_000, false, 1)).unwrap();
        assert_eq!(added.units_issued, Uint::from(1_000u64));
        ledger.set_pool_status(&btc, PoolStatus::Available).unwrap();

        let out = ledger
            .withdraw_liquidity(&btc, &owner, 10_000, WithdrawSide::Both, 2)
            .unwrap();
        assert_eq!(out.native, Uint::from(1_000u64));
        assert_eq!(out.asset, Uint::from(1_000u64));
        assert!(out.pool_staged);

        let pool = StateStore::pool(&store, &btc).unwrap();
        assert_eq!(pool.lp_units, Uint::ZERO);
        assert_eq!(pool.status, PoolStatus::Staged);
        assert!(store.liquidity_provider(&btc, &owner).unwrap().is_closed());

        let kinds: Vec<&str> = events.events().iter().map(Event::kind).collect();
        assert_eq!(
            kinds,
            vec!["add_liquidity", "pool_status_change", "pool_status_change", "withdraw"]
        );
    }

    #[test]
    fn test_staged_deposit_emits_pending_event() {
        let mut store = MemoryStore::new();
        let mut events = MemoryEventSink::new();
        let config = EngineConfig::default();
        let btc: Asset = "BTC.BTC".parse().unwrap();
        let owner = Address::new("thor1owner").unwrap();

        let mut ledger = LiquidityLedger::new(&mut store, &mut events, &config);
        let staged = ledger.add_liquidity(&btc, &owner, deposit(500, 0, true, 1)).unwrap();
        assert!(staged.staged);
        assert!(ledger.set_pool_status(&btc, PoolStatus::Available).is_err());

        assert_eq!(events.of_kind("pending_liquidity").count(), 1);
        let pool = StateStore::pool(&store, &btc).unwrap();
        assert_eq!(pool.pending_inbound_native, Uint::from(500u64));
    }

    #[test]
    fn test_rejects_native_and_missing_records() {
        let mut store = MemoryStore::new();
        let mut events = MemoryEventSink::new();
        let config = EngineConfig::default();
        let owner = Address::new("thor1owner").unwrap();
        let mut ledger = LiquidityLedger::new(&mut store, &mut events, &config);

        assert!(ledger
            .add_liquidity(&Asset::native(), &owner, deposit(1, 1, false, 1))
            .is_err());
        assert!(matches!(
            ledger.withdraw_liquidity(&"BTC.BTC".parse().unwrap(), &owner, 10_000, WithdrawSide::Both, 1),
            Err(StateError::NotFound { kind: "pool", .. })
        ));
    }
}
