//! Outbound payments and refunds
//!
//! Every coin leaving the ledger pays the native outbound fee. For a pooled
//! asset the fee is charged in asset terms at the pool's current ratio:
//! a layer-1 fee stays in the pool while its native equivalent leaves it,
//! a synthetic fee is burned from the synth supply, and other ledger assets
//! simply shrink. A coin whose pool is gone, or which cannot cover the fee,
//! is dropped with a `RefundDropped` event so the ledger stays consistent.

use engine_config::EngineConfig;
use state::{emit_or_log, Event, EventSink, StateStore};
use tracing::{info, warn};
use types::{Address, AssetClass, Coin, TxId, Uint};

/// Net coin paid out and the fee kept, in the coin's asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payout {
    pub coin: Coin,
    pub fee: Uint,
}

fn charge_outbound_fee(store: &mut dyn StateStore, coin: &Coin, config: &EngineConfig) -> Result<Payout, String> {
    let native_fee = Uint::from(config.pricing.native_outbound_fee);
    if coin.asset.is_native() {
        let fee = native_fee.min(coin.amount);
        return net_of(coin, fee);
    }

    let mut pool = store
        .pool(&coin.asset.layer1())
        .ok_or_else(|| format!("no pool for {}", coin.asset))?;
    if pool.balance_native.is_zero() || pool.balance_asset.is_zero() {
        return Err(format!("pool {} has an empty side", pool.asset));
    }
    let fee = pool.native_value_in_asset(native_fee).min(coin.amount);
    let payout = net_of(coin, fee)?;

    match coin.asset.class() {
        AssetClass::Layer1 => {
            let native_equivalent = pool.asset_value_in_native(fee);
            pool.balance_asset += fee;
            pool.balance_native = pool.balance_native.safe_sub(native_equivalent);
            store.set_pool(pool);
        }
        AssetClass::Synthetic => {
            let supply = store.synth_supply(&coin.asset).safe_sub(fee);
            store.set_synth_supply(&coin.asset, supply);
        }
        AssetClass::Trade | AssetClass::Secured | AssetClass::Derived => {}
    }
    Ok(payout)
}

fn net_of(coin: &Coin, fee: Uint) -> Result<Payout, String> {
    let net = coin.amount.safe_sub(fee);
    if net.is_zero() {
        return Err(format!("{coin} does not cover the outbound fee"));
    }
    Ok(Payout {
        coin: Coin::new(coin.asset.clone(), net),
        fee,
    })
}

/// Return `coin` to `to` net of the outbound fee
///
/// Returns `None` when the refund was dropped.
pub fn refund(
    store: &mut dyn StateStore,
    events: &mut dyn EventSink,
    tx_id: &TxId,
    to: &Address,
    coin: &Coin,
    reason: &str,
    config: &EngineConfig,
) -> Option<Payout> {
    match charge_outbound_fee(store, coin, config) {
        Ok(payout) => {
            info!(%tx_id, %to, coin = %payout.coin, fee = %payout.fee, reason, "refund");
            emit_or_log(
                events,
                Event::Refund {
                    tx_id: tx_id.clone(),
                    coin: payout.coin.clone(),
                    fee: payout.fee,
                    reason: reason.to_string(),
                },
            );
            Some(payout)
        }
        Err(drop_reason) => {
            warn!(%tx_id, %to, %coin, reason, %drop_reason, "fail to refund, dropping");
            emit_or_log(
                events,
                Event::RefundDropped {
                    tx_id: tx_id.clone(),
                    coin: coin.clone(),
                    reason: format!("{reason}: {drop_reason}"),
                },
            );
            None
        }
    }
}

/// Pay `coin` out to `to` net of the outbound fee
pub fn outbound(
    store: &mut dyn StateStore,
    events: &mut dyn EventSink,
    tx_id: &TxId,
    to: &Address,
    coin: &Coin,
    config: &EngineConfig,
) -> Option<Payout> {
    match charge_outbound_fee(store, coin, config) {
        Ok(payout) => {
            emit_or_log(
                events,
                Event::Outbound {
                    tx_id: tx_id.clone(),
                    to: to.clone(),
                    coin: payout.coin.clone(),
                },
            );
            Some(payout)
        }
        Err(drop_reason) => {
            warn!(%tx_id, %to, %coin, %drop_reason, "fail to send outbound, dropping");
            emit_or_log(
                events,
                Event::RefundDropped {
                    tx_id: tx_id.clone(),
                    coin: coin.clone(),
                    reason: drop_reason,
                },
            );
            None
        }
    }
}
