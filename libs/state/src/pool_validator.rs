//! Pool Validator
//!
//! Cross-checks a pool against the provider records that reference it:
//! the sum of provider units must equal the pool's LP units, staged funds must
//! match on both sides, and a pool holding units must hold both assets.

use crate::traits::{StateError, StateStore};
use std::fmt;
use tracing::{debug, error};
use types::{Asset, Pool, Uint};

/// A broken ledger invariant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    UnitMismatch {
        pool: Asset,
        pool_units: Uint,
        provider_units: Uint,
    },
    PendingMismatch {
        pool: Asset,
        side: &'static str,
        pool_pending: Uint,
        provider_pending: Uint,
    },
    InvalidBalance {
        pool: Asset,
        reason: String,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::UnitMismatch {
                pool,
                pool_units,
                provider_units,
            } => write!(f, "{pool}: pool lp units {pool_units} != provider units {provider_units}"),
            Violation::PendingMismatch {
                pool,
                side,
                pool_pending,
                provider_pending,
            } => write!(f, "{pool}: pending {side} {pool_pending} != provider pending {provider_pending}"),
            Violation::InvalidBalance { pool, reason } => write!(f, "{pool}: {reason}"),
        }
    }
}

pub struct PoolValidator;

impl PoolValidator {
    /// All violations for one pool
    pub fn check_pool(store: &dyn StateStore, pool: &Pool) -> Vec<Violation> {
        let mut violations = Vec::new();
        let pool = pool.clone().calc_units(store.synth_supply(&pool.asset));

        if let Err(err) = pool.validate() {
            violations.push(Violation::InvalidBalance {
                pool: pool.asset.clone(),
                reason: err.to_string(),
            });
        }

        let (mut units, mut pending_native, mut pending_asset) = (Uint::ZERO, Uint::ZERO, Uint::ZERO);
        for provider in store.liquidity_providers(&pool.asset) {
            units += provider.units;
            pending_native += provider.pending_native;
            pending_asset += provider.pending_asset;
        }

        if units != pool.lp_units {
            violations.push(Violation::UnitMismatch {
                pool: pool.asset.clone(),
                pool_units: pool.lp_units,
                provider_units: units,
            });
        }
        for (side, pool_pending, provider_pending) in [
            ("native", pool.pending_inbound_native, pending_native),
            ("asset", pool.pending_inbound_asset, pending_asset),
        ] {
            if pool_pending != provider_pending {
                violations.push(Violation::PendingMismatch {
                    pool: pool.asset.clone(),
                    side,
                    pool_pending,
                    provider_pending,
                });
            }
        }
        violations
    }

    /// Violations across every pool in the store
    pub fn check_all(store: &dyn StateStore) -> Vec<Violation> {
        let pools: Vec<Pool> = store.pools().collect();
        let violations: Vec<Violation> = pools
            .iter()
            .flat_map(|pool| Self::check_pool(store, pool))
            .collect();
        debug!(pools = pools.len(), violations = violations.len(), "checked pool invariants");
        violations
    }

    /// Fail on the first pool with a broken invariant
    pub fn validate(store: &dyn StateStore) -> Result<(), StateError> {
        let violations = Self::check_all(store);
        if violations.is_empty() {
            return Ok(());
        }
        for violation in &violations {
            error!(%violation, "pool invariant violated");
        }
        Err(StateError::ValidationFailed {
            reason: violations
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
        })
    }
}
