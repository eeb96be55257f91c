//! # Ledger State - Pools, Positions, Queue and Events
//!
//! ## Purpose
//!
//! Storage seam of the liquidity engine. Everything the engine persists
//! (pools, liquidity provider positions, synthetic supply, the swap queue,
//! the limit order index, the pair bitset and streaming swap progress) is
//! read and written through the [`StateStore`] trait, and every observable
//! outcome is reported through [`EventSink`].
//!
//! ## Integration Points
//!
//! - **Input Sources**: deposits, withdrawals and swap requests handed in by the host
//! - **Pricing**: [`PoolView`] exposes any store to the `amm` router
//! - **Workflows**: [`LiquidityLedger`] runs read-modify-write deposit and withdraw flows
//! - **Validation**: [`PoolValidator`] cross-checks pools against provider records
//! - **Persistence**: [`MemoryStore`] implements [`Snapshot`] as JSON
//!
//! ## Architecture Role
//!
//! ```text
//! Host Transactions → [LiquidityLedger] → [StateStore] ← [Swap Queue]
//!                            ↓                 ↓              ↓
//!                       amm unit math     MemoryStore     EventSink
//!                                         Snapshot        (memory, tracing)
//! ```
//!
//! The store is injected as `&mut dyn StateStore`; nothing in the engine
//! holds global state.

pub mod events;
pub mod ledger;
pub mod limit_index;
pub mod memory;
pub mod pool_validator;
pub mod traits;

pub use events::{emit_or_log, Event, MemoryEventSink, TracingEventSink};
pub use ledger::LiquidityLedger;
pub use limit_index::{LimitIndexKey, Ratio, MAX_RATIO, RATIO_DIGITS};
pub use memory::MemoryStore;
pub use pool_validator::{PoolValidator, Violation};
pub use traits::{EventSink, PoolView, Snapshot, StateError, StateStore};
