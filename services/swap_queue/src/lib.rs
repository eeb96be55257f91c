//! # Swap Queue - Deterministic Order Book Service
//!
//! ## Purpose
//!
//! Block-driven scheduling of market, limit and streaming swaps over the
//! native-paired pools. Swaps are queued as they arrive and processed once
//! per block by [`SwapQueueManager::end_block`]: candidates are fetched,
//! scored by the fee they pay, ordered deterministically and executed
//! sequentially against the ledger.
//!
//! ## Integration Points
//!
//! - **Input Sources**: [`types::PendingSwap`] values from the inbound
//!   handler, pool and order book state through [`state::StateStore`]
//! - **Output Destinations**: swap, outbound, refund, affiliate and
//!   streaming events through [`state::EventSink`]
//! - **Pricing**: [`amm::swap`] behind the [`SwapHandler`] seam
//! - **Configuration**: batch sizes, pool cycle, slip floors and streaming
//!   limits from [`engine_config::EngineConfig`]
//!
//! ## Architecture Role
//!
//! ```text
//! inbound swaps ──> add_swap_queue_item ──> queue + limit index
//!                                                 │
//! end of block ──> end_block: fetch → score → sort → execute ──> events
//!                                                 │
//!                                      pair bitset for next block
//! ```
//!
//! ## Determinism
//!
//! Every decision depends only on stored state and the block height. Ties in
//! the fee ordering break on transaction id then index, and the limit walk
//! visits buckets in key order, so two nodes with the same state always
//! execute the same swaps in the same order.

pub mod errors;
pub mod executor;
pub mod manager;
pub mod order_book;
pub mod pairs;
pub mod scoring;
pub mod settlement;

pub use errors::{QueueError, SwapFailure};
pub use executor::{PoolSwapHandler, SwapHandler, SwapRequest, SwapResult};
pub use manager::{BlockReport, SwapQueueManager};
pub use order_book::{check_feeless_swap, check_with_fee_swap, discover_limit_swaps, fetch_queue, SwapItem};
pub use pairs::PairIndex;
pub use scoring::{compare_items, score_items, sort_items, todo_count};
pub use settlement::{outbound, refund, Payout};
