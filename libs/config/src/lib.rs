//! # Liquidity Engine Configuration
//!
//! Economic parameters and protocol defaults for pools and the swap queue.
//!
//! ## Features
//!
//! - **Protocol Defaults**: batch sizing, slip floors, streaming limits
//! - **Layered Loading**: TOML file, then `ENGINE_` environment variables
//! - **Runtime Overrides**: named overrides where a negative value keeps the
//!   configured setting
//!
//! ## Usage
//!
//! ```rust
//! use engine_config::{EngineConfig, StreamingSizer};
//!
//! let config = EngineConfig::from_toml_str("[queue]\nmax_swaps_per_block = 50\n").unwrap();
//! assert_eq!(config.queue.max_swaps_per_block, 50);
//! assert_eq!(config.streaming.sizer, StreamingSizer::PerLegFloor);
//! ```
//!
//! The configuration is read once per block and treated as immutable for the
//! rest of that block.

pub mod constants;
pub mod engine_config;

pub use engine_config::{
    EngineConfig, PricingSettings, QueueSettings, SlipFloors, StreamingSettings, StreamingSizer,
};
