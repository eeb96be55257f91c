//! Engine Configuration Module
//!
//! Loads the economic parameters the pools and swap queue read at the start of
//! every block. Sources, later ones winning:
//!
//! 1. Built-in defaults from [`crate::constants`]
//! 2. A TOML file
//! 3. Environment variables prefixed `ENGINE`, sections separated by `__`
//!    (`ENGINE_QUEUE__MAX_SWAPS_PER_BLOCK=50`)
//! 4. Runtime overrides keyed by parameter name, where a negative value means
//!    "use the configured value"

use crate::constants::{pricing, queue, slip, streaming};
use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};
use types::{AssetClass, MAX_BASIS_POINTS};

/// Full engine configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    pub queue: QueueSettings,
    pub slip_floors: SlipFloors,
    pub streaming: StreamingSettings,
    pub pricing: PricingSettings,
}

/// Batch sizing for the swap queue
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct QueueSettings {
    pub min_swaps_per_block: u64,
    pub max_swaps_per_block: u64,
    /// Zero disables the pool-cycle guard
    pub pool_cycle: u64,
}

/// Minimum slip, in basis points, charged per asset class
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SlipFloors {
    pub layer1: u64,
    pub synth: u64,
    pub trade: u64,
    pub secured: u64,
    pub derived: u64,
}

/// Streaming swap sizing algorithm
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StreamingSizer {
    /// Floor-sized sub-swaps from the thinnest leg's native depth
    #[default]
    PerLegFloor,
    /// Floor-sized sub-swaps from the harmonic mean of both legs' depth
    VirtualDepth,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct StreamingSettings {
    pub max_length: u64,
    pub max_length_native: u64,
    /// Suspend all streaming sub-swaps
    pub pause: bool,
    pub sizer: StreamingSizer,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PricingSettings {
    pub virtual_mult_synths_bps: u64,
    pub native_outbound_fee: u64,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            min_swaps_per_block: queue::MIN_SWAPS_PER_BLOCK,
            max_swaps_per_block: queue::MAX_SWAPS_PER_BLOCK,
            pool_cycle: queue::POOL_CYCLE,
        }
    }
}

impl Default for SlipFloors {
    fn default() -> Self {
        Self {
            layer1: slip::LAYER1_MIN_SLIP_BPS,
            synth: slip::SYNTH_MIN_SLIP_BPS,
            trade: slip::TRADE_MIN_SLIP_BPS,
            secured: slip::SECURED_MIN_SLIP_BPS,
            derived: slip::DERIVED_MIN_SLIP_BPS,
        }
    }
}

impl Default for StreamingSettings {
    fn default() -> Self {
        Self {
            max_length: streaming::MAX_LENGTH,
            max_length_native: streaming::MAX_LENGTH_NATIVE,
            pause: false,
            sizer: StreamingSizer::default(),
        }
    }
}

impl Default for PricingSettings {
    fn default() -> Self {
        Self {
            virtual_mult_synths_bps: pricing::VIRTUAL_MULT_SYNTHS_BPS,
            native_outbound_fee: pricing::NATIVE_OUTBOUND_FEE,
        }
    }
}

impl SlipFloors {
    pub fn for_class(&self, class: AssetClass) -> u64 {
        match class {
            AssetClass::Synthetic => self.synth,
            AssetClass::Trade => self.trade,
            AssetClass::Derived => self.derived,
            AssetClass::Secured => self.secured,
            AssetClass::Layer1 => self.layer1,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file with environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            info!("Loading engine config: {:?}", path);
            builder = builder.add_source(File::from(path).required(true));
        } else {
            debug!("No engine config file given, using defaults");
        }

        // Override with environment variables (ENGINE_ prefix)
        builder = builder.add_source(
            Environment::with_prefix("ENGINE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder
            .build()
            .context("Failed to build engine configuration")?
            .try_deserialize()
            .context("Failed to deserialize engine configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string without touching the environment
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw).context("Failed to parse engine configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.queue.min_swaps_per_block > self.queue.max_swaps_per_block {
            bail!(
                "min_swaps_per_block {} exceeds max_swaps_per_block {}",
                self.queue.min_swaps_per_block,
                self.queue.max_swaps_per_block
            );
        }
        if self.pricing.virtual_mult_synths_bps == 0 {
            bail!("virtual_mult_synths_bps must be positive");
        }
        let floors = [
            ("layer1", self.slip_floors.layer1),
            ("synth", self.slip_floors.synth),
            ("trade", self.slip_floors.trade),
            ("secured", self.slip_floors.secured),
            ("derived", self.slip_floors.derived),
        ];
        for (name, value) in floors {
            if value > MAX_BASIS_POINTS {
                bail!("{} slip floor {} exceeds {} bps", name, value, MAX_BASIS_POINTS);
            }
        }
        Ok(())
    }

    /// Apply runtime overrides on top of the configured values
    ///
    /// Keys are parameter names such as `MaxSwapsPerBlock`; a negative value
    /// leaves the configured value in place. Unknown keys are ignored.
    pub fn with_overrides(&self, overrides: &BTreeMap<String, i64>) -> Self {
        let mut effective = self.clone();
        for (key, value) in overrides {
            let Ok(value) = u64::try_from(*value) else {
                continue;
            };
            let slot = match key.as_str() {
                "MinSwapsPerBlock" => &mut effective.queue.min_swaps_per_block,
                "MaxSwapsPerBlock" => &mut effective.queue.max_swaps_per_block,
                "PoolCycle" => &mut effective.queue.pool_cycle,
                "L1SlipMinBps" => &mut effective.slip_floors.layer1,
                "SynthSlipMinBps" => &mut effective.slip_floors.synth,
                "TradeAccountsSlipMinBps" => &mut effective.slip_floors.trade,
                "SecuredAssetSlipMinBps" => &mut effective.slip_floors.secured,
                "DerivedSlipMinBps" => &mut effective.slip_floors.derived,
                "VirtualMultSynthsBasisPoints" => &mut effective.pricing.virtual_mult_synths_bps,
                "NativeOutboundFee" => &mut effective.pricing.native_outbound_fee,
                "StreamingSwapMaxLength" => &mut effective.streaming.max_length,
                "StreamingSwapMaxLengthNative" => &mut effective.streaming.max_length_native,
                "StreamingSwapPause" => {
                    effective.streaming.pause = value > 0;
                    continue;
                }
                other => {
                    warn!(key = other, "Ignoring unknown config override");
                    continue;
                }
            };
            *slot = value;
        }
        if let Err(e) = effective.validate() {
            warn!(error = %e, "Runtime overrides produced an invalid config, keeping configured values");
            return self.clone();
        }
        effective
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.queue.min_swaps_per_block, 10);
        assert_eq!(config.queue.max_swaps_per_block, 100);
        assert_eq!(config.queue.pool_cycle, 43_200);
        assert_eq!(config.slip_floors.for_class(AssetClass::Secured), 5);
        assert_eq!(config.streaming.max_length_native, 14_400 * 365);
        assert_eq!(config.streaming.sizer, StreamingSizer::PerLegFloor);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("engine.toml");

        let config_content = r#"
[queue]
max_swaps_per_block = 40

[slip_floors]
synth = 25

[streaming]
sizer = "virtual_depth"
"#;

        fs::write(&config_path, config_content).unwrap();

        let config = EngineConfig::load(Some(&config_path)).unwrap();

        assert_eq!(config.queue.max_swaps_per_block, 40);
        assert_eq!(config.queue.min_swaps_per_block, 10);
        assert_eq!(config.slip_floors.synth, 25);
        assert_eq!(config.slip_floors.secured, 5);
        assert_eq!(config.streaming.sizer, StreamingSizer::VirtualDepth);
    }

    #[test]
    fn test_invalid_file_rejected() {
        let err = EngineConfig::from_toml_str("[queue]\nmin_swaps_per_block = 500\n").unwrap_err();
        assert!(err.to_string().contains("exceeds max_swaps_per_block"));

        assert!(EngineConfig::from_toml_str("[pricing]\nvirtual_mult_synths_bps = 0\n").is_err());
        assert!(EngineConfig::from_toml_str("[slip_floors]\nlayer1 = 10001\n").is_err());
    }

    #[test]
    fn test_overrides_negative_means_default() {
        let base = EngineConfig::default();
        let mut overrides = BTreeMap::new();
        overrides.insert("MaxSwapsPerBlock".to_string(), 20);
        overrides.insert("MinSwapsPerBlock".to_string(), -1);
        overrides.insert("SynthSlipMinBps".to_string(), 15);
        overrides.insert("StreamingSwapPause".to_string(), 1);
        overrides.insert("Unrelated".to_string(), 3);

        let effective = base.with_overrides(&overrides);
        assert_eq!(effective.queue.max_swaps_per_block, 20);
        assert_eq!(effective.queue.min_swaps_per_block, 10);
        assert_eq!(effective.slip_floors.synth, 15);
        assert!(effective.streaming.pause);
    }

    #[test]
    fn test_invalid_overrides_are_discarded() {
        let base = EngineConfig::default();
        let mut overrides = BTreeMap::new();
        overrides.insert("MaxSwapsPerBlock".to_string(), 1);
        assert_eq!(base.with_overrides(&overrides), base);
    }
}
