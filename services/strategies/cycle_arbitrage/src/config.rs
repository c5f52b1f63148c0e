//! # Cycle Arbitrage Configuration
//!
//! ## Purpose
//!
//! Single parameter surface for the detection service. Values are loaded from
//! a TOML or JSON file, overridden from the environment, validated once, and
//! then handed to the core as plain values. The detector never reads files or
//! environment variables itself.
//!
//! ## Sections
//!
//! - **detector**: profit threshold, hop limit, base assets, spread filter,
//!   per-pass gas estimate
//! - **curves**: per-protocol trade fractions and stable-swap convergence
//! - **optimizer**: sizing search budget and tolerances
//! - **gas**: metered gas schedule and per-asset pricing
//! - **service**: update queue capacity and tick interval
//! - **logging**: level and output format
//!
//! ## Environment Overrides
//!
//! `ARB_MIN_PROFIT`, `ARB_MAX_HOPS`, `ARB_GAS_COST`, `ARB_LOG_LEVEL`.

use crate::detector::{DetectorSettings, PassParams};
use crate::gas::GasModel;
use amm::{CurveConfig, SizingConfig};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::Path;
use types::AssetId;

/// Complete configuration for the cycle arbitrage service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbitrageConfig {
    pub detector: DetectorConfig,
    pub curves: CurveConfig,
    pub optimizer: SizingConfig,
    pub gas: GasModel,
    pub service: ServiceConfig,
    pub logging: LoggingConfig,
}

/// Configuration for opportunity detection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Net profit must exceed this, in raw base-asset units
    #[serde(with = "types::raw_amount")]
    pub min_profit_threshold: u128,
    /// Longest cycle searched, at least 2
    pub max_hops: usize,
    /// Cycle start assets; empty means every asset in the graph
    pub base_assets: Vec<AssetId>,
    /// Skip cycles whose best-case spread is below this
    pub min_spread_bps: Option<u32>,
    /// Fixed execution cost per opportunity, in raw base-asset units
    #[serde(with = "types::raw_amount")]
    pub gas_cost_estimate: u128,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_profit_threshold: 0,
            max_hops: 3,
            base_assets: Vec::new(),
            min_spread_bps: None,
            gas_cost_estimate: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Bound on pending pool updates between passes
    pub queue_capacity: usize,
    /// Stream mode: time between detection ticks
    pub tick_interval_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 10_000,
            tick_interval_ms: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl ArbitrageConfig {
    /// Load configuration from a TOML file, or JSON when the extension is `.json`
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let is_json = path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));
        let config = if is_json {
            serde_json::from_str(&contents)
                .with_context(|| format!("parsing JSON config {}", path.display()))?
        } else {
            toml::from_str(&contents)
                .with_context(|| format!("parsing TOML config {}", path.display()))?
        };
        Ok(config)
    }

    /// File (or defaults), then environment overrides, then validation
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `ARB_*` overrides from `lookup`
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<()> {
        if let Some(value) = lookup("ARB_MIN_PROFIT") {
            self.detector.min_profit_threshold = parse_amount("ARB_MIN_PROFIT", &value)?;
        }
        if let Some(value) = lookup("ARB_MAX_HOPS") {
            self.detector.max_hops = value
                .trim()
                .parse()
                .with_context(|| format!("ARB_MAX_HOPS={:?} is not a hop count", value))?;
        }
        if let Some(value) = lookup("ARB_GAS_COST") {
            self.detector.gas_cost_estimate = parse_amount("ARB_GAS_COST", &value)?;
        }
        if let Some(value) = lookup("ARB_LOG_LEVEL") {
            self.logging.level = value;
        }
        Ok(())
    }

    /// Save configuration as TOML
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let text = toml::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.detector.max_hops < 2 {
            bail!("max_hops must be at least 2, got {}", self.detector.max_hops);
        }
        if let Some(bps) = self.detector.min_spread_bps {
            if bps > 10_000 {
                bail!("min_spread_bps must be <= 10000 (100%)");
            }
        }
        if self.service.queue_capacity == 0 {
            bail!("queue_capacity must be positive");
        }
        if self.service.tick_interval_ms == 0 {
            bail!("tick_interval_ms must be positive");
        }
        self.curves.validate().context("curves")?;
        self.optimizer.validate().context("optimizer")?;
        Ok(())
    }

    /// Detector settings; the sizing threshold follows the detector threshold
    pub fn detector_settings(&self) -> DetectorSettings {
        DetectorSettings {
            base_assets: self.detector.base_assets.clone(),
            max_hops: self.detector.max_hops,
            min_spread_bps: self.detector.min_spread_bps,
            curves: self.curves.clone(),
            sizing: SizingConfig {
                min_profit: self.detector.min_profit_threshold,
                ..self.optimizer.clone()
            },
            gas: self.gas.clone(),
        }
    }

    pub fn pass_params(&self) -> PassParams {
        PassParams {
            gas_cost_estimate: self.detector.gas_cost_estimate,
        }
    }
}

fn parse_amount(key: &str, value: &str) -> anyhow::Result<u128> {
    value
        .trim()
        .replace('_', "")
        .parse()
        .with_context(|| format!("{}={:?} is not a raw amount", key, value))
}
