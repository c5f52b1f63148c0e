//! # Gas Cost Model
//!
//! Execution cost of a cycle, expressed in the base asset's raw units so it
//! can be subtracted from profit directly. Two additive parts:
//!
//! - a fixed per-opportunity estimate supplied with each pass
//! - a metered part: `price_per_gas * (approval + Σ swap gas) * (1 + margin)`
//!
//! No network price discovery happens here; the caller supplies prices.

use amm::{AmmError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use types::{AssetId, Protocol};

/// Gas units per transaction component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GasSchedule {
    /// Token approval before the first swap
    pub approval: u64,
    pub constant_product: u64,
    pub concentrated_liquidity: u64,
    pub stable_swap: u64,
    /// Safety margin on the metered total, in percent
    pub safety_margin_pct: u32,
}

impl Default for GasSchedule {
    fn default() -> Self {
        Self {
            approval: 50_000,
            constant_product: 120_000,
            concentrated_liquidity: 150_000,
            stable_swap: 200_000,
            safety_margin_pct: 10,
        }
    }
}

impl GasSchedule {
    pub fn swap_gas(&self, protocol: Protocol) -> u64 {
        match protocol {
            Protocol::ConstantProduct => self.constant_product,
            Protocol::ConcentratedLiquidity => self.concentrated_liquidity,
            Protocol::StableSwap => self.stable_swap,
        }
    }

    /// Gas units for a path crossing `protocols`, margin included
    pub fn metered_units(&self, protocols: impl IntoIterator<Item = Protocol>) -> u128 {
        let raw = protocols
            .into_iter()
            .fold(self.approval as u128, |total, p| total + self.swap_gas(p) as u128);
        raw * (100 + self.safety_margin_pct as u128) / 100
    }
}

/// Prices for one base asset, in its raw units
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GasPricing {
    #[serde(with = "types::raw_amount")]
    pub fixed_cost: u128,
    #[serde(with = "types::raw_amount")]
    pub price_per_gas: u128,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GasModel {
    pub schedule: GasSchedule,
    /// Gas price in base units when no override applies
    #[serde(with = "types::raw_amount")]
    pub price_per_gas: u128,
    /// Per-base-asset pricing replacing both the fixed estimate and the price
    pub overrides: BTreeMap<AssetId, GasPricing>,
}

impl GasModel {
    /// Total cost of executing a cycle through `protocols` from `base`
    pub fn cost(
        &self,
        base: &AssetId,
        fixed_estimate: u128,
        protocols: impl IntoIterator<Item = Protocol>,
    ) -> Result<u128> {
        let (fixed, price) = match self.overrides.get(base) {
            Some(pricing) => (pricing.fixed_cost, pricing.price_per_gas),
            None => (fixed_estimate, self.price_per_gas),
        };
        if price == 0 {
            return Ok(fixed);
        }
        price
            .checked_mul(self.schedule.metered_units(protocols))
            .and_then(|metered| metered.checked_add(fixed))
            .ok_or(AmmError::NumericOverflow("gas cost"))
    }
}
