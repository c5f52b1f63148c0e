//! Curve evaluation parameters
//!
//! Plain values handed to every quote; nothing here is read from process
//! state, so two passes with the same config and snapshot agree exactly.

use crate::error::{AmmError, Result};
use crate::stable_math::ConvergenceParams;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use types::Protocol;

/// Largest share of a pool's capacity a single hop may consume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeFractions {
    /// Share of the input reserve
    pub constant_product: Decimal,
    /// Share of the input that would exhaust all initialized ticks, plus the
    /// virtual reserve of any range left open past the last one
    pub concentrated_liquidity: Decimal,
    /// Share of the input coin balance
    pub stable_swap: Decimal,
}

impl Default for TradeFractions {
    fn default() -> Self {
        Self {
            constant_product: dec!(0.30),
            concentrated_liquidity: dec!(0.90),
            stable_swap: dec!(0.30),
        }
    }
}

impl TradeFractions {
    pub fn for_protocol(&self, protocol: Protocol) -> Decimal {
        match protocol {
            Protocol::ConstantProduct => self.constant_product,
            Protocol::ConcentratedLiquidity => self.concentrated_liquidity,
            Protocol::StableSwap => self.stable_swap,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveConfig {
    pub max_trade_fraction: TradeFractions,
    /// Stable-swap Newton tolerance, in 18-decimal normalized units
    #[serde(with = "types::raw_amount")]
    pub convergence_tolerance: u128,
    /// Stable-swap Newton iteration budget
    pub max_iterations: u32,
}

impl Default for CurveConfig {
    fn default() -> Self {
        let params = ConvergenceParams::default();
        Self {
            max_trade_fraction: TradeFractions::default(),
            convergence_tolerance: params.tolerance,
            max_iterations: params.max_iterations,
        }
    }
}

impl CurveConfig {
    pub fn convergence(&self) -> ConvergenceParams {
        ConvergenceParams {
            max_iterations: self.max_iterations,
            tolerance: self.convergence_tolerance,
        }
    }

    /// Trade fraction for `protocol` in parts per million
    pub fn fraction_ppm(&self, protocol: Protocol) -> Result<u64> {
        (self.max_trade_fraction.for_protocol(protocol) * dec!(1000000))
            .trunc()
            .to_u64()
            .ok_or_else(|| {
                AmmError::InvalidInput(format!("trade fraction for {} out of range", protocol))
            })
    }

    pub fn validate(&self) -> Result<()> {
        for protocol in Protocol::ALL {
            let fraction = self.max_trade_fraction.for_protocol(protocol);
            if fraction <= Decimal::ZERO || fraction > Decimal::ONE {
                return Err(AmmError::InvalidInput(format!(
                    "max_trade_fraction for {} must be in (0, 1], got {}",
                    protocol, fraction
                )));
            }
        }
        if self.max_iterations == 0 {
            return Err(AmmError::InvalidInput("max_iterations must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = CurveConfig::default();
        config.validate().unwrap();
        assert_eq!(config.fraction_ppm(Protocol::ConstantProduct).unwrap(), 300_000);
        assert_eq!(config.max_iterations, 255);
    }

    #[test]
    fn test_fraction_bounds() {
        let mut config = CurveConfig::default();
        config.max_trade_fraction.stable_swap = dec!(1.5);
        assert!(config.validate().is_err());
        config.max_trade_fraction.stable_swap = Decimal::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: CurveConfig =
            serde_json::from_str(r#"{"max_trade_fraction": {"constant_product": "0.1"}}"#).unwrap();
        assert_eq!(config.max_trade_fraction.constant_product, dec!(0.1));
        assert_eq!(config.max_trade_fraction.stable_swap, dec!(0.30));
    }
}
