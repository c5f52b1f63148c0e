//! Pricing-invariant families supported by the engine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Protocol variant tag of a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    /// x * y = k (Uniswap V2 and forks)
    ConstantProduct,
    /// Tick-ranged liquidity (Uniswap V3 and forks)
    ConcentratedLiquidity,
    /// Amplified invariant for pegged assets (Curve)
    StableSwap,
}

impl Protocol {
    pub const ALL: [Protocol; 3] = [
        Protocol::ConstantProduct,
        Protocol::ConcentratedLiquidity,
        Protocol::StableSwap,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::ConstantProduct => "constant_product",
            Protocol::ConcentratedLiquidity => "concentrated_liquidity",
            Protocol::StableSwap => "stable_swap",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
