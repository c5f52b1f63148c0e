//! Fixed-point fee rates
//!
//! Pool fees are stored as integer pips (parts per million), the unit the
//! concentrated-liquidity contracts use natively. Constant-product and
//! stable-swap fees convert exactly: 30 bps = 3_000 pips = 0.3%.
//!
//! ## Design Principles
//!
//! - **No Precision Loss**: Integer storage, exact conversion to `Decimal`
//! - **Range Checked**: A fee of 100% or more cannot be constructed
//! - **Transparent Serialization**: Serialized as the raw pip count

use crate::common::errors::ValidationError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fee rate in pips (1/1_000_000), always in [0, 1)
///
/// Examples:
/// - 0.05% = FeeRate(500)
/// - 0.3% = FeeRate(3_000)
/// - 1% = FeeRate(10_000)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct FeeRate(u32);

impl FeeRate {
    /// Pips per unit
    pub const DENOMINATOR: u32 = 1_000_000;

    /// Fee-free pool
    pub const ZERO: Self = Self(0);

    /// Create from a pip count
    pub fn from_pips(pips: u32) -> Result<Self, ValidationError> {
        if pips >= Self::DENOMINATOR {
            return Err(ValidationError::FeeOutOfRange {
                pips: pips as u64,
                max: Self::DENOMINATOR,
            });
        }
        Ok(Self(pips))
    }

    /// Create from basis points (1 bp = 100 pips)
    pub fn from_bps(bps: u32) -> Result<Self, ValidationError> {
        let pips = bps as u64 * 100;
        if pips >= Self::DENOMINATOR as u64 {
            return Err(ValidationError::FeeOutOfRange {
                pips,
                max: Self::DENOMINATOR,
            });
        }
        Ok(Self(pips as u32))
    }

    #[inline]
    pub const fn pips(self) -> u32 {
        self.0
    }

    /// Pips left to the trader after the fee, `DENOMINATOR - pips`
    #[inline]
    pub const fn complement_pips(self) -> u32 {
        Self::DENOMINATOR - self.0
    }

    /// Exact decimal fraction, 3_000 pips -> 0.003
    pub fn as_decimal(self) -> Decimal {
        Decimal::new(self.0 as i64, 6)
    }
}

impl TryFrom<u32> for FeeRate {
    type Error = ValidationError;

    fn try_from(pips: u32) -> Result<Self, Self::Error> {
        Self::from_pips(pips)
    }
}

impl From<FeeRate> for u32 {
    fn from(fee: FeeRate) -> u32 {
        fee.0
    }
}

impl fmt::Display for FeeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_decimal() * Decimal::ONE_HUNDRED)
    }
}
