//! 256-bit fixed-point helpers shared by every curve
//!
//! Mirrors the `FullMath` library used on-chain: products are widened to
//! 512 bits before division so no intermediate overflows silently.

use crate::error::{AmmError, Result};
use primitive_types::{U256, U512};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

/// 2^96, the Q64.96 fixed-point unit
pub const Q96: U256 = U256([0, 1 << 32, 0, 0]);

/// Significant bits kept when converting a ratio to `Decimal`
const DECIMAL_BITS: usize = 95;

/// floor(a * b / denominator)
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256> {
    if denominator.is_zero() {
        return Err(AmmError::NumericOverflow("mul_div: zero denominator"));
    }
    let quotient = a.full_mul(b) / U512::from(denominator);
    U256::try_from(quotient).map_err(|_| AmmError::NumericOverflow("mul_div"))
}

/// ceil(a * b / denominator)
pub fn mul_div_rounding_up(a: U256, b: U256, denominator: U256) -> Result<U256> {
    if denominator.is_zero() {
        return Err(AmmError::NumericOverflow("mul_div_rounding_up: zero denominator"));
    }
    let product = a.full_mul(b);
    let denominator = U512::from(denominator);
    let mut quotient = product / denominator;
    if !(product % denominator).is_zero() {
        quotient += U512::one();
    }
    U256::try_from(quotient).map_err(|_| AmmError::NumericOverflow("mul_div_rounding_up"))
}

/// ceil(a / b)
pub fn div_rounding_up(a: U256, b: U256) -> Result<U256> {
    if b.is_zero() {
        return Err(AmmError::NumericOverflow("div_rounding_up: zero denominator"));
    }
    let quotient = a / b;
    if (a % b).is_zero() {
        Ok(quotient)
    } else {
        Ok(quotient + U256::one())
    }
}

pub fn checked_add(a: U256, b: U256, context: &'static str) -> Result<U256> {
    a.checked_add(b).ok_or(AmmError::NumericOverflow(context))
}

pub fn checked_sub(a: U256, b: U256, context: &'static str) -> Result<U256> {
    a.checked_sub(b).ok_or(AmmError::NumericOverflow(context))
}

pub fn checked_mul(a: U256, b: U256, context: &'static str) -> Result<U256> {
    a.checked_mul(b).ok_or(AmmError::NumericOverflow(context))
}

pub fn checked_div(a: U256, b: U256, context: &'static str) -> Result<U256> {
    a.checked_div(b).ok_or(AmmError::NumericOverflow(context))
}

/// Narrow a 256-bit result to a raw token amount
pub fn to_u128(value: U256, context: &'static str) -> Result<u128> {
    if value.bits() > 128 {
        return Err(AmmError::NumericOverflow(context));
    }
    Ok(value.low_u128())
}

/// numerator / denominator as a `Decimal`
pub fn ratio_to_decimal(numerator: U256, denominator: U256) -> Result<Decimal> {
    wide_ratio_to_decimal(U512::from(numerator), U512::from(denominator))
}

/// numerator / denominator as a `Decimal`, both operands shifted down to
/// fit the 96-bit decimal mantissa
pub fn wide_ratio_to_decimal(numerator: U512, denominator: U512) -> Result<Decimal> {
    if denominator.is_zero() {
        return Err(AmmError::NumericOverflow("ratio: zero denominator"));
    }
    let shift = numerator
        .bits()
        .max(denominator.bits())
        .saturating_sub(DECIMAL_BITS);
    let numerator = numerator >> shift;
    let denominator = denominator >> shift;
    if denominator.is_zero() {
        return Err(AmmError::NumericOverflow("ratio: quotient exceeds decimal range"));
    }
    let numerator = Decimal::from_u128(numerator.low_u128())
        .ok_or(AmmError::NumericOverflow("ratio: numerator"))?;
    let denominator = Decimal::from_u128(denominator.low_u128())
        .ok_or(AmmError::NumericOverflow("ratio: denominator"))?;
    numerator
        .checked_div(denominator)
        .ok_or(AmmError::NumericOverflow("ratio: division"))
}

/// 10^exp as a 256-bit integer
pub fn pow10(exp: u8) -> U256 {
    U256::exp10(exp as usize)
}
