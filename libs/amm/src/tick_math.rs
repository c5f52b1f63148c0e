//! Uniswap V3 tick and sqrt-price math
//!
//! Bit-exact ports of `TickMath.getSqrtRatioAtTick`, `SqrtPriceMath` and
//! `SwapMath.computeSwapStep` (exact-input path) over 256-bit integers.

use crate::error::{AmmError, Result};
use crate::math::{checked_add, checked_sub, div_rounding_up, mul_div, mul_div_rounding_up, Q96};
use primitive_types::U256;
use types::FeeRate;

pub const MIN_TICK: i32 = -887_272;
pub const MAX_TICK: i32 = 887_272;

/// sqrt(1.0001^MIN_TICK) * 2^96
pub const MIN_SQRT_RATIO: U256 = U256([4_295_128_739, 0, 0, 0]);

/// sqrt(1.0001^MAX_TICK) * 2^96
pub const MAX_SQRT_RATIO: U256 = U256([
    0x5d95_1d52_6398_8d26,
    0xefd1_fc6a_5064_8849,
    0xfffd_8963,
    0,
]);

/// Per-bit multipliers: 2^128 / sqrt(1.0001)^(2^i)
const TICK_FACTORS: [(u32, u128); 19] = [
    (0x2, 0xfff97272373d413259a46990580e213a),
    (0x4, 0xfff2e50f5f656932ef12357cf3c7fdcc),
    (0x8, 0xffe5caca7e10e4e61c3624eaa0941cd0),
    (0x10, 0xffcb9843d60f6159c9db58835c926644),
    (0x20, 0xff973b41fa98c081472e6896dfb254c0),
    (0x40, 0xff2ea16466c96a3843ec78b326b52861),
    (0x80, 0xfe5dee046a99a2a811c461f1969c3053),
    (0x100, 0xfcbe86c7900a88aedcffc83b479aa3a4),
    (0x200, 0xf987a7253ac413176f2b074cf7815e54),
    (0x400, 0xf3392b0822b70005940c7a398e4b70f3),
    (0x800, 0xe7159475a2c29b7443b29c7fa6e889d9),
    (0x1000, 0xd097f3bdfd2022b8845ad8f792aa5825),
    (0x2000, 0xa9f746462d870fdf8a65dc1f90e061e5),
    (0x4000, 0x70d869a156d2a1b890bb3df62baf32f7),
    (0x8000, 0x31be135f97d08fd981231505542fcfa6),
    (0x10000, 0x9aa508b5b7a84e1c677de54f3e99bc9),
    (0x20000, 0x5d6af8dedb81196699c329225ee604),
    (0x40000, 0x2216e584f5fa1ea926041bedfe98),
    (0x80000, 0x48a170391f7dc42444e8fa2),
];

/// sqrt(1.0001^tick) as a Q64.96 value
pub fn get_sqrt_ratio_at_tick(tick: i32) -> Result<U256> {
    let abs_tick = tick.unsigned_abs();
    if abs_tick > MAX_TICK as u32 {
        return Err(AmmError::InvalidInput(format!("tick {} out of range", tick)));
    }

    let mut ratio = if abs_tick & 0x1 != 0 {
        U256::from(0xfffcb933bd6fad37aa2d162d1a594001u128)
    } else {
        U256::one() << 128
    };
    for (mask, factor) in TICK_FACTORS {
        if abs_tick & mask != 0 {
            ratio = (ratio * U256::from(factor)) >> 128;
        }
    }
    if tick > 0 {
        ratio = U256::MAX / ratio;
    }

    // Q128.128 -> Q64.96, rounding up
    let remainder = ratio & U256::from(u32::MAX);
    let sqrt_price = ratio >> 32;
    Ok(if remainder.is_zero() {
        sqrt_price
    } else {
        sqrt_price + U256::one()
    })
}

/// Amount of token0 between two prices for `liquidity`
pub fn get_amount0_delta(
    sqrt_ratio_a: U256,
    sqrt_ratio_b: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<U256> {
    let (lower, upper) = ordered(sqrt_ratio_a, sqrt_ratio_b);
    if lower.is_zero() {
        return Err(AmmError::InvalidInput("sqrt price must be positive".into()));
    }
    let numerator1 = U256::from(liquidity) << 96;
    let numerator2 = upper - lower;
    if round_up {
        div_rounding_up(mul_div_rounding_up(numerator1, numerator2, upper)?, lower)
    } else {
        Ok(mul_div(numerator1, numerator2, upper)? / lower)
    }
}

/// Amount of token1 between two prices for `liquidity`
pub fn get_amount1_delta(
    sqrt_ratio_a: U256,
    sqrt_ratio_b: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<U256> {
    let (lower, upper) = ordered(sqrt_ratio_a, sqrt_ratio_b);
    if round_up {
        mul_div_rounding_up(U256::from(liquidity), upper - lower, Q96)
    } else {
        mul_div(U256::from(liquidity), upper - lower, Q96)
    }
}

/// Price after adding `amount_in` of the input token
pub fn get_next_sqrt_price_from_input(
    sqrt_price: U256,
    liquidity: u128,
    amount_in: U256,
    zero_for_one: bool,
) -> Result<U256> {
    if sqrt_price.is_zero() || liquidity == 0 {
        return Err(AmmError::InsufficientLiquidity("no active liquidity".into()));
    }
    if zero_for_one {
        next_sqrt_price_from_amount0_rounding_up(sqrt_price, liquidity, amount_in)
    } else {
        next_sqrt_price_from_amount1_rounding_down(sqrt_price, liquidity, amount_in)
    }
}

fn next_sqrt_price_from_amount0_rounding_up(
    sqrt_price: U256,
    liquidity: u128,
    amount: U256,
) -> Result<U256> {
    if amount.is_zero() {
        return Ok(sqrt_price);
    }
    let numerator1 = U256::from(liquidity) << 96;
    if let Some(product) = amount.checked_mul(sqrt_price) {
        if let Some(denominator) = numerator1.checked_add(product) {
            return mul_div_rounding_up(numerator1, sqrt_price, denominator);
        }
    }
    let denominator = checked_add(numerator1 / sqrt_price, amount, "next sqrt price from amount0")?;
    div_rounding_up(numerator1, denominator)
}

fn next_sqrt_price_from_amount1_rounding_down(
    sqrt_price: U256,
    liquidity: u128,
    amount: U256,
) -> Result<U256> {
    let quotient = mul_div(amount, Q96, U256::from(liquidity))?;
    checked_add(sqrt_price, quotient, "next sqrt price from amount1")
}

/// Result of a single swap step within one tick range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapStep {
    pub sqrt_price_next: U256,
    pub amount_in: U256,
    pub amount_out: U256,
    pub fee_amount: U256,
}

/// Exact-input swap step from `sqrt_price_current` towards `sqrt_price_target`
pub fn compute_swap_step(
    sqrt_price_current: U256,
    sqrt_price_target: U256,
    liquidity: u128,
    amount_remaining: U256,
    fee: FeeRate,
) -> Result<SwapStep> {
    let zero_for_one = sqrt_price_current >= sqrt_price_target;
    let fee_pips = U256::from(fee.pips());
    let fee_complement = U256::from(fee.complement_pips());
    let denominator = U256::from(FeeRate::DENOMINATOR);

    let amount_remaining_less_fee = mul_div(amount_remaining, fee_complement, denominator)?;
    let amount_in_to_target = if zero_for_one {
        get_amount0_delta(sqrt_price_target, sqrt_price_current, liquidity, true)?
    } else {
        get_amount1_delta(sqrt_price_current, sqrt_price_target, liquidity, true)?
    };

    let sqrt_price_next = if amount_remaining_less_fee >= amount_in_to_target {
        sqrt_price_target
    } else {
        get_next_sqrt_price_from_input(
            sqrt_price_current,
            liquidity,
            amount_remaining_less_fee,
            zero_for_one,
        )?
    };
    let reached_target = sqrt_price_next == sqrt_price_target;

    let (amount_in, amount_out) = if zero_for_one {
        let amount_in = if reached_target {
            amount_in_to_target
        } else {
            get_amount0_delta(sqrt_price_next, sqrt_price_current, liquidity, true)?
        };
        let amount_out = get_amount1_delta(sqrt_price_next, sqrt_price_current, liquidity, false)?;
        (amount_in, amount_out)
    } else {
        let amount_in = if reached_target {
            amount_in_to_target
        } else {
            get_amount1_delta(sqrt_price_current, sqrt_price_next, liquidity, true)?
        };
        let amount_out = get_amount0_delta(sqrt_price_current, sqrt_price_next, liquidity, false)?;
        (amount_in, amount_out)
    };

    let fee_amount = if reached_target {
        mul_div_rounding_up(amount_in, fee_pips, fee_complement)?
    } else {
        checked_sub(amount_remaining, amount_in, "swap step fee")?
    };

    Ok(SwapStep {
        sqrt_price_next,
        amount_in,
        amount_out,
        fee_amount,
    })
}

#[inline]
fn ordered(a: U256, b: U256) -> (U256, U256) {
    if a > b {
        (b, a)
    } else {
        (a, b)
    }
}
