//! Uniswap V3 concentrated-liquidity swap simulation
//!
//! Walks initialized ticks in the trade direction exactly as
//! `UniswapV3Pool.swap` does for exact-input trades, accumulating output
//! per tick segment and applying `liquidity_net` on every crossing.

use crate::error::{AmmError, Result};
use crate::math::{self, checked_add, checked_sub, to_u128, Q96};
use crate::tick_math::{
    compute_swap_step, get_amount0_delta, get_amount1_delta, get_sqrt_ratio_at_tick, MAX_SQRT_RATIO,
    MAX_TICK, MIN_SQRT_RATIO, MIN_TICK,
};
use primitive_types::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};
use types::FeeRate;

/// V3 pool state with concentrated liquidity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct V3PoolState {
    /// Current sqrt(token1/token0) price as Q64.96
    pub sqrt_price_x96: U256,
    pub tick: i32,
    /// Liquidity active at the current tick
    pub liquidity: u128,
    /// Initialized ticks and their `liquidity_net`
    #[serde(default)]
    pub ticks: BTreeMap<i32, i128>,
}

/// Outcome of a simulated exact-input swap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct V3SwapResult {
    pub amount_in: u128,
    pub amount_out: u128,
    pub fee_amount: u128,
    pub sqrt_price_after: U256,
    pub liquidity_after: u128,
    pub ticks_crossed: u32,
}

/// Running state of the tick walk
#[derive(Debug, Clone)]
struct V3SwapState {
    amount_remaining: U256,
    amount_out: U256,
    fee_amount: U256,
    sqrt_price_x96: U256,
    tick: i32,
    liquidity: u128,
    ticks_crossed: u32,
}

impl V3PoolState {
    pub fn validate(&self) -> Result<()> {
        if !(MIN_TICK..MAX_TICK).contains(&self.tick) {
            return Err(AmmError::InvalidInput(format!("tick {} out of range", self.tick)));
        }
        if self.sqrt_price_x96 < MIN_SQRT_RATIO || self.sqrt_price_x96 >= MAX_SQRT_RATIO {
            return Err(AmmError::InvalidInput("sqrt price out of range".into()));
        }
        let lower = get_sqrt_ratio_at_tick(self.tick)?;
        let upper = get_sqrt_ratio_at_tick(self.tick + 1)?;
        if self.sqrt_price_x96 < lower || self.sqrt_price_x96 >= upper {
            return Err(AmmError::InvalidInput(format!(
                "sqrt price inconsistent with tick {}",
                self.tick
            )));
        }
        if let Some((&tick, _)) = self
            .ticks
            .iter()
            .find(|(tick, _)| !(MIN_TICK..=MAX_TICK).contains(*tick))
        {
            return Err(AmmError::InvalidInput(format!("initialized tick {} out of range", tick)));
        }
        if self.liquidity == 0 && self.ticks.values().all(|net| *net == 0) {
            return Err(AmmError::InvalidInput("pool has no liquidity".into()));
        }

        // Crossing every tick in either direction must keep liquidity non-negative
        let mut liquidity = self.liquidity;
        for net in self.ticks.range((Excluded(self.tick), Unbounded)).map(|(_, net)| *net) {
            liquidity = add_liquidity_delta(liquidity, net)?;
        }
        let mut liquidity = self.liquidity;
        for net in self.ticks.range(..=self.tick).rev().map(|(_, net)| *net) {
            liquidity = add_liquidity_delta(liquidity, crossing_delta(net, true)?)?;
        }
        Ok(())
    }

    /// Next initialized tick in the trade direction, if any
    fn next_initialized_tick(&self, tick: i32, zero_for_one: bool) -> Option<(i32, i128)> {
        if zero_for_one {
            self.ticks.range(..=tick).next_back().map(|(t, net)| (*t, *net))
        } else {
            self.ticks
                .range((Excluded(tick), Unbounded))
                .next()
                .map(|(t, net)| (*t, *net))
        }
    }
}

/// V3 AMM math with tick-crossing swaps
pub struct V3Math;

impl V3Math {
    /// Simulate an exact-input swap of `amount_in`
    ///
    /// Fails with `InsufficientLiquidity` if the initialized range is
    /// exhausted before the whole input is consumed.
    pub fn swap_exact_input(
        pool: &V3PoolState,
        amount_in: u128,
        zero_for_one: bool,
        fee: FeeRate,
    ) -> Result<V3SwapResult> {
        if amount_in == 0 {
            return Err(AmmError::InvalidInput("input amount must be positive".into()));
        }

        let price_limit = price_limit(zero_for_one);
        let mut state = V3SwapState {
            amount_remaining: U256::from(amount_in),
            amount_out: U256::zero(),
            fee_amount: U256::zero(),
            sqrt_price_x96: pool.sqrt_price_x96,
            tick: pool.tick,
            liquidity: pool.liquidity,
            ticks_crossed: 0,
        };

        while !state.amount_remaining.is_zero() && state.sqrt_price_x96 != price_limit {
            let next = pool.next_initialized_tick(state.tick, zero_for_one);
            if next.is_none() && state.liquidity == 0 {
                break;
            }
            let (tick_next, liquidity_net) = match next {
                Some((tick, net)) => (tick, Some(net)),
                None if zero_for_one => (MIN_TICK, None),
                None => (MAX_TICK, None),
            };

            let sqrt_price_next_tick = get_sqrt_ratio_at_tick(tick_next)?;
            let target = if zero_for_one {
                sqrt_price_next_tick.max(price_limit)
            } else {
                sqrt_price_next_tick.min(price_limit)
            };

            let step = compute_swap_step(
                state.sqrt_price_x96,
                target,
                state.liquidity,
                state.amount_remaining,
                fee,
            )?;
            state.sqrt_price_x96 = step.sqrt_price_next;
            state.amount_remaining = checked_sub(
                state.amount_remaining,
                checked_add(step.amount_in, step.fee_amount, "v3 step input")?,
                "v3 amount remaining",
            )?;
            state.amount_out = checked_add(state.amount_out, step.amount_out, "v3 amount out")?;
            state.fee_amount = checked_add(state.fee_amount, step.fee_amount, "v3 fee")?;

            if state.sqrt_price_x96 == sqrt_price_next_tick {
                if let Some(net) = liquidity_net {
                    let delta = crossing_delta(net, zero_for_one)?;
                    state.liquidity = add_liquidity_delta(state.liquidity, delta)?;
                    state.ticks_crossed += 1;
                }
                state.tick = if zero_for_one { tick_next - 1 } else { tick_next };
            }
        }

        if !state.amount_remaining.is_zero() {
            return Err(AmmError::InsufficientLiquidity(format!(
                "tick range exhausted with {} input remaining",
                state.amount_remaining
            )));
        }

        Ok(V3SwapResult {
            amount_in,
            amount_out: to_u128(state.amount_out, "v3 amount out")?,
            fee_amount: to_u128(state.fee_amount, "v3 fee")?,
            sqrt_price_after: state.sqrt_price_x96,
            liquidity_after: state.liquidity,
            ticks_crossed: state.ticks_crossed,
        })
    }

    /// Gross input (fee included) that moves the price through every
    /// initialized tick in the trade direction, saturating at `u128::MAX`
    ///
    /// Liquidity still active past the last initialized tick is bounded by
    /// its virtual input reserve (`L / sqrtP` for token0, `L * sqrtP` for
    /// token1), as if the range were a constant-product pool.
    pub fn capacity(pool: &V3PoolState, zero_for_one: bool, fee: FeeRate) -> Result<u128> {
        let fee_pips = U256::from(fee.pips());
        let fee_complement = U256::from(fee.complement_pips());
        let mut total = U256::zero();
        let mut sqrt_price = pool.sqrt_price_x96;
        let mut tick = pool.tick;
        let mut liquidity = pool.liquidity;

        while let Some((tick_next, net)) = pool.next_initialized_tick(tick, zero_for_one) {
            let boundary = get_sqrt_ratio_at_tick(tick_next)?;
            let net_in = if zero_for_one {
                get_amount0_delta(boundary, sqrt_price, liquidity, true)?
            } else {
                get_amount1_delta(sqrt_price, boundary, liquidity, true)?
            };
            let fee_amount = math::mul_div_rounding_up(net_in, fee_pips, fee_complement)?;
            total = total.saturating_add(net_in).saturating_add(fee_amount);

            liquidity = add_liquidity_delta(liquidity, crossing_delta(net, zero_for_one)?)?;
            sqrt_price = boundary;
            tick = if zero_for_one { tick_next - 1 } else { tick_next };
        }

        if liquidity > 0 {
            let virtual_in = if zero_for_one {
                math::mul_div(U256::from(liquidity), Q96, sqrt_price)?
            } else {
                math::mul_div(U256::from(liquidity), sqrt_price, Q96)?
            };
            let fee_amount = math::mul_div_rounding_up(virtual_in, fee_pips, fee_complement)?;
            total = total.saturating_add(virtual_in).saturating_add(fee_amount);
        }
        Ok(if total.bits() > 128 {
            u128::MAX
        } else {
            total.low_u128()
        })
    }

    /// Marginal output per unit input, fee excluded
    pub fn spot_price(pool: &V3PoolState, zero_for_one: bool) -> Result<Decimal> {
        let price_x192 = pool.sqrt_price_x96.full_mul(pool.sqrt_price_x96);
        let q192 = Q96.full_mul(Q96);
        if zero_for_one {
            math::wide_ratio_to_decimal(price_x192, q192)
        } else {
            math::wide_ratio_to_decimal(q192, price_x192)
        }
    }
}

fn price_limit(zero_for_one: bool) -> U256 {
    if zero_for_one {
        MIN_SQRT_RATIO + U256::one()
    } else {
        MAX_SQRT_RATIO - U256::one()
    }
}

/// `liquidity_net` is signed for upward crossings
fn crossing_delta(net: i128, zero_for_one: bool) -> Result<i128> {
    if zero_for_one {
        net.checked_neg()
            .ok_or(AmmError::NumericOverflow("liquidity net negation"))
    } else {
        Ok(net)
    }
}

fn add_liquidity_delta(liquidity: u128, delta: i128) -> Result<u128> {
    if delta < 0 {
        liquidity
            .checked_sub(delta.unsigned_abs())
            .ok_or_else(|| AmmError::InvalidInput("liquidity underflow while crossing tick".into()))
    } else {
        liquidity
            .checked_add(delta as u128)
            .ok_or(AmmError::NumericOverflow("liquidity overflow while crossing tick"))
    }
}
