//! Curve StableSwap math for two-coin pools
//!
//! Balances are normalized to 18 decimals before the invariant is solved.
//! `D` and `y` are found by Newton iteration with the same update rules as
//! the Vyper contracts; the fee is taken from the output.

use crate::error::{AmmError, Result};
use crate::math::{self, checked_add, checked_div, checked_mul, checked_sub, pow10, to_u128};
use primitive_types::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::FeeRate;

const N_COINS: u64 = 2;

/// Decimal precision balances are normalized to
pub const NORMALIZED_DECIMALS: u8 = 18;

/// Stable-swap pool balances and amplification coefficient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StablePoolState {
    pub balances: [u128; 2],
    /// Amplification coefficient `A`
    pub amplification: u64,
}

/// Newton iteration budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvergenceParams {
    pub max_iterations: u32,
    /// Successive iterates within this distance are considered converged
    pub tolerance: u128,
}

impl Default for ConvergenceParams {
    fn default() -> Self {
        Self {
            max_iterations: 255,
            tolerance: 1,
        }
    }
}

impl StablePoolState {
    pub fn validate(&self, decimals: [u8; 2]) -> Result<()> {
        if self.balances.iter().any(|b| *b == 0) {
            return Err(AmmError::InvalidInput(format!(
                "balances must be positive, got {:?}",
                self.balances
            )));
        }
        if self.amplification == 0 {
            return Err(AmmError::InvalidInput("amplification must be positive".into()));
        }
        multipliers(decimals)?;
        Ok(())
    }
}

/// Output and fee of a stable-swap exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StableSwapResult {
    pub amount_out: u128,
    pub fee_amount: u128,
}

/// Two-coin StableSwap invariant math
pub struct StableMath;

impl StableMath {
    /// Invariant `D` for normalized balances
    pub fn get_d(xp: [U256; 2], amplification: u64, params: ConvergenceParams) -> Result<U256> {
        if amplification == 0 {
            return Err(AmmError::InvalidInput("amplification must be positive".into()));
        }
        let n = U256::from(N_COINS);
        let sum = checked_add(xp[0], xp[1], "stable sum")?;
        if sum.is_zero() {
            return Ok(U256::zero());
        }

        let ann = U256::from(amplification) * n;
        let mut d = sum;
        for _ in 0..params.max_iterations {
            let mut d_p = d;
            for x in xp {
                d_p = checked_div(
                    checked_mul(d_p, d, "stable D_P")?,
                    checked_mul(x, n, "stable D_P")?,
                    "stable D_P",
                )?;
            }
            let d_prev = d;
            let numerator = checked_mul(
                checked_add(
                    checked_mul(ann, sum, "stable D numerator")?,
                    checked_mul(d_p, n, "stable D numerator")?,
                    "stable D numerator",
                )?,
                d,
                "stable D numerator",
            )?;
            let denominator = checked_add(
                checked_mul(ann - U256::one(), d, "stable D denominator")?,
                checked_mul(n + U256::one(), d_p, "stable D denominator")?,
                "stable D denominator",
            )?;
            d = checked_div(numerator, denominator, "stable D")?;

            if abs_diff(d, d_prev) <= U256::from(params.tolerance) {
                return Ok(d);
            }
        }

        Err(AmmError::ConvergenceError {
            what: "stable-swap invariant D",
            iterations: params.max_iterations,
        })
    }

    /// New balance of coin `j` when coin `i` moves to `x`, holding `D` fixed
    pub fn get_y(
        i: usize,
        x: U256,
        xp: [U256; 2],
        amplification: u64,
        params: ConvergenceParams,
    ) -> Result<U256> {
        if i > 1 || x.is_zero() {
            return Err(AmmError::InvalidInput("invalid stable-swap coin balance".into()));
        }
        let n = U256::from(N_COINS);
        let d = Self::get_d(xp, amplification, params)?;
        let ann = U256::from(amplification) * n;

        // Only one other coin in a two-coin pool
        let sum = x;
        let c = checked_div(checked_mul(d, d, "stable c")?, checked_mul(x, n, "stable c")?, "stable c")?;
        let c = math::mul_div(c, d, checked_mul(ann, n, "stable c")?)?;
        let b = checked_add(sum, checked_div(d, ann, "stable b")?, "stable b")?;

        let mut y = d;
        for _ in 0..params.max_iterations {
            let y_prev = y;
            let numerator = checked_add(checked_mul(y, y, "stable y")?, c, "stable y")?;
            let denominator = checked_sub(
                checked_add(checked_mul(y, U256::from(2u8), "stable y")?, b, "stable y")?,
                d,
                "stable y denominator",
            )?;
            y = checked_div(numerator, denominator, "stable y")?;

            if abs_diff(y, y_prev) <= U256::from(params.tolerance) {
                return Ok(y);
            }
        }

        Err(AmmError::ConvergenceError {
            what: "stable-swap balance y",
            iterations: params.max_iterations,
        })
    }

    /// Exchange `dx` raw units of coin `i` for coin `1 - i`
    pub fn get_dy(
        pool: &StablePoolState,
        i: usize,
        dx: u128,
        decimals: [u8; 2],
        fee: FeeRate,
        params: ConvergenceParams,
    ) -> Result<StableSwapResult> {
        if dx == 0 {
            return Err(AmmError::InvalidInput("input amount must be positive".into()));
        }
        if i > 1 {
            return Err(AmmError::InvalidInput(format!("coin index {} out of range", i)));
        }
        let j = 1 - i;
        let rates = multipliers(decimals)?;
        let xp = normalize(pool.balances, rates)?;

        let x = checked_add(
            xp[i],
            checked_mul(U256::from(dx), rates[i], "stable dx")?,
            "stable x",
        )?;
        let y = Self::get_y(i, x, xp, pool.amplification, params)?;

        let dy_normalized = match xp[j].checked_sub(y + U256::one()) {
            Some(dy) => dy,
            None => {
                return Ok(StableSwapResult {
                    amount_out: 0,
                    fee_amount: 0,
                })
            }
        };
        let dy = dy_normalized / rates[j];
        let fee_amount = math::mul_div(
            dy,
            U256::from(fee.pips()),
            U256::from(FeeRate::DENOMINATOR),
        )?;

        Ok(StableSwapResult {
            amount_out: to_u128(dy - fee_amount, "stable dy")?,
            fee_amount: to_u128(fee_amount, "stable fee")?,
        })
    }

    /// Marginal raw output of coin `1 - i` per raw unit of coin `i`, fee excluded
    ///
    /// Implicit derivative of the invariant at the current balances:
    /// `(a*x*y + t*y) / (a*x*y + t*x)` with `a = 4A` and `t = D^3 / (4xy)`.
    pub fn spot_price(
        pool: &StablePoolState,
        i: usize,
        decimals: [u8; 2],
        params: ConvergenceParams,
    ) -> Result<Decimal> {
        if i > 1 {
            return Err(AmmError::InvalidInput(format!("coin index {} out of range", i)));
        }
        let j = 1 - i;
        let rates = multipliers(decimals)?;
        let xp = normalize(pool.balances, rates)?;
        let (x, y) = (xp[i], xp[j]);

        let d = Self::get_d(xp, pool.amplification, params)?;
        let four = U256::from(4u8);
        let a = checked_mul(U256::from(pool.amplification), four, "stable spot")?;
        let t = math::mul_div(
            math::mul_div(d, d, checked_mul(four, x, "stable spot")?)?,
            d,
            y,
        )?;
        let axy = checked_mul(checked_mul(a, x, "stable spot")?, y, "stable spot")?;
        let numerator = checked_add(axy, checked_mul(t, y, "stable spot")?, "stable spot")?;
        let denominator = checked_add(axy, checked_mul(t, x, "stable spot")?, "stable spot")?;

        let normalized = math::ratio_to_decimal(numerator, denominator)?;
        let rate_in = decimal_rate(rates[i])?;
        let rate_out = decimal_rate(rates[j])?;
        normalized
            .checked_mul(rate_in)
            .and_then(|price| price.checked_div(rate_out))
            .ok_or(AmmError::NumericOverflow("stable spot price"))
    }

    /// Largest single-coin input the pool can absorb: its own balance
    pub fn capacity(pool: &StablePoolState, i: usize) -> u128 {
        pool.balances[i.min(1)]
    }
}

/// Per-coin multipliers `10^(18 - decimals)`
fn multipliers(decimals: [u8; 2]) -> Result<[U256; 2]> {
    let mut rates = [U256::one(); 2];
    for (rate, decimals) in rates.iter_mut().zip(decimals) {
        if decimals > NORMALIZED_DECIMALS {
            return Err(AmmError::InvalidInput(format!(
                "stable-swap coins support at most {} decimals, got {}",
                NORMALIZED_DECIMALS, decimals
            )));
        }
        *rate = pow10(NORMALIZED_DECIMALS - decimals);
    }
    Ok(rates)
}

fn normalize(balances: [u128; 2], rates: [U256; 2]) -> Result<[U256; 2]> {
    Ok([
        checked_mul(U256::from(balances[0]), rates[0], "stable normalize")?,
        checked_mul(U256::from(balances[1]), rates[1], "stable normalize")?,
    ])
}

fn decimal_rate(rate: U256) -> Result<Decimal> {
    math::ratio_to_decimal(rate, U256::one())
}

#[inline]
fn abs_diff(a: U256, b: U256) -> U256 {
    if a > b {
        a - b
    } else {
        b - a
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIT: u128 = 1_000_000;

    fn usdc_usdt(balance0: u128, balance1: u128) -> StablePoolState {
        StablePoolState {
            balances: [balance0 * UNIT, balance1 * UNIT],
            amplification: 100,
        }
    }

    fn fee() -> FeeRate {
        FeeRate::from_pips(400).unwrap()
    }

    #[test]
    fn test_d_equals_sum_when_balanced() {
        let xp = [U256::from(1_000_000u64), U256::from(1_000_000u64)];
        let d = StableMath::get_d(xp, 100, ConvergenceParams::default()).unwrap();
        assert_eq!(d, U256::from(2_000_000u64));
    }

    #[test]
    fn test_balanced_pool_trades_near_par() {
        let pool = usdc_usdt(1_000_000, 1_000_000);
        let result = StableMath::get_dy(&pool, 0, 1_000 * UNIT, [6, 6], fee(), ConvergenceParams::default())
            .unwrap();
        // 0.04% fee plus negligible curvature
        assert!(result.amount_out > 999 * UNIT - 500_000);
        assert!(result.amount_out < 1_000 * UNIT);
        assert!(result.fee_amount > 0);
    }

    #[test]
    fn test_mixed_decimals_normalized() {
        // 6-decimal coin against an 18-decimal coin at par
        let pool = StablePoolState {
            balances: [1_000_000 * UNIT, 1_000_000 * 10u128.pow(18)],
            amplification: 200,
        };
        let result = StableMath::get_dy(&pool, 0, 100 * UNIT, [6, 18], FeeRate::ZERO, ConvergenceParams::default())
            .unwrap();
        let expected = 100 * 10u128.pow(18);
        assert!(result.amount_out < expected);
        assert!(result.amount_out > expected - expected / 10_000);
    }

    #[test]
    fn test_spot_price_at_par() {
        let pool = usdc_usdt(1_000_000, 1_000_000);
        let spot = StableMath::spot_price(&pool, 0, [6, 6], ConvergenceParams::default()).unwrap();
        assert_eq!(spot, Decimal::ONE);
    }

    #[test]
    fn test_spot_price_tilts_with_imbalance() {
        let pool = usdc_usdt(1_500_000, 500_000);
        let spot = StableMath::spot_price(&pool, 0, [6, 6], ConvergenceParams::default()).unwrap();
        assert!(spot < Decimal::ONE);
        let reverse = StableMath::spot_price(&pool, 1, [6, 6], ConvergenceParams::default()).unwrap();
        assert!(reverse > Decimal::ONE);
    }

    #[test]
    fn test_iteration_budget_exceeded() {
        let pool = usdc_usdt(1_900_000, 100_000);
        let params = ConvergenceParams {
            max_iterations: 1,
            tolerance: 0,
        };
        assert!(matches!(
            StableMath::get_dy(&pool, 0, 1_000 * UNIT, [6, 6], fee(), params),
            Err(AmmError::ConvergenceError { .. })
        ));
    }

    #[test]
    fn test_too_many_decimals_rejected() {
        let pool = usdc_usdt(1, 1);
        assert!(matches!(
            pool.validate([6, 24]),
            Err(AmmError::InvalidInput(_))
        ));
    }
}
