//! Uniswap V2 constant-product math with exact on-chain arithmetic
//!
//! Amounts are raw token units. The fee is taken from the input before the
//! invariant is solved and every division truncates, matching
//! `UniswapV2Library.getAmountOut`.

use crate::error::{AmmError, Result};
use crate::math::{self, checked_add, checked_mul, checked_sub, to_u128};
use primitive_types::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::FeeRate;

/// Reserves of a constant-product pool, ordered like the pool's assets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct V2PoolState {
    pub reserve0: u128,
    pub reserve1: u128,
}

impl V2PoolState {
    pub fn new(reserve0: u128, reserve1: u128) -> Result<Self> {
        let state = Self { reserve0, reserve1 };
        state.validate()?;
        Ok(state)
    }

    pub fn validate(&self) -> Result<()> {
        if self.reserve0 == 0 || self.reserve1 == 0 {
            return Err(AmmError::InvalidInput(format!(
                "reserves must be positive, got ({}, {})",
                self.reserve0, self.reserve1
            )));
        }
        Ok(())
    }

    /// (reserve_in, reserve_out) for a trade direction
    #[inline]
    pub fn reserves(&self, zero_for_one: bool) -> (u128, u128) {
        if zero_for_one {
            (self.reserve0, self.reserve1)
        } else {
            (self.reserve1, self.reserve0)
        }
    }
}

/// Virtual-reserve composition of a constant-product chain.
///
/// A chain of constant-product hops behaves like a single pool
/// `out(x) = n * x / (d + m * x)`; each hop folds into the running
/// coefficients. Tracked in `f64` because it only seeds the exact search.
#[derive(Debug, Clone, Copy)]
pub struct ChainCoefficients {
    n: f64,
    d: f64,
    m: f64,
}

impl Default for ChainCoefficients {
    fn default() -> Self {
        Self {
            n: 1.0,
            d: 1.0,
            m: 0.0,
        }
    }
}

impl ChainCoefficients {
    /// Fold one hop with the given reserves and fee into the chain
    pub fn push(&mut self, reserve_in: u128, reserve_out: u128, fee: FeeRate) {
        let gamma = fee.complement_pips() as f64 / FeeRate::DENOMINATOR as f64;
        let r_in = reserve_in as f64;
        let r_out = reserve_out as f64;
        let n = gamma * self.n * r_out;
        let d = r_in * self.d;
        let m = r_in * self.m + gamma * self.n;
        // Rescale to keep magnitudes near one; the ratio is unchanged
        self.n = n / d;
        self.m = m / d;
        self.d = 1.0;
    }

    /// Profit-maximizing input `(sqrt(n*d) - d) / m`, if the chain is profitable
    pub fn optimal_input(&self) -> Option<u128> {
        if self.n <= self.d || self.m <= 0.0 {
            return None;
        }
        let x = ((self.n * self.d).sqrt() - self.d) / self.m;
        if x.is_finite() && x >= 1.0 && x < u128::MAX as f64 {
            Some(x as u128)
        } else {
            None
        }
    }
}

/// V2 AMM math functions
pub struct V2Math;

impl V2Math {
    /// Exact output amount for `amount_in` using the x*y=k formula
    ///
    /// `out = in * (1e6 - fee) * r_out / (r_in * 1e6 + in * (1e6 - fee))`
    pub fn get_amount_out(
        amount_in: u128,
        reserve_in: u128,
        reserve_out: u128,
        fee: FeeRate,
    ) -> Result<u128> {
        if amount_in == 0 {
            return Err(AmmError::InvalidInput("input amount must be positive".into()));
        }
        if reserve_in == 0 || reserve_out == 0 {
            return Err(AmmError::InsufficientLiquidity("empty reserves".into()));
        }

        let amount_in_with_fee = checked_mul(
            U256::from(amount_in),
            U256::from(fee.complement_pips()),
            "v2 amount_in_with_fee",
        )?;
        let numerator = checked_mul(amount_in_with_fee, U256::from(reserve_out), "v2 numerator")?;
        let denominator = checked_add(
            checked_mul(
                U256::from(reserve_in),
                U256::from(FeeRate::DENOMINATOR),
                "v2 denominator",
            )?,
            amount_in_with_fee,
            "v2 denominator",
        )?;

        to_u128(numerator / denominator, "v2 amount_out")
    }

    /// Input required to receive `amount_out`, rounded up like the router
    pub fn get_amount_in(
        amount_out: u128,
        reserve_in: u128,
        reserve_out: u128,
        fee: FeeRate,
    ) -> Result<u128> {
        if amount_out == 0 {
            return Err(AmmError::InvalidInput("output amount must be positive".into()));
        }
        if amount_out >= reserve_out {
            return Err(AmmError::InsufficientLiquidity(format!(
                "output {} exceeds reserve {}",
                amount_out, reserve_out
            )));
        }

        let numerator = checked_mul(
            checked_mul(U256::from(reserve_in), U256::from(amount_out), "v2 numerator")?,
            U256::from(FeeRate::DENOMINATOR),
            "v2 numerator",
        )?;
        let denominator = checked_mul(
            checked_sub(U256::from(reserve_out), U256::from(amount_out), "v2 denominator")?,
            U256::from(fee.complement_pips()),
            "v2 denominator",
        )?;
        let amount_in = math::checked_div(numerator, denominator, "v2 amount_in")?;

        to_u128(checked_add(amount_in, U256::one(), "v2 amount_in")?, "v2 amount_in")
    }

    /// Marginal output per unit input, fee excluded
    pub fn spot_price(reserve_in: u128, reserve_out: u128) -> Result<Decimal> {
        math::ratio_to_decimal(U256::from(reserve_out), U256::from(reserve_in))
    }

    /// Fee charged on `amount_in`, in input units
    pub fn fee_amount(amount_in: u128, fee: FeeRate) -> Result<u128> {
        let fee_amount = math::mul_div(
            U256::from(amount_in),
            U256::from(fee.pips()),
            U256::from(FeeRate::DENOMINATOR),
        )?;
        to_u128(fee_amount, "v2 fee")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fee_30bps() -> FeeRate {
        FeeRate::from_bps(30).unwrap()
    }

    #[test]
    fn test_output_matches_router_formula() {
        // 1 WETH into 100 WETH / 200_000 USDC at 0.3%
        let out = V2Math::get_amount_out(
            1_000_000_000_000_000_000,
            100_000_000_000_000_000_000,
            200_000_000_000,
            fee_30bps(),
        )
        .unwrap();
        let expected = (997u128 * 200_000_000_000 * 1_000_000_000_000_000_000)
            / (100_000_000_000_000_000_000 * 1000 + 997 * 1_000_000_000_000_000_000);
        assert_eq!(out, expected);
    }

    #[test]
    fn test_truncation_rather_than_rounding() {
        // 10 * 0.997 * 10 / (100 + 9.97) = 0.906.. -> 0
        assert_eq!(V2Math::get_amount_out(10, 100, 10, fee_30bps()).unwrap(), 0);
        assert_eq!(V2Math::get_amount_out(1_000, 1_000_000, 1_000_000, fee_30bps()).unwrap(), 996);
    }

    #[test]
    fn test_zero_input_rejected() {
        assert!(matches!(
            V2Math::get_amount_out(0, 100, 100, fee_30bps()),
            Err(AmmError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_amount_in_inverts_amount_out() {
        let (r_in, r_out) = (5_000_000u128, 7_000_000u128);
        let needed = V2Math::get_amount_in(10_000, r_in, r_out, fee_30bps()).unwrap();
        let received = V2Math::get_amount_out(needed, r_in, r_out, fee_30bps()).unwrap();
        assert!(received >= 10_000);
        let short = V2Math::get_amount_out(needed - 2, r_in, r_out, fee_30bps()).unwrap();
        assert!(short < 10_000);
    }

    #[test]
    fn test_amount_in_exceeding_reserve() {
        assert!(matches!(
            V2Math::get_amount_in(100, 100, 100, fee_30bps()),
            Err(AmmError::InsufficientLiquidity(_))
        ));
    }

    #[test]
    fn test_spot_price_ignores_fee() {
        let spot = V2Math::spot_price(100_000, 200_000).unwrap();
        assert_eq!(spot, Decimal::from(2));
    }

    #[test]
    fn test_chain_optimum_single_pair() {
        // Two pools quoting the same pair at different prices
        let mut chain = ChainCoefficients::default();
        chain.push(98_000, 205_000, fee_30bps());
        chain.push(200_000, 100_000, fee_30bps());
        let x = chain.optimal_input().unwrap();
        assert!(x > 500 && x < 1_500, "optimum {x}");
    }

    #[test]
    fn test_chain_optimum_unprofitable() {
        let mut chain = ChainCoefficients::default();
        chain.push(100_000, 200_000, fee_30bps());
        chain.push(205_000, 98_000, fee_30bps());
        assert_eq!(chain.optimal_input(), None);
    }
}
