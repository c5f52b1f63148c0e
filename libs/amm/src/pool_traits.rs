//! Pool trait definitions for the unified curve interface

use crate::config::CurveConfig;
use crate::error::{AmmError, Result};
use crate::math;
use crate::stable_math::{StableMath, StablePoolState};
use crate::v2_math::{V2Math, V2PoolState};
use crate::v3_math::{V3Math, V3PoolState};
use primitive_types::U256;
use rust_decimal::Decimal;
use types::{FeeRate, Protocol};

/// Everything a curve needs besides its own state
#[derive(Debug, Clone, Copy)]
pub struct SwapContext<'a> {
    /// Trading asset 0 for asset 1
    pub zero_for_one: bool,
    pub fee: FeeRate,
    pub decimals: [u8; 2],
    pub config: &'a CurveConfig,
}

/// Raw curve output for one hop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurveQuote {
    pub amount_out: u128,
    pub fee_amount: u128,
    /// Fee denominated in the input asset (otherwise the output asset)
    pub fee_on_input: bool,
}

/// Unified pricing-curve interface
pub trait AmmPool {
    fn protocol(&self) -> Protocol;

    /// Check the state invariants of this curve
    fn validate(&self, decimals: [u8; 2]) -> Result<()>;

    /// Exact output for `amount_in`, without the safe-fraction bound
    fn quote(&self, ctx: &SwapContext<'_>, amount_in: u128) -> Result<CurveQuote>;

    /// Instantaneous output per unit input, fee excluded
    fn spot_price(&self, ctx: &SwapContext<'_>) -> Result<Decimal>;

    /// Input the curve can absorb in the trade direction
    fn capacity(&self, ctx: &SwapContext<'_>) -> Result<u128>;

    /// Safe per-hop input bound: capacity times the protocol's trade fraction
    fn max_input(&self, ctx: &SwapContext<'_>) -> Result<u128> {
        let fraction_ppm = ctx.config.fraction_ppm(self.protocol())?;
        let bound = math::mul_div(
            U256::from(self.capacity(ctx)?),
            U256::from(fraction_ppm),
            U256::from(1_000_000u32),
        )?;
        math::to_u128(bound, "max input")
    }

    /// Bounded quote: rejects empty input and input above [`AmmPool::max_input`]
    fn quote_output(&self, ctx: &SwapContext<'_>, amount_in: u128) -> Result<CurveQuote> {
        if amount_in == 0 {
            return Err(AmmError::InvalidInput("input amount must be positive".into()));
        }
        let max_input = self.max_input(ctx)?;
        if amount_in > max_input {
            return Err(AmmError::InsufficientLiquidity(format!(
                "input {} exceeds safe {} bound {}",
                amount_in,
                self.protocol(),
                max_input
            )));
        }
        self.quote(ctx, amount_in)
    }

    /// `max(0, (spot - exec) / spot)` where `exec = amount_out / amount_in`
    fn price_impact(&self, ctx: &SwapContext<'_>, amount_in: u128) -> Result<Decimal> {
        let quote = self.quote_output(ctx, amount_in)?;
        let spot = self.spot_price(ctx)?;
        if spot.is_zero() {
            return Err(AmmError::InsufficientLiquidity("zero spot price".into()));
        }
        let execution = math::ratio_to_decimal(U256::from(quote.amount_out), U256::from(amount_in))?;
        let impact = (spot - execution)
            .checked_div(spot)
            .ok_or(AmmError::NumericOverflow("price impact"))?;
        Ok(impact.max(Decimal::ZERO))
    }
}

impl AmmPool for V2PoolState {
    fn protocol(&self) -> Protocol {
        Protocol::ConstantProduct
    }

    fn validate(&self, _decimals: [u8; 2]) -> Result<()> {
        V2PoolState::validate(self)
    }

    fn quote(&self, ctx: &SwapContext<'_>, amount_in: u128) -> Result<CurveQuote> {
        let (reserve_in, reserve_out) = self.reserves(ctx.zero_for_one);
        Ok(CurveQuote {
            amount_out: V2Math::get_amount_out(amount_in, reserve_in, reserve_out, ctx.fee)?,
            fee_amount: V2Math::fee_amount(amount_in, ctx.fee)?,
            fee_on_input: true,
        })
    }

    fn spot_price(&self, ctx: &SwapContext<'_>) -> Result<Decimal> {
        let (reserve_in, reserve_out) = self.reserves(ctx.zero_for_one);
        V2Math::spot_price(reserve_in, reserve_out)
    }

    fn capacity(&self, ctx: &SwapContext<'_>) -> Result<u128> {
        Ok(self.reserves(ctx.zero_for_one).0)
    }
}

impl AmmPool for V3PoolState {
    fn protocol(&self) -> Protocol {
        Protocol::ConcentratedLiquidity
    }

    fn validate(&self, _decimals: [u8; 2]) -> Result<()> {
        V3PoolState::validate(self)
    }

    fn quote(&self, ctx: &SwapContext<'_>, amount_in: u128) -> Result<CurveQuote> {
        let result = V3Math::swap_exact_input(self, amount_in, ctx.zero_for_one, ctx.fee)?;
        Ok(CurveQuote {
            amount_out: result.amount_out,
            fee_amount: result.fee_amount,
            fee_on_input: true,
        })
    }

    fn spot_price(&self, ctx: &SwapContext<'_>) -> Result<Decimal> {
        V3Math::spot_price(self, ctx.zero_for_one)
    }

    fn capacity(&self, ctx: &SwapContext<'_>) -> Result<u128> {
        V3Math::capacity(self, ctx.zero_for_one, ctx.fee)
    }
}

impl AmmPool for StablePoolState {
    fn protocol(&self) -> Protocol {
        Protocol::StableSwap
    }

    fn validate(&self, decimals: [u8; 2]) -> Result<()> {
        StablePoolState::validate(self, decimals)
    }

    fn quote(&self, ctx: &SwapContext<'_>, amount_in: u128) -> Result<CurveQuote> {
        let result = StableMath::get_dy(
            self,
            coin_index(ctx.zero_for_one),
            amount_in,
            ctx.decimals,
            ctx.fee,
            ctx.config.convergence(),
        )?;
        Ok(CurveQuote {
            amount_out: result.amount_out,
            fee_amount: result.fee_amount,
            fee_on_input: false,
        })
    }

    fn spot_price(&self, ctx: &SwapContext<'_>) -> Result<Decimal> {
        StableMath::spot_price(
            self,
            coin_index(ctx.zero_for_one),
            ctx.decimals,
            ctx.config.convergence(),
        )
    }

    fn capacity(&self, ctx: &SwapContext<'_>) -> Result<u128> {
        Ok(StableMath::capacity(self, coin_index(ctx.zero_for_one)))
    }
}

#[inline]
fn coin_index(zero_for_one: bool) -> usize {
    if zero_for_one {
        0
    } else {
        1
    }
}
