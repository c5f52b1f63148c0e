//! Optimal position sizing for arbitrage cycles
//!
//! Finds the input that maximizes `net(x) = chain_output(x) - x - gas` over
//! `(0, x_max]`. Net profit is concave in `x` on the feasible domain, so a
//! bounded golden-section search converges to the optimum; the closed-form
//! optimum of an all-constant-product chain is evaluated as an extra
//! candidate.

use crate::config::CurveConfig;
use crate::error::{AmmError, Result};
use crate::pool::{CurveState, Pool, SwapQuote};
use crate::v2_math::ChainCoefficients;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// 1 / golden ratio
const INV_PHI: f64 = 0.618_033_988_749_895;

/// Configuration for position sizing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingConfig {
    /// Net profit must exceed this, in raw base-asset units
    #[serde(with = "types::raw_amount")]
    pub min_profit: u128,
    /// Golden-section iteration budget
    pub max_iterations: u32,
    /// Stop once the bracket is at most this wide, in raw units
    #[serde(with = "types::raw_amount")]
    pub absolute_tolerance: u128,
    /// Stop once the bracket is at most this share of its upper end
    pub relative_tolerance_ppm: u32,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            min_profit: 0,
            max_iterations: 200,
            absolute_tolerance: 1,
            relative_tolerance_ppm: 100, // 0.01%
        }
    }
}

impl SizingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(AmmError::InvalidInput(
                "optimizer max_iterations must be positive".into(),
            ));
        }
        if self.relative_tolerance_ppm >= 1_000_000 {
            return Err(AmmError::InvalidInput(
                "optimizer relative tolerance must be below 100%".into(),
            ));
        }
        Ok(())
    }
}

/// One directed hop of a candidate path
#[derive(Debug, Clone, Copy)]
pub struct SwapLeg<'a> {
    pub pool: &'a Pool,
    pub zero_for_one: bool,
}

impl<'a> SwapLeg<'a> {
    pub fn new(pool: &'a Pool, zero_for_one: bool) -> Self {
        Self { pool, zero_for_one }
    }
}

/// Result of optimal position calculation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimalPosition {
    pub amount_in: u128,
    pub amount_out: u128,
    /// Per-hop quotes at `amount_in`
    pub leg_quotes: Vec<SwapQuote>,
    pub gas_cost: u128,
    pub net_profit: u128,
    /// Search iterations spent
    pub iterations: u32,
}

impl OptimalPosition {
    /// Output minus input, before gas
    pub fn gross_profit(&self) -> u128 {
        self.amount_out.saturating_sub(self.amount_in)
    }
}

/// Memoized objective with best-point tracking
struct Objective<'a, 'l> {
    legs: &'l [SwapLeg<'a>],
    curves: &'l CurveConfig,
    gas_cost: u128,
    evaluated: HashMap<u128, i128>,
    best: Option<(u128, i128)>,
}

impl<'a, 'l> Objective<'a, 'l> {
    fn eval(&mut self, amount_in: u128) -> Result<i128> {
        if let Some(net) = self.evaluated.get(&amount_in) {
            return Ok(*net);
        }
        let amount_out = OptimalSizeCalculator::chain_output(self.legs, amount_in, self.curves)?;
        let net = saturating_i128(amount_out)
            .saturating_sub(saturating_i128(amount_in))
            .saturating_sub(saturating_i128(self.gas_cost));
        self.evaluated.insert(amount_in, net);

        let improves = match self.best {
            None => true,
            Some((best_x, best_net)) => net > best_net || (net == best_net && amount_in < best_x),
        };
        if improves {
            self.best = Some((amount_in, net));
        }
        Ok(net)
    }
}

/// Calculates optimal trade sizes for arbitrage cycles
pub struct OptimalSizeCalculator {
    config: SizingConfig,
}

impl OptimalSizeCalculator {
    pub fn new(config: SizingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SizingConfig {
        &self.config
    }

    /// Profit-maximizing input for `legs`
    ///
    /// Fails with `NoFeasibleSize` when no input clears `min_profit` after
    /// `gas_cost`, and with `ConvergenceError` when the iteration budget runs
    /// out before the bracket meets the tolerance.
    pub fn calculate(
        &self,
        legs: &[SwapLeg<'_>],
        gas_cost: u128,
        curves: &CurveConfig,
    ) -> Result<OptimalPosition> {
        if legs.is_empty() {
            return Err(AmmError::InvalidInput("path has no legs".into()));
        }

        let log_return = Self::best_case_log_return(legs, curves)?;
        if log_return <= 0.0 {
            return Err(AmmError::NoFeasibleSize(format!(
                "best-case return {:.6} does not exceed 1",
                log_return.exp()
            )));
        }

        let x_max = self.feasible_upper_bound(legs, curves)?;
        let mut objective = Objective {
            legs,
            curves,
            gas_cost,
            evaluated: HashMap::new(),
            best: None,
        };

        if let Some(hint) = Self::closed_form_hint(legs) {
            objective.eval(hint.clamp(1, x_max))?;
        }

        let mut lo = 1u128;
        let mut hi = x_max;
        let mut iterations = 0u32;
        while hi - lo > self.tolerance(hi) {
            if iterations >= self.config.max_iterations {
                return Err(AmmError::ConvergenceError {
                    what: "profit optimizer",
                    iterations,
                });
            }
            iterations += 1;

            let span = golden_span(hi - lo);
            let x1 = hi - span;
            let x2 = lo + span;
            if objective.eval(x1)? < objective.eval(x2)? {
                lo = x1;
            } else {
                hi = x2;
            }
        }
        objective.eval(lo)?;
        objective.eval(hi)?;
        objective.eval(lo + (hi - lo) / 2)?;

        let (amount_in, net) = objective
            .best
            .ok_or_else(|| AmmError::NoFeasibleSize("no input evaluated".into()))?;
        if net <= saturating_i128(self.config.min_profit) {
            return Err(AmmError::NoFeasibleSize(format!(
                "best net profit {} at input {} does not exceed threshold {}",
                net, amount_in, self.config.min_profit
            )));
        }

        let quotes = Self::quote_chain(legs, amount_in, curves)?;
        let amount_out = quotes.last().map(|q| q.amount_out).unwrap_or_default();
        let net_profit = amount_out
            .checked_sub(amount_in)
            .and_then(|gross| gross.checked_sub(gas_cost))
            .ok_or(AmmError::NumericOverflow("net profit"))?;

        debug!(
            amount_in = %amount_in,
            amount_out = %amount_out,
            net_profit = %net_profit,
            iterations,
            "Optimal size found"
        );

        Ok(OptimalPosition {
            amount_in,
            amount_out,
            leg_quotes: quotes,
            gas_cost,
            net_profit,
            iterations,
        })
    }

    /// Quote every hop in order, each output feeding the next input
    pub fn quote_chain(
        legs: &[SwapLeg<'_>],
        amount_in: u128,
        curves: &CurveConfig,
    ) -> Result<Vec<SwapQuote>> {
        let mut quotes = Vec::with_capacity(legs.len());
        let mut amount = amount_in;
        for leg in legs {
            let quote = leg.pool.quote_directed(leg.zero_for_one, amount, curves)?;
            amount = quote.amount_out;
            quotes.push(quote);
        }
        Ok(quotes)
    }

    /// Final output of the chain; an intermediate output truncated to zero
    /// yields zero rather than an error
    pub fn chain_output(legs: &[SwapLeg<'_>], amount_in: u128, curves: &CurveConfig) -> Result<u128> {
        let mut amount = amount_in;
        for leg in legs {
            if amount == 0 {
                return Ok(0);
            }
            amount = leg
                .pool
                .quote_directed(leg.zero_for_one, amount, curves)?
                .amount_out;
        }
        Ok(amount)
    }

    /// Sum of log marginal rates: the return of an infinitesimal trade
    pub fn best_case_log_return(legs: &[SwapLeg<'_>], curves: &CurveConfig) -> Result<f64> {
        let mut total = 0.0;
        for leg in legs {
            let rate = leg
                .pool
                .marginal_rate(leg.zero_for_one, curves)?
                .to_f64()
                .unwrap_or(0.0);
            if rate <= 0.0 {
                return Ok(f64::NEG_INFINITY);
            }
            total += rate.ln();
        }
        Ok(total)
    }

    /// Largest input the whole chain accepts, found by bisection when the
    /// first hop's bound overflows a later hop
    fn feasible_upper_bound(&self, legs: &[SwapLeg<'_>], curves: &CurveConfig) -> Result<u128> {
        let first = legs[0];
        let x_max = first.pool.max_input_directed(first.zero_for_one, curves)?;
        if x_max == 0 {
            return Err(AmmError::NoFeasibleSize("first hop accepts no input".into()));
        }
        if Self::is_feasible(legs, x_max, curves)? {
            return Ok(x_max);
        }

        // Feasibility is monotone: every hop output increases with its input
        let (mut lo, mut hi) = (0u128, x_max);
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            if Self::is_feasible(legs, mid, curves)? {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        if lo == 0 {
            return Err(AmmError::NoFeasibleSize("no input fits every hop".into()));
        }
        Ok(lo)
    }

    fn is_feasible(legs: &[SwapLeg<'_>], amount_in: u128, curves: &CurveConfig) -> Result<bool> {
        match Self::chain_output(legs, amount_in, curves) {
            Ok(_) => Ok(true),
            Err(AmmError::InsufficientLiquidity(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Closed-form optimum when every hop is constant product
    fn closed_form_hint(legs: &[SwapLeg<'_>]) -> Option<u128> {
        let mut chain = ChainCoefficients::default();
        for leg in legs {
            match &leg.pool.curve {
                CurveState::ConstantProduct(state) => {
                    let (reserve_in, reserve_out) = state.reserves(leg.zero_for_one);
                    chain.push(reserve_in, reserve_out, leg.pool.fee);
                }
                _ => return None,
            }
        }
        chain.optimal_input()
    }

    fn tolerance(&self, hi: u128) -> u128 {
        let relative = hi / 1_000_000 * self.config.relative_tolerance_ppm as u128
            + hi % 1_000_000 * self.config.relative_tolerance_ppm as u128 / 1_000_000;
        self.config.absolute_tolerance.max(relative).max(2)
    }
}

/// Golden-section step, never below half the bracket so sample points stay ordered
fn golden_span(width: u128) -> u128 {
    let golden = (width as f64 * INV_PHI) as u128;
    golden.max(width / 2 + width % 2).min(width)
}

fn saturating_i128(value: u128) -> i128 {
    i128::try_from(value).unwrap_or(i128::MAX)
}
