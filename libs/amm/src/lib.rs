//! # AMM Library - Exact DEX Pricing Curves
//!
//! ## Purpose
//!
//! Integer-exact pricing for three curve families and profit-maximizing trade
//! sizing over chains of them. Every quote matches what the on-chain contract
//! would return for the same state, so a cycle reported profitable here is
//! profitable at that state.
//!
//! ## Integration Points
//!
//! - **Input Sources**: [`Pool`] values built from update feeds by the pool graph
//! - **Output Destinations**: Path enumeration and the cycle arbitrage detector
//! - **Protocol Support**: Constant product (V2), concentrated liquidity (V3 ticks),
//!   two-coin StableSwap
//! - **Precision**: Raw integer amounts in native token units; `U256`/`U512`
//!   intermediates; `Decimal` only for ratios
//!
//! ## Architecture Role
//!
//! ```text
//! CurveState ──► AmmPool::quote_output ──► Pool::quote_directed ──► SwapQuote
//!                        │                          │
//!                   max_input bound          OptimalSizeCalculator
//!                                                   │
//!                                            OptimalPosition
//! ```
//!
//! ## Performance Profile
//!
//! - **V2 quote**: a handful of 256-bit multiplications
//! - **V3 quote**: one swap step per crossed initialized tick
//! - **StableSwap quote**: two bounded Newton loops
//! - **Sizing**: tens of chain evaluations, memoized per input

pub mod config;
pub mod error;
pub mod math;
pub mod optimal_size;
pub mod pool;
pub mod pool_traits;
pub mod stable_math;
pub mod tick_math;
pub mod v2_math;
pub mod v3_math;

pub use config::{CurveConfig, TradeFractions};
pub use error::{AmmError, Result};
pub use optimal_size::{OptimalPosition, OptimalSizeCalculator, SizingConfig, SwapLeg};
pub use pool::{CurveState, Pool, SwapQuote};
pub use pool_traits::{AmmPool, CurveQuote, SwapContext};
pub use stable_math::{StableMath, StablePoolState};
pub use v2_math::{ChainCoefficients, V2Math, V2PoolState};
pub use v3_math::{V3Math, V3PoolState};

/// Common types for AMM calculations
pub use rust_decimal::Decimal;
pub use rust_decimal_macros::dec;
