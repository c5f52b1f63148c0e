//! # Cycle Arbitrage Types Library
//!
//! Shared vocabulary for the arbitrage engine: asset and pool identifiers,
//! fee rates and the protocol tag carried by every pool.
//!
//! ## Design Philosophy
//!
//! - **No Precision Loss**: Fee rates are integer pips, amounts stay raw token units
//! - **Type Safety**: Distinct identifier types prevent mixing assets and pools
//! - **Clear Boundaries**: Validation happens at construction, not at use
//!
//! ## Quick Start
//!
//! ```rust
//! use types::{Asset, AssetId, FeeRate, PoolId, Protocol};
//!
//! let weth = Asset::new(AssetId::new("WETH"), 18).unwrap();
//! let fee = FeeRate::from_bps(30).unwrap();
//! assert_eq!(fee.pips(), 3_000);
//! assert_eq!(Protocol::ConstantProduct.to_string(), "constant_product");
//! let _pool = PoolId::new("uniswap-v2:WETH/USDC");
//! # let _ = weth;
//! ```
//!
//! ## Integration Points
//!
//! - **AMM Library**: Pool state and quotes are keyed by these identifiers
//! - **Pool Graph**: Asset nodes and pool edges use [`AssetId`] and [`PoolId`]
//! - **Strategy Services**: Opportunities serialize these types to the execution side

#[cfg(feature = "common")]
pub mod common;

#[cfg(feature = "common")]
pub use common::amount::raw_amount;
#[cfg(feature = "common")]
pub use common::errors::ValidationError;
#[cfg(feature = "common")]
pub use common::fixed_point::FeeRate;
#[cfg(feature = "common")]
pub use common::identifiers::{Asset, AssetId, PoolId};
#[cfg(feature = "common")]
pub use common::protocol::Protocol;

// Define Result type alias
#[cfg(feature = "common")]
pub type Result<T> = std::result::Result<T, ValidationError>;
