//! # Cycle Arbitrage - Multi-hop DEX Arbitrage Detection
//!
//! ## Purpose
//!
//! Finds closed trading cycles across constant-product, concentrated-liquidity
//! and stable-swap pools whose output exceeds their input after fees and gas,
//! sizes each one optimally, and emits a ranked list of pool-disjoint
//! opportunities for execution.
//!
//! ## Integration Points
//!
//! - **Input Sources**: `PoolUpdate` events through the pool graph's bounded
//!   queue, or a pool file for one-shot scans
//! - **Output Destinations**: [`OpportunitySink`] implementations (JSON lines
//!   on stdout in the binary)
//! - **Math Libraries**: `amm` for quotes, marginal rates and optimal sizing
//! - **Configuration**: [`ArbitrageConfig`] loaded once at startup and passed
//!   down as plain values
//!
//! ## Architecture Role
//!
//! ```text
//! UpdateQueue → PoolGraph → GraphSnapshot → [PathEnumerator] → [OptimalSizeCalculator]
//!                                                                   ↓
//!                       OpportunitySink ← [OpportunityRanker] ← Opportunity
//! ```
//!
//! ## Performance Profile
//!
//! - **Enumeration**: DFS bounded by hop count, pruned by best-case log return
//! - **Parallelism**: base assets searched concurrently with rayon over one
//!   shared snapshot
//! - **Incremental**: after the first pass only cycles through changed pools
//!   are re-evaluated

pub mod config;
pub mod detector;
pub mod enumerator;
pub mod error;
pub mod gas;
pub mod logging;
pub mod metrics;
pub mod opportunity;
pub mod path;
pub mod pool_loader;
pub mod ranker;
pub mod service;
pub mod sink;

pub use config::{ArbitrageConfig, DetectorConfig, LoggingConfig, ServiceConfig};
pub use detector::{
    ArbitrageDetector, DetectorSettings, FailureKind, PassParams, PassReport, PathFailure,
};
pub use enumerator::{CycleIter, PathEnumerator};
pub use error::{DetectorError, Result, SinkError};
pub use gas::{GasModel, GasPricing, GasSchedule};
pub use logging::{init_tracing, LogEmoji};
pub use metrics::{DetectorMetrics, MetricsSnapshot};
pub use opportunity::Opportunity;
pub use path::{CyclePath, RouteHop};
pub use pool_loader::{load_pool_updates, parse_update_line};
pub use ranker::{OpportunityRanker, RankedOpportunities};
pub use service::ArbitrageService;
pub use sink::{JsonLinesSink, MemorySink, OpportunitySink};
