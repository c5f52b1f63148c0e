//! # Pool Graph - Authoritative DEX Pool State
//!
//! ## Purpose
//!
//! Single owner of current pool states for the arbitrage core. Assets are
//! nodes; every two-asset pool contributes one directed edge per trade
//! direction. Updates replace a pool's state atomically; detection passes read
//! immutable snapshots and never observe partial updates.
//!
//! ## Integration Points
//!
//! - **Input Sources**: `PoolUpdate` events pushed by ingestion into the
//!   bounded [`UpdateQueue`]
//! - **Output Destinations**: [`GraphSnapshot`] handed to the path enumerator
//!   and the detection pass
//! - **Validation**: Pool invariants checked before commit; out-of-order
//!   updates rejected per pool
//!
//! ## Architecture Role
//!
//! ```text
//! Ingestion ──submit──► UpdateQueue ──drain_into──► PoolGraph ──snapshot──► GraphSnapshot
//!                          (bounded)                 (DashMap,             (Arc, immutable,
//!                                                     per-pool lock)        edges_from)
//! ```
//!
//! ## Performance Profile
//!
//! - **Update**: O(1) map entry replacement, one `Arc` swap
//! - **Snapshot**: O(pools), writers excluded only while `Arc`s are cloned
//! - **Edge lookup**: hash lookup per asset, edges in pool insertion order

pub mod error;
pub mod pool_graph;
pub mod snapshot;
pub mod traits;
pub mod update;
pub mod update_queue;

pub use error::{GraphError, QueueError};
pub use pool_graph::{GraphStats, PoolGraph};
pub use snapshot::{Edge, GraphSnapshot};
pub use traits::{TimestampTracker, UpdateTarget};
pub use update::{PoolUpdate, UpdateOutcome};
pub use update_queue::{DrainReport, UpdateProducer, UpdateQueue};
