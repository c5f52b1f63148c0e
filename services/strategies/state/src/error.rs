//! Pool graph error types

use amm::AmmError;
use thiserror::Error;
use types::PoolId;

/// Errors from committing updates or checking snapshots
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Stale update for pool {pool_id}: timestamp {received} older than {last_applied}")]
    StaleUpdate {
        pool_id: PoolId,
        last_applied: u64,
        received: u64,
    },

    #[error("Invalid update for pool {pool_id}: {reason}")]
    InvalidUpdate { pool_id: PoolId, reason: String },

    #[error("Invalid state for pool {pool_id}: {source}")]
    InvalidState {
        pool_id: PoolId,
        #[source]
        source: AmmError,
    },

    /// Internal invariant violation; aborts the pass that observed it
    #[error("Corrupted snapshot v{version}: {reason}")]
    CorruptedSnapshot { version: u64, reason: String },
}

impl GraphError {
    /// Pool the error is about, when there is one
    pub fn pool_id(&self) -> Option<&PoolId> {
        match self {
            GraphError::StaleUpdate { pool_id, .. }
            | GraphError::InvalidUpdate { pool_id, .. }
            | GraphError::InvalidState { pool_id, .. } => Some(pool_id),
            GraphError::CorruptedSnapshot { .. } => None,
        }
    }
}

/// Producer-side queue errors
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    #[error("Update queue full (capacity {capacity})")]
    QueueFull { capacity: usize },

    #[error("Update queue disconnected")]
    Disconnected,
}
