//! State Management Traits
//!
//! Core traits for components that accept pool updates, and per-pool
//! timestamp tracking for out-of-order detection.

use crate::error::GraphError;
use crate::update::{PoolUpdate, UpdateOutcome};
use types::PoolId;

/// A store that commits pool updates one at a time
pub trait UpdateTarget {
    /// Validate and commit `update`, or reject it without side effects
    fn apply_update(&self, update: PoolUpdate) -> Result<UpdateOutcome, GraphError>;
}

/// Last applied timestamp for one pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimestampTracker {
    last_applied: Option<u64>,
}

impl TimestampTracker {
    /// Tracker that has already applied `timestamp`
    pub fn starting_at(timestamp: u64) -> Self {
        Self {
            last_applied: Some(timestamp),
        }
    }

    pub fn last_applied(&self) -> Option<u64> {
        self.last_applied
    }

    /// Reject timestamps strictly older than the last applied one.
    /// Equal timestamps pass: one block can carry several events per pool.
    pub fn check(&self, pool_id: &PoolId, timestamp: u64) -> Result<(), GraphError> {
        match self.last_applied {
            Some(last) if timestamp < last => Err(GraphError::StaleUpdate {
                pool_id: pool_id.clone(),
                last_applied: last,
                received: timestamp,
            }),
            _ => Ok(()),
        }
    }

    /// Record `timestamp` as applied (call after a successful commit)
    pub fn advance(&mut self, timestamp: u64) {
        self.last_applied = Some(timestamp);
    }
}
