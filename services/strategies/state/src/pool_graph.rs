//! Pool Graph
//!
//! Authoritative store of current pool states. Updates are serialized per
//! pool through the map's entry lock; snapshots take a consistent cut across
//! all pools by briefly excluding writers.

use crate::error::GraphError;
use crate::snapshot::GraphSnapshot;
use crate::traits::{TimestampTracker, UpdateTarget};
use crate::update::{PoolUpdate, UpdateOutcome};
use amm::Pool;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use types::{PoolId, Protocol};

struct PoolEntry {
    pool: Arc<Pool>,
    tracker: TimestampTracker,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct GraphStats {
    pub total_pools: usize,
    pub constant_product_pools: usize,
    pub concentrated_liquidity_pools: usize,
    pub stable_swap_pools: usize,
    pub applied_updates: u64,
    pub stale_updates: u64,
    pub rejected_updates: u64,
}

impl GraphStats {
    fn count_pool(&mut self, protocol: Protocol) {
        self.total_pools += 1;
        match protocol {
            Protocol::ConstantProduct => self.constant_product_pools += 1,
            Protocol::ConcentratedLiquidity => self.concentrated_liquidity_pools += 1,
            Protocol::StableSwap => self.stable_swap_pools += 1,
        }
    }
}

/// Manages state for all pools
pub struct PoolGraph {
    pools: DashMap<PoolId, PoolEntry>,
    /// Pool ids in registration order
    order: RwLock<Vec<PoolId>>,
    /// Bumped once per committed update
    version: AtomicU64,
    /// Writers hold it shared, snapshots exclusive
    commit_gate: RwLock<()>,
    stats: RwLock<GraphStats>,
}

impl Default for PoolGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl PoolGraph {
    pub fn new() -> Self {
        Self {
            pools: DashMap::new(),
            order: RwLock::new(Vec::new()),
            version: AtomicU64::new(0),
            commit_gate: RwLock::new(()),
            stats: RwLock::new(GraphStats::default()),
        }
    }

    /// Register a batch of initial states, e.g. from a pool file
    pub fn initialize_from_updates(&self, updates: impl IntoIterator<Item = PoolUpdate>) -> Vec<GraphError> {
        let mut errors = Vec::new();
        for update in updates {
            if let Err(err) = self.apply_update(update) {
                errors.push(err);
            }
        }
        info!(
            "✅ PoolGraph initialized: {} pools, {} rejected",
            self.len(),
            errors.len()
        );
        errors
    }

    /// Atomically replace one pool's state
    pub fn apply_update(&self, update: PoolUpdate) -> Result<UpdateOutcome, GraphError> {
        let pool = match update.to_pool() {
            Ok(pool) => pool,
            Err(source) => {
                self.stats.write().rejected_updates += 1;
                warn!(pool = %update.pool_id, error = %source, "Rejected invalid pool state");
                return Err(GraphError::InvalidState {
                    pool_id: update.pool_id,
                    source,
                });
            }
        };

        let _gate = self.commit_gate.read();
        let outcome = match self.pools.entry(update.pool_id.clone()) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                if let Err(err) = Self::check_identity(&entry.pool, &pool) {
                    self.stats.write().rejected_updates += 1;
                    warn!(pool = %update.pool_id, error = %err, "Rejected pool update");
                    return Err(err);
                }
                if let Err(err) = entry.tracker.check(&update.pool_id, update.timestamp) {
                    self.stats.write().stale_updates += 1;
                    warn!(pool = %update.pool_id, error = %err, "Discarded stale pool update");
                    return Err(err);
                }
                entry.pool = Arc::new(pool);
                entry.tracker.advance(update.timestamp);
                UpdateOutcome::Replaced
            }
            Entry::Vacant(vacant) => {
                let protocol = pool.protocol();
                vacant.insert(PoolEntry {
                    pool: Arc::new(pool),
                    tracker: TimestampTracker::starting_at(update.timestamp),
                });
                self.order.write().push(update.pool_id.clone());
                self.stats.write().count_pool(protocol);
                debug!(pool = %update.pool_id, %protocol, "Registered pool");
                UpdateOutcome::Registered
            }
        };

        self.version.fetch_add(1, Ordering::AcqRel);
        self.stats.write().applied_updates += 1;
        Ok(outcome)
    }

    fn check_identity(current: &Pool, next: &Pool) -> Result<(), GraphError> {
        if current.assets != next.assets {
            return Err(GraphError::InvalidUpdate {
                pool_id: current.id.clone(),
                reason: format!(
                    "assets changed from {}/{} to {}/{}",
                    current.assets[0].id, current.assets[1].id, next.assets[0].id, next.assets[1].id
                ),
            });
        }
        if current.protocol() != next.protocol() {
            return Err(GraphError::InvalidUpdate {
                pool_id: current.id.clone(),
                reason: format!(
                    "protocol changed from {} to {}",
                    current.protocol(),
                    next.protocol()
                ),
            });
        }
        Ok(())
    }

    /// Consistent read-only view of every committed pool
    pub fn snapshot(&self) -> Arc<GraphSnapshot> {
        let _gate = self.commit_gate.write();
        let version = self.version.load(Ordering::Acquire);
        let pools = self
            .order
            .read()
            .iter()
            .filter_map(|id| self.pools.get(id).map(|entry| Arc::clone(&entry.pool)))
            .collect();
        Arc::new(GraphSnapshot::from_pools(version, pools))
    }

    /// False once an update has been committed after `snapshot` was taken
    pub fn is_current(&self, snapshot: &GraphSnapshot) -> bool {
        self.version.load(Ordering::Acquire) == snapshot.version()
    }

    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    pub fn get_pool(&self, pool_id: &PoolId) -> Option<Arc<Pool>> {
        self.pools.get(pool_id).map(|entry| Arc::clone(&entry.pool))
    }

    pub fn last_timestamp(&self, pool_id: &PoolId) -> Option<u64> {
        self.pools
            .get(pool_id)
            .and_then(|entry| entry.tracker.last_applied())
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    pub fn stats(&self) -> GraphStats {
        self.stats.read().clone()
    }
}

impl UpdateTarget for PoolGraph {
    fn apply_update(&self, update: PoolUpdate) -> Result<UpdateOutcome, GraphError> {
        PoolGraph::apply_update(self, update)
    }
}
