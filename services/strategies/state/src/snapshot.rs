//! Immutable graph snapshots
//!
//! A [`GraphSnapshot`] is built once from a consistent cut of committed pool
//! states and never changes afterwards. Every read in a detection pass goes
//! through one snapshot, so a pass cannot observe a half-applied update.

use crate::error::GraphError;
use amm::Pool;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use types::{AssetId, PoolId};

/// Directed trade leg through one pool
#[derive(Debug, Clone)]
pub struct Edge {
    pub source: AssetId,
    pub dest: AssetId,
    pub pool: Arc<Pool>,
    /// Position of the pool in insertion order
    pub pool_index: usize,
    pub zero_for_one: bool,
}

impl Edge {
    pub fn pool_id(&self) -> &PoolId {
        &self.pool.id
    }
}

/// Read-only view of every pool at one graph version
#[derive(Debug)]
pub struct GraphSnapshot {
    version: u64,
    pools: Vec<Arc<Pool>>,
    pool_index: HashMap<PoolId, usize>,
    /// Assets in first-seen order
    assets: Vec<AssetId>,
    adjacency: HashMap<AssetId, Vec<Edge>>,
}

impl GraphSnapshot {
    /// Build a snapshot from pools in insertion order
    pub fn from_pools(version: u64, pools: Vec<Arc<Pool>>) -> Self {
        let mut pool_index = HashMap::with_capacity(pools.len());
        let mut assets = Vec::new();
        let mut adjacency: HashMap<AssetId, Vec<Edge>> = HashMap::new();

        for (index, pool) in pools.iter().enumerate() {
            pool_index.insert(pool.id.clone(), index);
            for zero_for_one in [true, false] {
                let source = pool.asset_in(zero_for_one).id.clone();
                let dest = pool.asset_out(zero_for_one).id.clone();
                if !adjacency.contains_key(&source) {
                    assets.push(source.clone());
                }
                adjacency.entry(source.clone()).or_default().push(Edge {
                    source,
                    dest,
                    pool: Arc::clone(pool),
                    pool_index: index,
                    zero_for_one,
                });
            }
        }

        Self {
            version,
            pools,
            pool_index,
            assets,
            adjacency,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Pools in insertion order
    pub fn pools(&self) -> &[Arc<Pool>] {
        &self.pools
    }

    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    pub fn pool(&self, pool_id: &PoolId) -> Option<&Arc<Pool>> {
        self.pool_index.get(pool_id).map(|&index| &self.pools[index])
    }

    pub fn pool_index(&self, pool_id: &PoolId) -> Option<usize> {
        self.pool_index.get(pool_id).copied()
    }

    pub fn assets(&self) -> &[AssetId] {
        &self.assets
    }

    pub fn contains_asset(&self, asset: &AssetId) -> bool {
        self.adjacency.contains_key(asset)
    }

    /// Outgoing edges of `asset`, in pool insertion order
    pub fn edges_from(&self, asset: &AssetId) -> std::slice::Iter<'_, Edge> {
        self.outgoing(asset).iter()
    }

    pub fn outgoing(&self, asset: &AssetId) -> &[Edge] {
        self.adjacency.get(asset).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }

    /// Re-check pool and edge invariants
    pub fn validate(&self) -> Result<(), GraphError> {
        let corrupted = |reason: String| GraphError::CorruptedSnapshot {
            version: self.version,
            reason,
        };

        for (index, pool) in self.pools.iter().enumerate() {
            pool.validate()
                .map_err(|e| corrupted(format!("pool {}: {}", pool.id, e)))?;
            if self.pool_index.get(&pool.id) != Some(&index) {
                return Err(corrupted(format!("pool {} indexed twice", pool.id)));
            }
        }

        let mut seen = HashSet::new();
        for (asset, edges) in &self.adjacency {
            for edge in edges {
                if &edge.source != asset {
                    return Err(corrupted(format!(
                        "edge {} -> {} filed under {}",
                        edge.source, edge.dest, asset
                    )));
                }
                if !seen.insert((edge.pool_index, edge.zero_for_one)) {
                    return Err(corrupted(format!(
                        "pool {} has duplicate edges in one direction",
                        edge.pool.id
                    )));
                }
            }
        }
        if seen.len() != 2 * self.pools.len() {
            return Err(corrupted(format!(
                "{} edges for {} pools",
                seen.len(),
                self.pools.len()
            )));
        }
        Ok(())
    }
}
