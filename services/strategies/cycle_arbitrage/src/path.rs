//! Candidate cycles
//!
//! A [`CyclePath`] holds edges cloned out of one graph snapshot, so it stays
//! valid for the whole pass no matter what the live graph does.

use amm::SwapLeg;
use pool_graph::Edge;
use serde::{Deserialize, Serialize};
use std::fmt;
use types::{AssetId, PoolId, Protocol};

/// One directed hop as reported to the execution side
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteHop {
    pub pool_id: PoolId,
    pub asset_in: AssetId,
    pub asset_out: AssetId,
    pub zero_for_one: bool,
}

/// Closed cycle starting and ending at `base`
#[derive(Debug, Clone)]
pub struct CyclePath {
    base: AssetId,
    edges: Vec<Edge>,
    /// Sum of log marginal rates, the best-case return of the cycle
    log_rate: f64,
}

impl CyclePath {
    pub fn new(base: AssetId, edges: Vec<Edge>, log_rate: f64) -> Self {
        Self {
            base,
            edges,
            log_rate,
        }
    }

    pub fn base(&self) -> &AssetId {
        &self.base
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn hops(&self) -> usize {
        self.edges.len()
    }

    pub fn log_rate(&self) -> f64 {
        self.log_rate
    }

    /// Best-case return of an infinitesimal trade, in basis points above 1
    pub fn best_case_spread_bps(&self) -> f64 {
        self.log_rate.exp_m1() * 10_000.0
    }

    pub fn pool_ids(&self) -> impl Iterator<Item = &PoolId> {
        self.edges.iter().map(|e| &e.pool.id)
    }

    pub fn contains_pool(&self, pool_id: &PoolId) -> bool {
        self.pool_ids().any(|id| id == pool_id)
    }

    pub fn protocols(&self) -> impl Iterator<Item = Protocol> + '_ {
        self.edges.iter().map(|e| e.pool.protocol())
    }

    pub fn legs(&self) -> Vec<SwapLeg<'_>> {
        self.edges
            .iter()
            .map(|e| SwapLeg::new(&e.pool, e.zero_for_one))
            .collect()
    }

    pub fn route(&self) -> Vec<RouteHop> {
        self.edges
            .iter()
            .map(|e| RouteHop {
                pool_id: e.pool.id.clone(),
                asset_in: e.source.clone(),
                asset_out: e.dest.clone(),
                zero_for_one: e.zero_for_one,
            })
            .collect()
    }

    /// Structural check: closed at `base`, connected, no asset or pool repeated
    pub fn is_simple_cycle(&self) -> bool {
        let (Some(first), Some(last)) = (self.edges.first(), self.edges.last()) else {
            return false;
        };
        if first.source != self.base || last.dest != self.base {
            return false;
        }
        let connected = self.edges.windows(2).all(|w| w[0].dest == w[1].source);
        let mut assets: Vec<&AssetId> = self.edges.iter().map(|e| &e.source).collect();
        let mut pools: Vec<&PoolId> = self.pool_ids().collect();
        assets.sort();
        assets.dedup();
        pools.sort();
        pools.dedup();
        connected && assets.len() == self.edges.len() && pools.len() == self.edges.len()
    }
}

impl fmt::Display for CyclePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        for edge in &self.edges {
            write!(f, " -[{}]-> {}", edge.pool.id, edge.dest)?;
        }
        Ok(())
    }
}
