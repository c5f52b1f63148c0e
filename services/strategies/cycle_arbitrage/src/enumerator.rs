//! # Path Enumerator
//!
//! Depth-first search for simple cycles through a base asset, over one
//! immutable snapshot.
//!
//! ## Pruning
//!
//! Every directed edge carries `ln(marginal_rate)`, the log return of an
//! infinitesimal trade. Price impact only lowers a hop's rate, so the sum of
//! log rates bounds the return of any real trade along a path from above.
//!
//! For each base asset a bounded Bellman-Ford table `best[k][a]` stores the
//! largest log return of any walk from `a` back to the base within `k` hops.
//! Walks may reuse pools, so the table over-estimates every real completion.
//! A partial path is abandoned once `partial + best[remaining][a] <= 0`, and a
//! closed cycle is emitted only when its log rate is positive.
//!
//! ## Laziness
//!
//! [`CycleIter`] keeps an explicit DFS stack and yields one cycle per `next`.
//! Calling [`PathEnumerator::cycles_from`] again restarts the same sequence.

use crate::path::CyclePath;
use amm::CurveConfig;
use pool_graph::{Edge, GraphSnapshot};
use std::collections::{HashMap, VecDeque};
use tracing::trace;
use types::{AssetId, PoolId};

struct Hop<'s> {
    edge: &'s Edge,
    dest: usize,
    log_rate: f64,
}

/// Cycle search over one snapshot; cheap to share across threads
pub struct PathEnumerator<'s> {
    snapshot: &'s GraphSnapshot,
    max_hops: usize,
    asset_index: HashMap<&'s AssetId, usize>,
    adjacency: Vec<Vec<Hop<'s>>>,
}

impl<'s> PathEnumerator<'s> {
    /// Precompute log marginal rates for every edge of `snapshot`.
    /// Edges whose rate cannot be computed are never traversed.
    pub fn new(snapshot: &'s GraphSnapshot, max_hops: usize, curves: &CurveConfig) -> Self {
        let assets = snapshot.assets();
        let asset_index: HashMap<&'s AssetId, usize> =
            assets.iter().enumerate().map(|(i, a)| (a, i)).collect();

        let adjacency = assets
            .iter()
            .map(|asset| {
                snapshot
                    .edges_from(asset)
                    .filter_map(|edge| {
                        let dest = *asset_index.get(&edge.dest)?;
                        let log_rate = edge_log_rate(edge, curves);
                        if log_rate == f64::NEG_INFINITY {
                            trace!(pool = %edge.pool.id, "Edge without usable rate skipped");
                            return None;
                        }
                        Some(Hop {
                            edge,
                            dest,
                            log_rate,
                        })
                    })
                    .collect()
            })
            .collect();

        Self {
            snapshot,
            max_hops,
            asset_index,
            adjacency,
        }
    }

    pub fn snapshot(&self) -> &'s GraphSnapshot {
        self.snapshot
    }

    pub fn max_hops(&self) -> usize {
        self.max_hops
    }

    /// Every profitable-at-the-margin simple cycle through `base`
    pub fn cycles_from(&self, base: &AssetId) -> CycleIter<'_, 's> {
        self.iter(base, None)
    }

    /// Cycles through `base` that trade through `pool_id`
    pub fn cycles_through(&self, base: &AssetId, pool_id: &PoolId) -> CycleIter<'_, 's> {
        match self.snapshot.pool(pool_id) {
            Some(pool) => {
                let endpoints = pool
                    .assets
                    .iter()
                    .filter_map(|a| self.asset_index.get(&a.id).copied())
                    .collect::<Vec<_>>();
                let required = RequiredPool {
                    index: self.snapshot.pool_index(pool_id).unwrap_or(usize::MAX),
                    distance: self.hop_distances(&endpoints),
                };
                self.iter(base, Some(required))
            }
            None => CycleIter::exhausted(self, base),
        }
    }

    fn iter(&self, base: &AssetId, required: Option<RequiredPool>) -> CycleIter<'_, 's> {
        let Some(&base_index) = self.asset_index.get(base) else {
            return CycleIter::exhausted(self, base);
        };
        if self.max_hops < 2 {
            return CycleIter::exhausted(self, base);
        }
        let bounds = self.return_bounds(base_index);
        let asset_count = self.adjacency.len();
        let mut visited = vec![false; asset_count];
        visited[base_index] = true;

        CycleIter {
            enumerator: self,
            base: base.clone(),
            base_index,
            bounds,
            required,
            stack: vec![Frame {
                asset: base_index,
                next: 0,
            }],
            path: Vec::with_capacity(self.max_hops),
            log_sums: Vec::with_capacity(self.max_hops),
            used_pools: vec![false; self.snapshot.pool_count()],
            visited,
        }
    }

    /// `best[k][a]`: largest log return from `a` to `base` within `k` hops
    fn return_bounds(&self, base: usize) -> Vec<Vec<f64>> {
        let n = self.adjacency.len();
        let mut best = Vec::with_capacity(self.max_hops + 1);
        let mut level = vec![f64::NEG_INFINITY; n];
        level[base] = 0.0;
        best.push(level.clone());

        for _ in 1..=self.max_hops {
            let previous = &best[best.len() - 1];
            let mut next = previous.clone();
            for (asset, hops) in self.adjacency.iter().enumerate() {
                for hop in hops {
                    let candidate = hop.log_rate + previous[hop.dest];
                    if candidate > next[asset] {
                        next[asset] = candidate;
                    }
                }
            }
            best.push(next);
        }
        best
    }

    /// Undirected hop distance from every asset to the nearest of `targets`
    fn hop_distances(&self, targets: &[usize]) -> Vec<usize> {
        let mut distance = vec![usize::MAX; self.adjacency.len()];
        let mut queue = VecDeque::new();
        for &t in targets {
            distance[t] = 0;
            queue.push_back(t);
        }
        // Every pool yields edges in both directions, so forward BFS suffices
        while let Some(asset) = queue.pop_front() {
            for hop in &self.adjacency[asset] {
                if distance[hop.dest] == usize::MAX {
                    distance[hop.dest] = distance[asset] + 1;
                    queue.push_back(hop.dest);
                }
            }
        }
        distance
    }
}

fn edge_log_rate(edge: &Edge, curves: &CurveConfig) -> f64 {
    use rust_decimal::prelude::ToPrimitive;
    match edge.pool.marginal_rate(edge.zero_for_one, curves) {
        Ok(rate) => match rate.to_f64() {
            Some(r) if r > 0.0 => r.ln(),
            _ => f64::NEG_INFINITY,
        },
        Err(_) => f64::NEG_INFINITY,
    }
}

struct RequiredPool {
    index: usize,
    distance: Vec<usize>,
}

struct Frame {
    asset: usize,
    next: usize,
}

/// Lazy DFS over simple cycles through one base asset
pub struct CycleIter<'e, 's> {
    enumerator: &'e PathEnumerator<'s>,
    base: AssetId,
    base_index: usize,
    bounds: Vec<Vec<f64>>,
    required: Option<RequiredPool>,
    stack: Vec<Frame>,
    path: Vec<&'e Hop<'s>>,
    log_sums: Vec<f64>,
    used_pools: Vec<bool>,
    visited: Vec<bool>,
}

impl<'e, 's> CycleIter<'e, 's> {
    fn exhausted(enumerator: &'e PathEnumerator<'s>, base: &AssetId) -> Self {
        Self {
            enumerator,
            base: base.clone(),
            base_index: usize::MAX,
            bounds: Vec::new(),
            required: None,
            stack: Vec::new(),
            path: Vec::new(),
            log_sums: Vec::new(),
            used_pools: Vec::new(),
            visited: Vec::new(),
        }
    }

    pub fn base(&self) -> &AssetId {
        &self.base
    }

    fn current_log(&self) -> f64 {
        self.log_sums.last().copied().unwrap_or(0.0)
    }

    fn backtrack(&mut self) {
        self.stack.pop();
        if let Some(hop) = self.path.pop() {
            self.used_pools[hop.edge.pool_index] = false;
            self.visited[hop.dest] = false;
            self.log_sums.pop();
        }
    }

    fn required_satisfied(&self, hop: &Hop<'_>) -> bool {
        match &self.required {
            None => true,
            Some(req) => hop.edge.pool_index == req.index || self.used_pools[req.index],
        }
    }

    fn can_reach_required(&self, hop: &Hop<'_>, remaining: usize) -> bool {
        match &self.required {
            None => true,
            Some(req) if hop.edge.pool_index == req.index || self.used_pools[req.index] => true,
            // Reach an endpoint, then cross the pool
            Some(req) => req.distance[hop.dest].saturating_add(1) <= remaining,
        }
    }

    fn emit(&self, closing: &'e Hop<'s>, log_rate: f64) -> CyclePath {
        let edges = self
            .path
            .iter()
            .chain(std::iter::once(&closing))
            .map(|hop| hop.edge.clone())
            .collect();
        CyclePath::new(self.base.clone(), edges, log_rate)
    }
}

impl<'e, 's> Iterator for CycleIter<'e, 's> {
    type Item = CyclePath;

    fn next(&mut self) -> Option<CyclePath> {
        let enumerator = self.enumerator;
        let max_hops = enumerator.max_hops;

        loop {
            let frame = self.stack.last_mut()?;
            let hops = &enumerator.adjacency[frame.asset];
            if frame.next >= hops.len() {
                self.backtrack();
                continue;
            }
            let hop = &hops[frame.next];
            frame.next += 1;

            if self.used_pools[hop.edge.pool_index] {
                continue;
            }
            let depth = self.path.len() + 1;
            let partial = self.current_log() + hop.log_rate;

            if hop.dest == self.base_index {
                if depth >= 2 && partial > 0.0 && self.required_satisfied(hop) {
                    return Some(self.emit(hop, partial));
                }
                continue;
            }
            if self.visited[hop.dest] || depth >= max_hops {
                continue;
            }
            let remaining = max_hops - depth;
            if partial + self.bounds[remaining][hop.dest] <= 0.0 {
                continue;
            }
            if !self.can_reach_required(hop, remaining) {
                continue;
            }

            self.used_pools[hop.edge.pool_index] = true;
            self.visited[hop.dest] = true;
            self.log_sums.push(partial);
            self.path.push(hop);
            self.stack.push(Frame {
                asset: hop.dest,
                next: 0,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amm::{CurveState, Pool, V2PoolState};
    use std::sync::Arc;
    use types::{Asset, FeeRate};

    fn pool(id: &str, a: &str, b: &str, ra: u128, rb: u128) -> Arc<Pool> {
        Arc::new(
            Pool::new(
                PoolId::new(id),
                [
                    Asset::new(AssetId::new(a), 18).unwrap(),
                    Asset::new(AssetId::new(b), 18).unwrap(),
                ],
                FeeRate::from_bps(30).unwrap(),
                CurveState::ConstantProduct(V2PoolState::new(ra, rb).unwrap()),
            )
            .unwrap(),
        )
    }

    fn scenario() -> GraphSnapshot {
        GraphSnapshot::from_pools(
            1,
            vec![
                pool("A", "ETH", "USDC", 100_000, 200_000),
                pool("B", "ETH", "USDC", 98_000, 205_000),
            ],
        )
    }

    #[test]
    fn test_two_pool_cycle_found_in_profitable_direction() {
        let snapshot = scenario();
        let enumerator = PathEnumerator::new(&snapshot, 2, &CurveConfig::default());
        let cycles: Vec<_> = enumerator.cycles_from(&AssetId::new("ETH")).collect();

        assert_eq!(cycles.len(), 1);
        let cycle = &cycles[0];
        assert!(cycle.is_simple_cycle());
        let pools: Vec<_> = cycle.pool_ids().map(|p| p.as_str()).collect();
        assert_eq!(pools, vec!["B", "A"]);
        assert!(cycle.log_rate() > 0.0);
    }

    #[test]
    fn test_restart_yields_same_sequence() {
        let snapshot = scenario();
        let enumerator = PathEnumerator::new(&snapshot, 3, &CurveConfig::default());
        let eth = AssetId::new("ETH");
        let first: Vec<String> = enumerator.cycles_from(&eth).map(|c| c.to_string()).collect();
        let second: Vec<String> = enumerator.cycles_from(&eth).map(|c| c.to_string()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_balanced_pools_yield_nothing() {
        let snapshot = GraphSnapshot::from_pools(
            1,
            vec![
                pool("A", "ETH", "USDC", 100_000, 200_000),
                pool("B", "ETH", "USDC", 100_000, 200_000),
            ],
        );
        let enumerator = PathEnumerator::new(&snapshot, 4, &CurveConfig::default());
        assert_eq!(enumerator.cycles_from(&AssetId::new("ETH")).count(), 0);
    }

    #[test]
    fn test_triangle_and_incremental_filter() {
        // ETH -> USDC -> DAI -> ETH is mispriced; X/Y pools are unrelated
        let snapshot = GraphSnapshot::from_pools(
            1,
            vec![
                pool("eth-usdc", "ETH", "USDC", 1_000_000, 2_000_000),
                pool("usdc-dai", "USDC", "DAI", 2_000_000, 2_100_000),
                pool("dai-eth", "DAI", "ETH", 2_000_000, 1_000_000),
                pool("x-y", "X", "Y", 1_000, 1_000),
            ],
        );
        let enumerator = PathEnumerator::new(&snapshot, 3, &CurveConfig::default());
        let eth = AssetId::new("ETH");

        let all: Vec<_> = enumerator.cycles_from(&eth).collect();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].hops(), 3);
        assert_eq!(all[0].pool_ids().next().unwrap().as_str(), "eth-usdc");

        let through: Vec<_> = enumerator
            .cycles_through(&eth, &PoolId::new("usdc-dai"))
            .collect();
        assert_eq!(through.len(), 1);
        assert_eq!(
            enumerator.cycles_through(&eth, &PoolId::new("x-y")).count(),
            0
        );
        assert_eq!(
            enumerator.cycles_through(&eth, &PoolId::new("missing")).count(),
            0
        );
    }

    #[test]
    fn test_hop_limit_respected() {
        let snapshot = GraphSnapshot::from_pools(
            1,
            vec![
                pool("eth-usdc", "ETH", "USDC", 1_000_000, 2_000_000),
                pool("usdc-dai", "USDC", "DAI", 2_000_000, 2_100_000),
                pool("dai-eth", "DAI", "ETH", 2_000_000, 1_000_000),
            ],
        );
        let enumerator = PathEnumerator::new(&snapshot, 2, &CurveConfig::default());
        assert_eq!(enumerator.cycles_from(&AssetId::new("ETH")).count(), 0);
        assert_eq!(enumerator.cycles_from(&AssetId::new("BTC")).count(), 0);
    }
}
