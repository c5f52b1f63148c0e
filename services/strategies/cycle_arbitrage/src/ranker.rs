//! # Opportunity Ranker
//!
//! Turns every opportunity found in a pass into an executable list:
//!
//! 1. drop anything whose net profit does not exceed the threshold
//! 2. drop duplicates (same base, same directed pools, same order)
//! 3. sort by net profit descending, then fewer hops, then pool ids
//!    lexically
//! 4. walk the sorted list and accept an opportunity only if none of its
//!    pools is used by an already accepted one
//!
//! Two opportunities sharing a pool cannot both execute against the same
//! reserves, so the accepted list is pool-disjoint.

use crate::opportunity::Opportunity;
use std::cmp::Ordering;
use std::collections::HashSet;
use types::PoolId;

/// Ranked output of one pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankedOpportunities {
    /// Pool-disjoint, best first
    pub accepted: Vec<Opportunity>,
    pub below_threshold: usize,
    pub duplicates: usize,
    /// Skipped because a better opportunity already uses one of their pools
    pub conflicting: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct OpportunityRanker {
    min_profit: u128,
}

impl OpportunityRanker {
    pub fn new(min_profit: u128) -> Self {
        Self { min_profit }
    }

    pub fn min_profit(&self) -> u128 {
        self.min_profit
    }

    pub fn rank(&self, mut candidates: Vec<Opportunity>) -> RankedOpportunities {
        let total = candidates.len();
        candidates.retain(|o| o.net_profit > self.min_profit);
        let below_threshold = total - candidates.len();

        let mut seen = HashSet::with_capacity(candidates.len());
        candidates.retain(|o| seen.insert(o.identity()));
        let duplicates = total - below_threshold - candidates.len();

        candidates.sort_by(compare);

        let mut used: HashSet<PoolId> = HashSet::new();
        let mut accepted = Vec::new();
        let mut conflicting = 0;
        for opportunity in candidates {
            if opportunity.pool_ids().any(|id| used.contains(id)) {
                conflicting += 1;
                continue;
            }
            used.extend(opportunity.pool_ids().cloned());
            accepted.push(opportunity);
        }

        RankedOpportunities {
            accepted,
            below_threshold,
            duplicates,
            conflicting,
        }
    }
}

/// Total order used for ranking; equal only for identical trades
pub fn compare(a: &Opportunity, b: &Opportunity) -> Ordering {
    b.net_profit
        .cmp(&a.net_profit)
        .then_with(|| a.hops().cmp(&b.hops()))
        .then_with(|| a.pool_ids().cmp(b.pool_ids()))
        .then_with(|| a.identity().cmp(&b.identity()))
}
