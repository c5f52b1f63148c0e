//! Detected opportunities as handed to the execution side
//!
//! An [`Opportunity`] is ephemeral: it is rebuilt every pass and only claims
//! validity against the snapshot version it was computed from. Execution must
//! re-check live state before submitting.

use crate::path::{CyclePath, RouteHop};
use amm::{AmmError, OptimalPosition, SwapQuote};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use types::{AssetId, PoolId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opportunity {
    pub base_asset: AssetId,
    /// Pools with trade direction, in execution order
    pub route: Vec<RouteHop>,
    pub leg_quotes: Vec<SwapQuote>,
    #[serde(with = "types::raw_amount")]
    pub input_amount: u128,
    #[serde(with = "types::raw_amount")]
    pub expected_output: u128,
    /// Fees charged per asset, in that asset's raw units
    pub fees: BTreeMap<AssetId, u128>,
    #[serde(with = "types::raw_amount")]
    pub gas_cost: u128,
    /// `expected_output - input_amount - gas_cost`
    #[serde(with = "types::raw_amount")]
    pub net_profit: u128,
    pub valid_as_of_snapshot: u64,
}

impl Opportunity {
    pub fn new(
        cycle: &CyclePath,
        position: OptimalPosition,
        snapshot_version: u64,
    ) -> amm::Result<Self> {
        let mut fees = BTreeMap::new();
        for quote in &position.leg_quotes {
            let total = fees.entry(quote.fee_asset.clone()).or_insert(0u128);
            *total = total
                .checked_add(quote.fee_amount)
                .ok_or(AmmError::NumericOverflow("fee total"))?;
        }

        Ok(Self {
            base_asset: cycle.base().clone(),
            route: cycle.route(),
            leg_quotes: position.leg_quotes,
            input_amount: position.amount_in,
            expected_output: position.amount_out,
            fees,
            gas_cost: position.gas_cost,
            net_profit: position.net_profit,
            valid_as_of_snapshot: snapshot_version,
        })
    }

    pub fn hops(&self) -> usize {
        self.route.len()
    }

    pub fn pool_ids(&self) -> impl Iterator<Item = &PoolId> {
        self.route.iter().map(|hop| &hop.pool_id)
    }

    pub fn shares_pool_with(&self, other: &Opportunity) -> bool {
        self.pool_ids().any(|id| other.pool_ids().any(|o| o == id))
    }

    /// Output minus input, before gas
    pub fn gross_profit(&self) -> u128 {
        self.expected_output.saturating_sub(self.input_amount)
    }

    /// Same base asset and same directed pools in the same order
    pub fn identity(&self) -> (AssetId, Vec<(PoolId, bool)>) {
        let hops = self
            .route
            .iter()
            .map(|hop| (hop.pool_id.clone(), hop.zero_for_one))
            .collect();
        (self.base_asset.clone(), hops)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amm::{CurveState, Pool, V2PoolState};
    use pool_graph::GraphSnapshot;
    use std::sync::Arc;
    use types::{Asset, FeeRate};

    fn snapshot() -> GraphSnapshot {
        let pool = |id: &str, eth: u128, usdc: u128| {
            Arc::new(
                Pool::new(
                    PoolId::new(id),
                    [
                        Asset::new(AssetId::new("ETH"), 18).unwrap(),
                        Asset::new(AssetId::new("USDC"), 18).unwrap(),
                    ],
                    FeeRate::from_bps(30).unwrap(),
                    CurveState::ConstantProduct(V2PoolState::new(eth, usdc).unwrap()),
                )
                .unwrap(),
            )
        };
        GraphSnapshot::from_pools(3, vec![pool("A", 100_000, 200_000), pool("B", 98_000, 205_000)])
    }

    fn cycle(snapshot: &GraphSnapshot) -> CyclePath {
        let eth = AssetId::new("ETH");
        let usdc = AssetId::new("USDC");
        let out = snapshot.edges_from(&eth).find(|e| e.pool_id().as_str() == "B").unwrap();
        let back = snapshot.edges_from(&usdc).find(|e| e.pool_id().as_str() == "A").unwrap();
        CyclePath::new(eth, vec![out.clone(), back.clone()], 0.03)
    }

    fn quote(pool: &str, fee_asset: &str, fee_amount: u128) -> SwapQuote {
        SwapQuote {
            pool_id: PoolId::new(pool),
            asset_in: AssetId::new("ETH"),
            asset_out: AssetId::new("USDC"),
            amount_in: 1_000,
            amount_out: 1_010,
            fee_asset: AssetId::new(fee_asset),
            fee_amount,
        }
    }

    fn position(leg_quotes: Vec<SwapQuote>) -> OptimalPosition {
        OptimalPosition {
            amount_in: 1_000,
            amount_out: 1_010,
            leg_quotes,
            gas_cost: 0,
            net_profit: 10,
            iterations: 1,
        }
    }

    #[test]
    fn test_fees_summed_per_asset() {
        let snapshot = snapshot();
        let opportunity = Opportunity::new(
            &cycle(&snapshot),
            position(vec![quote("B", "ETH", 3), quote("A", "ETH", 4)]),
            3,
        )
        .unwrap();
        assert_eq!(opportunity.fees.get(&AssetId::new("ETH")), Some(&7));
        assert_eq!(opportunity.valid_as_of_snapshot, 3);
        assert_eq!(opportunity.hops(), 2);
    }

    #[test]
    fn test_fee_total_overflow_is_numeric_overflow() {
        let snapshot = snapshot();
        let result = Opportunity::new(
            &cycle(&snapshot),
            position(vec![quote("B", "ETH", u128::MAX), quote("A", "ETH", 1)]),
            3,
        );
        assert!(matches!(result, Err(AmmError::NumericOverflow(_))));
    }
}
