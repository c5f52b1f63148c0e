use amm::{CurveConfig, CurveState, Pool, V2PoolState};
use cycle_arbitrage::{
    ArbitrageDetector, DetectorSettings, Opportunity, OpportunityRanker, PassParams,
    PathEnumerator, RouteHop,
};
use pool_graph::GraphSnapshot;
use proptest::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use types::{Asset, AssetId, FeeRate, PoolId};

const ASSETS: [&str; 4] = ["ETH", "USDC", "DAI", "WBTC"];

fn pool_strategy() -> impl Strategy<Value = (usize, usize, u128, u128)> {
    (0..ASSETS.len(), 0..ASSETS.len(), 10_000u128..1_000_000, 10_000u128..1_000_000)
        .prop_filter("distinct assets", |(a, b, _, _)| a != b)
}

fn build_snapshot(specs: &[(usize, usize, u128, u128)]) -> GraphSnapshot {
    let pools = specs
        .iter()
        .enumerate()
        .map(|(i, &(a, b, ra, rb))| {
            Arc::new(
                Pool::new(
                    PoolId::new(format!("p{:02}", i)),
                    [
                        Asset::new(AssetId::new(ASSETS[a]), 18).unwrap(),
                        Asset::new(AssetId::new(ASSETS[b]), 18).unwrap(),
                    ],
                    FeeRate::from_bps(30).unwrap(),
                    CurveState::ConstantProduct(V2PoolState::new(ra, rb).unwrap()),
                )
                .unwrap(),
            )
        })
        .collect();
    GraphSnapshot::from_pools(1, pools)
}

fn opportunity(pools: &[usize], net_profit: u128) -> Opportunity {
    Opportunity {
        base_asset: AssetId::new("ETH"),
        route: pools
            .iter()
            .map(|p| RouteHop {
                pool_id: PoolId::new(format!("p{}", p)),
                asset_in: AssetId::new("ETH"),
                asset_out: AssetId::new("USDC"),
                zero_for_one: true,
            })
            .collect(),
        leg_quotes: Vec::new(),
        input_amount: 100,
        expected_output: 100 + net_profit,
        fees: BTreeMap::new(),
        gas_cost: 0,
        net_profit,
        valid_as_of_snapshot: 1,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn enumerated_cycles_are_simple_and_bounded(
        specs in prop::collection::vec(pool_strategy(), 2..9),
        max_hops in 2usize..5,
    ) {
        let snapshot = build_snapshot(&specs);
        let enumerator = PathEnumerator::new(&snapshot, max_hops, &CurveConfig::default());
        for base in snapshot.assets() {
            let first: Vec<String> = enumerator.cycles_from(base).map(|c| c.to_string()).collect();
            for cycle in enumerator.cycles_from(base) {
                prop_assert!(cycle.is_simple_cycle(), "not simple: {}", cycle);
                prop_assert!(cycle.hops() >= 2 && cycle.hops() <= max_hops);
                prop_assert!(cycle.log_rate() > 0.0);
                prop_assert_eq!(cycle.base(), base);
            }
            // Restarting yields the same sequence
            let second: Vec<String> = enumerator.cycles_from(base).map(|c| c.to_string()).collect();
            prop_assert_eq!(first, second);
        }
    }

    #[test]
    fn cycles_through_is_subset_containing_pool(
        specs in prop::collection::vec(pool_strategy(), 2..9),
        pick in 0usize..8,
    ) {
        let snapshot = build_snapshot(&specs);
        let enumerator = PathEnumerator::new(&snapshot, 3, &CurveConfig::default());
        let pool_id = PoolId::new(format!("p{:02}", pick % specs.len()));
        for base in snapshot.assets() {
            let all: HashSet<String> = enumerator.cycles_from(base).map(|c| c.to_string()).collect();
            let expected: HashSet<String> = enumerator
                .cycles_from(base)
                .filter(|c| c.contains_pool(&pool_id))
                .map(|c| c.to_string())
                .collect();
            let through: HashSet<String> = enumerator
                .cycles_through(base, &pool_id)
                .map(|c| c.to_string())
                .collect();
            prop_assert!(through.is_subset(&all));
            prop_assert_eq!(through, expected);
        }
    }

    #[test]
    fn detected_opportunities_clear_threshold(
        specs in prop::collection::vec(pool_strategy(), 2..7),
        min_profit in 0u128..50,
    ) {
        let snapshot = build_snapshot(&specs);
        let mut settings = DetectorSettings { max_hops: 3, ..DetectorSettings::default() };
        settings.sizing.min_profit = min_profit;
        let detector = ArbitrageDetector::new(settings).unwrap();
        let report = detector.run_pass(&snapshot, &PassParams::default()).unwrap();

        let mut used = HashSet::new();
        for opportunity in &report.opportunities {
            prop_assert!(opportunity.net_profit > min_profit);
            prop_assert_eq!(
                opportunity.net_profit,
                opportunity.expected_output - opportunity.input_amount - opportunity.gas_cost
            );
            for pool in opportunity.pool_ids() {
                prop_assert!(used.insert(pool.clone()), "pool {} reused", pool);
            }
        }
    }

    #[test]
    fn ranker_output_is_pool_disjoint_and_sorted(
        raw in prop::collection::vec(
            (prop::collection::vec(0usize..10, 2..5), 0u128..1_000),
            0..30,
        ),
        min_profit in 0u128..100,
    ) {
        let candidates: Vec<Opportunity> = raw
            .iter()
            .map(|(pools, profit)| {
                let mut pools = pools.clone();
                pools.sort_unstable();
                pools.dedup();
                opportunity(&pools, *profit)
            })
            .collect();
        let ranked = OpportunityRanker::new(min_profit).rank(candidates.clone());

        let mut used = HashSet::new();
        for opportunity in &ranked.accepted {
            prop_assert!(opportunity.net_profit > min_profit);
            for pool in opportunity.pool_ids() {
                prop_assert!(used.insert(pool.clone()));
            }
        }
        for pair in ranked.accepted.windows(2) {
            prop_assert!(pair[0].net_profit >= pair[1].net_profit);
        }
        // Maximal: every rejected eligible candidate conflicts with an accepted one
        for candidate in candidates.iter().filter(|c| c.net_profit > min_profit) {
            let accepted = ranked.accepted.iter().any(|a| a.identity() == candidate.identity());
            let conflicts = ranked.accepted.iter().any(|a| a.shares_pool_with(candidate));
            prop_assert!(accepted || conflicts);
        }
    }
}
