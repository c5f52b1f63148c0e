//! Property tests for update ordering and snapshot consistency

use amm::{CurveState, V2PoolState};
use pool_graph::{GraphError, PoolGraph, PoolUpdate, UpdateQueue};
use proptest::prelude::*;
use std::collections::HashMap;
use types::{Asset, AssetId, FeeRate, PoolId};

fn update(pool: u8, reserve: u128, timestamp: u64) -> PoolUpdate {
    PoolUpdate::new(
        PoolId::new(format!("pool-{}", pool)),
        [
            Asset::new(AssetId::new("ETH"), 18).unwrap(),
            Asset::new(AssetId::new(format!("TOKEN{}", pool)), 18).unwrap(),
        ],
        FeeRate::from_bps(30).unwrap(),
        CurveState::ConstantProduct(V2PoolState::new(reserve, reserve + 1).unwrap()),
        timestamp,
    )
}

proptest! {
    #[test]
    fn prop_last_timestamp_is_running_max(
        events in prop::collection::vec((0u8..4, 1u128..1_000_000, 0u64..100), 1..60)
    ) {
        let graph = PoolGraph::new();
        let mut expected: HashMap<u8, u64> = HashMap::new();

        for (pool, reserve, timestamp) in events {
            let result = graph.apply_update(update(pool, reserve, timestamp));
            match expected.get(&pool) {
                Some(&last) if timestamp < last => {
                    let is_stale = matches!(result, Err(GraphError::StaleUpdate { .. }));
                    prop_assert!(is_stale);
                }
                _ => {
                    prop_assert!(result.is_ok());
                    expected.insert(pool, timestamp);
                }
            }
        }

        for (pool, last) in expected {
            let id = PoolId::new(format!("pool-{}", pool));
            prop_assert_eq!(graph.last_timestamp(&id), Some(last));
        }
        graph.snapshot().validate().unwrap();
    }

    #[test]
    fn prop_drain_counts_every_update(
        events in prop::collection::vec((0u8..3, 1u128..1_000, 0u64..20), 0..40)
    ) {
        let graph = PoolGraph::new();
        let queue = UpdateQueue::new(64);
        let total = events.len();
        for (pool, reserve, timestamp) in events {
            queue.submit(update(pool, reserve, timestamp)).unwrap();
        }
        let report = queue.drain_into(&graph);
        prop_assert_eq!(report.applied + report.stale + report.rejected, total);
        prop_assert_eq!(report.rejected, 0);
        prop_assert_eq!(graph.version(), report.applied as u64);
    }
}
