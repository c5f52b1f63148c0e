//! Inbound pool-state updates

use amm::{CurveState, Pool};
use serde::{Deserialize, Serialize};
use types::{Asset, FeeRate, PoolId, Protocol};

/// Full replacement state for one pool, as delivered by ingestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolUpdate {
    pub pool_id: PoolId,
    pub assets: [Asset; 2],
    pub fee: FeeRate,
    pub curve: CurveState,
    /// Source ordering key (block number or nanoseconds)
    pub timestamp: u64,
}

impl PoolUpdate {
    pub fn new(pool_id: PoolId, assets: [Asset; 2], fee: FeeRate, curve: CurveState, timestamp: u64) -> Self {
        Self {
            pool_id,
            assets,
            fee,
            curve,
            timestamp,
        }
    }

    /// Update carrying the current state of `pool`
    pub fn from_pool(pool: &Pool, timestamp: u64) -> Self {
        Self {
            pool_id: pool.id.clone(),
            assets: pool.assets.clone(),
            fee: pool.fee,
            curve: pool.curve.clone(),
            timestamp,
        }
    }

    pub fn protocol(&self) -> Protocol {
        self.curve.protocol()
    }

    /// Build and validate the pool this update describes
    pub fn to_pool(&self) -> amm::Result<Pool> {
        Pool::new(
            self.pool_id.clone(),
            self.assets.clone(),
            self.fee,
            self.curve.clone(),
        )
    }
}

/// Result of a committed update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// First state seen for this pool
    Registered,
    /// Existing pool state replaced
    Replaced,
}
