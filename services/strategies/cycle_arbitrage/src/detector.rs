//! # Cycle Arbitrage Detection Pass
//!
//! ## Purpose
//!
//! One detection pass turns an immutable graph snapshot into a ranked,
//! pool-disjoint list of opportunities. Every configured base asset is
//! searched independently and in parallel; each candidate cycle is sized by
//! the profit optimizer and the survivors go through the ranker.
//!
//! ## Error Classification
//!
//! - `InvalidInput`, `InsufficientLiquidity`, `NoFeasibleSize`: the candidate
//!   is counted as discarded and the pass continues
//! - `ConvergenceError`, `NumericOverflow`: recorded as a [`PathFailure`] for
//!   that cycle only
//! - a snapshot failing its invariant check aborts the pass with
//!   [`DetectorError::Graph`]
//!
//! ## Architecture Role
//!
//! ```text
//! GraphSnapshot ──► PathEnumerator ──par over bases──► CyclePath
//!                                                         │
//!                              GasModel ──► OptimalSizeCalculator
//!                                                         │
//!                                        Opportunity ──► OpportunityRanker ──► PassReport
//! ```
//!
//! ## Incremental Passes
//!
//! [`ArbitrageDetector::run_incremental`] only searches cycles through the
//! pools touched since the previous pass. Cycles that avoid every touched
//! pool have unchanged inputs and were already evaluated; merging them with
//! the new finds is up to the caller (see `ArbitrageService`).

use crate::enumerator::PathEnumerator;
use crate::error::{DetectorError, Result};
use crate::gas::GasModel;
use crate::logging::LogEmoji;
use crate::opportunity::Opportunity;
use crate::path::{CyclePath, RouteHop};
use crate::ranker::OpportunityRanker;
use crate::{log_error, log_metrics, log_profit};
use amm::{AmmError, CurveConfig, OptimalSizeCalculator, SizingConfig};
use pool_graph::GraphSnapshot;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, warn};
use types::{AssetId, PoolId};

/// Plain values a detector is built from
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorSettings {
    /// Empty means every asset in the snapshot
    pub base_assets: Vec<AssetId>,
    pub max_hops: usize,
    pub min_spread_bps: Option<u32>,
    pub curves: CurveConfig,
    /// `min_profit` doubles as the ranking threshold
    pub sizing: SizingConfig,
    pub gas: GasModel,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            base_assets: Vec::new(),
            max_hops: 3,
            min_spread_bps: None,
            curves: CurveConfig::default(),
            sizing: SizingConfig::default(),
            gas: GasModel::default(),
        }
    }
}

impl DetectorSettings {
    pub fn validate(&self) -> Result<()> {
        if self.max_hops < 2 {
            return Err(DetectorError::InvalidSettings {
                reason: format!("max_hops must be at least 2, got {}", self.max_hops),
            });
        }
        self.curves.validate()?;
        self.sizing.validate()?;
        Ok(())
    }
}

/// Values supplied with each pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassParams {
    /// Fixed execution cost per opportunity, in raw base-asset units
    #[serde(with = "types::raw_amount")]
    pub gas_cost_estimate: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Convergence,
    Overflow,
}

/// A cycle whose evaluation failed in a way worth surfacing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathFailure {
    pub base_asset: AssetId,
    pub route: Vec<RouteHop>,
    pub kind: FailureKind,
    pub reason: String,
}

impl PathFailure {
    fn new(cycle: &CyclePath, error: &AmmError) -> Self {
        let kind = match error {
            AmmError::ConvergenceError { .. } => FailureKind::Convergence,
            _ => FailureKind::Overflow,
        };
        Self {
            base_asset: cycle.base().clone(),
            route: cycle.route(),
            kind,
            reason: error.to_string(),
        }
    }
}

/// Outcome of one detection pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassReport {
    pub snapshot_version: u64,
    pub incremental: bool,
    /// Ranked and pool-disjoint
    pub opportunities: Vec<Opportunity>,
    /// Cycles handed to the optimizer or the spread filter
    pub candidates: usize,
    /// Candidates rejected as expected outcomes
    pub discarded: usize,
    pub failures: Vec<PathFailure>,
    pub below_threshold: usize,
    pub conflicting: usize,
    pub elapsed_micros: u64,
}

#[derive(Default)]
struct BaseOutcome {
    candidates: usize,
    discarded: usize,
    opportunities: Vec<Opportunity>,
    failures: Vec<PathFailure>,
}

impl BaseOutcome {
    fn merge(mut self, other: BaseOutcome) -> BaseOutcome {
        self.candidates += other.candidates;
        self.discarded += other.discarded;
        self.opportunities.extend(other.opportunities);
        self.failures.extend(other.failures);
        self
    }
}

/// Stateless detection engine; every pass is a pure function of its inputs
pub struct ArbitrageDetector {
    settings: DetectorSettings,
    sizer: OptimalSizeCalculator,
    ranker: OpportunityRanker,
}

impl ArbitrageDetector {
    pub fn new(settings: DetectorSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            sizer: OptimalSizeCalculator::new(settings.sizing.clone()),
            ranker: OpportunityRanker::new(settings.sizing.min_profit),
            settings,
        })
    }

    pub fn settings(&self) -> &DetectorSettings {
        &self.settings
    }

    pub fn ranker(&self) -> &OpportunityRanker {
        &self.ranker
    }

    /// Search every cycle through every base asset
    pub fn run_pass(&self, snapshot: &GraphSnapshot, params: &PassParams) -> Result<PassReport> {
        self.execute(snapshot, params, None)
    }

    /// Search only cycles through `touched` pools
    pub fn run_incremental(
        &self,
        snapshot: &GraphSnapshot,
        touched: &[PoolId],
        params: &PassParams,
    ) -> Result<PassReport> {
        self.execute(snapshot, params, Some(touched))
    }

    /// Base assets present in `snapshot`, in configured order
    pub fn base_assets(&self, snapshot: &GraphSnapshot) -> Vec<AssetId> {
        if self.settings.base_assets.is_empty() {
            return snapshot.assets().to_vec();
        }
        self.settings
            .base_assets
            .iter()
            .filter(|asset| snapshot.contains_asset(asset))
            .cloned()
            .collect()
    }

    fn execute(
        &self,
        snapshot: &GraphSnapshot,
        params: &PassParams,
        touched: Option<&[PoolId]>,
    ) -> Result<PassReport> {
        let started = Instant::now();
        if let Err(e) = snapshot.validate() {
            log_error!("Pass aborted on snapshot v{}: {}", snapshot.version(), e);
            return Err(e.into());
        }

        let touched: Option<Vec<&PoolId>> = touched.map(|pools| {
            let mut present: Vec<&PoolId> =
                pools.iter().filter(|id| snapshot.pool(id).is_some()).collect();
            present.sort();
            present.dedup();
            present
        });

        let enumerator = PathEnumerator::new(snapshot, self.settings.max_hops, &self.settings.curves);
        let bases = self.base_assets(snapshot);
        let version = snapshot.version();

        let outcome = bases
            .par_iter()
            .map(|base| match &touched {
                None => self.evaluate_all(enumerator.cycles_from(base), version, params),
                Some(pools) => {
                    let mut seen = HashSet::new();
                    let cycles = pools
                        .iter()
                        .flat_map(|pool| enumerator.cycles_through(base, pool))
                        .filter(|cycle| seen.insert(cycle.route()));
                    self.evaluate_all(cycles, version, params)
                }
            })
            .collect::<Vec<_>>()
            .into_iter()
            .fold(BaseOutcome::default(), BaseOutcome::merge);

        let ranked = self.ranker.rank(outcome.opportunities);
        for opportunity in &ranked.accepted {
            log_profit!(
                "Opportunity {} hops from {}: in {} out {} net {}",
                opportunity.hops(),
                opportunity.base_asset,
                opportunity.input_amount,
                opportunity.expected_output,
                opportunity.net_profit
            );
        }

        let report = PassReport {
            snapshot_version: version,
            incremental: touched.is_some(),
            opportunities: ranked.accepted,
            candidates: outcome.candidates,
            discarded: outcome.discarded,
            failures: outcome.failures,
            below_threshold: ranked.below_threshold,
            conflicting: ranked.conflicting,
            elapsed_micros: started.elapsed().as_micros() as u64,
        };
        log_metrics!(
            "Pass v{} over {} bases: {} candidates, {} accepted, {} discarded, {} failed in {}μs",
            version,
            bases.len(),
            report.candidates,
            report.opportunities.len(),
            report.discarded,
            report.failures.len(),
            report.elapsed_micros
        );
        Ok(report)
    }

    fn evaluate_all(
        &self,
        cycles: impl Iterator<Item = CyclePath>,
        version: u64,
        params: &PassParams,
    ) -> BaseOutcome {
        let mut outcome = BaseOutcome::default();
        for cycle in cycles {
            outcome.candidates += 1;
            match self.evaluate(&cycle, version, params) {
                Ok(Some(opportunity)) => outcome.opportunities.push(opportunity),
                Ok(None) => outcome.discarded += 1,
                Err(e) if e.is_expected() => {
                    debug!(cycle = %cycle, reason = %e, "Candidate discarded");
                    outcome.discarded += 1;
                }
                Err(e) => {
                    warn!("{} Path {} failed: {}", LogEmoji::WARNING, cycle, e);
                    outcome.failures.push(PathFailure::new(&cycle, &e));
                }
            }
        }
        outcome
    }

    /// Size one cycle; `Ok(None)` when the spread filter rejects it
    fn evaluate(
        &self,
        cycle: &CyclePath,
        version: u64,
        params: &PassParams,
    ) -> amm::Result<Option<Opportunity>> {
        if let Some(min_bps) = self.settings.min_spread_bps {
            let spread = cycle.best_case_spread_bps();
            if spread < min_bps as f64 {
                debug!(cycle = %cycle, spread_bps = spread, "Below spread filter");
                return Ok(None);
            }
        }

        let gas_cost = self
            .settings
            .gas
            .cost(cycle.base(), params.gas_cost_estimate, cycle.protocols())?;
        debug!(cycle = %cycle, gas_cost = %gas_cost, "{} Sizing candidate", LogEmoji::GAS);

        let position = self
            .sizer
            .calculate(&cycle.legs(), gas_cost, &self.settings.curves)?;
        Opportunity::new(cycle, position, version).map(Some)
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

    fn detector(max_hops: usize) -> ArbitrageDetector {
        ArbitrageDetector::new(DetectorSettings {
            base_assets: vec![AssetId::new("ETH")],
            max_hops,
            ..DetectorSettings::default()
        })
        .unwrap()
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let result = ArbitrageDetector::new(DetectorSettings {
            max_hops: 1,
            ..DetectorSettings::default()
        });
        assert!(matches!(result, Err(DetectorError::InvalidSettings { .. })));
    }

    #[test]
    fn test_scenario_pass_finds_cycle() {
        let snapshot = GraphSnapshot::from_pools(
            4,
            vec![
                pool("A", "ETH", "USDC", 100_000, 200_000),
                pool("B", "ETH", "USDC", 98_000, 205_000),
            ],
        );
        let report = detector(2).run_pass(&snapshot, &PassParams::default()).unwrap();

        assert_eq!(report.snapshot_version, 4);
        assert!(!report.incremental);
        assert_eq!(report.candidates, 1);
        assert_eq!(report.opportunities.len(), 1);
        let opportunity = &report.opportunities[0];
        assert_eq!(opportunity.valid_as_of_snapshot, 4);
        assert!(opportunity.net_profit > 0);
        assert_eq!(
            opportunity.net_profit,
            opportunity.expected_output - opportunity.input_amount
        );
    }

    #[test]
    fn test_spread_filter_discards() {
        let snapshot = GraphSnapshot::from_pools(
            1,
            vec![
                pool("A", "ETH", "USDC", 100_000, 200_000),
                pool("B", "ETH", "USDC", 98_000, 205_000),
            ],
        );
        let detector = ArbitrageDetector::new(DetectorSettings {
            base_assets: vec![AssetId::new("ETH")],
            max_hops: 2,
            // best case is roughly 397 bps
            min_spread_bps: Some(1_000),
            ..DetectorSettings::default()
        })
        .unwrap();
        let report = detector.run_pass(&snapshot, &PassParams::default()).unwrap();
        assert_eq!(report.candidates, 1);
        assert_eq!(report.discarded, 1);
        assert!(report.opportunities.is_empty());
    }

    #[test]
    fn test_incremental_only_touches_given_pools() {
        let snapshot = GraphSnapshot::from_pools(
            1,
            vec![
                pool("A", "ETH", "USDC", 100_000, 200_000),
                pool("B", "ETH", "USDC", 98_000, 205_000),
                pool("C", "ETH", "DAI", 100_000, 200_000),
                pool("D", "ETH", "DAI", 100_000, 200_000),
            ],
        );
        let detector = detector(2);

        let untouched = detector
            .run_incremental(&snapshot, &[PoolId::new("C")], &PassParams::default())
            .unwrap();
        assert!(untouched.incremental);
        assert_eq!(untouched.candidates, 0);

        let touched = detector
            .run_incremental(
                &snapshot,
                &[PoolId::new("A"), PoolId::new("B"), PoolId::new("missing")],
                &PassParams::default(),
            )
            .unwrap();
        assert_eq!(touched.candidates, 1);
        assert_eq!(touched.opportunities.len(), 1);
    }

    #[test]
    fn test_unknown_base_asset_yields_empty_pass() {
        let snapshot = GraphSnapshot::from_pools(1, vec![pool("A", "ETH", "USDC", 10, 20)]);
        let detector = ArbitrageDetector::new(DetectorSettings {
            base_assets: vec![AssetId::new("BTC")],
            ..DetectorSettings::default()
        })
        .unwrap();
        assert!(detector.base_assets(&snapshot).is_empty());
        let report = detector.run_pass(&snapshot, &PassParams::default()).unwrap();
        assert_eq!(report.candidates, 0);
    }

    #[test]
    fn test_corrupted_snapshot_aborts_pass() {
        let snapshot = GraphSnapshot::from_pools(
            9,
            vec![pool("A", "ETH", "USDC", 10, 20), pool("A", "ETH", "DAI", 10, 20)],
        );
        let result = detector(2).run_pass(&snapshot, &PassParams::default());
        assert!(matches!(result, Err(DetectorError::Graph(_))));
    }
}
