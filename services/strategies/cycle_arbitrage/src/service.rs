//! # Detection Service Loop
//!
//! Owns the pool graph, the inbound update queue, the detector and the
//! outbound sink. Each [`ArbitrageService::tick`]:
//!
//! 1. drains queued updates into the graph
//! 2. takes one snapshot
//! 3. runs a full pass the first time (or after parameters change), and an
//!    incremental pass over the touched pools afterwards
//! 4. rebuilds the book of live opportunities and publishes it when it changed
//!
//! The book is pool-disjoint as a whole. A full pass replaces it. An
//! incremental pass keeps the entries that avoid every touched pool and ranks
//! them together with the new finds, so an earlier opportunity and a new one
//! never claim the same pool.
//!
//! Updates arriving during a pass wait in the queue for the next tick.
//! After the first tick every update must go through the queue; writes made
//! directly on the graph are only picked up by the next full pass.

use crate::detector::{ArbitrageDetector, PassParams, PassReport};
use crate::error::Result;
use crate::metrics::DetectorMetrics;
use crate::opportunity::Opportunity;
use crate::sink::OpportunitySink;
use crate::{log_error, log_pool, log_search};
use pool_graph::{PoolGraph, UpdateProducer, UpdateQueue};
use std::collections::HashSet;
use std::sync::Arc;
use types::PoolId;
use tracing::debug;

pub struct ArbitrageService<S: OpportunitySink> {
    graph: Arc<PoolGraph>,
    queue: UpdateQueue,
    detector: ArbitrageDetector,
    sink: S,
    params: PassParams,
    metrics: Arc<DetectorMetrics>,
    /// Snapshot version of the last completed pass
    last_pass: Option<u64>,
    /// Live pool-disjoint opportunities, best first
    book: Vec<Opportunity>,
}

impl<S: OpportunitySink> ArbitrageService<S> {
    pub fn new(
        graph: Arc<PoolGraph>,
        detector: ArbitrageDetector,
        sink: S,
        params: PassParams,
        queue_capacity: usize,
    ) -> Self {
        Self {
            graph,
            queue: UpdateQueue::new(queue_capacity),
            detector,
            sink,
            params,
            metrics: Arc::new(DetectorMetrics::new()),
            last_pass: None,
            book: Vec::new(),
        }
    }

    /// Handle for ingestion tasks
    pub fn producer(&self) -> UpdateProducer {
        self.queue.producer()
    }

    pub fn graph(&self) -> &Arc<PoolGraph> {
        &self.graph
    }

    pub fn metrics(&self) -> Arc<DetectorMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Opportunities currently standing, as last published
    pub fn book(&self) -> &[Opportunity] {
        &self.book
    }

    pub fn pending_updates(&self) -> usize {
        self.queue.len()
    }

    /// New per-pass values; the next tick rescans everything
    pub fn set_params(&mut self, params: PassParams) {
        if params != self.params {
            self.params = params;
            self.last_pass = None;
        }
    }

    /// Force the next tick to run a full pass
    pub fn request_full_pass(&mut self) {
        self.last_pass = None;
    }

    /// Drain, snapshot, detect, publish. `Ok(None)` when nothing changed
    /// since the last pass.
    pub fn tick(&mut self) -> Result<Option<PassReport>> {
        let drain = self.queue.drain_into(self.graph.as_ref());
        self.metrics.record_drain(&drain);
        if drain.stale > 0 || drain.rejected > 0 {
            log_pool!(
                "{} stale and {} invalid updates discarded",
                drain.stale,
                drain.rejected
            );
        }

        let snapshot = self.graph.snapshot();
        let report = match self.last_pass {
            Some(version) if version == snapshot.version() => {
                debug!(version, "No pool changes since last pass");
                return Ok(None);
            }
            Some(_) => {
                log_search!("Incremental pass over {} touched pools", drain.touched.len());
                self.detector
                    .run_incremental(&snapshot, &drain.touched, &self.params)
            }
            None => {
                log_search!("Full pass over {} pools", snapshot.pool_count());
                self.detector.run_pass(&snapshot, &self.params)
            }
        };

        let report = match report {
            Ok(report) => report,
            Err(e) => {
                self.metrics.record_aborted_pass();
                self.last_pass = None;
                return Err(e);
            }
        };
        self.metrics.record_pass(&report);
        self.last_pass = Some(report.snapshot_version);

        let book = if report.incremental {
            self.merge_into_book(&drain.touched, &report.opportunities)
        } else {
            report.opportunities.clone()
        };
        if book == self.book {
            return Ok(Some(report));
        }
        self.book = book;

        if !self.book.is_empty() {
            if let Err(e) = self.sink.publish(report.snapshot_version, &self.book) {
                log_error!("Failed to publish {} opportunities: {}", self.book.len(), e);
                return Err(e.into());
            }
        }
        Ok(Some(report))
    }

    /// Untouched book entries ranked together with `found`
    fn merge_into_book(&self, touched: &[PoolId], found: &[Opportunity]) -> Vec<Opportunity> {
        let touched: HashSet<&PoolId> = touched.iter().collect();
        let mut candidates: Vec<Opportunity> = self
            .book
            .iter()
            .filter(|o| !o.pool_ids().any(|id| touched.contains(id)))
            .cloned()
            .collect();
        let retained = candidates.len();
        candidates.extend(found.iter().cloned());

        let ranked = self.detector.ranker().rank(candidates);
        debug!(
            retained,
            found = found.len(),
            conflicting = ranked.conflicting,
            "Book merged"
        );
        ranked.accepted
    }
}
