//! Bounded producer/consumer boundary between ingestion and detection
//!
//! Producers `submit` without blocking; the detection loop drains the queue
//! between passes, so no pass ever sees an update land mid-computation.

use crate::error::{GraphError, QueueError};
use crate::traits::UpdateTarget;
use crate::update::PoolUpdate;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::collections::HashSet;
use tracing::debug;
use types::PoolId;

/// Outcome of one drain
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DrainReport {
    pub applied: usize,
    pub stale: usize,
    pub rejected: usize,
    /// Pools whose state changed, in first-touched order
    pub touched: Vec<PoolId>,
}

impl DrainReport {
    pub fn is_empty(&self) -> bool {
        self.applied == 0 && self.stale == 0 && self.rejected == 0
    }
}

/// Cloneable producer handle
#[derive(Debug, Clone)]
pub struct UpdateProducer {
    sender: Sender<PoolUpdate>,
    capacity: usize,
}

impl UpdateProducer {
    /// Enqueue without blocking
    pub fn submit(&self, update: PoolUpdate) -> Result<(), QueueError> {
        self.sender.try_send(update).map_err(|err| match err {
            TrySendError::Full(_) => QueueError::QueueFull {
                capacity: self.capacity,
            },
            TrySendError::Disconnected(_) => QueueError::Disconnected,
        })
    }
}

pub struct UpdateQueue {
    producer: UpdateProducer,
    receiver: Receiver<PoolUpdate>,
}

impl UpdateQueue {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            producer: UpdateProducer { sender, capacity },
            receiver,
        }
    }

    pub fn producer(&self) -> UpdateProducer {
        self.producer.clone()
    }

    pub fn submit(&self, update: PoolUpdate) -> Result<(), QueueError> {
        self.producer.submit(update)
    }

    pub fn capacity(&self) -> usize {
        self.producer.capacity
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Apply every queued update to `target`, in arrival order
    pub fn drain_into<T: UpdateTarget + ?Sized>(&self, target: &T) -> DrainReport {
        let mut report = DrainReport::default();
        let mut seen = HashSet::new();

        while let Ok(update) = self.receiver.try_recv() {
            let pool_id = update.pool_id.clone();
            match target.apply_update(update) {
                Ok(_) => {
                    report.applied += 1;
                    if seen.insert(pool_id.clone()) {
                        report.touched.push(pool_id);
                    }
                }
                Err(GraphError::StaleUpdate { .. }) => report.stale += 1,
                Err(_) => report.rejected += 1,
            }
        }

        if !report.is_empty() {
            debug!(
                applied = report.applied,
                stale = report.stale,
                rejected = report.rejected,
                touched = report.touched.len(),
                "Drained update queue"
            );
        }
        report
    }
}
