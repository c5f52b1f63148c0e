//! Execution-side boundary
//!
//! The service publishes each non-empty ranked list to an
//! [`OpportunitySink`]. Re-validation against live state and transaction
//! submission happen on the other side of this trait.

use crate::error::SinkError;
use crate::opportunity::Opportunity;
use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;

pub trait OpportunitySink: Send {
    /// Deliver one pass worth of ranked opportunities
    fn publish(&mut self, snapshot_version: u64, opportunities: &[Opportunity]) -> Result<(), SinkError>;
}

/// Writes one JSON object per opportunity, one per line
pub struct JsonLinesSink<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> OpportunitySink for JsonLinesSink<W> {
    fn publish(&mut self, _snapshot_version: u64, opportunities: &[Opportunity]) -> Result<(), SinkError> {
        for opportunity in opportunities {
            serde_json::to_writer(&mut self.writer, opportunity)?;
            self.writer.write_all(b"\n")?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

/// Keeps every published batch; clones share the same storage
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    batches: Arc<Mutex<Vec<(u64, Vec<Opportunity>)>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches(&self) -> Vec<(u64, Vec<Opportunity>)> {
        self.batches.lock().clone()
    }

    pub fn total(&self) -> usize {
        self.batches.lock().iter().map(|(_, batch)| batch.len()).sum()
    }
}

impl OpportunitySink for MemorySink {
    fn publish(&mut self, snapshot_version: u64, opportunities: &[Opportunity]) -> Result<(), SinkError> {
        self.batches
            .lock()
            .push((snapshot_version, opportunities.to_vec()));
        Ok(())
    }
}
