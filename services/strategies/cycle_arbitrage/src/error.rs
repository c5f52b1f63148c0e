//! Detection pass errors
//!
//! Only conditions that abort a whole pass or reject the detector's settings
//! live here. Per-path failures are reported inside the pass result.

use amm::AmmError;
use pool_graph::{GraphError, QueueError};
use thiserror::Error;

/// Structured error types for detection failures
#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("Invalid detector settings: {reason}")]
    InvalidSettings { reason: String },

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Pricing error: {0}")]
    Amm(#[from] AmmError),

    #[error("Update queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Opportunity sink failed: {0}")]
    Sink(#[from] SinkError),
}

/// Failures delivering opportunities to the execution side
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DetectorError>;
