//! Error types for identifier and fee validation

use thiserror::Error;

/// Errors that can occur while constructing validated domain values
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Identifier is empty or whitespace only
    #[error("{kind} identifier cannot be empty")]
    EmptyId { kind: &'static str },

    /// Fee rate must lie in [0, 1)
    #[error("Fee rate {pips} pips is out of range [0, {max})")]
    FeeOutOfRange { pips: u64, max: u32 },

    /// Token decimal precision outside supported range
    #[error("Asset {asset} has {decimals} decimals, maximum supported is {max}")]
    DecimalsOutOfRange { asset: String, decimals: u8, max: u8 },
}
