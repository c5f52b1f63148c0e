//! AMM error taxonomy
//!
//! Every pricing and sizing failure maps to one of these kinds. Callers use
//! [`AmmError::is_expected`] to separate routine candidate rejections from
//! failures worth reporting.

use thiserror::Error;
use types::ValidationError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmmError {
    /// Malformed amount, asset or pool parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Trade exceeds the safe fraction or exhausts the curve range
    #[error("Insufficient liquidity: {0}")]
    InsufficientLiquidity(String),

    /// Newton iteration or search did not settle within budget
    #[error("{what} failed to converge after {iterations} iterations")]
    ConvergenceError { what: &'static str, iterations: u32 },

    /// Fixed-precision intermediate does not fit
    #[error("Numeric overflow in {0}")]
    NumericOverflow(&'static str),

    /// No trade size clears the profit threshold
    #[error("No feasible trade size: {0}")]
    NoFeasibleSize(String),
}

impl AmmError {
    /// Local, non-fatal outcomes that simply discard a candidate
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            AmmError::InvalidInput(_)
                | AmmError::InsufficientLiquidity(_)
                | AmmError::NoFeasibleSize(_)
        )
    }
}

impl From<ValidationError> for AmmError {
    fn from(err: ValidationError) -> Self {
        AmmError::InvalidInput(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AmmError>;
