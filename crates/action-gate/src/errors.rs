//! Error types for gate validation

use cdp_adapter::AdapterError;
use thiserror::Error;

/// Gate validation error enumeration
///
/// An unmet check is not an error; it is a `passed: false` outcome.
#[derive(Debug, Error, Clone)]
pub enum GateError {
    /// The page driver failed in a way no retry can fix
    #[error("Infrastructure fault during verification: {0}")]
    Infrastructure(AdapterError),

    /// Invalid verification spec
    #[error("Invalid VerificationSpec: {0}")]
    InvalidSpec(String),
}

impl GateError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Get error severity (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self {
            GateError::Infrastructure(_) => 3,
            GateError::InvalidSpec(_) => 2,
        }
    }
}
