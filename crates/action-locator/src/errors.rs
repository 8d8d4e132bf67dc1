//! Error types for the resolver

use action_gate::GateError;
use cdp_adapter::AdapterError;
use thiserror::Error;

/// Locator error enumeration
///
/// "Nothing found" is never an error here; it ends up in the
/// `ActionResult` diagnostics instead.
#[derive(Debug, Error, Clone)]
pub enum LocatorError {
    /// The browser primitive failed beyond recovery
    #[error("Infrastructure fault: {0}")]
    Infrastructure(AdapterError),

    /// Intent cannot be executed as declared
    #[error("Invalid intent: {0}")]
    InvalidIntent(String),

    /// Verification spec rejected by the gate
    #[error("Invalid verification: {0}")]
    InvalidVerification(String),
}

impl LocatorError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Get error severity (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self {
            LocatorError::Infrastructure(_) => 3,
            LocatorError::InvalidIntent(_) | LocatorError::InvalidVerification(_) => 2,
        }
    }
}

impl From<GateError> for LocatorError {
    fn from(err: GateError) -> Self {
        match err {
            GateError::Infrastructure(inner) => LocatorError::Infrastructure(inner),
            GateError::InvalidSpec(reason) => LocatorError::InvalidVerification(reason),
        }
    }
}
