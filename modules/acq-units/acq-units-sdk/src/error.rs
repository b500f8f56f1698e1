//! Error types for the acquisition units gateway.

use thiserror::Error;

/// Errors that can occur when calling the acquisition units storage.
///
/// These represent transport and storage failures only. Protection
/// decisions (denied, units missing) are not gateway errors.
#[derive(Debug, Clone, Error)]
pub enum AcqUnitsError {
    /// The storage answered with a non-success status.
    #[error("storage responded with status {status}: {message}")]
    Upstream { status: u16, message: String },

    /// The storage could not be reached (timeout, connection refused).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The CQL filter was rejected.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AcqUnitsError {
    /// Create an `Upstream` error.
    #[must_use]
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            message: message.into(),
        }
    }

    /// Create an `InvalidQuery` error.
    #[must_use]
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery(message.into())
    }
}
