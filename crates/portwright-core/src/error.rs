//! Error types for the conversion entry point.
//!
//! The propagation policy is deliberately lopsided: malformed or unusual
//! *input* never fails a conversion (it degrades to opaque passthrough or
//! flagged review comments, recorded in the report), so the only fatal
//! errors are caller-contract violations and internal bugs.

use thiserror::Error;

/// Errors that fail a `convert()` call outright.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Caller supplied an unrecognized conversion mode.
    #[error("invalid conversion mode: '{mode}'")]
    InvalidMode { mode: String },

    /// Internal invariant violation (a bug, not an input problem).
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl ConvertError {
    /// Create an invalid-mode error.
    pub fn invalid_mode(mode: impl Into<String>) -> Self {
        ConvertError::InvalidMode { mode: mode.into() }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ConvertError::Internal {
            message: message.into(),
        }
    }

    /// Stable exit code for CLI output: 2 for caller errors, 10 for bugs.
    pub fn exit_code(&self) -> u8 {
        match self {
            ConvertError::InvalidMode { .. } => 2,
            ConvertError::Internal { .. } => 10,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
