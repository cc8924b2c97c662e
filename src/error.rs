//! Error handling for threshold key generation
//!
//! Every fallible operation in the crate returns [`FhewError`]. Failures are
//! detected synchronously and never leave shared values (parameters, CRS)
//! in a modified state.

use thiserror::Error;

/// Failure kinds surfaced by the crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FhewError {
    /// Parameter set is internally inconsistent.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Configuration names a modulus or distribution kind that is not recognized.
    #[error("unsupported config variant: {0}")]
    UnsupportedConfigVariant(String),

    /// Distribution cannot be sampled from (e.g. non-positive standard deviation).
    #[error("invalid distribution: {0}")]
    InvalidDistribution(String),

    /// Party index is outside `0..total`.
    #[error("invalid party index {index}, total shares is {total}")]
    InvalidPartyIndex { index: usize, total: usize },

    /// A supplied key does not have the shape the parameter set requires.
    #[error("key does not match parameters: {0}")]
    KeyParameterMismatch(String),

    /// CRS was derived for a different parameter set.
    #[error("crs does not match parameters")]
    CrsParameterMismatch,

    /// Byte sequence is not a canonical encoding.
    #[error("malformed encoding: {0}")]
    MalformedEncoding(String),

    /// Byte sequence ended before the structure was complete.
    #[error("truncated input: needed {needed} more bytes, {remaining} remaining")]
    TruncatedInput { needed: usize, remaining: usize },
}

/// Result type used across the crate.
pub type Result<T> = std::result::Result<T, FhewError>;

/// Create an [`FhewError::InvalidParameter`] with format string support
macro_rules! invalid_param {
    ($($arg:tt)*) => {
        $crate::error::FhewError::InvalidParameter(format!($($arg)*))
    };
}

/// Create an [`FhewError::MalformedEncoding`] with format string support
macro_rules! malformed {
    ($($arg:tt)*) => {
        $crate::error::FhewError::MalformedEncoding(format!($($arg)*))
    };
}

pub(crate) use {invalid_param, malformed};
