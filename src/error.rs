//! Error types for the AIPP runtime.
//!
//! Every operation validates fully before producing output. A returned error
//! means the caller must discard the whole result.

use thiserror::Error;

/// Errors raised by the custom-data codec, the config extractor, the tensor
/// remappers and the parameter packer.
#[derive(Debug, Error)]
pub enum AippError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{what} index {index} out of range (len {len})")]
    OutOfRange {
        what: &'static str,
        index: i64,
        len: usize,
    },

    #[error("Corrupt data: {0}")]
    Corrupt(String),

    #[error("{what} size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, AippError>;

impl AippError {
    pub(crate) fn out_of_range(what: &'static str, index: impl Into<i64>, len: usize) -> Self {
        Self::OutOfRange {
            what,
            index: index.into(),
            len,
        }
    }

    /// Returns true if the error points at malformed stored bytes rather
    /// than at the caller's arguments.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::Corrupt(_))
    }

    /// Returns true if the caller can fix the error by changing its inputs.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument(_)
                | Self::OutOfRange { .. }
                | Self::SizeMismatch { .. }
                | Self::ConstraintViolation(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_message_names_the_vector() {
        let err = AippError::out_of_range("graph data", 5, 3);
        assert_eq!(err.to_string(), "graph data index 5 out of range (len 3)");
    }

    #[test]
    fn classification() {
        assert!(AippError::Corrupt("x".into()).is_corruption());
        assert!(!AippError::Corrupt("x".into()).is_caller_error());
        assert!(AippError::ConstraintViolation("x".into()).is_caller_error());
        assert!(!AippError::Unsupported("x".into()).is_caller_error());
    }
}
