//! Unified error type for the translation crates
//!
//! [`TranslateError`] covers every fatal condition a translation can hit.
//! Recoverable data problems never surface here; they are collected in
//! [`crate::diagnostics::Diagnostics`] and only become errors when a caller
//! escalates them.
//!
//! # Example
//!
//! ```ignore
//! use mp2grg_core::{TranslateError, TranslateResult};
//!
//! fn load(path: &str) -> TranslateResult<Case> {
//!     let case = parse_matpower_file(path)?;
//!     case.validate()?;
//!     Ok(case)
//! }
//! ```

use thiserror::Error;

use crate::grg::GrgDocument;

/// Error type for all parsing and translation operations.
#[derive(Error, Debug)]
pub enum TranslateError {
    /// I/O errors (file access) are propagated unchanged
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed MATPOWER text
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Unreadable GRG JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A flat case whose records do not reference each other consistently
    #[error("Invalid case: {0}")]
    InvalidCase(String),

    /// The document to decode stores physical rather than per-unit values
    #[error("network data not given in per unit")]
    NotPerUnit,

    /// The encoded document failed validation. The offending document is
    /// kept so callers can print it for diagnosis.
    #[error("incorrect grg data representation ({} issue(s))", issues.len())]
    InvalidDocument {
        issues: Vec<String>,
        document: Box<GrgDocument>,
    },

    /// Generator cost model code other than piecewise-linear (1) or polynomial (2)
    #[error("unsupported cost model type {0}")]
    UnsupportedCostModel(i32),

    /// Producer/consumer contract mismatch inside the translator
    #[error("Internal consistency failure: {0}")]
    Internal(String),

    /// Warnings escalated to a failure at the caller's request
    #[error("{0}")]
    Escalated(String),
}

/// Convenience type alias for Results using TranslateError.
pub type TranslateResult<T> = Result<T, TranslateError>;

impl TranslateError {
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        TranslateError::Parse {
            line,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        TranslateError::Internal(message.into())
    }
}

impl From<anyhow::Error> for TranslateError {
    fn from(err: anyhow::Error) -> Self {
        TranslateError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TranslateError::parse(12, "invalid number 'x1'");
        assert!(err.to_string().contains("line 12"));
        assert!(err.to_string().contains("x1"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TranslateError = io_err.into();
        assert!(matches!(err, TranslateError::Io(_)));
    }

    #[test]
    fn test_unsupported_cost_model_display() {
        let err = TranslateError::UnsupportedCostModel(7);
        assert_eq!(err.to_string(), "unsupported cost model type 7");
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> TranslateResult<()> {
            Err(TranslateError::NotPerUnit)
        }

        fn outer() -> TranslateResult<()> {
            inner()?;
            Ok(())
        }

        assert!(matches!(outer(), Err(TranslateError::NotPerUnit)));
    }
}
