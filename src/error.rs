//! Error types for snapdiff
//!
//! A comparison that completes with differing pixels is a normal result, not
//! an error. Errors cover the cases where the comparison could not be carried
//! out at all: missing inputs, undecodable inputs, unwritable output.
//!
//! All errors use the `thiserror` crate for minimal boilerplate and proper
//! error trait implementations.

use thiserror::Error;

/// Result type alias for snapdiff operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for snapdiff.
#[derive(Error, Debug)]
pub enum Error {
  /// Image comparison could not be completed
  #[error("Compare error: {0}")]
  Compare(#[from] CompareError),

  /// I/O error (file reading, directory creation, etc.)
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  /// Generic error for miscellaneous issues
  #[error("{0}")]
  Other(String),
}

/// Errors that prevent a comparison from completing.
///
/// Each variant names the offending path so callers can tell which input was
/// at fault, and so "could not compare" is never confused with "images
/// differ".
#[derive(Error, Debug, Clone)]
pub enum CompareError {
  /// The expected (baseline) image does not exist or is not a regular file
  #[error("Expected baseline not found: {path}")]
  MissingExpected { path: String },

  /// The actual (candidate) image does not exist or is not a regular file
  #[error("Actual image not found: {path}")]
  MissingActual { path: String },

  /// The file exists but is not a decodable PNG
  #[error("Failed to decode PNG '{path}': {reason}")]
  DecodeFailed { path: String, reason: String },

  /// The diff artifact could not be encoded or written
  #[error("Failed to write diff artifact '{path}': {reason}")]
  WriteFailed { path: String, reason: String },

  /// Threshold outside the accepted [0, 1] range
  #[error("Threshold {value} is outside [0.0, 1.0]")]
  InvalidThreshold { value: f64 },
}
