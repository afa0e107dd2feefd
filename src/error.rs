//! Library error types
//!
//! Calculators never fail on data quality: short, flat or mismatched series
//! degrade to neutral readings. The variants here are reserved for inputs
//! that can only come from a programming mistake.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SignalError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("column {column} has {actual} rows, expected {expected}")]
    LengthMismatch {
        column: usize,
        expected: usize,
        actual: usize,
    },
}

pub type SignalResult<T> = Result<T, SignalError>;
