//! Error types for response collection

use thiserror::Error;

/// Errors raised while querying or converting input records.
///
/// Every variant is a caller-input problem or an explicit wait outcome.
/// Orphaned releases are not errors; they are governed by
/// [`OrphanPolicy`](crate::correlate::OrphanPolicy).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TimingError {
    /// Unit name not recognised by the converter
    #[error("invalid unit '{0}' (expected pix, cm, deg or norm)")]
    InvalidUnit(String),

    /// Monitor geometry lacks a value the conversion needs
    #[error("monitor geometry is missing {field}")]
    MissingGeometry { field: &'static str },

    /// Button name not recognised in a filter list
    #[error("invalid button name '{0}' (expected left, middle, right or scroll)")]
    InvalidButtonName(String),

    /// A wait ran past its deadline without a qualifying event
    #[error("no qualifying event within {after:.3} s")]
    WaitTimedOut { after: f64 },

    /// A wait was cancelled from outside
    #[error("wait cancelled")]
    WaitCancelled,
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, TimingError>;
