//! Error module for the rusty_mtspec library.
use std::error::Error;
use std::fmt;

/// Error types for the library.
#[derive(Debug, PartialEq)]
pub enum SpectralError {
    /// Error for invalid event times, e.g., NaN or infinite values.
    InvalidTimes,
    /// Error for invalid parameters, e.g., non-positive sampling rate or taper count.
    InvalidParameter(String),
    /// Error for incompatible dimensions, e.g., channel count vs number of trials.
    DimensionMismatch(String),
    /// Error for an unusable time grid, e.g., non-uniform spacing or no events to derive bounds from.
    InvalidTimeGrid(String),
}

impl fmt::Display for SpectralError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SpectralError::InvalidTimes => write!(f, "Invalid event times detected"),
            SpectralError::InvalidParameter(e) => write!(f, "Invalid parameter: {}", e),
            SpectralError::DimensionMismatch(e) => write!(f, "Dimension mismatch: {}", e),
            SpectralError::InvalidTimeGrid(e) => write!(f, "Invalid time grid: {}", e),
        }
    }
}

impl Error for SpectralError {}
