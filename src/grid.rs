//! Module implementing the uniform time grids on which tapers are evaluated.

use crate::error::SpectralError;
use crate::GRID_SPACING_TOLERANCE;

/// A sequence of sample instants at uniform spacing 1/Fs.
///
/// The grid length determines the unpadded transform length.
#[derive(Debug, PartialEq, Clone)]
pub struct TimeGrid {
    times: Vec<f64>,
    dt: f64,
}

impl TimeGrid {
    /// Expand a pair of endpoint bounds into a uniform grid at spacing 1/Fs.
    ///
    /// The grid runs from one sample before `tmin` to one sample after `tmax`,
    /// so that events at either bound fall strictly inside the grid support.
    pub fn from_bounds(tmin: f64, tmax: f64, fs: f64) -> Result<Self, SpectralError> {
        if fs <= 0.0 {
            return Err(SpectralError::InvalidParameter(
                "the sampling rate must be positive".to_string(),
            ));
        }
        if tmax < tmin {
            return Err(SpectralError::InvalidTimeGrid(format!(
                "the bounds ({}, {}) are not ordered",
                tmin, tmax
            )));
        }
        let dt = 1.0 / fs;
        let start = tmin - dt;
        let stop = tmax + 2.0 * dt;
        let num_samples = ((stop - start) / dt).ceil() as usize;
        let times = (0..num_samples).map(|i| start + i as f64 * dt).collect();
        Ok(TimeGrid { times, dt })
    }

    /// Create a grid of `num_samples` instants from `start` at spacing 1/Fs.
    pub fn regular(start: f64, num_samples: usize, fs: f64) -> Result<Self, SpectralError> {
        if fs <= 0.0 {
            return Err(SpectralError::InvalidParameter(
                "the sampling rate must be positive".to_string(),
            ));
        }
        if num_samples == 0 {
            return Err(SpectralError::InvalidTimeGrid(
                "a time grid needs at least one sample".to_string(),
            ));
        }
        let dt = 1.0 / fs;
        let times = (0..num_samples).map(|i| start + i as f64 * dt).collect();
        Ok(TimeGrid { times, dt })
    }

    /// Create a grid from caller-supplied sample instants.
    /// The instants must be strictly increasing at uniform spacing.
    pub fn from_points(times: Vec<f64>) -> Result<Self, SpectralError> {
        if times.len() < 2 {
            return Err(SpectralError::InvalidTimeGrid(
                "a caller-supplied time grid needs at least two samples".to_string(),
            ));
        }
        if times.iter().any(|t| !t.is_finite()) {
            return Err(SpectralError::InvalidTimeGrid(
                "non-finite sample instant".to_string(),
            ));
        }
        let dt = times[1] - times[0];
        if dt <= 0.0 {
            return Err(SpectralError::InvalidTimeGrid(
                "the sample instants must be strictly increasing".to_string(),
            ));
        }
        for ts in times.windows(2) {
            let step = ts[1] - ts[0];
            if ((step - dt) / dt).abs() > GRID_SPACING_TOLERANCE {
                return Err(SpectralError::InvalidTimeGrid(format!(
                    "non-uniform spacing: {} differs from {}",
                    step, dt
                )));
            }
        }
        Ok(TimeGrid { times, dt })
    }

    /// Returns the sample instants of the grid.
    pub fn times(&self) -> &[f64] {
        &self.times[..]
    }

    /// Returns the number of samples in the grid.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Returns true if the grid contains no samples.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Returns the spacing between consecutive samples.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Returns the first sample instant.
    pub fn start(&self) -> f64 {
        self.times[0]
    }

    /// Returns the last sample instant.
    pub fn end(&self) -> f64 {
        self.times[self.times.len() - 1]
    }
}
