//! Module implementing the tapered Fourier transforms at the heart of the
//! estimators: one for event-time (point process) data, one for continuous
//! signals.

use log::debug;
use nalgebra::DMatrix;
use num_complex::Complex64;
use rayon::prelude::*;
use rustfft::FftPlanner;
use std::f64::consts::PI;

use crate::error::SpectralError;
use crate::freq::FrequencyGrid;
use crate::grid::TimeGrid;
use crate::spike_train::SpikeTrainSet;
use crate::tapers::Tapers;

/// Per-trial tapered Fourier coefficients of a point process.
#[derive(Debug, Clone)]
pub struct PointSpectra {
    /// One (frequency x taper) complex matrix per trial.
    pub j: Vec<DMatrix<Complex64>>,
    /// Mean spikes per grid sample in each trial.
    pub msp: Vec<f64>,
    /// Number of spikes retained in each trial.
    pub nsp: Vec<usize>,
}

/// Transforms each taper, zero-padded to `nfft`, keeping only the rows
/// selected by the frequency grid. Trial-invariant, computed once per call.
fn taper_spectra(tapers: &Tapers, nfft: usize, fgrid: &FrequencyGrid) -> DMatrix<Complex64> {
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(nfft);

    let mut spectra = DMatrix::zeros(fgrid.len(), tapers.count());
    let mut buffer = vec![Complex64::new(0.0, 0.0); nfft];
    for k in 0..tapers.count() {
        buffer.fill(Complex64::new(0.0, 0.0));
        for i in 0..tapers.len() {
            buffer[i] = Complex64::new(tapers.values()[(i, k)], 0.0);
        }
        fft.process(&mut buffer);
        for (row, &idx) in fgrid.indices().iter().enumerate() {
            spectra[(row, k)] = buffer[idx];
        }
    }
    spectra
}

/// Evaluates every taper at the given event times by piecewise-linear
/// interpolation over the taper's native sample grid.
///
/// Every event must lie within the grid support.
fn project_events(tapers: &Tapers, grid: &TimeGrid, events: &[f64]) -> DMatrix<f64> {
    let last = grid.len() - 2;
    let mut projection = DMatrix::zeros(tapers.count(), events.len());
    for (col, &event) in events.iter().enumerate() {
        let position = (event - grid.start()) / grid.dt();
        let idx = (position.floor() as usize).min(last);
        let frac = position - idx as f64;
        for row in 0..tapers.count() {
            let lo = tapers.values()[(idx, row)];
            let hi = tapers.values()[(idx + 1, row)];
            projection[(row, col)] = lo + frac * (hi - lo);
        }
    }
    projection
}

/// Computes the per-trial, per-taper Fourier coefficients of a point process.
///
/// For each trial, the events inside the grid support are projected onto the
/// interpolated tapers and phase-aligned to the grid origin; the taper's own
/// spectrum, scaled by the trial's mean rate, is subtracted so that the
/// estimator is unbiased for a homogeneous Poisson process. A trial with no
/// events in range yields an all-zero column, not an error.
///
/// Trials are independent; they are processed in parallel with results
/// identical to the sequential loop.
pub fn point_process_fft(
    trains: &SpikeTrainSet,
    tapers: &Tapers,
    nfft: usize,
    grid: &TimeGrid,
    fgrid: &FrequencyGrid,
) -> Result<PointSpectra, SpectralError> {
    if fgrid.freqs().len() != fgrid.indices().len() {
        return Err(SpectralError::DimensionMismatch(format!(
            "frequency grid holds {} values but {} indices",
            fgrid.freqs().len(),
            fgrid.indices().len()
        )));
    }
    if grid.len() < 2 {
        return Err(SpectralError::InvalidTimeGrid(
            "the time grid needs at least two samples".to_string(),
        ));
    }
    if tapers.len() != grid.len() {
        return Err(SpectralError::DimensionMismatch(format!(
            "tapers have length {} but the time grid has {} samples",
            tapers.len(),
            grid.len()
        )));
    }
    if nfft < grid.len() {
        return Err(SpectralError::InvalidParameter(format!(
            "transform length {} is shorter than the time grid ({} samples)",
            nfft,
            grid.len()
        )));
    }

    let taper_fft = taper_spectra(tapers, nfft, fgrid);
    let omega: Vec<f64> = fgrid.freqs().iter().map(|f| 2.0 * PI * f).collect();
    let (tmin, tmax) = (grid.start(), grid.end());

    let per_trial: Vec<(DMatrix<Complex64>, f64, usize)> = trains
        .trains()
        .par_iter()
        .map(|train| {
            let events: Vec<f64> = train
                .times()
                .iter()
                .copied()
                .filter(|&t| t >= tmin && t <= tmax)
                .collect();
            let nsp = events.len();
            let msp = nsp as f64 / grid.len() as f64;

            if events.is_empty() {
                debug!("trial with no events in [{}, {}]", tmin, tmax);
                return (DMatrix::zeros(fgrid.len(), tapers.count()), msp, nsp);
            }

            let projection =
                project_events(tapers, grid, &events).map(|v| Complex64::new(v, 0.0));
            let phases = DMatrix::from_fn(fgrid.len(), events.len(), |row, col| {
                Complex64::from_polar(1.0, -omega[row] * (events[col] - tmin))
            });

            let coefficients = &phases * projection.transpose() - taper_fft.map(|h| h * msp);
            (coefficients, msp, nsp)
        })
        .collect();

    let (j, msp, nsp) = itertools::multiunzip(per_trial);
    Ok(PointSpectra { j, msp, nsp })
}

/// Computes the per-channel, per-taper Fourier coefficients of a continuous
/// signal with shape (samples x channels), sharing the taper bank, transform
/// length and frequency grid of the point-process transform.
pub fn continuous_fft(
    data: &DMatrix<f64>,
    tapers: &Tapers,
    nfft: usize,
    fgrid: &FrequencyGrid,
) -> Result<Vec<DMatrix<Complex64>>, SpectralError> {
    let (num_samples, num_channels) = data.shape();
    if tapers.len() != num_samples {
        return Err(SpectralError::DimensionMismatch(format!(
            "tapers have length {} but the signal has {} samples",
            tapers.len(),
            num_samples
        )));
    }
    if nfft < num_samples {
        return Err(SpectralError::InvalidParameter(format!(
            "transform length {} is shorter than the signal ({} samples)",
            nfft, num_samples
        )));
    }

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(nfft);

    let mut spectra = Vec::with_capacity(num_channels);
    let mut buffer = vec![Complex64::new(0.0, 0.0); nfft];
    for channel in 0..num_channels {
        let mut coefficients = DMatrix::zeros(fgrid.len(), tapers.count());
        for k in 0..tapers.count() {
            buffer.fill(Complex64::new(0.0, 0.0));
            for i in 0..num_samples {
                buffer[i] = Complex64::new(data[(i, channel)] * tapers.values()[(i, k)], 0.0);
            }
            fft.process(&mut buffer);
            for (row, &idx) in fgrid.indices().iter().enumerate() {
                coefficients[(row, k)] = buffer[idx];
            }
        }
        spectra.push(coefficients);
    }
    Ok(spectra)
}
