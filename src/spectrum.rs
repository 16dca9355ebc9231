//! Module implementing the multitaper spectral estimators: the point-process
//! power spectrum and the coherency between a continuous signal and a point
//! process.

use log::{debug, warn};
use nalgebra::DMatrix;
use num_complex::Complex64;

use crate::error::SpectralError;
use crate::freq::{nfft_length, FrequencyGrid};
use crate::grid::TimeGrid;
use crate::spike_train::SpikeTrainSet;
use crate::tapers::TaperSpec;
use crate::transform::{continuous_fft, point_process_fft, PointSpectra};
use crate::{DEFAULT_TIME_BANDWIDTH, GRID_SPACING_TOLERANCE};

/// Time grid selection for taper evaluation.
#[derive(Debug, PartialEq, Clone)]
pub enum TimeGridSpec {
    /// Derive the grid from the data: the event range for point-process
    /// estimators, the sample count for continuous-signal estimators.
    Auto,
    /// Expand a pair of endpoint bounds into a uniform grid.
    Bounds(f64, f64),
    /// Use the provided sample instants directly.
    Points(Vec<f64>),
}

/// Options shared by the multitaper estimators, with named, typed and
/// defaulted fields.
#[derive(Debug, PartialEq, Clone)]
pub struct MtConfig {
    /// Taper count to compute, or a precomputed bank to reuse.
    pub tapers: TaperSpec,
    /// Time-bandwidth product for taper design (ignored for precomputed tapers).
    pub time_bandwidth: f64,
    /// Zero-padding factor: -1 for none, 0 for the next power of two, each
    /// further increment doubles the transform length again.
    pub pad: i32,
    /// Sampling rate in Hz.
    pub fs: f64,
    /// Frequency band to retain; None keeps everything in [0, fs/2].
    pub fpass: Option<(f64, f64)>,
    /// Average estimates across trials when true.
    pub trialave: bool,
    /// Time grid over which the tapers are evaluated.
    pub tgrid: TimeGridSpec,
}

impl Default for MtConfig {
    fn default() -> Self {
        MtConfig {
            tapers: TaperSpec::default(),
            time_bandwidth: DEFAULT_TIME_BANDWIDTH,
            pad: 0,
            fs: 1.0,
            fpass: None,
            trialave: false,
            tgrid: TimeGridSpec::Auto,
        }
    }
}

impl MtConfig {
    /// Returns the effective pass-band, defaulting to [0, fs/2].
    pub fn fpass(&self) -> (f64, f64) {
        self.fpass.unwrap_or((0.0, self.fs / 2.0))
    }

    /// Checks the cross-field consistency of the options.
    pub fn validate(&self) -> Result<(), SpectralError> {
        if self.fs <= 0.0 {
            return Err(SpectralError::InvalidParameter(
                "the sampling rate must be positive".to_string(),
            ));
        }
        if self.time_bandwidth <= 0.0 {
            return Err(SpectralError::InvalidParameter(
                "the time-bandwidth product must be positive".to_string(),
            ));
        }
        let (lo, hi) = self.fpass();
        if lo < 0.0 || lo > hi {
            return Err(SpectralError::InvalidParameter(format!(
                "the pass-band ({}, {}) is not a non-negative ordered pair",
                lo, hi
            )));
        }
        Ok(())
    }

    /// Resolves the time grid for a point-process estimator, deriving the
    /// bounds from the event range when no grid was supplied.
    fn resolve_grid(&self, trains: &SpikeTrainSet) -> Result<TimeGrid, SpectralError> {
        match &self.tgrid {
            TimeGridSpec::Auto => {
                let (tmin, tmax) = trains.range().ok_or_else(|| {
                    SpectralError::InvalidTimeGrid(
                        "no events to derive the grid bounds from".to_string(),
                    )
                })?;
                TimeGrid::from_bounds(tmin, tmax, self.fs)
            }
            TimeGridSpec::Bounds(tmin, tmax) => TimeGrid::from_bounds(*tmin, *tmax, self.fs),
            TimeGridSpec::Points(times) => {
                let grid = TimeGrid::from_points(times.clone())?;
                let dt = 1.0 / self.fs;
                if ((grid.dt() - dt) / dt).abs() > GRID_SPACING_TOLERANCE {
                    warn!(
                        "time grid spacing {} does not match 1/Fs = {}",
                        grid.dt(),
                        dt
                    );
                }
                Ok(grid)
            }
        }
    }
}

/// The multitaper power spectrum of a point process.
#[derive(Debug, Clone)]
pub struct SpectrumEstimate {
    /// Power estimates, one row per frequency and one column per trial
    /// (a single column when trials are averaged).
    pub power: DMatrix<f64>,
    /// Frequency axis in Hz.
    pub freqs: Vec<f64>,
    /// Mean firing rate in events per second, one entry per trial
    /// (a single entry when trials are averaged).
    pub rate: Vec<f64>,
}

/// The multitaper coherency between a continuous signal and a point process.
#[derive(Debug, Clone)]
pub struct CoherencyEstimate {
    /// Coherence magnitude |C12| in [0, 1].
    pub coherence: DMatrix<f64>,
    /// Coherency phase in radians.
    pub phase: DMatrix<f64>,
    /// Cross-spectrum S12.
    pub cross: DMatrix<Complex64>,
    /// Auto-spectrum S1 of the continuous signal.
    pub auto1: DMatrix<f64>,
    /// Auto-spectrum S2 of the point process.
    pub auto2: DMatrix<f64>,
    /// Frequency axis in Hz.
    pub freqs: Vec<f64>,
}

/// Computes the multitaper Fourier transform of a point process.
///
/// Resolves the time grid, transform length, frequency grid and taper bank
/// from the options, then runs the point-process transform. Returns the
/// per-trial coefficients together with the frequency grid.
pub fn mtfftpt(
    trains: &SpikeTrainSet,
    config: &MtConfig,
) -> Result<(PointSpectra, FrequencyGrid), SpectralError> {
    config.validate()?;
    let grid = config.resolve_grid(trains)?;
    let nfft = nfft_length(grid.len(), config.pad);
    let fgrid = FrequencyGrid::build(config.fs, nfft, config.fpass())?;
    if fgrid.is_empty() {
        debug!(
            "pass-band ({}, {}) excludes every frequency bin",
            config.fpass().0,
            config.fpass().1
        );
    }
    let tapers = config.tapers.resolve(grid.len(), config.time_bandwidth)?;
    let spectra = point_process_fft(trains, &tapers, nfft, &grid, &fgrid)?;
    Ok((spectra, fgrid))
}

/// Computes the multitaper power spectrum and firing rate of a point process.
///
/// The power at each frequency is the squared coefficient magnitude averaged
/// over tapers; with `trialave` the spectrum and the mean rate are further
/// averaged across trials.
pub fn mtspectrumpt(
    trains: &SpikeTrainSet,
    config: &MtConfig,
) -> Result<SpectrumEstimate, SpectralError> {
    let (spectra, fgrid) = mtfftpt(trains, config)?;
    let num_trials = trains.num_trials();
    let num_freqs = fgrid.len();

    let mut power = DMatrix::zeros(num_freqs, num_trials);
    for (trial, j) in spectra.j.iter().enumerate() {
        let num_tapers = j.ncols() as f64;
        for row in 0..num_freqs {
            power[(row, trial)] =
                j.row(row).iter().map(|v| v.norm_sqr()).sum::<f64>() / num_tapers;
        }
    }

    let (power, rate) = if config.trialave && num_trials > 0 {
        let averaged = DMatrix::from_fn(num_freqs, 1, |row, _| {
            power.row(row).sum() / num_trials as f64
        });
        let mean_msp = spectra.msp.iter().sum::<f64>() / num_trials as f64;
        (averaged, vec![mean_msp * config.fs])
    } else {
        (power, spectra.msp.iter().map(|m| m * config.fs).collect())
    };

    Ok(SpectrumEstimate {
        power,
        freqs: fgrid.freqs().to_vec(),
        rate,
    })
}

/// Computes the multitaper coherency between a continuous signal (samples x
/// channels) and a point process.
///
/// The channel count must equal the trial count, or be 1, in which case the
/// signal is tiled across trials. With `trialave`, the cross- and
/// auto-spectra are averaged across trials before the division.
pub fn coherencycpt(
    data: &DMatrix<f64>,
    trains: &SpikeTrainSet,
    config: &MtConfig,
) -> Result<CoherencyEstimate, SpectralError> {
    config.validate()?;
    let num_trials = trains.num_trials();
    if num_trials == 0 {
        return Err(SpectralError::InvalidParameter(
            "the spike train collection holds no trials".to_string(),
        ));
    }

    let (num_samples, num_channels) = data.shape();
    let tiled;
    let data = if num_channels == num_trials {
        data
    } else if num_channels == 1 {
        tiled = DMatrix::from_fn(num_samples, num_trials, |row, _| data[(row, 0)]);
        &tiled
    } else {
        return Err(SpectralError::DimensionMismatch(format!(
            "continuous signal has {} channels but the collection has {} trials",
            num_channels, num_trials
        )));
    };

    let grid = match &config.tgrid {
        TimeGridSpec::Auto => TimeGrid::regular(0.0, num_samples, config.fs)?,
        TimeGridSpec::Bounds(tmin, tmax) => TimeGrid::from_bounds(*tmin, *tmax, config.fs)?,
        TimeGridSpec::Points(times) => TimeGrid::from_points(times.clone())?,
    };
    if grid.len() != num_samples {
        return Err(SpectralError::DimensionMismatch(format!(
            "time grid has {} samples but the continuous signal has {}",
            grid.len(),
            num_samples
        )));
    }

    let nfft = nfft_length(num_samples, config.pad);
    let fgrid = FrequencyGrid::build(config.fs, nfft, config.fpass())?;
    let tapers = config.tapers.resolve(num_samples, config.time_bandwidth)?;

    let j1 = continuous_fft(data, &tapers, nfft, &fgrid)?;
    let j2 = point_process_fft(trains, &tapers, nfft, &grid, &fgrid)?;

    let num_freqs = fgrid.len();
    let num_tapers = tapers.count() as f64;
    let mut cross = DMatrix::zeros(num_freqs, num_trials);
    let mut auto1 = DMatrix::zeros(num_freqs, num_trials);
    let mut auto2 = DMatrix::zeros(num_freqs, num_trials);
    for trial in 0..num_trials {
        for row in 0..num_freqs {
            let mut acc12 = Complex64::new(0.0, 0.0);
            let (mut acc1, mut acc2) = (0.0, 0.0);
            for k in 0..tapers.count() {
                let a = j1[trial][(row, k)];
                let b = j2.j[trial][(row, k)];
                acc12 += a.conj() * b;
                acc1 += a.norm_sqr();
                acc2 += b.norm_sqr();
            }
            cross[(row, trial)] = acc12 / num_tapers;
            auto1[(row, trial)] = acc1 / num_tapers;
            auto2[(row, trial)] = acc2 / num_tapers;
        }
    }

    // Trial averaging happens on the spectra, before the division below
    let (cross, auto1, auto2) = if config.trialave {
        let scale = num_trials as f64;
        (
            DMatrix::from_fn(num_freqs, 1, |row, _| {
                cross.row(row).iter().sum::<Complex64>() / scale
            }),
            DMatrix::from_fn(num_freqs, 1, |row, _| auto1.row(row).sum() / scale),
            DMatrix::from_fn(num_freqs, 1, |row, _| auto2.row(row).sum() / scale),
        )
    } else {
        (cross, auto1, auto2)
    };

    let mut coherence = DMatrix::zeros(num_freqs, cross.ncols());
    let mut phase = DMatrix::zeros(num_freqs, cross.ncols());
    for col in 0..cross.ncols() {
        for row in 0..num_freqs {
            let c12 = cross[(row, col)] / (auto1[(row, col)] * auto2[(row, col)]).sqrt();
            coherence[(row, col)] = c12.norm();
            phase[(row, col)] = c12.arg();
        }
    }

    Ok(CoherencyEstimate {
        coherence,
        phase,
        cross,
        auto1,
        auto2,
        freqs: fgrid.freqs().to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = MtConfig::default();
        assert_eq!(config.fpass(), (0.0, 0.5));
        assert_eq!(config.pad, 0);
        assert!(!config.trialave);
        assert!(config.validate().is_ok());

        let config = MtConfig {
            fs: 1000.0,
            ..MtConfig::default()
        };
        assert_eq!(config.fpass(), (0.0, 500.0));
    }

    #[test]
    fn test_config_validation() {
        let config = MtConfig {
            fs: 0.0,
            ..MtConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SpectralError::InvalidParameter(_))
        ));

        let config = MtConfig {
            fpass: Some((10.0, 5.0)),
            ..MtConfig::default()
        };
        assert!(config.validate().is_err());

        let config = MtConfig {
            fpass: Some((-1.0, 5.0)),
            fs: 100.0,
            ..MtConfig::default()
        };
        assert!(config.validate().is_err());

        let config = MtConfig {
            time_bandwidth: 0.0,
            ..MtConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_auto_grid_needs_events() {
        let trains = SpikeTrainSet::from_times(vec![vec![], vec![]]).unwrap();
        let config = MtConfig::default();
        assert!(matches!(
            mtfftpt(&trains, &config),
            Err(SpectralError::InvalidTimeGrid(_))
        ));
    }

    #[test]
    fn test_empty_passband_yields_empty_spectrum() {
        let trains = SpikeTrainSet::from_times(vec![vec![0.1, 0.2, 0.35]]).unwrap();
        let config = MtConfig {
            fs: 100.0,
            fpass: Some((49.7, 49.9)),
            ..MtConfig::default()
        };
        let estimate = mtspectrumpt(&trains, &config).unwrap();
        assert!(estimate.freqs.is_empty());
        assert_eq!(estimate.power.nrows(), 0);
        assert_eq!(estimate.rate.len(), 1);
    }
}
