//! This crate provides multitaper spectral estimation tools for neural point
//! processes (spike trains) in Rust.
//!
//! # Computing a Point-Process Spectrum
//!
//! ```rust
//! use rusty_mtspec::spectrum::{mtspectrumpt, MtConfig};
//! use rusty_mtspec::spike_train::SpikeTrainSet;
//!
//! // Two trials of event times, in seconds
//! let trains = SpikeTrainSet::from_times(vec![
//!     vec![0.12, 0.48, 0.71, 1.33],
//!     vec![0.05, 0.62, 1.18],
//! ]).unwrap();
//!
//! let config = MtConfig { fs: 100.0, ..MtConfig::default() };
//! let estimate = mtspectrumpt(&trains, &config).unwrap();
//!
//! // One spectrum per trial, on a shared frequency axis
//! assert_eq!(estimate.power.ncols(), 2);
//! assert_eq!(estimate.power.nrows(), estimate.freqs.len());
//! assert_eq!(estimate.rate.len(), 2);
//! ```
//!
//! # Coherency Between a Continuous Signal and a Point Process
//!
//! ```rust
//! use nalgebra::DMatrix;
//! use rusty_mtspec::spectrum::{coherencycpt, MtConfig};
//! use rusty_mtspec::spike_train::SpikeTrainSet;
//!
//! let fs = 100.0;
//! // A single-channel sinusoid, tiled across trials automatically
//! let data = DMatrix::from_fn(200, 1, |i, _| {
//!     (2.0 * std::f64::consts::PI * 10.0 * i as f64 / fs).sin()
//! });
//! let trains = SpikeTrainSet::from_times(vec![
//!     vec![0.31, 0.52, 0.97, 1.43],
//!     vec![0.11, 0.79, 1.22],
//! ]).unwrap();
//!
//! let config = MtConfig { fs, trialave: true, ..MtConfig::default() };
//! let estimate = coherencycpt(&data, &trains, &config).unwrap();
//!
//! assert_eq!(estimate.coherence.ncols(), 1);
//! assert!(estimate.coherence.iter().all(|&c| c <= 1.0 + 1e-9));
//! ```

pub mod error;
pub mod freq;
pub mod grid;
pub mod spectrum;
pub mod spike_train;
pub mod tapers;
pub mod transform;

/// The default number of tapers when none are supplied.
pub const DEFAULT_NUM_TAPERS: usize = 5;
/// The default time-bandwidth product for taper design.
pub const DEFAULT_TIME_BANDWIDTH: f64 = 3.0;
/// The relative tolerance for a caller-supplied time grid to count as uniform.
pub const GRID_SPACING_TOLERANCE: f64 = 1e-6;
