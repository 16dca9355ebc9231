//! Module implementing the frequency grid of a padded Fourier transform.

use crate::error::SpectralError;

/// Returns the exponent of the smallest power of two no smaller than n.
pub fn nextpow2(n: usize) -> u32 {
    usize::BITS - (n - 1).leading_zeros()
}

/// Returns the padded transform length `max(2^(nextpow2(n) + pad), n)`.
///
/// The padding factor follows the usual convention: -1 keeps the unpadded
/// length, 0 pads to the next power of two, and each further increment
/// doubles the length again.
pub fn nfft_length(n: usize, pad: i32) -> usize {
    let exponent = nextpow2(n) as i32 + pad;
    let padded = if exponent > 0 { 1usize << exponent } else { 1 };
    padded.max(n)
}

/// The non-negative frequency bins of an nfft-point transform restricted to a
/// pass-band, together with the parallel indices into the full FFT output.
#[derive(Debug, PartialEq, Clone)]
pub struct FrequencyGrid {
    freqs: Vec<f64>,
    indices: Vec<usize>,
    df: f64,
}

impl FrequencyGrid {
    /// Builds the grid for a sampling rate, transform length and pass-band.
    ///
    /// The full axis holds the `nfft/2 + 1` non-negative bins at spacing
    /// `fs/nfft`; only bins with `fpass.0 <= f <= fpass.1` are retained.
    /// A pass-band excluding every bin yields an empty grid, not an error.
    pub fn build(fs: f64, nfft: usize, fpass: (f64, f64)) -> Result<Self, SpectralError> {
        if fs <= 0.0 {
            return Err(SpectralError::InvalidParameter(
                "the sampling rate must be positive".to_string(),
            ));
        }
        if nfft == 0 {
            return Err(SpectralError::InvalidParameter(
                "the transform length must be positive".to_string(),
            ));
        }
        if fpass.0 > fpass.1 {
            return Err(SpectralError::InvalidParameter(format!(
                "the pass-band ({}, {}) is not ordered",
                fpass.0, fpass.1
            )));
        }

        let df = fs / nfft as f64;
        let (freqs, indices) = (0..=nfft / 2)
            .filter_map(|k| {
                let f = k as f64 * df;
                (f >= fpass.0 && f <= fpass.1).then_some((f, k))
            })
            .unzip();

        Ok(FrequencyGrid { freqs, indices, df })
    }

    /// Returns the retained frequency values in Hz.
    pub fn freqs(&self) -> &[f64] {
        &self.freqs[..]
    }

    /// Returns the indices of the retained bins in the full FFT output.
    pub fn indices(&self) -> &[usize] {
        &self.indices[..]
    }

    /// Returns the number of retained bins.
    pub fn len(&self) -> usize {
        self.freqs.len()
    }

    /// Returns true if the pass-band excluded every bin.
    pub fn is_empty(&self) -> bool {
        self.freqs.is_empty()
    }

    /// Returns the bin spacing `fs/nfft`.
    pub fn df(&self) -> f64 {
        self.df
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_nextpow2() {
        assert_eq!(nextpow2(1), 0);
        assert_eq!(nextpow2(2), 1);
        assert_eq!(nextpow2(3), 2);
        assert_eq!(nextpow2(500), 9);
        assert_eq!(nextpow2(512), 9);
        assert_eq!(nextpow2(513), 10);
    }

    #[test]
    fn test_nfft_length() {
        // For N = 500: no padding keeps 500, 0 pads to 512, 1 to 1024
        assert_eq!(nfft_length(500, -1), 500);
        assert_eq!(nfft_length(500, 0), 512);
        assert_eq!(nfft_length(500, 1), 1024);
        assert_eq!(nfft_length(512, 0), 512);
        assert_eq!(nfft_length(512, -1), 512);
        assert_eq!(nfft_length(1, 0), 1);
        assert_eq!(nfft_length(3, -2), 3);
    }

    #[test]
    fn test_full_grid() {
        let grid = FrequencyGrid::build(1000.0, 1024, (0.0, 500.0)).unwrap();
        assert_eq!(grid.len(), 513);
        assert_relative_eq!(grid.df(), 1000.0 / 1024.0);
        assert_relative_eq!(grid.freqs()[0], 0.0);
        assert_relative_eq!(grid.freqs()[512], 500.0);
        assert_eq!(grid.indices()[0], 0);
        assert_eq!(grid.indices()[512], 512);
    }

    #[test]
    fn test_band_restriction() {
        let grid = FrequencyGrid::build(1000.0, 1024, (100.0, 200.0)).unwrap();
        let df: f64 = 1000.0 / 1024.0;

        // floor(200/df) - ceil(100/df) + 1 bins, boundaries inclusive
        let expected = (200.0 / df).floor() as usize - (100.0 / df).ceil() as usize + 1;
        assert_eq!(grid.len(), expected);
        assert_eq!(grid.len(), 102);

        assert!(grid.freqs().iter().all(|&f| (100.0..=200.0).contains(&f)));
        assert!(grid.freqs()[0] - df < 100.0);
        assert!(grid.freqs()[grid.len() - 1] + df > 200.0);
        for (&f, &k) in grid.freqs().iter().zip(grid.indices()) {
            assert_relative_eq!(f, k as f64 * df);
        }
    }

    #[test]
    fn test_empty_band() {
        let grid = FrequencyGrid::build(1000.0, 1024, (600.0, 700.0)).unwrap();
        assert!(grid.is_empty());

        assert!(FrequencyGrid::build(1000.0, 1024, (200.0, 100.0)).is_err());
        assert!(FrequencyGrid::build(0.0, 1024, (0.0, 100.0)).is_err());
    }
}
