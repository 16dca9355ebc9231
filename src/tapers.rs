//! Module implementing the discrete prolate spheroidal (Slepian) taper bank.

use log::warn;
use nalgebra::DMatrix;

use crate::error::SpectralError;
use crate::DEFAULT_NUM_TAPERS;

/// A bank of K orthogonal tapers of length N, each with unit energy.
///
/// Depends only on (N, time-bandwidth product, K); safe to compute once and
/// reuse across trials sharing the same grid length.
#[derive(Debug, PartialEq, Clone)]
pub struct Tapers {
    values: DMatrix<f64>,
    time_bandwidth: f64,
}

impl Tapers {
    /// Computes the K most concentrated discrete prolate spheroidal sequences
    /// of length `num_samples` with time-bandwidth product `nw`.
    ///
    /// The tapers are the leading eigenvectors of the symmetric tridiagonal
    /// Slepian matrix, normalized to unit energy. Sign convention: even-order
    /// tapers have a positive mean, odd-order tapers a positive first lobe.
    /// Identical inputs always yield bit-identical matrices.
    pub fn dpss(num_samples: usize, nw: f64, num_tapers: usize) -> Result<Self, SpectralError> {
        if num_samples == 0 {
            return Err(SpectralError::InvalidParameter(
                "the taper length must be positive".to_string(),
            ));
        }
        if nw <= 0.0 {
            return Err(SpectralError::InvalidParameter(
                "the time-bandwidth product must be positive".to_string(),
            ));
        }
        if num_tapers == 0 {
            return Err(SpectralError::InvalidParameter(
                "at least one taper is required".to_string(),
            ));
        }
        if num_tapers > num_samples {
            return Err(SpectralError::InvalidParameter(format!(
                "cannot compute {} tapers of length {}",
                num_tapers, num_samples
            )));
        }
        if num_tapers as f64 > 2.0 * nw - 1.0 {
            warn!(
                "{} tapers exceed the well-concentrated bound 2*NW-1 = {}",
                num_tapers,
                2.0 * nw - 1.0
            );
        }

        let n = num_samples;
        let half_bandwidth = nw / n as f64;
        let cos_bw = (2.0 * std::f64::consts::PI * half_bandwidth).cos();

        // Symmetric tridiagonal Slepian matrix; its eigenvectors are the
        // tapers, ordered by decreasing spectral concentration.
        // TODO: switch to a dedicated tridiagonal eigensolver for long grids.
        let mut slepian = DMatrix::zeros(n, n);
        for i in 0..n {
            let x = (n as f64 - 1.0 - 2.0 * i as f64) / 2.0;
            slepian[(i, i)] = x * x * cos_bw;
            if i + 1 < n {
                let off = ((i + 1) * (n - i - 1)) as f64 / 2.0;
                slepian[(i, i + 1)] = off;
                slepian[(i + 1, i)] = off;
            }
        }
        let eigen = slepian.symmetric_eigen();

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            eigen.eigenvalues[b]
                .partial_cmp(&eigen.eigenvalues[a])
                .expect("Problem with sorting the Slepian eigenvalues.")
        });

        let lobe_threshold = 1e-7_f64.max(1.0 / n as f64);
        let mut values = DMatrix::zeros(n, num_tapers);
        for (k, &idx) in order.iter().take(num_tapers).enumerate() {
            let mut taper = eigen.eigenvectors.column(idx).clone_owned();
            let flip = if k % 2 == 0 {
                taper.sum() < 0.0
            } else {
                taper
                    .iter()
                    .find(|x| x.abs() > lobe_threshold)
                    .is_some_and(|&x| x < 0.0)
            };
            if flip {
                taper.neg_mut();
            }
            values.set_column(k, &taper);
        }

        Ok(Tapers {
            values,
            time_bandwidth: nw,
        })
    }

    /// Returns the taper matrix, one column per taper.
    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    /// Returns the taper length N.
    pub fn len(&self) -> usize {
        self.values.nrows()
    }

    /// Returns true if the bank holds no samples.
    pub fn is_empty(&self) -> bool {
        self.values.nrows() == 0
    }

    /// Returns the number of tapers K.
    pub fn count(&self) -> usize {
        self.values.ncols()
    }

    /// Returns the time-bandwidth product the bank was designed for.
    pub fn time_bandwidth(&self) -> f64 {
        self.time_bandwidth
    }
}

/// Taper selection: either a count to compute or a precomputed bank to reuse.
#[derive(Debug, PartialEq, Clone)]
pub enum TaperSpec {
    /// Compute this many tapers on the resolved time grid.
    Count(usize),
    /// Use the provided bank unchanged; its length must match the grid.
    Precomputed(Tapers),
}

impl Default for TaperSpec {
    fn default() -> Self {
        TaperSpec::Count(DEFAULT_NUM_TAPERS)
    }
}

impl TaperSpec {
    /// Resolves the specification against a grid of `num_samples` points,
    /// computing tapers when only a count was supplied.
    pub fn resolve(&self, num_samples: usize, nw: f64) -> Result<Tapers, SpectralError> {
        match self {
            TaperSpec::Count(k) => Tapers::dpss(num_samples, nw, *k),
            TaperSpec::Precomputed(tapers) => {
                if tapers.len() != num_samples {
                    return Err(SpectralError::DimensionMismatch(format!(
                        "precomputed tapers have length {} but the time grid has {} samples",
                        tapers.len(),
                        num_samples
                    )));
                }
                Ok(tapers.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_dpss_invalid_parameters() {
        assert!(Tapers::dpss(0, 3.0, 5).is_err());
        assert!(Tapers::dpss(64, 0.0, 5).is_err());
        assert!(Tapers::dpss(64, 3.0, 0).is_err());
        assert!(Tapers::dpss(4, 3.0, 5).is_err());
    }

    #[test]
    fn test_dpss_shape_and_energy() {
        let tapers = Tapers::dpss(128, 3.0, 5).unwrap();
        assert_eq!(tapers.len(), 128);
        assert_eq!(tapers.count(), 5);
        assert_relative_eq!(tapers.time_bandwidth(), 3.0);

        // Unit energy per taper
        for k in 0..5 {
            let energy: f64 = tapers.values().column(k).iter().map(|v| v * v).sum();
            assert_relative_eq!(energy, 1.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_dpss_orthonormality() {
        let tapers = Tapers::dpss(96, 3.0, 5).unwrap();
        let gram = tapers.values().transpose() * tapers.values();
        for i in 0..5 {
            for j in 0..5 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(gram[(i, j)], expected, epsilon = 1e-8);
            }
        }
    }

    #[test]
    fn test_dpss_sign_convention() {
        let tapers = Tapers::dpss(64, 3.0, 4).unwrap();

        // Even-order tapers have a positive mean, and the leading taper is
        // a single positive lobe
        assert!(tapers.values().column(0).sum() > 0.0);
        assert!(tapers.values().column(2).sum() > 0.0);
        assert!(tapers.values().column(0).iter().all(|&v| v > -1e-12));

        // Odd-order tapers integrate to zero but start positive
        let first = tapers
            .values()
            .column(1)
            .iter()
            .copied()
            .find(|v| v.abs() > 1e-7_f64.max(1.0 / 64.0))
            .unwrap();
        assert!(first > 0.0);
    }

    #[test]
    fn test_dpss_determinism() {
        let a = Tapers::dpss(256, 3.0, 5).unwrap();
        let b = Tapers::dpss(256, 3.0, 5).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_taper_spec_resolve() {
        let spec = TaperSpec::default();
        let tapers = spec.resolve(64, 3.0).unwrap();
        assert_eq!(tapers.count(), DEFAULT_NUM_TAPERS);

        let precomputed = TaperSpec::Precomputed(tapers.clone());
        assert_eq!(precomputed.resolve(64, 3.0).unwrap(), tapers);
        assert!(matches!(
            precomputed.resolve(65, 3.0),
            Err(SpectralError::DimensionMismatch(_))
        ));
    }
}
