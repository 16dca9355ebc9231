//! Module implementing spike trains and multi-trial collections thereof.

use itertools::{Itertools, MinMaxResult};
use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use rand_distr::Poisson;
use serde::{Deserialize, Serialize};

use crate::error::SpectralError;

/// The event times of a single trial or channel, in seconds.
///
/// The times need not be sorted; duplicates are permitted and counted.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SpikeTrain {
    times: Vec<f64>,
}

impl SpikeTrain {
    /// Create a spike train from the provided event times.
    /// The function returns an error for non-finite times.
    pub fn build(times: Vec<f64>) -> Result<Self, SpectralError> {
        if times.iter().any(|t| !t.is_finite()) {
            return Err(SpectralError::InvalidTimes);
        }
        Ok(SpikeTrain { times })
    }

    /// Returns the event times of the spike train.
    pub fn times(&self) -> &[f64] {
        &self.times[..]
    }

    /// Returns the number of events in the spike train.
    pub fn num_events(&self) -> usize {
        self.times.len()
    }

    /// Returns true if the spike train contains no events.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// An indexable collection of spike trains, one per trial or channel.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SpikeTrainSet {
    trains: Vec<SpikeTrain>,
}

impl SpikeTrainSet {
    /// Create a collection from already validated spike trains.
    pub fn new(trains: Vec<SpikeTrain>) -> Self {
        SpikeTrainSet { trains }
    }

    /// Create a collection from raw event times, one vector per trial.
    /// The function returns an error for non-finite times.
    pub fn from_times(times: Vec<Vec<f64>>) -> Result<Self, SpectralError> {
        let trains = times
            .into_iter()
            .map(SpikeTrain::build)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SpikeTrainSet { trains })
    }

    /// Returns the number of trials in the collection.
    pub fn num_trials(&self) -> usize {
        self.trains.len()
    }

    /// Returns the spike trains of the collection.
    pub fn trains(&self) -> &[SpikeTrain] {
        &self.trains[..]
    }

    /// Returns the global time range (min, max) over the events of all trials,
    /// or None if no trial contains any event.
    pub fn range(&self) -> Option<(f64, f64)> {
        match self
            .trains
            .iter()
            .flat_map(|train| train.times().iter().copied())
            .minmax()
        {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(t) => Some((t, t)),
            MinMaxResult::MinMax(tmin, tmax) => Some((tmin, tmax)),
        }
    }

    /// Returns a new collection restricted to the events in [tmin, tmax] (inclusive).
    pub fn subrange(&self, tmin: f64, tmax: f64) -> Self {
        let trains = self
            .trains
            .iter()
            .map(|train| SpikeTrain {
                times: train
                    .times()
                    .iter()
                    .copied()
                    .filter(|&t| t >= tmin && t <= tmax)
                    .collect(),
            })
            .collect();
        SpikeTrainSet { trains }
    }

    /// Returns a new collection with every event time shifted by the given offset.
    pub fn shifted(&self, offset: f64) -> Self {
        let trains = self
            .trains
            .iter()
            .map(|train| SpikeTrain {
                times: train.times().iter().map(|t| t + offset).collect(),
            })
            .collect();
        SpikeTrainSet { trains }
    }

    /// Samples a collection of homogeneous Poisson spike trains.
    ///
    /// # Parameters
    /// - `num_trials`: The number of trials to sample.
    /// - `duration`: The trial duration in seconds; events fall in [0, duration).
    /// - `rate`: The mean firing rate in events per second.
    /// - `rng`: A mutable reference to a random number generator implementing the `Rng` trait.
    ///
    /// # Returns
    /// A collection with `num_trials` trials, each holding sorted event times.
    pub fn rand<R: Rng>(
        num_trials: usize,
        duration: f64,
        rate: f64,
        rng: &mut R,
    ) -> Result<Self, SpectralError> {
        if duration <= 0.0 {
            return Err(SpectralError::InvalidParameter(
                "the trial duration must be positive".to_string(),
            ));
        }
        if rate < 0.0 {
            return Err(SpectralError::InvalidParameter(
                "the firing rate must be non-negative".to_string(),
            ));
        }

        let uniform = Uniform::new(0.0, duration);
        let mut trains = Vec::with_capacity(num_trials);
        for _ in 0..num_trials {
            let num_events = if rate > 0.0 {
                let poisson = Poisson::new(rate * duration)
                    .map_err(|e| SpectralError::InvalidParameter(e.to_string()))?;
                poisson.sample(rng) as usize
            } else {
                0
            };
            let mut times: Vec<f64> = (0..num_events).map(|_| uniform.sample(rng)).collect();
            times.sort_by(|t1, t2| {
                t1.partial_cmp(t2)
                    .expect("Problem with sorting the sampled event times.")
            });
            trains.push(SpikeTrain { times });
        }

        Ok(SpikeTrainSet { trains })
    }
}

impl std::ops::Index<usize> for SpikeTrainSet {
    type Output = SpikeTrain;

    fn index(&self, index: usize) -> &Self::Output {
        &self.trains[index]
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    const SEED: u64 = 42;

    #[test]
    fn test_spike_train_build() {
        let train = SpikeTrain::build(vec![0.5, 0.2, 1.0]).unwrap();
        assert_eq!(train.times(), &[0.5, 0.2, 1.0]);
        assert_eq!(train.num_events(), 3);

        let train = SpikeTrain::build(vec![]).unwrap();
        assert!(train.is_empty());

        assert_eq!(
            SpikeTrain::build(vec![0.0, f64::NAN]),
            Err(SpectralError::InvalidTimes)
        );
        assert_eq!(
            SpikeTrain::build(vec![f64::INFINITY]),
            Err(SpectralError::InvalidTimes)
        );
    }

    #[test]
    fn test_spike_train_set_range() {
        let set = SpikeTrainSet::from_times(vec![vec![], vec![]]).unwrap();
        assert_eq!(set.range(), None);

        let set = SpikeTrainSet::from_times(vec![vec![1.5], vec![]]).unwrap();
        assert_eq!(set.range(), Some((1.5, 1.5)));

        let set = SpikeTrainSet::from_times(vec![vec![0.7, 0.1], vec![2.3], vec![]]).unwrap();
        assert_eq!(set.range(), Some((0.1, 2.3)));
        assert_eq!(set.num_trials(), 3);
    }

    #[test]
    fn test_spike_train_set_subrange() {
        let set = SpikeTrainSet::from_times(vec![vec![0.1, 0.5, 1.2, 2.0], vec![0.4]]).unwrap();

        let sub = set.subrange(0.5, 2.0);
        assert_eq!(sub[0].times(), &[0.5, 1.2, 2.0]);
        assert_eq!(sub[1].times(), &[] as &[f64]);

        let shifted = sub.shifted(-0.5);
        assert_eq!(shifted[0].times(), &[0.0, 0.7, 1.5]);
    }

    #[test]
    fn test_spike_train_set_rand() {
        let mut rng = StdRng::seed_from_u64(SEED);

        assert_eq!(
            SpikeTrainSet::rand(5, -1.0, 1.0, &mut rng),
            Err(SpectralError::InvalidParameter(
                "the trial duration must be positive".to_string()
            ))
        );
        assert_eq!(
            SpikeTrainSet::rand(5, 1.0, -1.0, &mut rng),
            Err(SpectralError::InvalidParameter(
                "the firing rate must be non-negative".to_string()
            ))
        );

        let set = SpikeTrainSet::rand(20, 10.0, 5.0, &mut rng).unwrap();
        assert_eq!(set.num_trials(), 20);

        // All sampled events fall in [0, duration) and are sorted
        for train in set.trains() {
            assert!(train.times().iter().all(|&t| (0.0..10.0).contains(&t)));
            assert!(train.times().windows(2).all(|ts| ts[0] <= ts[1]));
        }

        // The empirical rate is close to the requested one
        let total: usize = set.trains().iter().map(|train| train.num_events()).sum();
        let empirical = total as f64 / (20.0 * 10.0);
        assert!((empirical - 5.0).abs() < 0.5);

        // Zero rate produces empty trials
        let set = SpikeTrainSet::rand(3, 10.0, 0.0, &mut rng).unwrap();
        assert!(set.trains().iter().all(|train| train.is_empty()));
    }
}
