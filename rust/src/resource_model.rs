//! Resource-conditioned duration model.
//!
//! Maps an activity's composite resource score to a distribution over four
//! resource-state bins, looks up the conditional duration-category
//! distribution for the observed bin, and samples integer durations from a
//! triangular distribution parameterized by the posterior-weighted mode.
//!
//! The underlying model is a two-node discrete Bayesian network
//! (ResourceState -> DurationCategory); with evidence on the single parent,
//! exact inference reduces to normalizing one column of the conditional
//! table, so that is all this module does.

use rand::Rng;
use rand_distr::{Distribution, Triangular};
use thiserror::Error;

use crate::envelope::DurationEnvelope;

/// Number of resource-state bins.
pub const RESOURCE_STATE_COUNT: usize = 4;
/// Number of duration categories (near-min, near-likely, near-max).
pub const DURATION_CATEGORY_COUNT: usize = 3;

/// Upper thresholds of the resource-state bins over the [0, 100] score range.
const BIN_UPPER_BOUNDS: [f64; RESOURCE_STATE_COUNT] = [25.0, 50.0, 75.0, 100.0];

/// Errors from probability-table validation or sampling.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("The length of the resource marginal table does not match the number of resource states (expected 4, got {0})")]
    MarginalCardinality(usize),
    #[error("The duration table shape does not match 3 duration categories by 4 resource states (got {rows}x{cols})")]
    ConditionalShape { rows: usize, cols: usize },
    #[error("Duration probabilities for resource state {0} sum to zero")]
    DegeneratePosterior(&'static str),
    #[error("Triangular parameters are not ordered: min={min}, mode={mode}, max={max}")]
    InvalidTriangular { min: f64, mode: f64, max: f64 },
}

/// Discretized resource allocation level, one of four ordered bins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceState {
    Scarce,
    Limited,
    Adequate,
    Abundant,
}

impl ResourceState {
    pub const ALL: [ResourceState; RESOURCE_STATE_COUNT] = [
        ResourceState::Scarce,
        ResourceState::Limited,
        ResourceState::Adequate,
        ResourceState::Abundant,
    ];

    /// Column index of this state in the probability tables.
    pub fn index(self) -> usize {
        match self {
            ResourceState::Scarce => 0,
            ResourceState::Limited => 1,
            ResourceState::Adequate => 2,
            ResourceState::Abundant => 3,
        }
    }

    /// Display label for the bin's score range.
    pub fn label(self) -> &'static str {
        match self {
            ResourceState::Scarce => "0%-25%",
            ResourceState::Limited => "25%-50%",
            ResourceState::Adequate => "50%-75%",
            ResourceState::Abundant => "75%-100%",
        }
    }
}

/// Probability distribution over the four resource-state bins.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BinDistribution {
    pub probabilities: [f64; RESOURCE_STATE_COUNT],
}

impl BinDistribution {
    /// The most probable bin; ties break toward the lowest bin index.
    pub fn observed_state(&self) -> ResourceState {
        let mut best = 0;
        for bin in 1..RESOURCE_STATE_COUNT {
            if self.probabilities[bin] > self.probabilities[best] {
                best = bin;
            }
        }
        ResourceState::ALL[best]
    }
}

/// Spill a composite score across the four bins and normalize.
///
/// The bins fill monotonically: a score of 40 fills the first bin to its
/// width of 25 and spills 15 into the second, leaving the rest empty. A
/// score contributing nothing to any bin (<= 0) yields the uniform
/// no-information distribution.
pub fn bin_probabilities(score: f64) -> BinDistribution {
    let mut bin_scores = [0.0_f64; RESOURCE_STATE_COUNT];
    let mut lower = 0.0;
    for (bin, &upper) in BIN_UPPER_BOUNDS.iter().enumerate() {
        let width = upper - lower;
        bin_scores[bin] = (score - lower).max(0.0).min(width);
        lower = upper;
    }

    let total: f64 = bin_scores.iter().sum();
    let probabilities = if total > 0.0 {
        bin_scores.map(|s| s / total)
    } else {
        [1.0 / RESOURCE_STATE_COUNT as f64; RESOURCE_STATE_COUNT]
    };

    BinDistribution { probabilities }
}

/// Validated probability tables for the resource/duration model.
#[derive(Clone, Debug, PartialEq)]
pub struct DurationTables {
    resource_marginal: Vec<f64>,
    duration_given_resource: Vec<Vec<f64>>,
}

impl DurationTables {
    /// Validate table shapes: a 4-entry resource marginal and a 3x4
    /// conditional (duration categories by resource states).
    pub fn new(
        resource_marginal: Vec<f64>,
        duration_given_resource: Vec<Vec<f64>>,
    ) -> Result<Self, ModelError> {
        if resource_marginal.len() != RESOURCE_STATE_COUNT {
            return Err(ModelError::MarginalCardinality(resource_marginal.len()));
        }
        if duration_given_resource.len() != DURATION_CATEGORY_COUNT {
            return Err(ModelError::ConditionalShape {
                rows: duration_given_resource.len(),
                cols: duration_given_resource
                    .first()
                    .map(Vec::len)
                    .unwrap_or(0),
            });
        }
        for row in &duration_given_resource {
            if row.len() != RESOURCE_STATE_COUNT {
                return Err(ModelError::ConditionalShape {
                    rows: duration_given_resource.len(),
                    cols: row.len(),
                });
            }
        }
        Ok(Self {
            resource_marginal,
            duration_given_resource,
        })
    }

    /// The resource-state marginal table.
    pub fn resource_marginal(&self) -> &[f64] {
        &self.resource_marginal
    }

    /// Exact posterior over duration categories given an observed state:
    /// the conditional table's column for that state, normalized.
    pub fn posterior(
        &self,
        state: ResourceState,
    ) -> Result<[f64; DURATION_CATEGORY_COUNT], ModelError> {
        let col = state.index();
        let mut posterior = [0.0_f64; DURATION_CATEGORY_COUNT];
        for (category, row) in self.duration_given_resource.iter().enumerate() {
            posterior[category] = row[col];
        }

        let total: f64 = posterior.iter().sum();
        if total <= 0.0 {
            return Err(ModelError::DegeneratePosterior(state.label()));
        }
        for p in &mut posterior {
            *p /= total;
        }
        Ok(posterior)
    }
}

/// Posterior-weighted mode for triangular sampling, clamped into the envelope.
pub fn weighted_mode(
    posterior: &[f64; DURATION_CATEGORY_COUNT],
    envelope: &DurationEnvelope,
) -> f64 {
    let mode =
        posterior[0] * envelope.min + posterior[1] * envelope.likely + posterior[2] * envelope.max;
    mode.clamp(envelope.min, envelope.max)
}

/// Result of simulating one activity's durations for a batch.
#[derive(Clone, Debug)]
pub struct SimulatedDurations {
    /// One integer duration per trial.
    pub samples: Vec<i64>,
    /// The weighted mode actually used for sampling.
    pub mode: f64,
    /// The observed resource state used for inference.
    pub resource_state: ResourceState,
}

/// Run the full per-activity model: bin spillover, posterior lookup,
/// weighted mode, and `num_simulations` triangular draws.
pub fn simulate_durations<R: Rng>(
    tables: &DurationTables,
    envelope: &DurationEnvelope,
    score: f64,
    num_simulations: u32,
    rng: &mut R,
) -> Result<SimulatedDurations, ModelError> {
    let bins = bin_probabilities(score);
    let resource_state = bins.observed_state();
    let posterior = tables.posterior(resource_state)?;
    let mode = weighted_mode(&posterior, envelope);

    let triangular = Triangular::new(envelope.min, envelope.max, mode).map_err(|_| {
        ModelError::InvalidTriangular {
            min: envelope.min,
            mode,
            max: envelope.max,
        }
    })?;

    // Rounding is monotone, so the clamp only trims rounding past the
    // envelope edges.
    let min_i = envelope.min.round() as i64;
    let max_i = envelope.max.round() as i64;
    let samples = (0..num_simulations)
        .map(|_| (triangular.sample(rng).round() as i64).clamp(min_i, max_i))
        .collect();

    Ok(SimulatedDurations {
        samples,
        mode,
        resource_state,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn uniform_marginal() -> Vec<f64> {
        vec![0.25; 4]
    }

    fn tables(conditional: Vec<Vec<f64>>) -> DurationTables {
        DurationTables::new(uniform_marginal(), conditional).unwrap()
    }

    #[test]
    fn test_spillover_score_40() {
        let bins = bin_probabilities(40.0);
        let expected = [0.625, 0.375, 0.0, 0.0];
        for (p, e) in bins.probabilities.iter().zip(expected.iter()) {
            assert!((p - e).abs() < 1e-12);
        }
        assert_eq!(bins.observed_state(), ResourceState::Scarce);
    }

    #[test]
    fn test_spillover_sums_to_one() {
        for score in [0.0, 0.5, 12.5, 25.0, 40.0, 60.0, 75.0, 99.9, 100.0, 130.0] {
            let bins = bin_probabilities(score);
            let total: f64 = bins.probabilities.iter().sum();
            assert!((total - 1.0).abs() < 1e-9, "score {score}");
        }
    }

    #[test]
    fn test_zero_score_falls_back_to_uniform() {
        for score in [0.0, -5.0] {
            let bins = bin_probabilities(score);
            for p in bins.probabilities {
                assert!((p - 0.25).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_full_score_fills_all_bins() {
        let bins = bin_probabilities(100.0);
        for p in bins.probabilities {
            assert!((p - 0.25).abs() < 1e-12);
        }
        // All bins tie, so the observation breaks toward the lowest bin.
        assert_eq!(bins.observed_state(), ResourceState::Scarce);
    }

    #[test]
    fn test_observed_state_tracks_spill_front() {
        assert_eq!(bin_probabilities(30.0).observed_state(), ResourceState::Scarce);
        assert_eq!(bin_probabilities(60.0).observed_state(), ResourceState::Scarce);
        // Past 75 the first three bins are full and tied; the spill into the
        // last bin cannot exceed them, so the lowest full bin wins.
        assert_eq!(bin_probabilities(90.0).observed_state(), ResourceState::Scarce);
    }

    #[test]
    fn test_marginal_cardinality_rejected() {
        let result = DurationTables::new(vec![0.5, 0.5], vec![vec![0.25; 4]; 3]);
        assert_eq!(result.unwrap_err(), ModelError::MarginalCardinality(2));
    }

    #[test]
    fn test_conditional_shape_rejected() {
        let result = DurationTables::new(uniform_marginal(), vec![vec![0.25; 4]; 2]);
        assert_eq!(
            result.unwrap_err(),
            ModelError::ConditionalShape { rows: 2, cols: 4 }
        );

        let ragged = vec![vec![0.25; 4], vec![0.25; 3], vec![0.25; 4]];
        let result = DurationTables::new(uniform_marginal(), ragged);
        assert_eq!(
            result.unwrap_err(),
            ModelError::ConditionalShape { rows: 3, cols: 3 }
        );
    }

    #[test]
    fn test_posterior_reads_and_normalizes_column() {
        let t = tables(vec![
            vec![0.6, 0.1, 0.1, 0.1],
            vec![0.3, 0.4, 0.2, 0.3],
            vec![0.1, 0.5, 0.7, 0.6],
        ]);

        let posterior = t.posterior(ResourceState::Scarce).unwrap();
        assert!((posterior[0] - 0.6).abs() < 1e-12);
        assert!((posterior[1] - 0.3).abs() < 1e-12);
        assert!((posterior[2] - 0.1).abs() < 1e-12);

        // An unnormalized column comes back normalized.
        let t = tables(vec![
            vec![2.0, 0.0, 0.0, 0.0],
            vec![1.0, 0.0, 0.0, 0.0],
            vec![1.0, 1.0, 1.0, 1.0],
        ]);
        let posterior = t.posterior(ResourceState::Scarce).unwrap();
        assert!((posterior[0] - 0.5).abs() < 1e-12);
        assert!((posterior[1] - 0.25).abs() < 1e-12);
        assert!((posterior[2] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_zero_column_rejected() {
        let t = tables(vec![
            vec![0.0, 0.5, 0.5, 0.5],
            vec![0.0, 0.3, 0.3, 0.3],
            vec![0.0, 0.2, 0.2, 0.2],
        ]);
        assert_eq!(
            t.posterior(ResourceState::Scarce).unwrap_err(),
            ModelError::DegeneratePosterior("0%-25%")
        );
    }

    #[test]
    fn test_weighted_mode_stays_in_envelope() {
        let envelope = DurationEnvelope {
            min: 2.0,
            likely: 5.0,
            max: 12.0,
        };

        let mode = weighted_mode(&[1.0, 0.0, 0.0], &envelope);
        assert!((mode - 2.0).abs() < 1e-12);

        let mode = weighted_mode(&[0.0, 0.0, 1.0], &envelope);
        assert!((mode - 12.0).abs() < 1e-12);

        let mode = weighted_mode(&[0.2, 0.5, 0.3], &envelope);
        assert!(mode >= envelope.min && mode <= envelope.max);
    }

    #[test]
    fn test_samples_stay_in_bounds() {
        let t = tables(vec![
            vec![0.6, 0.4, 0.2, 0.1],
            vec![0.3, 0.4, 0.5, 0.3],
            vec![0.1, 0.2, 0.3, 0.6],
        ]);
        let envelope = DurationEnvelope {
            min: 2.4,
            likely: 5.0,
            max: 11.7,
        };
        let mut rng = ChaCha20Rng::seed_from_u64(13);

        let simulated = simulate_durations(&t, &envelope, 40.0, 10_000, &mut rng).unwrap();
        assert_eq!(simulated.samples.len(), 10_000);
        assert_eq!(simulated.resource_state, ResourceState::Scarce);
        assert!(simulated.mode >= envelope.min && simulated.mode <= envelope.max);

        let min_i = envelope.min.round() as i64;
        let max_i = envelope.max.round() as i64;
        for &sample in &simulated.samples {
            assert!(sample >= min_i && sample <= max_i);
        }
    }

    #[test]
    fn test_sampling_is_seed_deterministic() {
        let t = tables(vec![
            vec![0.5, 0.25, 0.2, 0.1],
            vec![0.3, 0.5, 0.3, 0.3],
            vec![0.2, 0.25, 0.5, 0.6],
        ]);
        let envelope = DurationEnvelope {
            min: 1.0,
            likely: 4.0,
            max: 9.0,
        };

        let mut rng_a = ChaCha20Rng::seed_from_u64(99);
        let mut rng_b = ChaCha20Rng::seed_from_u64(99);
        let a = simulate_durations(&t, &envelope, 55.0, 100, &mut rng_a).unwrap();
        let b = simulate_durations(&t, &envelope, 55.0, 100, &mut rng_b).unwrap();
        assert_eq!(a.samples, b.samples);
    }
}
