//! Configuration types for the simulation engine.

use pyo3::prelude::*;

use crate::envelope::EnvelopeParams;

/// Batch-level simulation configuration.
#[pyclass]
#[derive(Clone, Debug)]
pub struct SimulationConfig {
    /// RNG seed for reproducible batches (None = seed from OS entropy).
    #[pyo3(get, set)]
    pub seed: Option<u64>,
    /// Verbosity level: 0=silent, 1=batch, 2=trials, 3=debug.
    #[pyo3(get, set)]
    pub verbosity: u8,
    /// Center of the truncated-normal draw for the envelope minimum.
    #[pyo3(get, set)]
    pub min_loc: f64,
    /// Spread of the envelope-minimum draw.
    #[pyo3(get, set)]
    pub min_scale: f64,
    /// Center of the envelope most-likely draw.
    #[pyo3(get, set)]
    pub likely_loc: f64,
    /// Spread of the envelope most-likely draw.
    #[pyo3(get, set)]
    pub likely_scale: f64,
    /// Center of the envelope maximum draw.
    #[pyo3(get, set)]
    pub max_loc: f64,
    /// Spread of the envelope maximum draw.
    #[pyo3(get, set)]
    pub max_scale: f64,
    /// Upper bound on all envelope draws.
    #[pyo3(get, set)]
    pub duration_cap: f64,
    /// Spacing enforced between min/likely and likely/max.
    #[pyo3(get, set)]
    pub separation: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let envelope = EnvelopeParams::default();
        Self {
            seed: None,
            verbosity: 0,
            min_loc: envelope.min_loc,
            min_scale: envelope.min_scale,
            likely_loc: envelope.likely_loc,
            likely_scale: envelope.likely_scale,
            max_loc: envelope.max_loc,
            max_scale: envelope.max_scale,
            duration_cap: envelope.duration_cap,
            separation: envelope.separation,
        }
    }
}

#[pymethods]
impl SimulationConfig {
    #[new]
    #[pyo3(signature = (
        seed=None,
        verbosity=None,
        min_loc=None,
        min_scale=None,
        likely_loc=None,
        likely_scale=None,
        max_loc=None,
        max_scale=None,
        duration_cap=None,
        separation=None
    ))]
    #[allow(clippy::too_many_arguments)]
    fn py_new(
        seed: Option<u64>,
        verbosity: Option<u8>,
        min_loc: Option<f64>,
        min_scale: Option<f64>,
        likely_loc: Option<f64>,
        likely_scale: Option<f64>,
        max_loc: Option<f64>,
        max_scale: Option<f64>,
        duration_cap: Option<f64>,
        separation: Option<f64>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            seed,
            verbosity: verbosity.unwrap_or(defaults.verbosity),
            min_loc: min_loc.unwrap_or(defaults.min_loc),
            min_scale: min_scale.unwrap_or(defaults.min_scale),
            likely_loc: likely_loc.unwrap_or(defaults.likely_loc),
            likely_scale: likely_scale.unwrap_or(defaults.likely_scale),
            max_loc: max_loc.unwrap_or(defaults.max_loc),
            max_scale: max_scale.unwrap_or(defaults.max_scale),
            duration_cap: duration_cap.unwrap_or(defaults.duration_cap),
            separation: separation.unwrap_or(defaults.separation),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "SimulationConfig(seed={:?}, verbosity={}, duration_cap={})",
            self.seed, self.verbosity, self.duration_cap
        )
    }
}

impl SimulationConfig {
    /// Extract the envelope-draw parameters as a separate struct.
    pub fn envelope_params(&self) -> EnvelopeParams {
        EnvelopeParams {
            min_loc: self.min_loc,
            min_scale: self.min_scale,
            likely_loc: self.likely_loc,
            likely_scale: self.likely_scale,
            max_loc: self.max_loc,
            max_scale: self.max_scale,
            duration_cap: self.duration_cap,
            separation: self.separation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = SimulationConfig::default();
        assert_eq!(config.seed, None);
        assert_eq!(config.verbosity, 0);
        assert!((config.min_loc - 2.0).abs() < 1e-9);
        assert!((config.likely_loc - 5.0).abs() < 1e-9);
        assert!((config.max_loc - 10.0).abs() < 1e-9);
        assert!((config.duration_cap - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_envelope_params_extraction() {
        let mut config = SimulationConfig::default();
        config.max_scale = 7.5;
        let params = config.envelope_params();
        assert!((params.max_scale - 7.5).abs() < 1e-9);
        assert!((params.separation - 1.0).abs() < 1e-9);
    }
}
