//! Duration envelope generation.
//!
//! Each activity gets one `(min, likely, max)` envelope per batch, drawn by
//! successive truncated-normal draws with floor adjustment so the strict
//! ordering `min < likely < max` always holds.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use thiserror::Error;

/// Errors from envelope parameter validation or drawing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnvelopeError {
    #[error("Envelope scale parameters must be positive, got {0}")]
    InvalidScale(f64),
    #[error("Envelope separation must be positive, got {0}")]
    InvalidSeparation(f64),
    #[error("Envelope duration cap must be positive, got {0}")]
    InvalidCap(f64),
}

/// Bounds for triangular duration sampling, `min < likely < max`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DurationEnvelope {
    pub min: f64,
    pub likely: f64,
    pub max: f64,
}

/// Parameters of the three truncated-normal envelope draws.
#[derive(Clone, Debug)]
pub struct EnvelopeParams {
    pub min_loc: f64,
    pub min_scale: f64,
    pub likely_loc: f64,
    pub likely_scale: f64,
    pub max_loc: f64,
    pub max_scale: f64,
    /// Upper bound shared by all three draws.
    pub duration_cap: f64,
    /// Spacing enforced between min/likely and likely/max.
    pub separation: f64,
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        Self {
            min_loc: 2.0,
            min_scale: 2.0,
            likely_loc: 5.0,
            likely_scale: 2.0,
            max_loc: 10.0,
            max_scale: 5.0,
            duration_cap: 15.0,
            separation: 1.0,
        }
    }
}

impl EnvelopeParams {
    /// Reject parameter sets that cannot produce a valid ordered envelope.
    pub fn validate(&self) -> Result<(), EnvelopeError> {
        for scale in [self.min_scale, self.likely_scale, self.max_scale] {
            if !scale.is_finite() || scale <= 0.0 {
                return Err(EnvelopeError::InvalidScale(scale));
            }
        }
        if !self.separation.is_finite() || self.separation <= 0.0 {
            return Err(EnvelopeError::InvalidSeparation(self.separation));
        }
        if !self.duration_cap.is_finite() || self.duration_cap <= 0.0 {
            return Err(EnvelopeError::InvalidCap(self.duration_cap));
        }
        Ok(())
    }
}

const MAX_REJECTION_DRAWS: usize = 64;

/// One normal draw truncated to `[lo, hi]` by rejection.
///
/// When the window sits far in the tail the rejection loop gives up and
/// clamps the distribution mean instead; when the window is empty
/// (`lo >= hi`) the lower bound wins, which is the floor adjustment that
/// keeps envelopes ordered near the duration cap.
fn truncated_normal<R: Rng>(
    rng: &mut R,
    loc: f64,
    scale: f64,
    lo: f64,
    hi: f64,
) -> Result<f64, EnvelopeError> {
    if lo >= hi {
        return Ok(lo);
    }
    let normal = Normal::new(loc, scale).map_err(|_| EnvelopeError::InvalidScale(scale))?;
    for _ in 0..MAX_REJECTION_DRAWS {
        let value = normal.sample(rng);
        if value >= lo && value <= hi {
            return Ok(value);
        }
    }
    Ok(loc.clamp(lo, hi))
}

/// Draw one ordered duration envelope.
pub fn draw_envelope<R: Rng>(
    params: &EnvelopeParams,
    rng: &mut R,
) -> Result<DurationEnvelope, EnvelopeError> {
    let min = truncated_normal(rng, params.min_loc, params.min_scale, 0.0, params.duration_cap)?;

    let likely_floor = min + params.separation;
    let likely = truncated_normal(
        rng,
        params.likely_loc,
        params.likely_scale,
        likely_floor,
        params.duration_cap,
    )?
    .max(likely_floor);

    let max_floor = likely + params.separation;
    let max = truncated_normal(
        rng,
        params.max_loc,
        params.max_scale,
        max_floor,
        params.duration_cap,
    )?
    .max(max_floor);

    Ok(DurationEnvelope { min, likely, max })
}
