//! Composite resource scoring strategies.
//!
//! Each activity weighs its people/cost/technology allocation differently;
//! the registry maps activity names to their strategy and is checked for
//! full coverage before a batch starts sampling.

use pyo3::prelude::*;
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Errors from scoring-strategy lookup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScoringError {
    #[error("No scoring function defined for activity '{0}'")]
    MissingStrategy(String),
}

/// A composite scoring strategy over a resource allocation.
pub trait ScoreFunction: Send + Sync + std::fmt::Debug {
    /// Composite score for a `(people, cost, tech)` allocation.
    ///
    /// Expected (not guaranteed) to land in [0, 100] when the inputs do.
    fn score(&self, people: f64, cost: f64, tech: f64) -> f64;
}

/// Linear blend of the three resource inputs.
#[pyclass]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeightedScore {
    #[pyo3(get, set)]
    pub people_weight: f64,
    #[pyo3(get, set)]
    pub cost_weight: f64,
    #[pyo3(get, set)]
    pub tech_weight: f64,
}

#[pymethods]
impl WeightedScore {
    #[new]
    #[pyo3(signature = (people_weight=1.0, cost_weight=1.0, tech_weight=1.0))]
    fn new(people_weight: f64, cost_weight: f64, tech_weight: f64) -> Self {
        Self {
            people_weight,
            cost_weight,
            tech_weight,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "WeightedScore(people_weight={}, cost_weight={}, tech_weight={})",
            self.people_weight, self.cost_weight, self.tech_weight
        )
    }
}

impl ScoreFunction for WeightedScore {
    fn score(&self, people: f64, cost: f64, tech: f64) -> f64 {
        self.people_weight * people + self.cost_weight * cost + self.tech_weight * tech
    }
}

/// Activity name -> scoring strategy lookup.
#[derive(Default)]
pub struct ScoreRegistry {
    strategies: FxHashMap<String, Box<dyn ScoreFunction>>,
}

impl ScoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the strategy for an activity.
    pub fn register(&mut self, activity: impl Into<String>, strategy: Box<dyn ScoreFunction>) {
        self.strategies.insert(activity.into(), strategy);
    }

    /// Strategy for an activity.
    pub fn get(&self, activity: &str) -> Result<&dyn ScoreFunction, ScoringError> {
        self.strategies
            .get(activity)
            .map(|strategy| strategy.as_ref())
            .ok_or_else(|| ScoringError::MissingStrategy(activity.to_string()))
    }

    /// Check that every activity has a registered strategy.
    pub fn validate_coverage<'a>(
        &self,
        activities: impl Iterator<Item = &'a str>,
    ) -> Result<(), ScoringError> {
        for activity in activities {
            if !self.strategies.contains_key(activity) {
                return Err(ScoringError::MissingStrategy(activity.to_string()));
            }
        }
        Ok(())
    }

    /// Number of registered strategies.
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}
