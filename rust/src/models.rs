//! Boundary data types for the simulation engine.

use pyo3::prelude::*;
use std::collections::HashMap;

// Note: We use std HashMap here for PyO3 interface compatibility

/// A single activity's resource allocation, each input in [0, 100].
#[pyclass]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResourceAllocation {
    #[pyo3(get, set)]
    pub people: f64,
    #[pyo3(get, set)]
    pub cost: f64,
    #[pyo3(get, set)]
    pub tech: f64,
}

#[pymethods]
impl ResourceAllocation {
    #[new]
    fn new(people: f64, cost: f64, tech: f64) -> Self {
        Self { people, cost, tech }
    }

    fn __repr__(&self) -> String {
        format!(
            "ResourceAllocation(people={}, cost={}, tech={})",
            self.people, self.cost, self.tech
        )
    }
}

/// Aggregate simulation result for one activity.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct SummaryRow {
    #[pyo3(get, set)]
    pub activity: String,
    /// Number of trials in which the activity had zero total float.
    #[pyo3(get, set)]
    pub criticality: u32,
    /// Mean total float across trials, unscaled.
    #[pyo3(get, set)]
    pub mean_total_float: f64,
    #[pyo3(get, set)]
    pub min_duration: i64,
    /// The weighted mode actually used for triangular sampling.
    #[pyo3(get, set)]
    pub most_likely_duration: i64,
    #[pyo3(get, set)]
    pub max_duration: i64,
}

#[pymethods]
impl SummaryRow {
    #[new]
    fn new(
        activity: String,
        criticality: u32,
        mean_total_float: f64,
        min_duration: i64,
        most_likely_duration: i64,
        max_duration: i64,
    ) -> Self {
        Self {
            activity,
            criticality,
            mean_total_float,
            min_duration,
            most_likely_duration,
            max_duration,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "SummaryRow(activity={:?}, criticality={}, mean_total_float={:.3}, durations=({}, {}, {}))",
            self.activity,
            self.criticality,
            self.mean_total_float,
            self.min_duration,
            self.most_likely_duration,
            self.max_duration
        )
    }
}

/// Finished result of one simulation batch.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationSummary {
    /// One row per activity, in sorted activity-name order.
    #[pyo3(get)]
    pub rows: Vec<SummaryRow>,
    /// Number of Monte Carlo trials that produced the rows.
    #[pyo3(get)]
    pub num_trials: u32,
    /// The `activity -> predecessors` mapping, for diagram rendering.
    #[pyo3(get)]
    pub predecessors: HashMap<String, Vec<String>>,
}

#[pymethods]
impl SimulationSummary {
    #[new]
    #[pyo3(signature = (rows, num_trials, predecessors=None))]
    fn new(
        rows: Vec<SummaryRow>,
        num_trials: u32,
        predecessors: Option<HashMap<String, Vec<String>>>,
    ) -> Self {
        Self {
            rows,
            num_trials,
            predecessors: predecessors.unwrap_or_default(),
        }
    }

    /// The `activity -> criticality` mapping, for diagram annotation.
    pub(crate) fn criticality_by_activity(&self) -> HashMap<String, u32> {
        self.rows
            .iter()
            .map(|row| (row.activity.clone(), row.criticality))
            .collect()
    }

    fn __len__(&self) -> usize {
        self.rows.len()
    }

    fn __repr__(&self) -> String {
        format!(
            "SimulationSummary(activities={}, num_trials={})",
            self.rows.len(),
            self.num_trials
        )
    }
}
