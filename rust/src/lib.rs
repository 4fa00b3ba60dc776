//! Rust implementation of the riskpath schedule-risk simulation engine.
//!
//! This module provides the stochastic critical-path simulation core for the
//! project risk application: the deterministic CPM calculator, the
//! resource-conditioned duration model, and the Monte Carlo orchestration.

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use rustc_hash::FxHashMap;
use std::collections::HashMap;

mod config;
pub mod cpm;
pub mod engine;
pub mod envelope;
pub mod graph;
mod interner;
pub mod logging;
mod models;
pub mod resource_model;
pub mod scoring;

pub use config::SimulationConfig;
pub use cpm::{compute_schedule, compute_schedule_indexed, CpmError, CpmRow, CpmSchedule};
pub use engine::{run_batch, SimulationError};
pub use envelope::{draw_envelope, DurationEnvelope, EnvelopeError, EnvelopeParams};
pub use graph::{ActivityGraph, ActivityId, GraphError};
pub use models::{ResourceAllocation, SimulationSummary, SummaryRow};
pub use resource_model::{
    bin_probabilities, simulate_durations, BinDistribution, DurationTables, ModelError,
    ResourceState,
};
pub use scoring::{ScoreFunction, ScoreRegistry, ScoringError, WeightedScore};

/// Run a full Monte Carlo schedule-risk simulation.
///
/// This is the single entry point the UI layer calls per "run simulation"
/// action: it builds the dependency graph, validates the probability tables
/// and scoring strategies, runs `num_simulations` CPM trials, and returns
/// the aggregated summary.
///
/// # Arguments
/// * `activity_dependencies` - Dict mapping activity name to its predecessor names
/// * `resource_inputs` - Dict mapping activity name to a (people, cost, tech) triple, each in [0, 100]
/// * `score_weights` - Dict mapping activity name to its WeightedScore strategy
/// * `resource_marginal` - Marginal probability table for the resource node (4 entries)
/// * `duration_cpd` - Conditional probability table for the duration node (3 rows x 4 columns)
/// * `num_simulations` - Number of Monte Carlo trials to run
/// * `config` - Optional simulation configuration (seed, verbosity, envelope draws)
///
/// # Returns
/// * SimulationSummary with one row per activity plus the dependency mapping
///
/// # Raises
/// * ValueError on dependency cycles, malformed tables, missing scoring
///   strategies, or resource inputs outside [0, 100]
#[pyfunction]
#[pyo3(signature = (
    activity_dependencies,
    resource_inputs,
    score_weights,
    resource_marginal,
    duration_cpd,
    num_simulations,
    config=None
))]
fn run_simulation(
    activity_dependencies: HashMap<String, Vec<String>>,
    resource_inputs: HashMap<String, (f64, f64, f64)>,
    score_weights: HashMap<String, WeightedScore>,
    resource_marginal: Vec<f64>,
    duration_cpd: Vec<Vec<f64>>,
    num_simulations: u32,
    config: Option<SimulationConfig>,
) -> PyResult<SimulationSummary> {
    let dependencies: FxHashMap<String, Vec<String>> =
        activity_dependencies.into_iter().collect();
    let graph = ActivityGraph::new(&dependencies).map_err(value_error)?;

    let tables = DurationTables::new(resource_marginal, duration_cpd).map_err(value_error)?;

    let mut registry = ScoreRegistry::new();
    for (activity, weights) in score_weights {
        registry.register(activity, Box::new(weights));
    }

    let resources: FxHashMap<String, ResourceAllocation> = resource_inputs
        .into_iter()
        .map(|(activity, (people, cost, tech))| {
            (activity, ResourceAllocation { people, cost, tech })
        })
        .collect();

    let config = config.unwrap_or_default();

    match run_batch(
        &graph,
        &resources,
        &registry,
        &tables,
        num_simulations,
        &config,
    ) {
        Ok(summary) => Ok(summary),
        Err(e) => Err(value_error(e)),
    }
}

fn value_error(e: impl std::fmt::Display) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// The riskpath.rust Python module.
#[pymodule]
fn rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Core data types
    m.add_class::<ResourceAllocation>()?;
    m.add_class::<SummaryRow>()?;
    m.add_class::<SimulationSummary>()?;
    m.add_class::<WeightedScore>()?;

    // Config types
    m.add_class::<SimulationConfig>()?;

    // Algorithms
    m.add_function(wrap_pyfunction!(run_simulation, m)?)?;

    Ok(())
}
