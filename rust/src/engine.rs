//! Monte Carlo batch orchestration and aggregation.
//!
//! Runs N independent trials over a shared dependency graph: one duration
//! envelope and one sample vector per activity (drawn once per batch), one
//! CPM schedule per trial, then a single-pass per-activity reduction into
//! the summary table. The batch is all-or-nothing: any trial error discards
//! all partial results.

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::config::SimulationConfig;
use crate::cpm::{compute_schedule_indexed, CpmError, CpmSchedule};
use crate::envelope::{draw_envelope, DurationEnvelope, EnvelopeError};
use crate::graph::{ActivityGraph, ActivityId, GraphError};
use crate::models::{ResourceAllocation, SimulationSummary, SummaryRow};
use crate::resource_model::{simulate_durations, DurationTables, ModelError};
use crate::scoring::{ScoreRegistry, ScoringError};
use crate::{log_batch, log_trials};

/// Errors that can occur while running a simulation batch.
#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("{0}")]
    Graph(#[from] GraphError),
    #[error("{0}")]
    Cpm(#[from] CpmError),
    #[error("{0}")]
    Model(#[from] ModelError),
    #[error("{0}")]
    Scoring(#[from] ScoringError),
    #[error("{0}")]
    Envelope(#[from] EnvelopeError),
    #[error("num_simulations must be at least 1")]
    NoTrials,
    #[error("No resource allocation provided for activity '{0}'")]
    MissingResourceInput(String),
    #[error("Resource input {input} = {value} for activity '{activity}' is outside [0, 100]")]
    ResourceOutOfRange {
        activity: String,
        input: &'static str,
        value: f64,
    },
}

/// Per-activity sampling state shared by every trial of a batch.
struct ActivitySamples {
    envelope: DurationEnvelope,
    mode: f64,
    samples: Vec<i64>,
}

/// Run a full simulation batch and aggregate the results.
///
/// Validation happens up front: scoring coverage, resource presence and
/// range, and envelope parameters are all checked before any sampling
/// begins. Trials then run on the rayon worker pool; results are collected
/// in trial-index order and reduced per activity.
pub fn run_batch(
    graph: &ActivityGraph,
    resources: &FxHashMap<String, ResourceAllocation>,
    registry: &ScoreRegistry,
    tables: &DurationTables,
    num_simulations: u32,
    config: &SimulationConfig,
) -> Result<SimulationSummary, SimulationError> {
    if num_simulations == 0 {
        return Err(SimulationError::NoTrials);
    }
    registry.validate_coverage(graph.names())?;
    let params = config.envelope_params();
    params.validate()?;

    let mut allocations: Vec<&ResourceAllocation> = Vec::with_capacity(graph.len());
    for name in graph.names() {
        let Some(allocation) = resources.get(name) else {
            return Err(SimulationError::MissingResourceInput(name.to_string()));
        };
        validate_allocation(name, allocation)?;
        allocations.push(allocation);
    }

    let verbosity = config.verbosity;
    let master_seed = config.seed.unwrap_or_else(rand::random);
    log_batch!(
        verbosity,
        "Running {} trials over {} activities (seed {})",
        num_simulations,
        graph.len(),
        master_seed
    );

    // One envelope and one sample vector per activity, shared by all trials.
    let mut per_activity: Vec<ActivitySamples> = Vec::with_capacity(graph.len());
    for (id, name) in graph.names().enumerate() {
        let mut rng = ChaCha20Rng::seed_from_u64(stream_seed(master_seed, id as u64));
        let envelope = draw_envelope(&params, &mut rng)?;

        let allocation = allocations[id];
        let score = registry
            .get(name)?
            .score(allocation.people, allocation.cost, allocation.tech);
        let simulated = simulate_durations(tables, &envelope, score, num_simulations, &mut rng)?;

        log_trials!(
            verbosity,
            "{}: score={:.1} state={} envelope=({:.1}, {:.1}, {:.1}) mode={:.1}",
            name,
            score,
            simulated.resource_state.label(),
            envelope.min,
            envelope.likely,
            envelope.max,
            simulated.mode
        );

        per_activity.push(ActivitySamples {
            envelope,
            mode: simulated.mode,
            samples: simulated.samples,
        });
    }

    // Trials are independent: each reads the shared graph and sample
    // vectors and writes only its own schedule.
    let trials: Vec<CpmSchedule> = (0..num_simulations as usize)
        .into_par_iter()
        .map(|trial| {
            let durations: Vec<i64> = per_activity
                .iter()
                .map(|activity| activity.samples[trial])
                .collect();
            compute_schedule_indexed(graph, &durations)
        })
        .collect::<Result<Vec<_>, CpmError>>()?;

    let mut rows: Vec<SummaryRow> = Vec::with_capacity(graph.len());
    for (id, name) in graph.names().enumerate() {
        let mut zero_float_trials = 0u32;
        let mut float_sum = 0i64;
        for schedule in &trials {
            let row = schedule.row(id as ActivityId);
            if row.is_critical() {
                zero_float_trials += 1;
            }
            float_sum += row.total_float;
        }

        let activity = &per_activity[id];
        rows.push(SummaryRow {
            activity: name.to_string(),
            criticality: zero_float_trials,
            mean_total_float: float_sum as f64 / num_simulations as f64,
            min_duration: activity.envelope.min as i64,
            most_likely_duration: activity.mode as i64,
            max_duration: activity.envelope.max as i64,
        });
    }

    log_batch!(
        verbosity,
        "Batch complete: {} trials, {} activities",
        num_simulations,
        rows.len()
    );

    Ok(SimulationSummary {
        rows,
        num_trials: num_simulations,
        predecessors: graph.predecessor_map(),
    })
}

fn validate_allocation(
    name: &str,
    allocation: &ResourceAllocation,
) -> Result<(), SimulationError> {
    for (input, value) in [
        ("people", allocation.people),
        ("cost", allocation.cost),
        ("tech", allocation.tech),
    ] {
        if !(0.0..=100.0).contains(&value) {
            return Err(SimulationError::ResourceOutOfRange {
                activity: name.to_string(),
                input,
                value,
            });
        }
    }
    Ok(())
}

/// Derive a per-activity stream seed from the batch seed.
fn stream_seed(master_seed: u64, stream: u64) -> u64 {
    master_seed.wrapping_add(stream.wrapping_mul(0x9e37_79b9_7f4a_7c15))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::WeightedScore;

    fn graph() -> ActivityGraph {
        let deps: FxHashMap<String, Vec<String>> = [
            ("a", vec![]),
            ("b", vec!["a"]),
            ("c", vec!["a"]),
            ("d", vec!["b"]),
            ("e", vec!["c", "d"]),
        ]
        .into_iter()
        .map(|(activity, preds)| {
            (
                activity.to_string(),
                preds.into_iter().map(str::to_string).collect(),
            )
        })
        .collect();
        ActivityGraph::new(&deps).unwrap()
    }

    fn resources(graph: &ActivityGraph) -> FxHashMap<String, ResourceAllocation> {
        graph
            .names()
            .map(|name| {
                (
                    name.to_string(),
                    ResourceAllocation {
                        people: 50.0,
                        cost: 50.0,
                        tech: 50.0,
                    },
                )
            })
            .collect()
    }

    fn registry(graph: &ActivityGraph) -> ScoreRegistry {
        let mut registry = ScoreRegistry::new();
        for name in graph.names() {
            registry.register(
                name,
                Box::new(WeightedScore {
                    people_weight: 0.5,
                    cost_weight: 0.3,
                    tech_weight: 0.2,
                }),
            );
        }
        registry
    }

    fn tables() -> DurationTables {
        DurationTables::new(
            vec![0.25; 4],
            vec![
                vec![0.6, 0.4, 0.2, 0.1],
                vec![0.3, 0.4, 0.5, 0.3],
                vec![0.1, 0.2, 0.3, 0.6],
            ],
        )
        .unwrap()
    }

    fn seeded_config(seed: u64) -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.seed = Some(seed);
        config
    }

    #[test]
    fn test_batch_produces_one_row_per_activity() {
        let g = graph();
        let summary = run_batch(
            &g,
            &resources(&g),
            &registry(&g),
            &tables(),
            10,
            &seeded_config(1),
        )
        .unwrap();

        assert_eq!(summary.rows.len(), 5);
        assert_eq!(summary.num_trials, 10);

        let names: Vec<&str> = summary.rows.iter().map(|r| r.activity.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d", "e"]);

        for row in &summary.rows {
            assert!(row.criticality <= 10);
            assert!(row.mean_total_float >= 0.0);
            assert!(row.min_duration <= row.most_likely_duration);
            assert!(row.most_likely_duration <= row.max_duration);
        }

        // Every trial has at least one zero-float activity, so the
        // criticality counts across activities cover all trials.
        let total: u32 = summary.rows.iter().map(|r| r.criticality).sum();
        assert!(total >= 10);

        // Root activity of a connected graph is always on the critical path.
        assert_eq!(summary.rows[0].criticality, 10);
    }

    #[test]
    fn test_batch_is_seed_deterministic() {
        let g = graph();
        let first = run_batch(
            &g,
            &resources(&g),
            &registry(&g),
            &tables(),
            25,
            &seeded_config(77),
        )
        .unwrap();
        let second = run_batch(
            &g,
            &resources(&g),
            &registry(&g),
            &tables(),
            25,
            &seeded_config(77),
        )
        .unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_predecessor_map_carried_for_diagram() {
        let g = graph();
        let summary = run_batch(
            &g,
            &resources(&g),
            &registry(&g),
            &tables(),
            5,
            &seeded_config(3),
        )
        .unwrap();

        assert_eq!(summary.predecessors["e"], vec!["c".to_string(), "d".to_string()]);
        let criticality = summary.criticality_by_activity();
        assert_eq!(criticality.len(), 5);
        assert_eq!(criticality["a"], summary.rows[0].criticality);
    }

    #[test]
    fn test_zero_trials_rejected() {
        let g = graph();
        let result = run_batch(
            &g,
            &resources(&g),
            &registry(&g),
            &tables(),
            0,
            &seeded_config(1),
        );
        assert!(matches!(result.unwrap_err(), SimulationError::NoTrials));
    }

    #[test]
    fn test_unregistered_activity_fails_before_sampling() {
        let g = graph();
        let mut partial = ScoreRegistry::new();
        partial.register(
            "a",
            Box::new(WeightedScore {
                people_weight: 1.0,
                cost_weight: 1.0,
                tech_weight: 1.0,
            }),
        );

        let result = run_batch(
            &g,
            &resources(&g),
            &partial,
            &tables(),
            10,
            &seeded_config(1),
        );
        assert!(matches!(
            result.unwrap_err(),
            SimulationError::Scoring(ScoringError::MissingStrategy(_))
        ));
    }

    #[test]
    fn test_missing_resource_input_rejected() {
        let g = graph();
        let mut partial = resources(&g);
        partial.remove("c");

        let result = run_batch(
            &g,
            &partial,
            &registry(&g),
            &tables(),
            10,
            &seeded_config(1),
        );
        match result.unwrap_err() {
            SimulationError::MissingResourceInput(activity) => assert_eq!(activity, "c"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_out_of_range_resource_rejected() {
        let g = graph();
        let mut bad = resources(&g);
        bad.insert(
            "b".to_string(),
            ResourceAllocation {
                people: 120.0,
                cost: 50.0,
                tech: 50.0,
            },
        );

        let result = run_batch(&g, &bad, &registry(&g), &tables(), 10, &seeded_config(1));
        match result.unwrap_err() {
            SimulationError::ResourceOutOfRange {
                activity,
                input,
                value,
            } => {
                assert_eq!(activity, "b");
                assert_eq!(input, "people");
                assert!((value - 120.0).abs() < 1e-9);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_single_activity_batch() {
        let deps: FxHashMap<String, Vec<String>> =
            [("only".to_string(), Vec::new())].into_iter().collect();
        let g = ActivityGraph::new(&deps).unwrap();

        let summary = run_batch(
            &g,
            &resources(&g),
            &registry(&g),
            &tables(),
            8,
            &seeded_config(5),
        )
        .unwrap();

        assert_eq!(summary.rows.len(), 1);
        // A lone activity is the whole critical path in every trial.
        assert_eq!(summary.rows[0].criticality, 8);
        assert!((summary.rows[0].mean_total_float).abs() < 1e-12);
    }
}
