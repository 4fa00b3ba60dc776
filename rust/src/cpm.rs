//! Deterministic CPM forward/backward passes and total float.
//!
//! A pure function of (graph, durations): no randomness, no I/O, and
//! bit-identical output across repeated calls. Durations are integers, so
//! zero total float is an exact test rather than a float comparison.

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::graph::{ActivityGraph, ActivityId};

/// Errors that can occur during CPM calculation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CpmError {
    #[error("No duration provided for activity '{0}'")]
    MissingDuration(String),
    #[error("Negative duration {duration} for activity '{activity}'")]
    NegativeDuration { activity: String, duration: i64 },
    #[error("Expected {expected} durations, got {got}")]
    DurationCountMismatch { expected: usize, got: usize },
}

/// Per-activity timing for a single schedule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CpmRow {
    pub duration: i64,
    pub earliest_start: i64,
    pub earliest_finish: i64,
    pub latest_start: i64,
    pub latest_finish: i64,
    /// Total float: `latest_start - earliest_start`, >= 0 for valid inputs.
    pub total_float: i64,
}

impl CpmRow {
    /// Zero total float puts the activity on the critical path.
    pub fn is_critical(&self) -> bool {
        self.total_float == 0
    }
}

/// Complete CPM result for one duration assignment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CpmSchedule {
    rows: Vec<CpmRow>,
    project_end: i64,
}

impl CpmSchedule {
    /// Timing row for an activity id.
    pub fn row(&self, id: ActivityId) -> &CpmRow {
        &self.rows[id as usize]
    }

    /// All rows in activity id order.
    pub fn rows(&self) -> &[CpmRow] {
        &self.rows
    }

    /// Project end: the maximum earliest finish over all activities.
    pub fn project_end(&self) -> i64 {
        self.project_end
    }
}

/// Compute a CPM schedule from a name-keyed duration mapping.
pub fn compute_schedule(
    graph: &ActivityGraph,
    durations: &FxHashMap<String, i64>,
) -> Result<CpmSchedule, CpmError> {
    let mut by_id: Vec<i64> = Vec::with_capacity(graph.len());
    for name in graph.names() {
        match durations.get(name) {
            Some(&duration) => by_id.push(duration),
            None => return Err(CpmError::MissingDuration(name.to_string())),
        }
    }
    compute_schedule_indexed(graph, &by_id)
}

/// Compute a CPM schedule from durations indexed by activity id.
///
/// This is the hot path for simulation trials; the duration slice must have
/// one entry per activity in graph id order.
pub fn compute_schedule_indexed(
    graph: &ActivityGraph,
    durations: &[i64],
) -> Result<CpmSchedule, CpmError> {
    if durations.len() != graph.len() {
        return Err(CpmError::DurationCountMismatch {
            expected: graph.len(),
            got: durations.len(),
        });
    }
    for (name, &duration) in graph.names().zip(durations) {
        if duration < 0 {
            return Err(CpmError::NegativeDuration {
                activity: name.to_string(),
                duration,
            });
        }
    }

    let mut rows: Vec<CpmRow> = durations
        .iter()
        .map(|&duration| CpmRow {
            duration,
            ..Default::default()
        })
        .collect();

    // Forward pass: earliest start is the max earliest finish over predecessors.
    for &id in graph.topo_order() {
        let idx = id as usize;
        let mut earliest_start = 0;
        for &pred in graph.predecessors(id) {
            earliest_start = earliest_start.max(rows[pred as usize].earliest_finish);
        }
        rows[idx].earliest_start = earliest_start;
        rows[idx].earliest_finish = earliest_start + rows[idx].duration;
    }

    let project_end = rows.iter().map(|row| row.earliest_finish).max().unwrap_or(0);

    // Backward pass: latest finish is the min latest start over successors,
    // or the project end for activities with no successors.
    for &id in graph.topo_order().iter().rev() {
        let idx = id as usize;
        let successors = graph.successors(id);
        let latest_finish = if successors.is_empty() {
            project_end
        } else {
            successors
                .iter()
                .map(|&succ| rows[succ as usize].latest_start)
                .min()
                .unwrap_or(project_end)
        };
        rows[idx].latest_finish = latest_finish;
        rows[idx].latest_start = latest_finish - rows[idx].duration;
        rows[idx].total_float = rows[idx].latest_start - rows[idx].earliest_start;
    }

    Ok(CpmSchedule { rows, project_end })
}
