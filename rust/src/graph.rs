//! Immutable activity dependency graph.
//!
//! Holds the precedence structure for a project: per-activity predecessor
//! lists, derived successor lists, and a topological order computed once at
//! construction. No computation beyond topological validity lives here.

use rustc_hash::FxHashMap;
use std::collections::HashMap;
use std::collections::VecDeque;
use thiserror::Error;

use crate::interner::ActivityIndex;

pub use crate::interner::ActivityId;

/// Errors that can occur while building the activity graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Circular dependency detected in activity graph")]
    Cycle,
    #[error("Unknown predecessor '{predecessor}' for activity '{activity}'")]
    UnknownPredecessor {
        activity: String,
        predecessor: String,
    },
}

/// Activity precedence graph, immutable after construction.
///
/// Activities are interned to dense ids in sorted-name order, so the same
/// dependency mapping always produces the same indexing regardless of map
/// iteration order.
#[derive(Clone, Debug)]
pub struct ActivityGraph {
    index: ActivityIndex,
    predecessors: Vec<Vec<ActivityId>>,
    successors: Vec<Vec<ActivityId>>,
    topo_order: Vec<ActivityId>,
}

impl ActivityGraph {
    /// Build a graph from an `activity -> predecessors` mapping.
    ///
    /// Every predecessor must itself be a key of the mapping. Fails with
    /// `GraphError::Cycle` when the precedence relation admits no
    /// topological order.
    pub fn new(dependencies: &FxHashMap<String, Vec<String>>) -> Result<Self, GraphError> {
        let mut names: Vec<&str> = dependencies.keys().map(String::as_str).collect();
        names.sort_unstable();
        let index = ActivityIndex::from_names(names.iter().copied());

        let n = index.len();
        let mut predecessors: Vec<Vec<ActivityId>> = vec![Vec::new(); n];
        let mut successors: Vec<Vec<ActivityId>> = vec![Vec::new(); n];

        for (id, name) in names.iter().enumerate() {
            for predecessor in &dependencies[*name] {
                let Some(pred_id) = index.id_of(predecessor) else {
                    return Err(GraphError::UnknownPredecessor {
                        activity: (*name).to_string(),
                        predecessor: predecessor.clone(),
                    });
                };
                predecessors[id].push(pred_id);
                successors[pred_id as usize].push(id as ActivityId);
            }
        }

        let topo_order = topological_order(&predecessors, &successors)?;

        Ok(Self {
            index,
            predecessors,
            successors,
            topo_order,
        })
    }

    /// Number of activities.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Id for an activity name, if present.
    pub fn id_of(&self, name: &str) -> Option<ActivityId> {
        self.index.id_of(name)
    }

    /// Name for an activity id, if in range.
    pub fn name_of(&self, id: ActivityId) -> Option<&str> {
        self.index.name_of(id)
    }

    /// Activity names in id order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.index.names()
    }

    /// Direct predecessors of an activity.
    pub fn predecessors(&self, id: ActivityId) -> &[ActivityId] {
        &self.predecessors[id as usize]
    }

    /// Direct successors of an activity (derived from the predecessor lists).
    pub fn successors(&self, id: ActivityId) -> &[ActivityId] {
        &self.successors[id as usize]
    }

    /// A valid topological order: predecessors appear before dependents.
    pub fn topo_order(&self) -> &[ActivityId] {
        &self.topo_order
    }

    /// The `activity -> predecessors` mapping, for the diagram collaborator.
    ///
    /// Returned as a std HashMap since this crosses the Python boundary.
    pub fn predecessor_map(&self) -> HashMap<String, Vec<String>> {
        let mut map = HashMap::with_capacity(self.len());
        for (id, name) in self.names().enumerate() {
            let preds: Vec<String> = self.predecessors[id]
                .iter()
                .filter_map(|&p| self.index.name_of(p))
                .map(str::to_string)
                .collect();
            map.insert(name.to_string(), preds);
        }
        map
    }
}

/// Kahn's algorithm over the id-indexed adjacency lists.
fn topological_order(
    predecessors: &[Vec<ActivityId>],
    successors: &[Vec<ActivityId>],
) -> Result<Vec<ActivityId>, GraphError> {
    let n = predecessors.len();
    let mut in_degree: Vec<usize> = predecessors.iter().map(Vec::len).collect();

    let mut queue: VecDeque<ActivityId> = (0..n)
        .filter(|&id| in_degree[id] == 0)
        .map(|id| id as ActivityId)
        .collect();

    let mut order: Vec<ActivityId> = Vec::with_capacity(n);
    while let Some(id) = queue.pop_front() {
        order.push(id);
        for &succ in &successors[id as usize] {
            let degree = &mut in_degree[succ as usize];
            *degree -= 1;
            if *degree == 0 {
                queue.push_back(succ);
            }
        }
    }

    if order.len() != n {
        return Err(GraphError::Cycle);
    }

    Ok(order)
}
