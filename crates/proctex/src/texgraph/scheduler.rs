//! Dependency scheduling for texture graphs.
//!
//! [`Scheduler::schedule`] computes a topological evaluation order with Kahn's algorithm.
//! Nodes that can never become ready (on a cycle, or downstream of one) are left out of the
//! order and reported in [`Schedule::unscheduled`] instead.
use std::collections::{HashMap, VecDeque};

use crate::error::{Error, Result};
use crate::texgraph::{NodeId, TextureGraph};

/// Evaluation order for one graph snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Schedule {
    /// Node ids such that every producer precedes its consumers.
    pub order: Vec<NodeId>,
    /// Nodes that never became ready, in graph insertion order.
    pub unscheduled: Vec<NodeId>,
}

impl Schedule {
    /// Whether every node of the graph was scheduled.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.unscheduled.is_empty()
    }

    /// Position of `id` in the evaluation order.
    pub fn position(&self, id: NodeId) -> Option<usize> {
        self.order.iter().position(|n| *n == id)
    }

    /// Returns the order, or [`Error::Cycle`] if any node was left out.
    pub fn into_strict(self) -> Result<Vec<NodeId>> {
        if self.unscheduled.is_empty() {
            Ok(self.order)
        } else {
            Err(Error::Cycle {
                nodes: self.unscheduled,
            })
        }
    }
}

/// Topological scheduler for texture graphs.
pub struct Scheduler;

impl Scheduler {
    /// Orders the graph's nodes so that producers come before consumers.
    ///
    /// Ready nodes are taken first-in first-out, seeded in node insertion order, so the
    /// result is deterministic for a given node and link ordering. Links whose endpoints
    /// are missing from the graph are ignored.
    pub fn schedule(graph: &TextureGraph) -> Schedule {
        let mut indeg: HashMap<NodeId, usize> =
            graph.nodes().iter().map(|n| (n.id, 0)).collect();
        let mut dependents: HashMap<NodeId, Vec<NodeId>> = HashMap::new();

        for link in graph.links() {
            if !indeg.contains_key(&link.from_node) {
                continue;
            }
            let Some(e) = indeg.get_mut(&link.to_node) else {
                continue;
            };
            *e += 1;
            dependents
                .entry(link.from_node)
                .or_default()
                .push(link.to_node);
        }

        let mut q: VecDeque<NodeId> = graph
            .nodes()
            .iter()
            .map(|n| n.id)
            .filter(|id| indeg.get(id) == Some(&0))
            .collect();
        let mut order = Vec::with_capacity(graph.len());

        while let Some(n) = q.pop_front() {
            order.push(n);

            let Some(children) = dependents.get(&n) else {
                continue;
            };
            for child in children {
                if let Some(e) = indeg.get_mut(child) {
                    *e = e.saturating_sub(1);
                    if *e == 0 {
                        q.push_back(*child);
                    }
                }
            }
        }

        let unscheduled = graph
            .nodes()
            .iter()
            .map(|n| n.id)
            .filter(|id| indeg.get(id).is_some_and(|d| *d > 0))
            .collect();

        Schedule { order, unscheduled }
    }
}
