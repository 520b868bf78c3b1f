//! Name-keyed dependency graph over work units and tasks.
//!
//! The builder wires units by symbolic name; this graph validates the wiring
//! as it happens. Edges only ever point from an already-registered upstream
//! name to the unit being built (no forward references), and every insert is
//! checked for cycles, so a completed build is acyclic by construction.
//! Execution adapters use the ready-set and topological-order queries to run
//! independent units in parallel while honoring every edge.

use petgraph::algo::{is_cyclic_directed, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};

/// Directed acyclic graph of unit/task names.
#[derive(Debug, Clone, Default)]
pub struct PipelineDag {
    /// The underlying directed graph; an edge a -> b means b depends on a.
    graph: DiGraph<String, ()>,
    /// Index mapping from name to NodeIndex for fast lookups.
    node_index: HashMap<String, NodeIndex>,
}

impl PipelineDag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node. Names are globally unique across all stages.
    pub fn add_node(&mut self, name: &str) -> Result<()> {
        if self.node_index.contains_key(name) {
            return Err(Error::DuplicateUnit(name.to_string()));
        }
        let index = self.graph.add_node(name.to_string());
        self.node_index.insert(name.to_string(), index);
        Ok(())
    }

    /// Record that `dependent` depends on `dependency`.
    ///
    /// Both names must already be registered; depending on a name that has
    /// not been built yet is a forward reference and is rejected. Inserting
    /// an edge that would close a cycle is rejected and leaves the graph
    /// unchanged. Re-declaring an existing edge is a no-op.
    pub fn add_dependency(&mut self, dependent: &str, dependency: &str) -> Result<()> {
        let dep_index = *self.node_index.get(dependency).ok_or_else(|| {
            Error::UnknownDependency {
                dependent: dependent.to_string(),
                dependency: dependency.to_string(),
            }
        })?;
        let node_index = *self.node_index.get(dependent).ok_or_else(|| {
            Error::UnknownDependency {
                dependent: dependency.to_string(),
                dependency: dependent.to_string(),
            }
        })?;

        if self.graph.find_edge(dep_index, node_index).is_some() {
            return Ok(());
        }

        // Temporarily add the edge to check for cycles.
        let edge = self.graph.add_edge(dep_index, node_index, ());
        if is_cyclic_directed(&self.graph) {
            self.graph.remove_edge(edge);
            return Err(Error::DependencyCycle {
                from: dependency.to_string(),
                to: dependent.to_string(),
            });
        }

        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.node_index.contains_key(name)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn has_dependency(&self, dependent: &str, dependency: &str) -> bool {
        if let (Some(&dep), Some(&node)) = (
            self.node_index.get(dependency),
            self.node_index.get(dependent),
        ) {
            self.graph.find_edge(dep, node).is_some()
        } else {
            false
        }
    }

    /// Names the given node depends on (upstream neighbors), sorted.
    pub fn dependencies_of(&self, name: &str) -> Vec<String> {
        self.neighbors(name, petgraph::Direction::Incoming)
    }

    /// Names depending on the given node (downstream neighbors), sorted.
    pub fn dependents_of(&self, name: &str) -> Vec<String> {
        self.neighbors(name, petgraph::Direction::Outgoing)
    }

    fn neighbors(&self, name: &str, direction: petgraph::Direction) -> Vec<String> {
        let mut names: Vec<String> = match self.node_index.get(name) {
            Some(&index) => self
                .graph
                .neighbors_directed(index, direction)
                .filter_map(|n| self.graph.node_weight(n).cloned())
                .collect(),
            None => Vec::new(),
        };
        names.sort();
        names
    }

    /// Every node not yet completed whose dependencies are all completed.
    pub fn ready(&self, completed: &HashSet<String>) -> Vec<String> {
        let mut ready: Vec<String> = self
            .graph
            .node_indices()
            .filter_map(|index| {
                let name = self.graph.node_weight(index)?;
                if completed.contains(name) {
                    return None;
                }
                let all_done = self
                    .graph
                    .neighbors_directed(index, petgraph::Direction::Incoming)
                    .all(|dep| {
                        self.graph
                            .node_weight(dep)
                            .map(|n| completed.contains(n))
                            .unwrap_or(false)
                    });
                if all_done {
                    Some(name.clone())
                } else {
                    None
                }
            })
            .collect();
        ready.sort();
        ready
    }

    /// All nodes in dependency order. The graph is acyclic by construction,
    /// so this cannot fail after a successful build.
    pub fn topological_order(&self) -> Result<Vec<String>> {
        let order = toposort(&self.graph, None).map_err(|cycle| {
            let name = self
                .graph
                .node_weight(cycle.node_id())
                .cloned()
                .unwrap_or_default();
            Error::DependencyCycle {
                from: name.clone(),
                to: name,
            }
        })?;
        Ok(order
            .into_iter()
            .filter_map(|index| self.graph.node_weight(index).cloned())
            .collect())
    }
}
