//! Inheritance graph for claim dialects with Kahn's algorithm for ordering
//!
//! This module builds the parent graph of a catalog to:
//! 1. Produce a parents-first evaluation order for bulk resolution
//! 2. Report every inheritance cycle with its full path
//! 3. List parent references that point outside the catalog

use super::DialectCatalog;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use thiserror::Error;

/// Graph-related errors
#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    /// Circular inheritance detected between dialects
    #[error("Circular inheritance detected: {}", .0.join(" -> "))]
    CircularDependency(Vec<String>),
}

/// Parent reference that does not resolve to a dialect in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingEdge {
    /// Dialect declaring the parent
    pub dialect: String,
    /// Parent identifier that is absent
    pub parent: String,
}

/// Graph node representing a dialect and the parents it inherits from
#[derive(Debug, Clone)]
struct GraphNode {
    /// Parents present in the catalog, de-duplicated, in declaration order
    parents: Vec<String>,
}

impl GraphNode {
    fn new() -> Self {
        Self {
            parents: Vec::new(),
        }
    }

    fn add_parent(&mut self, parent: &str) {
        if !self.parents.iter().any(|p| p == parent) {
            self.parents.push(parent.to_string());
        }
    }
}

/// DFS colouring used by cycle detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unvisited,
    InProgress,
    Done,
}

/// Parent graph of a dialect catalog
///
/// Edges point from a dialect to its parents. Node iteration follows the
/// catalog's insertion order so every result here is deterministic.
#[derive(Debug, Clone)]
pub struct InheritanceGraph {
    /// Dialect ids in catalog order
    order: Vec<String>,

    /// Map of dialect ids to graph nodes
    nodes: HashMap<String, GraphNode>,

    /// Parent references that point outside the catalog
    missing: Vec<MissingEdge>,
}

impl InheritanceGraph {
    /// Build the graph for a catalog
    pub fn from_catalog(catalog: &DialectCatalog) -> Self {
        let mut nodes = HashMap::with_capacity(catalog.len());
        let mut missing = Vec::new();
        let mut order = Vec::with_capacity(catalog.len());

        for dialect in catalog.iter() {
            let mut node = GraphNode::new();
            for parent in &dialect.parents {
                if catalog.contains(parent) {
                    node.add_parent(parent);
                } else {
                    missing.push(MissingEdge {
                        dialect: dialect.id.clone(),
                        parent: parent.clone(),
                    });
                }
            }
            order.push(dialect.id.clone());
            nodes.insert(dialect.id.clone(), node);
        }

        Self {
            order,
            nodes,
            missing,
        }
    }

    /// Number of dialects in the graph
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the graph has no dialects
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Parent references that point outside the catalog
    pub fn missing_parents(&self) -> &[MissingEdge] {
        &self.missing
    }

    /// Parents-first order plus the dialects blocked by a cycle
    ///
    /// Kahn's algorithm:
    /// 1. in-degree of a dialect = number of distinct parents it has
    /// 2. queue every dialect with in-degree 0
    /// 3. pop a dialect, emit it, decrement each child's in-degree and queue
    ///    children that reach 0
    ///
    /// Dialects never reaching in-degree 0 sit on, or inherit from, a cycle;
    /// they are returned separately in catalog order.
    pub fn partial_order(&self) -> (Vec<String>, Vec<String>) {
        let mut children: HashMap<&str, Vec<&str>> = HashMap::with_capacity(self.len());
        let mut in_degree: HashMap<&str, usize> = HashMap::with_capacity(self.len());

        for id in &self.order {
            children.entry(id.as_str()).or_default();
            in_degree.insert(id.as_str(), 0);
        }

        for id in &self.order {
            let node = &self.nodes[id];
            for parent in &node.parents {
                if let Some(edges) = children.get_mut(parent.as_str()) {
                    edges.push(id.as_str());
                }
                if let Some(degree) = in_degree.get_mut(id.as_str()) {
                    *degree += 1;
                }
            }
        }

        let mut queue: VecDeque<&str> = self
            .order
            .iter()
            .map(String::as_str)
            .filter(|id| in_degree[id] == 0)
            .collect();

        let mut sorted = Vec::with_capacity(self.len());
        while let Some(current) = queue.pop_front() {
            sorted.push(current.to_string());

            if let Some(dependents) = children.get(current) {
                for dependent in dependents {
                    if let Some(degree) = in_degree.get_mut(dependent) {
                        *degree -= 1;
                        if *degree == 0 {
                            queue.push_back(*dependent);
                        }
                    }
                }
            }
        }

        let blocked = self
            .order
            .iter()
            .filter(|id| in_degree[id.as_str()] > 0)
            .cloned()
            .collect();

        (sorted, blocked)
    }

    /// Parents-first evaluation order
    ///
    /// # Errors
    ///
    /// Returns the first cycle found if any dialect is blocked.
    pub fn resolve_order(&self) -> Result<Vec<String>, GraphError> {
        let (sorted, blocked) = self.partial_order();
        if blocked.is_empty() {
            return Ok(sorted);
        }

        match self.detect_cycles().into_iter().next() {
            Some(cycle) => Err(GraphError::CircularDependency(cycle)),
            None => Err(GraphError::CircularDependency(blocked)),
        }
    }

    /// Detect all cycles using DFS
    ///
    /// Three states per node: unvisited, in progress (on the DFS stack) and
    /// done. Reaching an in-progress node closes a cycle; the reported path
    /// starts and ends with that node, so a self-reference is `[a, a]`.
    pub fn detect_cycles(&self) -> Vec<Vec<String>> {
        let mut state: HashMap<&str, Visit> = self
            .order
            .iter()
            .map(|id| (id.as_str(), Visit::Unvisited))
            .collect();
        let mut path = Vec::new();
        let mut cycles = Vec::new();

        for start in &self.order {
            if state[start.as_str()] == Visit::Unvisited {
                self.dfs_cycle_detect(start, &mut state, &mut path, &mut cycles);
            }
        }

        cycles
    }

    fn dfs_cycle_detect<'a>(
        &'a self,
        node: &'a str,
        state: &mut HashMap<&'a str, Visit>,
        path: &mut Vec<&'a str>,
        cycles: &mut Vec<Vec<String>>,
    ) {
        match state.get(node) {
            Some(Visit::InProgress) => {
                if let Some(start) = path.iter().position(|n| *n == node) {
                    let cycle = path[start..]
                        .iter()
                        .chain(std::iter::once(&node))
                        .map(|n| n.to_string())
                        .collect();
                    cycles.push(cycle);
                }
                return;
            }
            Some(Visit::Done) => return,
            _ => {}
        }

        state.insert(node, Visit::InProgress);
        path.push(node);

        if let Some(graph_node) = self.nodes.get(node) {
            for parent in &graph_node.parents {
                self.dfs_cycle_detect(parent, state, path, cycles);
            }
        }

        state.insert(node, Visit::Done);
        path.pop();
    }
}
