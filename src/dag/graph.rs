// src/dag/graph.rs

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::errors::{ControllerError, Result};
use crate::task::TaskName;

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone)]
struct DagNode {
    /// Position in declaration order; lower runs first among ready tasks.
    index: usize,
    /// Direct dependencies that are part of this run.
    deps: Vec<TaskName>,
    /// Direct dependents: tasks that depend on this one.
    dependents: Vec<TaskName>,
}

/// Validated dependency graph of the tasks taking part in one run.
#[derive(Debug, Clone)]
pub struct DagGraph {
    order: Vec<TaskName>,
    nodes: HashMap<TaskName, DagNode>,
}

impl DagGraph {
    /// Build and validate the graph from `(name, dependencies)` pairs given in
    /// declaration order.
    ///
    /// `known` tells whether a name is a real task kind. A dependency on a
    /// known kind that is not part of this run is dropped; a dependency on
    /// anything else is fatal. Duplicate names and cycles are fatal too.
    pub fn build<'a, I, K>(tasks: I, known: K) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a [TaskName])>,
        K: Fn(&str) -> bool,
    {
        let declared: Vec<(&str, &[TaskName])> = tasks.into_iter().collect();

        let mut nodes: HashMap<TaskName, DagNode> = HashMap::new();
        let mut order = Vec::with_capacity(declared.len());

        // First pass: create nodes.
        for (index, (name, _)) in declared.iter().enumerate() {
            let node = DagNode {
                index,
                deps: Vec::new(),
                dependents: Vec::new(),
            };
            if nodes.insert(name.to_string(), node).is_some() {
                return Err(ControllerError::DuplicateTask(name.to_string()));
            }
            order.push(name.to_string());
        }

        // Second pass: resolve dependency names.
        for (name, deps) in declared.iter() {
            let mut resolved = Vec::new();
            for dep in deps.iter() {
                if dep == name {
                    return Err(ControllerError::DagCycle(format!(
                        "task '{name}' depends on itself"
                    )));
                }
                if nodes.contains_key(dep) {
                    resolved.push(dep.clone());
                } else if known(dep.as_str()) {
                    debug!(task = %name, dep = %dep, "dependency not part of this run; ignoring");
                } else {
                    return Err(ControllerError::TaskNotFound(format!(
                        "task '{name}' depends on unknown task '{dep}'"
                    )));
                }
            }
            if let Some(node) = nodes.get_mut(*name) {
                node.deps = resolved;
            }
        }

        // Third pass: populate dependents based on deps.
        for name in order.iter() {
            let deps = nodes.get(name).map(|n| n.deps.clone()).unwrap_or_default();
            for dep in deps {
                if let Some(dep_node) = nodes.get_mut(&dep) {
                    dep_node.dependents.push(name.clone());
                }
            }
        }

        let graph = Self { order, nodes };
        graph.check_acyclic()?;
        Ok(graph)
    }

    // Edge direction: dep -> task. A topological sort fails on a cycle.
    fn check_acyclic(&self) -> Result<()> {
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for name in self.order.iter() {
            graph.add_node(name.as_str());
        }
        for (name, node) in self.nodes.iter() {
            for dep in node.deps.iter() {
                graph.add_edge(dep.as_str(), name.as_str(), ());
            }
        }

        match toposort(&graph, None) {
            Ok(_order) => Ok(()),
            Err(cycle) => Err(ControllerError::DagCycle(format!(
                "cycle detected in task DAG involving task '{}'",
                cycle.node_id()
            ))),
        }
    }

    /// Task names in declaration order.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Declaration index of a task.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.nodes.get(name).map(|n| n.index)
    }

    /// Immediate dependencies of a task that take part in this run.
    pub fn dependencies_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a task.
    pub fn dependents_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }
}
