// src/dag/graph.rs

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap};
use std::path::{Path, PathBuf};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use crate::errors::StructuralError;
use crate::fs::{normalize_path, FileSystem};
use crate::task::Task;

/// Index of a task in the submitted collection.
pub type NodeId = usize;

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone)]
struct DagNode {
    label: String,
    /// Producers of this task's inputs.
    deps: Vec<NodeId>,
    /// Consumers of this task's outputs.
    dependents: Vec<NodeId>,
}

/// Dependency graph derived from matching output paths to input paths.
///
/// Nodes live in an arena indexed by [`NodeId`] (the position of the task in
/// the slice given to [`DagGraph::build`]). Edges point from producer to
/// consumer and are deduplicated.
#[derive(Debug, Clone)]
pub struct DagGraph {
    nodes: Vec<DagNode>,
    /// Normalized output path -> producing task.
    producers: HashMap<PathBuf, NodeId>,
    /// Inputs that no task in this run produces.
    external_inputs: Vec<(NodeId, PathBuf)>,
    /// One valid topological order.
    order: Vec<NodeId>,
}

impl DagGraph {
    /// Build the graph for `tasks`.
    ///
    /// Fails with every ambiguous producer found, or with the first cycle
    /// found once producers are unambiguous.
    pub fn build<T>(tasks: &[T]) -> Result<Self, Vec<StructuralError>>
    where
        T: AsRef<dyn Task>,
    {
        let mut producers: HashMap<PathBuf, NodeId> = HashMap::new();
        let mut errors = Vec::new();

        for (id, task) in tasks.iter().enumerate() {
            let task = task.as_ref();
            for output in task.outputs() {
                let key = normalize_path(output);
                match producers.get(&key) {
                    Some(&first) if first != id => {
                        errors.push(StructuralError::AmbiguousProducer {
                            path: key,
                            first: tasks[first].as_ref().label().to_string(),
                            second: task.label().to_string(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        producers.insert(key, id);
                    }
                }
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let mut deps: Vec<BTreeSet<NodeId>> = vec![BTreeSet::new(); tasks.len()];
        let mut external_inputs = Vec::new();

        for (id, task) in tasks.iter().enumerate() {
            for input in task.as_ref().inputs() {
                let key = normalize_path(input);
                match producers.get(&key) {
                    Some(&producer) => {
                        deps[id].insert(producer);
                    }
                    None => external_inputs.push((id, input.clone())),
                }
            }
        }

        let mut nodes: Vec<DagNode> = tasks
            .iter()
            .zip(deps)
            .map(|(task, deps)| DagNode {
                label: task.as_ref().label().to_string(),
                deps: deps.into_iter().collect(),
                dependents: Vec::new(),
            })
            .collect();

        for id in 0..nodes.len() {
            for dep in nodes[id].deps.clone() {
                nodes[dep].dependents.push(id);
            }
        }

        let order = topological_order(&nodes).map_err(|e| vec![e])?;

        debug!(
            tasks = nodes.len(),
            edges = nodes.iter().map(|n| n.deps.len()).sum::<usize>(),
            external_inputs = external_inputs.len(),
            "dependency graph built"
        );

        Ok(Self {
            nodes,
            producers,
            external_inputs,
            order,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn label_of(&self, id: NodeId) -> &str {
        self.nodes.get(id).map(|n| n.label.as_str()).unwrap_or("")
    }

    /// Immediate predecessors of a task (producers of its inputs).
    pub fn dependencies_of(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map(|n| n.deps.as_slice()).unwrap_or(&[])
    }

    /// Immediate dependents of a task (consumers of its outputs).
    pub fn dependents_of(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// Tasks without predecessors.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).filter(|&id| self.nodes[id].deps.is_empty())
    }

    /// Every task appears after all of its predecessors.
    pub fn topological_order(&self) -> &[NodeId] {
        &self.order
    }

    /// Task producing `path` in this run, if any.
    pub fn producer_of(&self, path: &Path) -> Option<NodeId> {
        self.producers.get(&normalize_path(path)).copied()
    }

    /// Inputs with no producer in this run, as `(consumer, path)`.
    pub fn external_inputs(&self) -> &[(NodeId, PathBuf)] {
        &self.external_inputs
    }

    /// External inputs that do not exist on disk right now.
    pub fn missing_external_inputs(&self, fs: &dyn FileSystem) -> Vec<(NodeId, PathBuf)> {
        self.external_inputs
            .iter()
            .filter(|(_, path)| !fs.exists(path))
            .cloned()
            .collect()
    }
}

/// Kahn's algorithm, always picking the lowest ready id so the order follows
/// submission order wherever the edges allow it.
///
/// If nodes are left over, petgraph's SCC search names the cycle: the
/// non-trivial component holding the lowest leftover id.
fn topological_order(nodes: &[DagNode]) -> Result<Vec<NodeId>, StructuralError> {
    let mut pending: Vec<usize> = nodes.iter().map(|n| n.deps.len()).collect();
    let mut ready: BinaryHeap<Reverse<NodeId>> = pending
        .iter()
        .enumerate()
        .filter(|&(_, &p)| p == 0)
        .map(|(id, _)| Reverse(id))
        .collect();
    let mut order = Vec::with_capacity(nodes.len());

    while let Some(Reverse(id)) = ready.pop() {
        order.push(id);
        for &dependent in &nodes[id].dependents {
            pending[dependent] -= 1;
            if pending[dependent] == 0 {
                ready.push(Reverse(dependent));
            }
        }
    }

    if order.len() == nodes.len() {
        return Ok(order);
    }

    // Edge direction: producer -> consumer.
    let mut graph: DiGraph<NodeId, ()> = DiGraph::with_capacity(nodes.len(), 0);
    let indices: Vec<NodeIndex> = (0..nodes.len()).map(|id| graph.add_node(id)).collect();
    for (id, node) in nodes.iter().enumerate() {
        for &dep in &node.deps {
            graph.add_edge(indices[dep], indices[id], ());
        }
    }

    let mut cycles: Vec<Vec<NodeId>> = tarjan_scc(&graph)
        .into_iter()
        .map(|scc| {
            let mut members: Vec<NodeId> = scc.into_iter().map(|ix| graph[ix]).collect();
            members.sort_unstable();
            members
        })
        .filter(|members| members.len() > 1 || nodes[members[0]].deps.contains(&members[0]))
        .collect();
    cycles.sort();

    let members = cycles.into_iter().next().unwrap_or_else(|| {
        (0..nodes.len())
            .filter(|&id| pending[id] > 0)
            .collect()
    });

    Err(StructuralError::DependencyCycle {
        tasks: members
            .into_iter()
            .map(|id| nodes[id].label.clone())
            .collect(),
    })
}
