//! Build ordering.
//!
//! A rollup concatenates the debug builds of the modules it lists, so those
//! modules have to be built first. The plan is a graph with an edge from each
//! listed module to the rollup listing it, split into waves: every node in a
//! wave depends only on nodes of earlier waves, so a wave can be built
//! concurrently.

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::descriptor::{BuildFile, DescriptorError};

/// A buildable unit of a build file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlanNode {
  Module(String),
  Rollup(String),
}

impl PlanNode {
  pub fn name(&self) -> &str {
    match self {
      PlanNode::Module(name) | PlanNode::Rollup(name) => name,
    }
  }
}

pub struct BuildPlan {
  graph: DiGraph<PlanNode, ()>,
  nodes: HashMap<String, NodeIndex>,
}

impl BuildPlan {
  /// Build the dependency graph of a build file.
  ///
  /// Rollup entries naming nothing in the file refer to modules built
  /// elsewhere and add no edge.
  pub fn new(file: &BuildFile) -> Result<Self, DescriptorError> {
    let mut graph = DiGraph::new();
    let mut nodes = HashMap::new();

    for name in file.builds.keys() {
      let idx = graph.add_node(PlanNode::Module(name.clone()));
      nodes.insert(name.clone(), idx);
    }
    for name in file.rollups.keys() {
      let idx = graph.add_node(PlanNode::Rollup(name.clone()));
      nodes.insert(name.clone(), idx);
    }

    for (name, rollup) in &file.rollups {
      let dependent = nodes[name];
      for dep in &rollup.files {
        if let Some(&dep_idx) = nodes.get(dep) {
          graph.add_edge(dep_idx, dependent, ());
        }
      }
    }

    toposort(&graph, None).map_err(|_| DescriptorError::CycleDetected)?;

    Ok(Self { graph, nodes })
  }

  pub fn len(&self) -> usize {
    self.graph.node_count()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Names of the nodes `name` waits for.
  pub fn dependencies(&self, name: &str) -> Vec<&str> {
    let Some(&idx) = self.nodes.get(name) else {
      return Vec::new();
    };

    let mut deps: Vec<NodeIndex> = self.graph.neighbors_directed(idx, Direction::Incoming).collect();
    deps.sort();
    deps.into_iter().map(|dep| self.graph[dep].name()).collect()
  }

  /// Nodes grouped into waves. Within a wave, nodes keep declaration order.
  pub fn waves(&self) -> Result<Vec<Vec<PlanNode>>, DescriptorError> {
    let mut in_degree: Vec<usize> = self
      .graph
      .node_indices()
      .map(|idx| self.graph.neighbors_directed(idx, Direction::Incoming).count())
      .collect();
    let mut remaining: Vec<NodeIndex> = self.graph.node_indices().collect();
    let mut waves = Vec::new();

    while !remaining.is_empty() {
      let (ready, blocked): (Vec<NodeIndex>, Vec<NodeIndex>) =
        remaining.into_iter().partition(|idx| in_degree[idx.index()] == 0);

      if ready.is_empty() {
        return Err(DescriptorError::CycleDetected);
      }

      for &idx in &ready {
        for dependent in self.graph.neighbors_directed(idx, Direction::Outgoing) {
          let degree = &mut in_degree[dependent.index()];
          *degree = degree.saturating_sub(1);
        }
      }

      waves.push(ready.into_iter().map(|idx| self.graph[idx].clone()).collect());
      remaining = blocked;
    }

    Ok(waves)
  }
}
