// src/dag/graph.rs

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::api::link::StepLink;
use crate::api::step::Step;
use crate::errors::{Result, StepError};

/// Steps connected by the links they create and require.
///
/// Edge direction: creator -> requirer. A step that requires a link no step
/// in the collection creates is not an error; such links are expected to be
/// satisfied outside this graph and are reported by [`StepGraph::external_links`].
pub struct StepGraph {
    graph: DiGraph<Arc<dyn Step>, StepLink>,
    order: Vec<NodeIndex>,
    external: BTreeSet<StepLink>,
}

impl std::fmt::Debug for StepGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepGraph")
            .field("order", &self.ordered_names())
            .field("external", &self.external)
            .finish()
    }
}

impl StepGraph {
    /// Wire `steps` together and compute an execution order.
    ///
    /// Fails with [`StepError::DagCycle`] if the links form a cycle.
    pub fn build(steps: Vec<Arc<dyn Step>>) -> Result<Self> {
        let mut graph: DiGraph<Arc<dyn Step>, StepLink> = DiGraph::new();
        let mut creators: HashMap<StepLink, Vec<NodeIndex>> = HashMap::new();

        for step in steps {
            let created = step.creates();
            let provided = step.provides().1;
            let idx = graph.add_node(step);
            for link in created.into_iter().chain(provided) {
                creators.entry(link).or_default().push(idx);
            }
        }

        let mut external = BTreeSet::new();
        let mut edges = Vec::new();
        for idx in graph.node_indices() {
            for link in graph[idx].requires() {
                match creators.get(&link) {
                    Some(from) => {
                        for &creator in from {
                            edges.push((creator, idx, link.clone()));
                        }
                    }
                    None => {
                        external.insert(link);
                    }
                }
            }
        }
        for (from, to, link) in edges {
            graph.add_edge(from, to, link);
        }

        let order = toposort(&graph, None).map_err(|cycle| {
            StepError::DagCycle(format!(
                "cycle detected in step graph involving step '{}'",
                graph[cycle.node_id()].name()
            ))
        })?;

        Ok(Self {
            graph,
            order,
            external,
        })
    }

    /// Steps in an order where every step comes after the steps creating
    /// the links it requires.
    pub fn ordered(&self) -> Vec<Arc<dyn Step>> {
        self.order
            .iter()
            .map(|&idx| Arc::clone(&self.graph[idx]))
            .collect()
    }

    pub fn ordered_names(&self) -> Vec<&str> {
        self.order.iter().map(|&idx| self.graph[idx].name()).collect()
    }

    /// Names of the steps `name` directly waits for.
    pub fn dependencies_of(&self, name: &str) -> Vec<&str> {
        self.find(name)
            .map(|idx| {
                self.graph
                    .neighbors_directed(idx, petgraph::Direction::Incoming)
                    .map(|dep| self.graph[dep].name())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Required links that no step in the graph creates.
    pub fn external_links(&self) -> &BTreeSet<StepLink> {
        &self.external
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    fn find(&self, name: &str) -> Option<NodeIndex> {
        self.graph
            .node_indices()
            .find(|&idx| self.graph[idx].name() == name)
    }
}
