//! Runtime flow representation using a directed graph.
//!
//! The serialized `FlowModel` is validated and loaded into a petgraph
//! `DiGraph` once per execution. The graph is never mutated afterwards, so a
//! single instance can be read by the dispatcher and every node action
//! without locking.

use std::collections::HashMap;

use petgraph::{
    Direction,
    graph::{DiGraph, EdgeIndex, NodeIndex},
    visit::EdgeRef,
};

use crate::{
    AgentflowError, Result,
    model::{EdgeModel, FlowModel, NodeId, NodeModel},
};

/// Immutable snapshot of a validated flow.
pub struct FlowGraph {
    graph: DiGraph<NodeModel, EdgeModel>,
    index: HashMap<NodeId, NodeIndex>,
}

impl FlowGraph {
    /// Output a human-readable representation of the flow graph
    pub fn schema(&self) -> String {
        let mut lines = Vec::new();

        lines.push("=== Flow Graph ===".to_string());
        lines.push(format!("Nodes: {}, Edges: {}", self.graph.node_count(), self.graph.edge_count()));
        lines.push(String::new());

        lines.push("--- Nodes ---".to_string());
        for idx in self.graph.node_indices() {
            let node = &self.graph[idx];
            lines.push(format!("[{}] (type: {})", node.id, node.node_type));
        }
        lines.push(String::new());

        lines.push("--- Graph Structure ---".to_string());
        for idx in self.graph.node_indices() {
            let node = &self.graph[idx];
            let outgoing: Vec<String> = self
                .sorted_edges(idx, Direction::Outgoing)
                .into_iter()
                .map(|e| {
                    let target_id = &self.graph[e].target;
                    match &self.graph[e].source_handle {
                        Some(handle) => format!("{}({})", target_id, handle),
                        None => target_id.clone(),
                    }
                })
                .collect();

            if outgoing.is_empty() {
                lines.push(format!("{} -> (end)", node.id));
            } else {
                lines.push(format!("{} -> {}", node.id, outgoing.join(", ")));
            }
        }

        lines.join("\n")
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// get node by id
    pub fn node(
        &self,
        id: &str,
    ) -> Option<&NodeModel> {
        self.index.get(id).map(|idx| &self.graph[*idx])
    }

    /// get all node ids, in declaration order
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.graph.node_indices().map(|idx| self.graph[idx].id.clone()).collect()
    }

    /// nodes without incoming edges, in declaration order
    pub fn starting_nodes(&self) -> Vec<NodeId> {
        self.graph
            .node_indices()
            .filter(|idx| self.graph.neighbors_directed(*idx, Direction::Incoming).next().is_none())
            .map(|idx| self.graph[idx].id.clone())
            .collect()
    }

    /// Outgoing edges of a node in the order they were declared.
    pub fn outgoing_edges(
        &self,
        nid: &str,
    ) -> Vec<&EdgeModel> {
        self.index
            .get(nid)
            .map(|idx| self.sorted_edges(*idx, Direction::Outgoing).into_iter().map(|e| &self.graph[e]).collect())
            .unwrap_or_default()
    }

    /// Targets of the outgoing edges, in edge order. A target reached by two
    /// parallel edges appears twice.
    pub fn successors(
        &self,
        nid: &str,
    ) -> Vec<NodeId> {
        self.outgoing_edges(nid).into_iter().map(|e| e.target.clone()).collect()
    }

    /// Distinct sources of the incoming edges.
    pub fn predecessors(
        &self,
        nid: &str,
    ) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = Vec::new();
        if let Some(idx) = self.index.get(nid) {
            for e in self.sorted_edges(*idx, Direction::Incoming) {
                let source = &self.graph[e].source;
                if !ids.contains(source) {
                    ids.push(source.clone());
                }
            }
        }
        ids
    }

    /// petgraph walks adjacency lists newest-first; sort back to insertion order
    fn sorted_edges(
        &self,
        idx: NodeIndex,
        direction: Direction,
    ) -> Vec<EdgeIndex> {
        let mut edges: Vec<EdgeIndex> = self.graph.edges_directed(idx, direction).map(|e| e.id()).collect();
        edges.sort();
        edges
    }
}

impl TryFrom<&FlowModel> for FlowGraph {
    type Error = AgentflowError;

    fn try_from(model: &FlowModel) -> Result<Self> {
        model.validate()?;

        let mut graph: DiGraph<NodeModel, EdgeModel> = DiGraph::with_capacity(model.nodes.len(), model.edges.len());
        let mut index = HashMap::with_capacity(model.nodes.len());

        for node in model.nodes.iter() {
            let idx = graph.add_node(node.clone());
            index.insert(node.id.clone(), idx);
        }
        for edge in model.edges.iter() {
            let source = index.get(&edge.source).ok_or(AgentflowError::Structural(format!("source node {} not found", edge.source)))?;
            let target = index.get(&edge.target).ok_or(AgentflowError::Structural(format!("target node {} not found", edge.target)))?;
            graph.add_edge(*source, *target, edge.clone());
        }

        Ok(Self {
            graph,
            index,
        })
    }
}
