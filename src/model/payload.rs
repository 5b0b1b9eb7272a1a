//! The canonical wire payload.

use serde::{Deserialize, Serialize};

use super::edge::WorkflowEdge;
use super::graph::Graph;
use super::node::WorkflowNode;

/// Serializable graph payload: nodes then edges, in live array order.
///
/// Used both for persistence (`graph` bodies in the HTTP contract) and
/// for snapshot/diff comparisons. Equality of two graphs is defined as
/// byte-identical [`canonical_json`](Self::canonical_json) output.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphPayload {
    pub nodes: Vec<WorkflowNode>,
    pub edges: Vec<WorkflowEdge>,
}

impl GraphPayload {
    /// Build the payload from a live graph.
    ///
    /// Each node's `metadata["position"]` is refreshed from its live
    /// position before serialization, so the redundant copy can never go
    /// stale in persisted form.
    #[must_use]
    pub fn from_graph(graph: &Graph) -> Self {
        let mut nodes = graph.nodes.clone();
        for node in &mut nodes {
            node.sync_position_metadata();
        }
        Self {
            nodes,
            edges: graph.edges.clone(),
        }
    }

    /// Deterministic JSON form.
    ///
    /// `serde_json` maps are key-ordered and struct fields serialize in
    /// declaration order, so equal payloads always produce identical
    /// bytes.
    pub fn canonical_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a snapshot string back into a payload.
    pub fn parse(snapshot: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(snapshot)
    }

    /// Split into parts, dropping nodes of unrecognized kind and edges
    /// left dangling by the drop.
    ///
    /// History restoration and the merge engine both route through this
    /// filter so a payload written by a newer editor can never introduce
    /// kinds this build cannot render.
    #[must_use]
    pub fn into_recognized_parts(self) -> (Vec<WorkflowNode>, Vec<WorkflowEdge>) {
        let nodes: Vec<WorkflowNode> = self
            .nodes
            .into_iter()
            .filter(|n| n.kind.is_recognized())
            .collect();
        let edges = self
            .edges
            .into_iter()
            .filter(|e| {
                nodes.iter().any(|n| n.slug == e.source) && nodes.iter().any(|n| n.slug == e.target)
            })
            .collect();
        (nodes, edges)
    }
}
