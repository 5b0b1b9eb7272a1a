//! The editable graph: ordered node/edge collections plus the mutations
//! that preserve its invariants.

use miette::Diagnostic;
use thiserror::Error;

use super::edge::WorkflowEdge;
use super::node::{Position, WorkflowNode};
use super::payload::GraphPayload;
use crate::types::NodeKind;

/// Errors raised by graph mutations.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    /// The start node is protected from deletion.
    #[error("the start node cannot be deleted")]
    #[diagnostic(
        code(draftloom::model::start_protected),
        help("Every workflow needs exactly one start node; disable downstream nodes instead.")
    )]
    StartNodeProtected,

    /// No node with the given slug exists.
    #[error("unknown node: {slug}")]
    #[diagnostic(code(draftloom::model::unknown_node))]
    UnknownNode { slug: String },

    /// A node with the given slug already exists.
    #[error("duplicate node slug: {slug}")]
    #[diagnostic(code(draftloom::model::duplicate_slug))]
    DuplicateSlug { slug: String },

    /// At most one start node may exist per graph.
    #[error("a start node already exists")]
    #[diagnostic(code(draftloom::model::duplicate_start))]
    DuplicateStartNode,

    /// An edge with the given id already exists.
    #[error("duplicate edge id: {id}")]
    #[diagnostic(code(draftloom::model::duplicate_edge))]
    DuplicateEdge { id: String },
}

/// Ordered collection of nodes and edges.
///
/// Array order is part of the canonical form: payloads serialize nodes
/// and edges in their current order, so mutations append rather than
/// reorder.
///
/// # Examples
///
/// ```rust
/// use draftloom::model::{Graph, Position, WorkflowEdge, WorkflowNode};
/// use draftloom::types::NodeKind;
///
/// let mut graph = Graph::new();
/// graph
///     .insert_node(WorkflowNode::new("start", NodeKind::Start, Position::default()))
///     .unwrap();
/// graph
///     .insert_node(WorkflowNode::new("agent-1", NodeKind::Agent, Position::new(200.0, 0.0)))
///     .unwrap();
/// graph
///     .insert_edge(WorkflowEdge::new("e-1", "start", "agent-1"))
///     .unwrap();
///
/// // The start node is protected.
/// assert!(graph.remove_node("start").is_err());
///
/// // Removing any other node cascades to its edges.
/// graph.remove_node("agent-1").unwrap();
/// assert!(graph.edges.is_empty());
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Graph {
    pub nodes: Vec<WorkflowNode>,
    pub edges: Vec<WorkflowEdge>,
}

impl Graph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from already-validated parts, preserving order.
    #[must_use]
    pub fn from_parts(nodes: Vec<WorkflowNode>, edges: Vec<WorkflowEdge>) -> Self {
        Self { nodes, edges }
    }

    #[must_use]
    pub fn node(&self, slug: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.slug == slug)
    }

    pub fn node_mut(&mut self, slug: &str) -> Option<&mut WorkflowNode> {
        self.nodes.iter_mut().find(|n| n.slug == slug)
    }

    #[must_use]
    pub fn contains_slug(&self, slug: &str) -> bool {
        self.node(slug).is_some()
    }

    #[must_use]
    pub fn contains_edge_id(&self, id: &str) -> bool {
        self.edges.iter().any(|e| e.id == id)
    }

    /// The graph's start node, if present.
    #[must_use]
    pub fn start_node(&self) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.kind.is_start())
    }

    /// Append a node, rejecting duplicate slugs and a second start
    /// node.
    pub fn insert_node(&mut self, node: WorkflowNode) -> Result<(), GraphError> {
        if self.contains_slug(&node.slug) {
            return Err(GraphError::DuplicateSlug { slug: node.slug });
        }
        if node.kind.is_start() && self.start_node().is_some() {
            return Err(GraphError::DuplicateStartNode);
        }
        self.nodes.push(node);
        Ok(())
    }

    /// Append an edge, rejecting duplicate ids.
    pub fn insert_edge(&mut self, edge: WorkflowEdge) -> Result<(), GraphError> {
        if self.contains_edge_id(&edge.id) {
            return Err(GraphError::DuplicateEdge { id: edge.id });
        }
        self.edges.push(edge);
        Ok(())
    }

    /// Delete a node and every edge touching it.
    ///
    /// Deleting a node of kind [`NodeKind::Start`] is rejected; the graph
    /// is left untouched and the caller surfaces the error to the user.
    pub fn remove_node(&mut self, slug: &str) -> Result<(), GraphError> {
        let Some(node) = self.node(slug) else {
            return Err(GraphError::UnknownNode {
                slug: slug.to_string(),
            });
        };
        if node.kind.is_start() {
            return Err(GraphError::StartNodeProtected);
        }
        self.nodes.retain(|n| n.slug != slug);
        self.edges.retain(|e| e.source != slug && e.target != slug);
        Ok(())
    }

    /// Delete an edge by id. Unknown ids are a no-op.
    pub fn remove_edge(&mut self, id: &str) {
        self.edges.retain(|e| e.id != id);
    }

    /// Toggle a node's enabled flag. Disabled nodes keep their edges and
    /// stay in the payload; they only leave validation scope.
    pub fn set_node_enabled(&mut self, slug: &str, enabled: bool) -> Result<(), GraphError> {
        match self.node_mut(slug) {
            Some(node) => {
                node.is_enabled = enabled;
                Ok(())
            }
            None => Err(GraphError::UnknownNode {
                slug: slug.to_string(),
            }),
        }
    }

    /// Move a node, keeping `metadata["position"]` in sync.
    pub fn update_node_position(
        &mut self,
        slug: &str,
        position: Position,
    ) -> Result<(), GraphError> {
        match self.node_mut(slug) {
            Some(node) => {
                node.position = position;
                node.sync_position_metadata();
                Ok(())
            }
            None => Err(GraphError::UnknownNode {
                slug: slug.to_string(),
            }),
        }
    }

    /// Whether a node exists, is enabled, and is of the given kind.
    #[must_use]
    pub fn is_enabled_of_kind(&self, slug: &str, kind: &NodeKind) -> bool {
        self.node(slug)
            .map(|n| n.is_enabled && &n.kind == kind)
            .unwrap_or(false)
    }

    /// Edges whose endpoints both exist and are enabled.
    pub fn active_edges(&self) -> impl Iterator<Item = &WorkflowEdge> {
        self.edges.iter().filter(|e| {
            self.node(&e.source).map(|n| n.is_enabled).unwrap_or(false)
                && self.node(&e.target).map(|n| n.is_enabled).unwrap_or(false)
        })
    }

    /// Active edges leaving the given node.
    pub fn outgoing_active_edges<'a>(
        &'a self,
        slug: &'a str,
    ) -> impl Iterator<Item = &'a WorkflowEdge> {
        self.active_edges().filter(move |e| e.source == slug)
    }

    /// Active edges arriving at the given node.
    pub fn incoming_active_edges<'a>(
        &'a self,
        slug: &'a str,
    ) -> impl Iterator<Item = &'a WorkflowEdge> {
        self.active_edges().filter(move |e| e.target == slug)
    }

    /// Build the canonical wire payload for this graph.
    #[must_use]
    pub fn payload(&self) -> GraphPayload {
        GraphPayload::from_graph(self)
    }

    /// Canonical serialization: the byte-level equality oracle used by
    /// autosave, history, and pending-changes detection.
    pub fn canonical_json(&self) -> Result<String, serde_json::Error> {
        self.payload().canonical_json()
    }
}
