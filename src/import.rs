//! JSON file import parsing.
//!
//! Turns user-supplied bytes into an [`ImportBundle`] the merge engine
//! or the import endpoint can consume, or a typed [`ImportError`] the
//! host maps to a localized message. Accepts either a bare graph
//! (`{nodes, edges}`) or an envelope carrying workflow metadata next to
//! the graph.

use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;

use crate::model::{GraphPayload, WorkflowEdge, WorkflowNode};

/// Why an import file was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportErrorReason {
    InvalidJson,
    MissingNodes,
    InvalidNode,
    InvalidEdge,
    InvalidGraph,
}

/// A rejected import file.
#[derive(Debug, Error, Diagnostic)]
pub enum ImportError {
    #[error("file is not valid JSON: {detail}")]
    #[diagnostic(code(draftloom::import::invalid_json))]
    InvalidJson { detail: String },

    #[error("graph has no nodes")]
    #[diagnostic(code(draftloom::import::missing_nodes))]
    MissingNodes,

    #[error("node {index} is malformed: {detail}")]
    #[diagnostic(code(draftloom::import::invalid_node))]
    InvalidNode { index: usize, detail: String },

    #[error("edge {index} is malformed: {detail}")]
    #[diagnostic(code(draftloom::import::invalid_edge))]
    InvalidEdge { index: usize, detail: String },

    #[error("graph is malformed: {detail}")]
    #[diagnostic(code(draftloom::import::invalid_graph))]
    InvalidGraph { detail: String },
}

impl ImportError {
    /// The reason code the host maps to a localized message.
    #[must_use]
    pub fn reason(&self) -> ImportErrorReason {
        match self {
            ImportError::InvalidJson { .. } => ImportErrorReason::InvalidJson,
            ImportError::MissingNodes => ImportErrorReason::MissingNodes,
            ImportError::InvalidNode { .. } => ImportErrorReason::InvalidNode,
            ImportError::InvalidEdge { .. } => ImportErrorReason::InvalidEdge,
            ImportError::InvalidGraph { .. } => ImportErrorReason::InvalidGraph,
        }
    }
}

/// Parsed import file: the graph plus any workflow metadata the
/// envelope carried.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImportBundle {
    pub graph: GraphPayload,
    pub workflow_id: Option<String>,
    pub slug: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub mark_as_active: Option<bool>,
    pub version_name: Option<String>,
}

/// Parse user-supplied bytes into an import bundle.
pub fn parse_import(bytes: &[u8]) -> Result<ImportBundle, ImportError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|err| ImportError::InvalidJson {
            detail: err.to_string(),
        })?;
    let Value::Object(root) = value else {
        return Err(ImportError::InvalidGraph {
            detail: "top level must be an object".to_string(),
        });
    };

    // Envelope form nests the graph; bare form is the graph itself.
    let (graph_value, envelope) = match root.get("graph") {
        Some(graph) => (graph.clone(), Some(&root)),
        None => (Value::Object(root.clone()), None),
    };
    let Value::Object(graph_obj) = graph_value else {
        return Err(ImportError::InvalidGraph {
            detail: "graph must be an object".to_string(),
        });
    };

    let nodes = match graph_obj.get("nodes") {
        Some(Value::Array(nodes)) if !nodes.is_empty() => nodes.clone(),
        _ => return Err(ImportError::MissingNodes),
    };
    let edges = match graph_obj.get("edges") {
        None => Vec::new(),
        Some(Value::Array(edges)) => edges.clone(),
        Some(_) => {
            return Err(ImportError::InvalidGraph {
                detail: "edges must be an array".to_string(),
            });
        }
    };

    let mut parsed_nodes: Vec<WorkflowNode> = Vec::with_capacity(nodes.len());
    for (index, node) in nodes.into_iter().enumerate() {
        let node: WorkflowNode =
            serde_json::from_value(node).map_err(|err| ImportError::InvalidNode {
                index,
                detail: err.to_string(),
            })?;
        if node.slug.trim().is_empty() {
            return Err(ImportError::InvalidNode {
                index,
                detail: "slug must not be empty".to_string(),
            });
        }
        parsed_nodes.push(node);
    }

    let mut parsed_edges: Vec<WorkflowEdge> = Vec::with_capacity(edges.len());
    for (index, edge) in edges.into_iter().enumerate() {
        let edge: WorkflowEdge =
            serde_json::from_value(edge).map_err(|err| ImportError::InvalidEdge {
                index,
                detail: err.to_string(),
            })?;
        parsed_edges.push(edge);
    }
    for edge in &parsed_edges {
        let known = |slug: &str| parsed_nodes.iter().any(|n| n.slug == slug);
        if !known(&edge.source) || !known(&edge.target) {
            return Err(ImportError::InvalidGraph {
                detail: format!("edge {} references a missing node", edge.id),
            });
        }
    }

    let field = |key: &str| {
        envelope
            .and_then(|env| env.get(key))
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    Ok(ImportBundle {
        graph: GraphPayload {
            nodes: parsed_nodes,
            edges: parsed_edges,
        },
        workflow_id: field("workflow_id"),
        slug: field("slug"),
        display_name: field("display_name"),
        description: field("description"),
        mark_as_active: envelope
            .and_then(|env| env.get("mark_as_active"))
            .and_then(Value::as_bool),
        version_name: field("version_name"),
    })
}
