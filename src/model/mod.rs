//! Canonical graph representation for the workflow editor.
//!
//! The model layer owns the editable node/edge collections, the wire
//! payload they serialize to, and the structural validation that gates
//! every save attempt.
//!
//! # Core Types
//!
//! - [`WorkflowNode`] / [`WorkflowEdge`]: the editable elements
//! - [`Graph`]: ordered collections plus invariant-preserving mutations
//! - [`GraphPayload`]: the canonical wire form; its serialization string
//!   is the equality oracle for autosave, history, and pending-changes
//!   detection
//! - [`validate::validate_graph`]: the blocking pre-save checks
//!
//! # Canonical serialization
//!
//! Two graphs are equal iff their payloads serialize to byte-identical
//! JSON. `serde_json`'s map type is key-ordered and struct fields
//! serialize in declaration order, so [`GraphPayload::canonical_json`]
//! is deterministic without any extra normalization pass.

pub mod edge;
pub mod graph;
pub mod node;
pub mod payload;
pub mod validate;

pub use edge::WorkflowEdge;
pub use graph::{Graph, GraphError};
pub use node::{Position, WorkflowNode, mint_slug};
pub use payload::GraphPayload;
pub use validate::{ValidationError, validate_graph};
