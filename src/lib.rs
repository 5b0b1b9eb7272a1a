//! # Draftloom: Workflow-Editor Reconciliation Engine
//!
//! Draftloom keeps an editable workflow graph (nodes + edges of an
//! automation workflow) synchronized with a remote versioned store. It
//! is the engine behind a workflow-builder UI: optimistic local
//! editing, debounced autosave onto the single mutable *draft* version,
//! bounded undo/redo, conflict-free remote polling, graph merge for
//! paste/duplicate/import, and per-device viewport memory.
//!
//! The rendering canvas, form widgets, authentication, and the backend
//! itself stay behind narrow seams ([`canvas::CanvasSurface`],
//! [`client::TokenProvider`], the HTTP contract in [`client`]); the
//! engine is UI-technology agnostic and fully drivable from tests.
//!
//! ## Core Concepts
//!
//! - **Canonical serialization**: two graphs are equal iff their
//!   payloads serialize to byte-identical JSON. That one oracle drives
//!   pending-changes detection, autosave, and history.
//! - **Draft**: the highest-numbered non-active version above the
//!   active one. All edits flow into it; promoting it freezes it.
//! - **Session**: an explicit controller object owning the live graph
//!   and every "is the user doing X right now" flag, consulted
//!   synchronously before any async result is applied.
//!
//! ## Quick Start
//!
//! ### Editing and history
//!
//! ```
//! use draftloom::config::EngineConfig;
//! use draftloom::model::Position;
//! use draftloom::session::EditorSession;
//! use draftloom::types::NodeKind;
//!
//! let config = EngineConfig::default();
//! let mut session = EditorSession::new(&config);
//!
//! let start = session.create_node(NodeKind::Start, Position::default(), 1)?;
//! let agent = session.create_node(NodeKind::Agent, Position::new(240.0, 0.0), 2)?;
//!
//! // The start node is protected; everything else cascades.
//! assert!(session.delete_nodes(&[start.clone()]).is_err());
//! assert!(session.undo()?);
//! assert!(!session.graph.contains_slug(&agent));
//! # Ok::<(), draftloom::session::SessionError>(())
//! ```
//!
//! ### Draft resolution
//!
//! ```
//! use draftloom::versions::{WorkflowVersionSummary, resolve_draft_candidate};
//!
//! let versions = vec![
//!     WorkflowVersionSummary::sample("v1", "wf", 1, true),
//!     WorkflowVersionSummary::sample("v2", "wf", 2, false),
//! ];
//! assert_eq!(resolve_draft_candidate(&versions).unwrap().id, "v2");
//! ```
//!
//! ## Module Guide
//!
//! - [`model`] - Nodes, edges, payloads, and structural validation
//! - [`versions`] - Draft resolution and version ordering
//! - [`history`] - Undo/redo over canonical snapshots
//! - [`merge`] - Fragment insertion for paste/duplicate/import
//! - [`viewport`] - Per-device camera memory and restoration
//! - [`save`] - Debounced autosave and the draft lifecycle
//! - [`poll`] - Remote divergence detection
//! - [`client`] - The workflow store's HTTP contract
//! - [`session`] - The controller object tying it together

pub mod canvas;
pub mod client;
pub mod config;
pub mod history;
pub mod import;
pub mod merge;
pub mod model;
pub mod poll;
pub mod save;
pub mod session;
pub mod telemetry;
pub mod types;
pub mod utils;
pub mod versions;
pub mod viewport;
