//! The editor session: one controller object owning the live graph and
//! every synchronously-consulted flag.
//!
//! The source of truth for "is the user actively doing X" lives here as
//! plain fields, read at the moment an async result is about to be
//! applied. Handlers receive the session by reference instead of
//! reaching for ambient state, which preserves the
//! read-latest-value-synchronously behavior the save and poll paths
//! depend on.

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::canvas::CanvasSurface;
use crate::config::EngineConfig;
use crate::history::{HistoryEngine, restore_parts};
use crate::import::ImportBundle;
use crate::merge::{
    DUPLICATE_OFFSET, MergeError, MergeInsertion, MergeTarget, merge_fragment,
};
use crate::model::{
    Graph, GraphError, GraphPayload, Position, ValidationError, WorkflowEdge, WorkflowNode,
    mint_slug, validate_graph,
};
use crate::types::{DeviceType, NodeKind};
use crate::versions::{VersionRegistry, WorkflowSummary};
use crate::viewport::{Viewport, ViewportKey, ViewportMemory};

/// Errors from session-level operations.
#[derive(Debug, Error, Diagnostic)]
pub enum SessionError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Merge(#[from] MergeError),

    #[error("failed to serialize graph snapshot")]
    #[diagnostic(code(draftloom::session::serialize))]
    Serialize(#[from] serde_json::Error),

    /// The chatkit default workflow is protected from deletion.
    #[error("the default workflow cannot be deleted")]
    #[diagnostic(
        code(draftloom::session::protected_workflow),
        help("Pick another workflow as the chatkit default first.")
    )]
    ProtectedWorkflow,
}

/// Current canvas selection: node slugs, edge ids, and the primary
/// element.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    pub nodes: Vec<String>,
    pub edges: Vec<String>,
    pub primary: Option<String>,
}

impl Selection {
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.primary = None;
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// The editing session for one open workflow.
pub struct EditorSession {
    pub graph: Graph,
    pub registry: VersionRegistry,
    pub history: HistoryEngine,
    pub viewports: ViewportMemory,
    pub selection: Selection,
    workflow: Option<WorkflowSummary>,
    version_id: Option<String>,
    device: DeviceType,
    last_saved: Option<String>,
    pending_changes: bool,
    dragging: bool,
    properties_panel_open: bool,
    preview: bool,
    hydrating: bool,
    draft_creation_in_flight: bool,
    parameter_errors: FxHashMap<String, String>,
}

impl EditorSession {
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            graph: Graph::new(),
            registry: VersionRegistry::new(),
            history: HistoryEngine::with_capacity(config.history_capacity),
            viewports: ViewportMemory::new(config.viewport_debouncer()),
            selection: Selection::default(),
            workflow: None,
            version_id: None,
            device: DeviceType::Desktop,
            last_saved: None,
            pending_changes: false,
            dragging: false,
            properties_panel_open: false,
            preview: false,
            hydrating: false,
            draft_creation_in_flight: false,
            parameter_errors: FxHashMap::default(),
        }
    }

    // ------------------------------------------------------------------
    // Identity & flags
    // ------------------------------------------------------------------

    #[must_use]
    pub fn workflow(&self) -> Option<&WorkflowSummary> {
        self.workflow.as_ref()
    }

    #[must_use]
    pub fn workflow_id(&self) -> Option<&str> {
        self.workflow.as_ref().map(|w| w.id.as_str())
    }

    #[must_use]
    pub fn version_id(&self) -> Option<&str> {
        self.version_id.as_deref()
    }

    #[must_use]
    pub fn device(&self) -> DeviceType {
        self.device
    }

    #[must_use]
    pub fn pending_changes(&self) -> bool {
        self.pending_changes
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    #[must_use]
    pub fn properties_panel_open(&self) -> bool {
        self.properties_panel_open
    }

    pub fn set_properties_panel_open(&mut self, open: bool) {
        self.properties_panel_open = open;
    }

    #[must_use]
    pub fn is_preview(&self) -> bool {
        self.preview
    }

    /// Preview mode is read-only viewing: history is disabled entirely.
    pub fn set_preview(&mut self, preview: bool) {
        self.preview = preview;
        self.history.set_enabled(!preview);
    }

    #[must_use]
    pub fn is_hydrating(&self) -> bool {
        self.hydrating
    }

    pub fn set_hydrating(&mut self, hydrating: bool) {
        self.hydrating = hydrating;
    }

    /// Whether this session still speaks for the workflow's draft state
    /// (used to gate synthetic draft reconstruction).
    #[must_use]
    pub fn is_authoritative(&self) -> bool {
        self.workflow.is_some() && !self.preview
    }

    /// The reentrancy guard around draft creation. Consulted before any
    /// routine that would mint a new draft; a second trigger firing
    /// while the first create call is in flight backs off instead of
    /// creating a duplicate.
    #[must_use]
    pub fn draft_creation_in_flight(&self) -> bool {
        self.draft_creation_in_flight
    }

    pub fn set_draft_creation_in_flight(&mut self, in_flight: bool) {
        self.draft_creation_in_flight = in_flight;
    }

    #[must_use]
    pub fn last_saved_snapshot(&self) -> Option<&str> {
        self.last_saved.as_deref()
    }

    /// Record the snapshot a successful save established as baseline.
    pub fn mark_saved(&mut self, snapshot: String) {
        self.last_saved = Some(snapshot);
        self.pending_changes = false;
    }

    /// Reclassify the device from a surface width. A class change
    /// invalidates the active viewport key and plans a fresh restore.
    pub fn set_device_width(&mut self, width: f64) -> bool {
        let device = DeviceType::from_width(width);
        if device == self.device {
            return false;
        }
        self.device = device;
        if let Some(key) = self.viewport_key() {
            self.viewports.plan_restore(&key);
        }
        true
    }

    /// The viewport key for the current (device, workflow, version), or
    /// `None` when no workflow is selected.
    #[must_use]
    pub fn viewport_key(&self) -> Option<ViewportKey> {
        let workflow = self.workflow.as_ref()?;
        Some(ViewportKey::new(
            self.device,
            workflow.id.clone(),
            self.version_id.as_deref(),
        ))
    }

    /// Record a settled pan/zoom under the current key.
    pub fn note_viewport_settled(&mut self, viewport: Viewport, now: std::time::Instant) {
        if let Some(key) = self.viewport_key() {
            self.viewports.note_settled(key, viewport, now);
        }
    }

    /// Guard called before deleting a workflow remotely.
    pub fn ensure_workflow_deletable(summary: &WorkflowSummary) -> Result<(), SessionError> {
        if summary.is_chatkit_default {
            return Err(SessionError::ProtectedWorkflow);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Open a workflow; the caller follows up with version adoption and
    /// a `load_version`.
    pub fn select_workflow(&mut self, workflow: WorkflowSummary) {
        self.workflow = Some(workflow);
        self.version_id = None;
        self.registry = VersionRegistry::new();
        self.selection.clear();
        self.parameter_errors.clear();
        self.last_saved = None;
        self.pending_changes = false;
    }

    pub fn close_workflow(&mut self) {
        self.workflow = None;
        self.version_id = None;
        self.selection.clear();
        self.pending_changes = false;
    }

    /// Replace the live graph with a loaded version.
    ///
    /// A foreground load resets history to the loaded snapshot and
    /// plans a viewport restore. A `background` load — the post-save
    /// rehydration of the same logical content — arms the history
    /// engine's restore flag instead, so the reload does not register
    /// as an undoable edit, and leaves the viewport alone.
    pub fn load_version(
        &mut self,
        version_id: impl Into<String>,
        payload: GraphPayload,
        background: bool,
    ) -> Result<(), SessionError> {
        let (nodes, edges) = payload.into_recognized_parts();
        self.graph = Graph::from_parts(nodes, edges);
        let snapshot = self.graph.canonical_json()?;
        self.version_id = Some(version_id.into());
        if background {
            self.history.mark_restoring();
            self.history.observe(&snapshot, false);
        } else {
            self.history.reset(snapshot.clone());
            self.selection.clear();
            if let Some(key) = self.viewport_key() {
                self.viewports.plan_restore(&key);
            }
        }
        self.last_saved = Some(snapshot);
        self.pending_changes = false;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Re-snapshot after a mutation: feed history (or the drag buffer)
    /// and recompute pending-changes against the saved baseline.
    pub fn commit_mutation(&mut self) -> Result<(), SessionError> {
        let snapshot = self.graph.canonical_json()?;
        self.history.observe(&snapshot, self.dragging);
        self.pending_changes = self.last_saved.as_deref() != Some(snapshot.as_str());
        Ok(())
    }

    /// Create a node of the given kind at a position, select it, and
    /// commit.
    pub fn create_node(
        &mut self,
        kind: NodeKind,
        position: Position,
        now_ms: i64,
    ) -> Result<String, SessionError> {
        let slug = mint_slug(&kind, now_ms);
        self.graph
            .insert_node(WorkflowNode::new(slug.clone(), kind, position))?;
        self.selection = Selection {
            nodes: vec![slug.clone()],
            edges: Vec::new(),
            primary: Some(slug.clone()),
        };
        self.commit_mutation()?;
        Ok(slug)
    }

    /// Delete nodes, cascading to their edges. Deleting the start node
    /// fails the whole batch before anything is removed.
    pub fn delete_nodes(&mut self, slugs: &[String]) -> Result<(), SessionError> {
        if slugs
            .iter()
            .any(|slug| self.graph.node(slug).is_some_and(|n| n.kind.is_start()))
        {
            return Err(GraphError::StartNodeProtected.into());
        }
        for slug in slugs {
            self.graph.remove_node(slug)?;
        }
        self.selection.clear();
        self.commit_mutation()
    }

    pub fn delete_edges(&mut self, ids: &[String]) -> Result<(), SessionError> {
        for id in ids {
            self.graph.remove_edge(id);
        }
        self.selection.clear();
        self.commit_mutation()
    }

    pub fn connect(&mut self, edge: WorkflowEdge) -> Result<(), SessionError> {
        self.graph.insert_edge(edge)?;
        self.commit_mutation()
    }

    pub fn set_node_enabled(&mut self, slug: &str, enabled: bool) -> Result<(), SessionError> {
        self.graph.set_node_enabled(slug, enabled)?;
        self.commit_mutation()
    }

    /// Move a node. During a drag the history engine buffers the
    /// intermediate snapshots; see [`end_drag`](Self::end_drag).
    pub fn move_node(&mut self, slug: &str, position: Position) -> Result<(), SessionError> {
        self.graph.update_node_position(slug, position)?;
        self.commit_mutation()
    }

    pub fn begin_drag(&mut self) {
        self.dragging = true;
    }

    /// Finish a drag gesture, committing at most one history entry for
    /// the whole movement.
    pub fn end_drag(&mut self) -> Result<(), SessionError> {
        self.dragging = false;
        self.history.end_drag();
        let snapshot = self.graph.canonical_json()?;
        self.pending_changes = self.last_saved.as_deref() != Some(snapshot.as_str());
        Ok(())
    }

    // ------------------------------------------------------------------
    // Undo / redo
    // ------------------------------------------------------------------

    /// Step history back. Returns `false` when there was nothing to
    /// undo.
    pub fn undo(&mut self) -> Result<bool, SessionError> {
        let Some(snapshot) = self.history.undo() else {
            return Ok(false);
        };
        self.apply_snapshot(&snapshot)?;
        Ok(true)
    }

    /// Step history forward. Returns `false` when there was nothing to
    /// redo.
    pub fn redo(&mut self) -> Result<bool, SessionError> {
        let Some(snapshot) = self.history.redo() else {
            return Ok(false);
        };
        self.apply_snapshot(&snapshot)?;
        Ok(true)
    }

    fn apply_snapshot(&mut self, snapshot: &str) -> Result<(), SessionError> {
        let (nodes, edges) = restore_parts(snapshot)?;
        self.graph = Graph::from_parts(nodes, edges);
        self.selection.clear();
        self.pending_changes = self.last_saved.as_deref() != Some(snapshot);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Merge: paste / duplicate / import
    // ------------------------------------------------------------------

    /// Paste a foreign fragment, centered on the canvas when a surface
    /// is available.
    pub fn paste_fragment(
        &mut self,
        nodes: Vec<WorkflowNode>,
        edges: Vec<WorkflowEdge>,
        surface: Option<&dyn CanvasSurface>,
    ) -> Result<MergeInsertion, SessionError> {
        let target = match surface {
            Some(surface) => MergeTarget::Surface(surface),
            None => MergeTarget::Unanchored,
        };
        self.insert_fragment(nodes, edges, target)
    }

    /// Duplicate the current node selection (with its induced edges),
    /// offset by +80/+80 from the originals.
    pub fn duplicate_selection(&mut self) -> Result<MergeInsertion, SessionError> {
        let nodes: Vec<WorkflowNode> = self
            .graph
            .nodes
            .iter()
            .filter(|n| self.selection.nodes.contains(&n.slug))
            .cloned()
            .collect();
        if nodes.is_empty() {
            return Err(MergeError::NothingToInsert.into());
        }
        let edges: Vec<WorkflowEdge> = self
            .graph
            .edges
            .iter()
            .filter(|e| {
                self.selection.nodes.contains(&e.source) && self.selection.nodes.contains(&e.target)
            })
            .cloned()
            .collect();

        let mut min = Position::new(f64::INFINITY, f64::INFINITY);
        let mut max = Position::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for node in &nodes {
            min = Position::new(min.x.min(node.position.x), min.y.min(node.position.y));
            max = Position::new(max.x.max(node.position.x), max.y.max(node.position.y));
        }
        let target = Position::new(
            (min.x + max.x) / 2.0 + DUPLICATE_OFFSET,
            (min.y + max.y) / 2.0 + DUPLICATE_OFFSET,
        );
        self.insert_fragment(nodes, edges, MergeTarget::Explicit(target))
    }

    /// Merge an imported file into the open workflow.
    pub fn import_bundle(
        &mut self,
        bundle: ImportBundle,
        surface: Option<&dyn CanvasSurface>,
    ) -> Result<MergeInsertion, SessionError> {
        self.paste_fragment(bundle.graph.nodes, bundle.graph.edges, surface)
    }

    fn insert_fragment(
        &mut self,
        nodes: Vec<WorkflowNode>,
        edges: Vec<WorkflowEdge>,
        target: MergeTarget<'_>,
    ) -> Result<MergeInsertion, SessionError> {
        let insertion = merge_fragment(&mut self.graph, nodes, edges, target)?;
        self.selection = Selection {
            nodes: insertion.node_slugs.clone(),
            edges: insertion.edge_ids.clone(),
            primary: insertion.node_slugs.first().cloned(),
        };
        self.commit_mutation()?;
        Ok(insertion)
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    /// Record that a node's staged parameter text failed to parse.
    pub fn note_parameter_error(&mut self, slug: impl Into<String>, detail: impl Into<String>) {
        self.parameter_errors.insert(slug.into(), detail.into());
    }

    pub fn clear_parameter_error(&mut self, slug: &str) {
        self.parameter_errors.remove(slug);
    }

    /// Every finding that blocks a save: parameter parse errors first,
    /// then structural violations.
    #[must_use]
    pub fn blocking_validation(&self) -> Vec<ValidationError> {
        let mut findings: Vec<ValidationError> = Vec::new();
        let mut parameter_errors: Vec<_> = self.parameter_errors.iter().collect();
        parameter_errors.sort_by(|a, b| a.0.cmp(b.0));
        for (slug, detail) in parameter_errors {
            findings.push(ValidationError::ParameterParse {
                slug: slug.clone(),
                detail: detail.clone(),
            });
        }
        findings.extend(validate_graph(&self.graph));
        findings
    }
}
