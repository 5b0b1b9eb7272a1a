//! Graph merge engine: inserting a foreign fragment into the live graph.
//!
//! One algorithm serves paste-from-clipboard, duplicate-selection, and
//! file/JSON import into an open workflow: filter the fragment to known
//! kinds, dedupe every slug against the live graph *and* the batch,
//! re-anchor the fragment around a target point, remap edges through the
//! slug mapping, and append everything in one batch.

use miette::Diagnostic;
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use crate::canvas::{CanvasSurface, visual_center};
use crate::model::{Graph, GraphError, Position, WorkflowEdge, WorkflowNode};

/// Pixel offset applied when duplicating a selection in place.
pub const DUPLICATE_OFFSET: f64 = 80.0;

/// Where the inserted fragment should be centered.
pub enum MergeTarget<'a> {
    /// Caller-resolved point (duplicate uses the original selection
    /// center offset by +80/+80).
    Explicit(Position),
    /// Center on the surface's visual center, projected into graph
    /// space; falls back to viewport math, then to no translation.
    Surface(&'a dyn CanvasSurface),
    /// Keep the fragment's original coordinates.
    Unanchored,
}

/// Successful insertion: the ids now present in the live graph, in
/// insertion order. The first node slug is the primary selection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeInsertion {
    pub node_slugs: Vec<String>,
    pub edge_ids: Vec<String>,
}

/// Why a merge produced nothing.
#[derive(Debug, Error, Diagnostic)]
pub enum MergeError {
    /// Every foreign node was filtered out (unknown kinds, or only a
    /// redundant start node).
    #[error("nothing to insert")]
    #[diagnostic(code(draftloom::merge::nothing_to_insert))]
    NothingToInsert,

    /// The batch insert failed despite deduplication. Logged upstream;
    /// indicates a bug rather than bad input.
    #[error("merge failed: {0}")]
    #[diagnostic(code(draftloom::merge::graph))]
    Graph(#[from] GraphError),
}

/// Insert a foreign node/edge set into the live graph.
///
/// See the module docs for the algorithm. On success the graph contains
/// the renamed fragment and the returned [`MergeInsertion`] lists the
/// new ids; the caller owns selection and pending-changes bookkeeping.
///
/// # Examples
///
/// ```rust
/// use draftloom::merge::{MergeTarget, merge_fragment};
/// use draftloom::model::{Graph, Position, WorkflowEdge, WorkflowNode};
/// use draftloom::types::NodeKind;
///
/// let mut graph = Graph::new();
/// graph
///     .insert_node(WorkflowNode::new("agent-1", NodeKind::Agent, Position::default()))
///     .unwrap();
///
/// // Pasting a fragment whose slug collides yields a suffixed slug,
/// // and its edges follow the rename.
/// let nodes = vec![
///     WorkflowNode::new("agent-1", NodeKind::Agent, Position::default()),
///     WorkflowNode::new("end-1", NodeKind::End, Position::new(100.0, 0.0)),
/// ];
/// let edges = vec![WorkflowEdge::new("e-1", "agent-1", "end-1")];
/// let inserted = merge_fragment(&mut graph, nodes, edges, MergeTarget::Unanchored).unwrap();
///
/// assert_eq!(inserted.node_slugs, ["agent-1-1", "end-1"]);
/// assert_eq!(graph.edges[0].source, "agent-1-1");
/// ```
pub fn merge_fragment(
    graph: &mut Graph,
    nodes: Vec<WorkflowNode>,
    edges: Vec<WorkflowEdge>,
    target: MergeTarget<'_>,
) -> Result<MergeInsertion, MergeError> {
    let live_has_start = graph.start_node().is_some();
    let mut incoming: Vec<WorkflowNode> = nodes
        .into_iter()
        .filter(|n| n.kind.is_recognized())
        .filter(|n| !(live_has_start && n.kind.is_start()))
        .collect();
    if incoming.is_empty() {
        return Err(MergeError::NothingToInsert);
    }

    // Rename against the live graph and the batch itself.
    let mut taken: FxHashSet<String> = graph.nodes.iter().map(|n| n.slug.clone()).collect();
    let mut slug_map: FxHashMap<String, String> = FxHashMap::default();
    for node in &mut incoming {
        let slug = dedupe_id(&node.slug, &taken);
        taken.insert(slug.clone());
        slug_map.insert(node.slug.clone(), slug.clone());
        node.slug = slug;
    }

    let selection_center = bounding_box_center(&incoming);
    let target_center = match target {
        MergeTarget::Explicit(position) => position,
        MergeTarget::Surface(surface) => visual_center(surface).unwrap_or(selection_center),
        MergeTarget::Unanchored => selection_center,
    };
    let delta = Position::new(
        target_center.x - selection_center.x,
        target_center.y - selection_center.y,
    );
    for node in &mut incoming {
        node.position = Position::new(node.position.x + delta.x, node.position.y + delta.y);
        node.sync_position_metadata();
    }

    let mut taken_edge_ids: FxHashSet<String> =
        graph.edges.iter().map(|e| e.id.clone()).collect();
    let mut incoming_edges: Vec<WorkflowEdge> = Vec::new();
    for mut edge in edges {
        // Drop edges whose endpoints did not survive the kind filter.
        let (Some(source), Some(target)) = (slug_map.get(&edge.source), slug_map.get(&edge.target))
        else {
            continue;
        };
        edge.source = source.clone();
        edge.target = target.clone();
        edge.id = dedupe_id(&edge.id, &taken_edge_ids);
        taken_edge_ids.insert(edge.id.clone());
        incoming_edges.push(edge);
    }

    let mut insertion = MergeInsertion::default();
    for node in incoming {
        insertion.node_slugs.push(node.slug.clone());
        graph.insert_node(node)?;
    }
    for edge in incoming_edges {
        insertion.edge_ids.push(edge.id.clone());
        graph.insert_edge(edge)?;
    }
    Ok(insertion)
}

/// Append `-1`, `-2`, … to `base` until it is free.
fn dedupe_id(base: &str, taken: &FxHashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    let mut suffix = 1usize;
    loop {
        let candidate = format!("{base}-{suffix}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

/// Center of the bounding box of the fragment's original positions.
fn bounding_box_center(nodes: &[WorkflowNode]) -> Position {
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for node in nodes {
        min_x = min_x.min(node.position.x);
        min_y = min_y.min(node.position.y);
        max_x = max_x.max(node.position.x);
        max_y = max_y.max(node.position.y);
    }
    Position::new((min_x + max_x) / 2.0, (min_y + max_y) / 2.0)
}
