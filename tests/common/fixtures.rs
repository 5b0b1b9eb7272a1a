#![allow(dead_code)]

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::json;

use draftloom::canvas::CanvasSurface;
use draftloom::config::EngineConfig;
use draftloom::model::{Graph, Position, WorkflowEdge, WorkflowNode};
use draftloom::session::EditorSession;
use draftloom::types::NodeKind;
use draftloom::versions::{WorkflowSummary, WorkflowVersionSummary};
use draftloom::viewport::Viewport;

/// Engine config with zero delays so tests never wait on wall time.
pub fn test_config() -> EngineConfig {
    EngineConfig::default()
        .with_endpoints(vec!["http://localhost:0".to_string()])
        .with_autosave_delay(Duration::ZERO)
        .with_restore_policy(draftloom::utils::RetryPolicy::new(3, Duration::ZERO, 1.0))
}

pub fn node(slug: &str, kind: NodeKind, x: f64, y: f64) -> WorkflowNode {
    WorkflowNode::new(slug, kind, Position::new(x, y))
}

pub fn edge(id: &str, source: &str, target: &str) -> WorkflowEdge {
    WorkflowEdge::new(id, source, target)
}

/// A start node plus one agent wired to it.
pub fn seeded_graph() -> Graph {
    let mut graph = Graph::new();
    graph
        .insert_node(node("start", NodeKind::Start, 0.0, 0.0))
        .unwrap();
    graph
        .insert_node(node("agent-1", NodeKind::Agent, 240.0, 0.0))
        .unwrap();
    graph
        .insert_edge(edge("e-start", "start", "agent-1"))
        .unwrap();
    graph
}

pub fn workflow_summary(id: &str) -> WorkflowSummary {
    WorkflowSummary {
        id: id.to_string(),
        slug: format!("{id}-slug"),
        display_name: id.to_string(),
        description: None,
        active_version_id: None,
        is_chatkit_default: false,
    }
}

/// A version summary with an `updated_at` derived from its number so
/// ordering ties are distinguishable.
pub fn version(id: &str, number: i64, is_active: bool) -> WorkflowVersionSummary {
    let stamp = DateTime::<Utc>::UNIX_EPOCH + TimeDelta::seconds(number);
    WorkflowVersionSummary {
        id: id.to_string(),
        workflow_id: "wf-1".to_string(),
        name: format!("v{number}"),
        version: number,
        is_active,
        created_at: stamp,
        updated_at: stamp,
    }
}

/// A session with an open workflow and a seeded, saved graph.
pub fn open_session() -> EditorSession {
    let mut session = EditorSession::new(&test_config());
    session.select_workflow(workflow_summary("wf-1"));
    session
        .load_version("v-1", seeded_graph().payload(), false)
        .unwrap();
    session
}

/// A version detail body as the store would return it.
pub fn version_response_body(id: &str, number: i64, graph: &Graph) -> serde_json::Value {
    json!({
        "id": id,
        "workflow_id": "wf-1",
        "name": format!("v{number}"),
        "version": number,
        "is_active": false,
        "created_at": "2026-01-01T00:00:00Z",
        "updated_at": "2026-01-01T00:00:00Z",
        "graph": graph.payload(),
    })
}

/// Canvas stub whose auto-fit swallows the first N viewport
/// assignments, mimicking the rendering library racing a restore.
pub struct FakeSurface {
    pub viewport: Viewport,
    pub dimensions: (f64, f64),
    pub swallow_sets: u32,
    pub set_calls: u32,
    pub projectable: bool,
}

impl Default for FakeSurface {
    fn default() -> Self {
        Self {
            viewport: Viewport::DEFAULT,
            dimensions: (1280.0, 720.0),
            swallow_sets: 0,
            set_calls: 0,
            projectable: true,
        }
    }
}

impl CanvasSurface for FakeSurface {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.set_calls += 1;
        if self.set_calls <= self.swallow_sets {
            return;
        }
        self.viewport = viewport;
    }

    fn dimensions(&self) -> (f64, f64) {
        self.dimensions
    }

    fn project(&self, screen: Position) -> Option<Position> {
        if !self.projectable {
            return None;
        }
        let viewport = self.viewport;
        Some(Position::new(
            (screen.x - viewport.x) / viewport.zoom,
            (screen.y - viewport.y) / viewport.zoom,
        ))
    }
}
