//! Node representation and slug minting.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::types::NodeKind;

/// A 2D canvas position in graph space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// JSON object form, as persisted inside node metadata.
    #[must_use]
    pub fn to_value(&self) -> Value {
        json!({"x": self.x, "y": self.y})
    }
}

/// A single editable node of the workflow graph.
///
/// The `slug` doubles as the node's graph-local unique id. `metadata`
/// redundantly carries the position for persistence; it is refreshed from
/// the live `position` every time a payload is built (see
/// [`crate::model::GraphPayload::from_graph`]).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkflowNode {
    pub slug: String,
    pub kind: NodeKind,
    pub display_name: String,
    #[serde(default = "default_enabled")]
    pub is_enabled: bool,
    #[serde(default)]
    pub parameters: Value,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

fn default_enabled() -> bool {
    true
}

impl WorkflowNode {
    /// Create a node with empty parameters at the given position.
    #[must_use]
    pub fn new(slug: impl Into<String>, kind: NodeKind, position: Position) -> Self {
        let slug = slug.into();
        let display_name = slug.clone();
        Self {
            slug,
            kind,
            display_name,
            is_enabled: true,
            parameters: Value::Null,
            position,
            metadata: Map::new(),
        }
    }

    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    #[must_use]
    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = parameters;
        self
    }

    /// Mirror the live position into `metadata["position"]`.
    pub fn sync_position_metadata(&mut self) {
        self.metadata
            .insert("position".to_string(), self.position.to_value());
    }
}

/// Mint a slug for a freshly created node: `"{kind}-{millis}"`.
///
/// Creation happens against a known-unique, currently-loaded graph, so
/// collisions are not resolved here; the merge engine owns deduplication
/// for foreign fragments (see [`crate::merge`]).
///
/// ```rust
/// use draftloom::model::mint_slug;
/// use draftloom::types::NodeKind;
///
/// assert_eq!(mint_slug(&NodeKind::Agent, 1_700_000_000_000), "agent-1700000000000");
/// ```
#[must_use]
pub fn mint_slug(kind: &NodeKind, now_ms: i64) -> String {
    format!("{}-{}", kind.as_str(), now_ms)
}
