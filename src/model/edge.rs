//! Edge representation and condition-string normalization.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A directed edge between two nodes, identified by the source and
/// target slugs.
///
/// `condition` carries the branch label for edges leaving a
/// condition-kind node; `metadata` may carry a display label the canvas
/// renders.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkflowEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl WorkflowEdge {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            condition: None,
            metadata: Map::new(),
        }
    }

    #[must_use]
    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    /// The condition string trimmed and lowercased, for sibling
    /// comparisons. `None` and `""` normalize to the empty string.
    #[must_use]
    pub fn normalized_condition(&self) -> String {
        self.condition
            .as_deref()
            .unwrap_or("")
            .trim()
            .to_lowercase()
    }

    /// Whether this edge is a default branch: no condition, an empty
    /// condition, or the literal (case-insensitive) `"default"`.
    #[must_use]
    pub fn is_default_branch(&self) -> bool {
        let normalized = self.normalized_condition();
        normalized.is_empty() || normalized == "default"
    }
}
