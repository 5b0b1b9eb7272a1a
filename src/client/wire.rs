//! Request and response bodies of the workflow store contract.

use serde::{Deserialize, Serialize};

use crate::model::GraphPayload;
use crate::versions::WorkflowVersionSummary;
use crate::viewport::ViewportRecord;

/// Error body shape shared by all endpoints.
#[derive(Debug, Deserialize)]
pub struct DetailBody {
    pub detail: String,
}

/// Full version detail, graph included.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkflowVersionResponse {
    pub id: String,
    pub workflow_id: String,
    pub name: String,
    pub version: i64,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub graph: GraphPayload,
}

impl WorkflowVersionResponse {
    /// The summary view of this version, as the list endpoint would
    /// return it.
    #[must_use]
    pub fn summary(&self) -> WorkflowVersionSummary {
        WorkflowVersionSummary {
            id: self.id.clone(),
            workflow_id: self.workflow_id.clone(),
            name: self.name.clone(),
            version: self.version,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct CreateWorkflowRequest {
    pub slug: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub graph: GraphPayload,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct WorkflowPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct CreateVersionRequest {
    pub graph: GraphPayload,
    pub mark_as_active: bool,
}

impl CreateVersionRequest {
    /// The draft-creation body: a new version that is not promoted.
    #[must_use]
    pub fn draft(graph: GraphPayload) -> Self {
        Self {
            graph,
            mark_as_active: false,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct UpdateVersionRequest {
    pub graph: GraphPayload,
}

#[derive(Clone, Debug, Serialize)]
pub struct ImportRequest {
    pub graph: GraphPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mark_as_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_name: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct PromoteRequest {
    pub version_id: String,
}

/// Wrapper for the viewport list/replace endpoints.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ViewportTable {
    pub viewports: Vec<ViewportRecord>,
}
