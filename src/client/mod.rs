//! HTTP client for the workflow store.
//!
//! Every call is attempted against an ordered list of candidate base
//! URLs (the deployment may expose the API under several topologies).
//! A transport failure — connection refused, timeout, aborted request —
//! moves on to the next candidate; the first real HTTP response, success
//! or definitive error, short-circuits the loop.
//!
//! Authentication is a seam: [`TokenProvider`] supplies the bearer
//! token, and the host decides where tokens come from.

pub mod wire;

use std::sync::Arc;

use miette::Diagnostic;
use thiserror::Error;

use crate::versions::{WorkflowSummary, WorkflowVersionSummary};
use crate::viewport::ViewportRecord;
use wire::{
    CreateVersionRequest, CreateWorkflowRequest, DetailBody, ImportRequest, PromoteRequest,
    UpdateVersionRequest, ViewportTable, WorkflowPatch, WorkflowVersionResponse,
};

/// Supplies the bearer token attached to every request.
pub trait TokenProvider: Send + Sync {
    /// The current token, or `None` to send the request unauthenticated.
    fn bearer_token(&self) -> Option<String>;
}

/// Token provider for deployments without authentication.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoAuth;

impl TokenProvider for NoAuth {
    fn bearer_token(&self) -> Option<String> {
        None
    }
}

/// Errors from the workflow store client.
#[derive(Debug, Error, Diagnostic)]
pub enum ApiError {
    /// The client was built with an empty candidate list.
    #[error("no endpoint candidates configured")]
    #[diagnostic(
        code(draftloom::client::no_endpoints),
        help("Configure at least one API base URL.")
    )]
    NoEndpoints,

    /// Every candidate failed at the transport level.
    #[error("all endpoint candidates failed")]
    #[diagnostic(code(draftloom::client::transport))]
    Transport {
        #[source]
        last: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("request failed with status {status}")]
    #[diagnostic(code(draftloom::client::status))]
    Status {
        status: u16,
        /// `detail` field of the error body, when the server sent one.
        detail: Option<String>,
    },

    /// The response body did not decode as the expected shape.
    #[error("failed to decode response body")]
    #[diagnostic(code(draftloom::client::decode))]
    Decode {
        #[source]
        source: reqwest::Error,
    },
}

impl ApiError {
    /// HTTP status, when the server produced one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message suitable for the status bar: the server-provided detail
    /// when present, a generic description otherwise.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status {
                detail: Some(detail),
                ..
            } => detail.clone(),
            other => other.to_string(),
        }
    }
}

/// Client over the workflow store's JSON contract.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    bases: Vec<String>,
    token: Arc<dyn TokenProvider>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("bases", &self.bases)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Build a client over the given candidate base URLs, tried in
    /// order. Trailing slashes are trimmed.
    #[must_use]
    pub fn new(bases: Vec<String>) -> Self {
        Self::with_token_provider(bases, Arc::new(NoAuth))
    }

    #[must_use]
    pub fn with_token_provider(bases: Vec<String>, token: Arc<dyn TokenProvider>) -> Self {
        let bases = bases
            .into_iter()
            .map(|b| b.trim_end_matches('/').to_string())
            .collect();
        Self {
            http: reqwest::Client::new(),
            bases,
            token,
        }
    }

    /// Try each candidate until one yields an HTTP response.
    ///
    /// Transport errors (connect, timeout, abort) move to the next
    /// candidate; an HTTP response of any status short-circuits.
    async fn send_with_fallback<F>(&self, build: F) -> Result<reqwest::Response, ApiError>
    where
        F: Fn(&reqwest::Client, &str) -> reqwest::RequestBuilder,
    {
        let mut last: Option<reqwest::Error> = None;
        for base in &self.bases {
            let mut request = build(&self.http, base);
            if let Some(token) = self.token.bearer_token() {
                request = request.bearer_auth(token);
            }
            match request.send().await {
                Ok(response) => return Ok(response),
                Err(err) => {
                    tracing::debug!(%base, error = %err, "endpoint candidate failed, trying next");
                    last = Some(err);
                }
            }
        }
        match last {
            Some(last) => Err(ApiError::Transport { last }),
            None => Err(ApiError::NoEndpoints),
        }
    }

    async fn expect_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let detail = response
            .json::<DetailBody>()
            .await
            .ok()
            .map(|body| body.detail);
        Err(ApiError::Status {
            status: status.as_u16(),
            detail,
        })
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        response
            .json::<T>()
            .await
            .map_err(|source| ApiError::Decode { source })
    }

    /// `GET /api/workflows`
    pub async fn list_workflows(&self) -> Result<Vec<WorkflowSummary>, ApiError> {
        let response = self
            .send_with_fallback(|http, base| http.get(format!("{base}/api/workflows")))
            .await?;
        Self::decode(Self::expect_success(response).await?).await
    }

    /// `POST /api/workflows`
    pub async fn create_workflow(
        &self,
        request: &CreateWorkflowRequest,
    ) -> Result<WorkflowVersionResponse, ApiError> {
        let response = self
            .send_with_fallback(|http, base| {
                http.post(format!("{base}/api/workflows")).json(request)
            })
            .await?;
        Self::decode(Self::expect_success(response).await?).await
    }

    /// `PATCH /api/workflows/{id}`
    pub async fn update_workflow(
        &self,
        workflow_id: &str,
        patch: &WorkflowPatch,
    ) -> Result<WorkflowSummary, ApiError> {
        let response = self
            .send_with_fallback(|http, base| {
                http.patch(format!("{base}/api/workflows/{workflow_id}"))
                    .json(patch)
            })
            .await?;
        Self::decode(Self::expect_success(response).await?).await
    }

    /// `DELETE /api/workflows/{id}` — 204 on success, 400 with a detail
    /// body when deletion is disallowed.
    pub async fn delete_workflow(&self, workflow_id: &str) -> Result<(), ApiError> {
        let response = self
            .send_with_fallback(|http, base| {
                http.delete(format!("{base}/api/workflows/{workflow_id}"))
            })
            .await?;
        Self::expect_success(response).await?;
        Ok(())
    }

    /// `GET /api/workflows/{id}/versions`
    pub async fn list_versions(
        &self,
        workflow_id: &str,
    ) -> Result<Vec<WorkflowVersionSummary>, ApiError> {
        let response = self
            .send_with_fallback(|http, base| {
                http.get(format!("{base}/api/workflows/{workflow_id}/versions"))
            })
            .await?;
        Self::decode(Self::expect_success(response).await?).await
    }

    /// `POST /api/workflows/{id}/versions` — creates the draft
    /// (`mark_as_active: false`).
    pub async fn create_version(
        &self,
        workflow_id: &str,
        request: &CreateVersionRequest,
    ) -> Result<WorkflowVersionResponse, ApiError> {
        let response = self
            .send_with_fallback(|http, base| {
                http.post(format!("{base}/api/workflows/{workflow_id}/versions"))
                    .json(request)
            })
            .await?;
        Self::decode(Self::expect_success(response).await?).await
    }

    /// `PUT /api/workflows/{id}/versions/{versionId}` — replaces the
    /// draft's graph.
    pub async fn update_version_graph(
        &self,
        workflow_id: &str,
        version_id: &str,
        request: &UpdateVersionRequest,
    ) -> Result<WorkflowVersionResponse, ApiError> {
        let response = self
            .send_with_fallback(|http, base| {
                http.put(format!(
                    "{base}/api/workflows/{workflow_id}/versions/{version_id}"
                ))
                .json(request)
            })
            .await?;
        Self::decode(Self::expect_success(response).await?).await
    }

    /// `GET /api/workflows/{id}/versions/{versionId}` — full graph
    /// detail.
    pub async fn get_version(
        &self,
        workflow_id: &str,
        version_id: &str,
    ) -> Result<WorkflowVersionResponse, ApiError> {
        let response = self
            .send_with_fallback(|http, base| {
                http.get(format!(
                    "{base}/api/workflows/{workflow_id}/versions/{version_id}"
                ))
            })
            .await?;
        Self::decode(Self::expect_success(response).await?).await
    }

    /// `GET /api/workflows/{id}/versions/{versionId}/export` — raw graph
    /// JSON for download.
    pub async fn export_version(
        &self,
        workflow_id: &str,
        version_id: &str,
    ) -> Result<serde_json::Value, ApiError> {
        let response = self
            .send_with_fallback(|http, base| {
                http.get(format!(
                    "{base}/api/workflows/{workflow_id}/versions/{version_id}/export"
                ))
            })
            .await?;
        Self::decode(Self::expect_success(response).await?).await
    }

    /// `POST /api/workflows/import`
    pub async fn import_workflow(
        &self,
        request: &ImportRequest,
    ) -> Result<WorkflowVersionResponse, ApiError> {
        let response = self
            .send_with_fallback(|http, base| {
                http.post(format!("{base}/api/workflows/import")).json(request)
            })
            .await?;
        Self::decode(Self::expect_success(response).await?).await
    }

    /// `POST /api/workflows/{id}/production` — promote a version to
    /// active.
    pub async fn promote_version(
        &self,
        workflow_id: &str,
        version_id: &str,
    ) -> Result<WorkflowVersionResponse, ApiError> {
        let request = PromoteRequest {
            version_id: version_id.to_string(),
        };
        let response = self
            .send_with_fallback(|http, base| {
                http.post(format!("{base}/api/workflows/{workflow_id}/production"))
                    .json(&request)
            })
            .await?;
        Self::decode(Self::expect_success(response).await?).await
    }

    /// `GET /api/workflows/viewports`
    pub async fn get_viewports(&self) -> Result<Vec<ViewportRecord>, ApiError> {
        let response = self
            .send_with_fallback(|http, base| http.get(format!("{base}/api/workflows/viewports")))
            .await?;
        let table: ViewportTable = Self::decode(Self::expect_success(response).await?).await?;
        Ok(table.viewports)
    }

    /// `PUT /api/workflows/viewports` — full-table replace.
    pub async fn put_viewports(&self, viewports: Vec<ViewportRecord>) -> Result<(), ApiError> {
        let table = ViewportTable { viewports };
        let response = self
            .send_with_fallback(|http, base| {
                http.put(format!("{base}/api/workflows/viewports")).json(&table)
            })
            .await?;
        Self::expect_success(response).await?;
        Ok(())
    }
}
