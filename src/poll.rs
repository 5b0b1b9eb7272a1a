//! Remote poll reconciliation.
//!
//! On a fixed interval, the reconciler compares the local version list
//! against the server and triggers a background, viewport-preserving
//! refresh when they diverge — and only then. Local unsaved work always
//! wins: pending changes observed at decision time or at apply time
//! veto the cycle, and a user who navigated away mid-request vetoes it
//! too.

use std::time::{Duration, Instant};

use rustc_hash::FxHashSet;

use crate::client::{ApiClient, ApiError};
use crate::config::EngineConfig;
use crate::save::{SaveState, SaveStatus};
use crate::session::EditorSession;
use crate::versions::WorkflowVersionSummary;

/// What one poll cycle decided.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PollOutcome {
    /// Local and remote agree.
    NoChange,
    /// Divergence detected but local state changed under the request;
    /// nothing was applied.
    Vetoed,
    /// Version metadata was refreshed. The graph itself only needs a
    /// reload when the active version changed.
    Refreshed { active_version_changed: bool },
    /// The workflow itself is gone server-side; the host should reload
    /// the whole workflow list.
    WorkflowMissing,
}

/// Fixed-interval version-list reconciler.
pub struct PollReconciler {
    interval: Duration,
    last_poll: Option<Instant>,
}

impl PollReconciler {
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            interval: config.poll_interval,
            last_poll: None,
        }
    }

    /// Whether a poll should run now: a workflow and version are
    /// selected, the save machine is idle, there is no unsaved work,
    /// and the interval has elapsed.
    #[must_use]
    pub fn should_poll(&self, session: &EditorSession, status: &SaveStatus, now: Instant) -> bool {
        if session.workflow_id().is_none() || session.version_id().is_none() {
            return false;
        }
        if status.state != SaveState::Idle || session.pending_changes() {
            return false;
        }
        match self.last_poll {
            Some(last) => now.duration_since(last) >= self.interval,
            None => true,
        }
    }

    /// Run one poll cycle.
    ///
    /// The workflow/version identity is captured before the request;
    /// if either changed by the time the response arrives, or local
    /// edits appeared, the refresh is vetoed for this cycle.
    pub async fn poll_once(
        &mut self,
        session: &mut EditorSession,
        client: &ApiClient,
        now: Instant,
    ) -> Result<PollOutcome, ApiError> {
        self.last_poll = Some(now);
        let Some(workflow_id) = session.workflow_id().map(str::to_string) else {
            return Ok(PollOutcome::Vetoed);
        };
        let version_id = session.version_id().map(str::to_string);

        let fresh = match client.list_versions(&workflow_id).await {
            Ok(fresh) => fresh,
            Err(err) if err.status() == Some(404) => {
                tracing::warn!(%workflow_id, "workflow disappeared server-side");
                return Ok(PollOutcome::WorkflowMissing);
            }
            Err(err) => return Err(err),
        };

        if !versions_diverged(session, &fresh) {
            return Ok(PollOutcome::NoChange);
        }

        // Re-consult local state at apply time: an edit or a navigation
        // that landed while the request was in flight wins.
        if session.pending_changes()
            || session.workflow_id() != Some(workflow_id.as_str())
            || session.version_id().map(str::to_string) != version_id
        {
            tracing::debug!(%workflow_id, "poll refresh vetoed by local state");
            return Ok(PollOutcome::Vetoed);
        }

        let active_before = session
            .registry
            .active_version()
            .map(|v| v.id.clone());
        let authoritative = session.is_authoritative();
        session.registry.apply_refresh(fresh, authoritative);
        let active_after = session
            .registry
            .active_version()
            .map(|v| v.id.clone());

        Ok(PollOutcome::Refreshed {
            active_version_changed: active_before != active_after,
        })
    }
}

/// Compare local and remote lists by `(id, updated_at, version)`,
/// including locally-known non-draft versions that disappeared
/// server-side. A locally fabricated synthetic draft is not expected on
/// the server and is excluded from the comparison.
fn versions_diverged(session: &EditorSession, fresh: &[WorkflowVersionSummary]) -> bool {
    let synthetic_draft = session
        .registry
        .draft_is_synthetic()
        .then(|| session.registry.draft_id())
        .flatten();

    fingerprint(session.registry.versions(), synthetic_draft) != fingerprint(fresh, None)
}

fn fingerprint(
    versions: &[WorkflowVersionSummary],
    exclude: Option<&str>,
) -> FxHashSet<(String, chrono::DateTime<chrono::Utc>, i64)> {
    versions
        .iter()
        .filter(|v| Some(v.id.as_str()) != exclude)
        .map(|v| (v.id.clone(), v.updated_at, v.version))
        .collect()
}
