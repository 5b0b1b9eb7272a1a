//! Save orchestration: the draft-vs-update decision, debounced
//! autosave, and the status lifecycle.
//!
//! A save attempt runs through fixed gates — not already saving, no
//! blocking validation finding, a workflow selected, the properties
//! panel closed (autosave must not fight the user's keystrokes) — then
//! targets either the known draft (`PUT`) or creates one
//! (`POST {mark_as_active: false}`) under a reentrancy guard, so two
//! debounce firings racing through the no-draft path cannot mint two
//! drafts.

use std::time::{Duration, Instant};

use miette::Diagnostic;
use thiserror::Error;

use crate::canvas::CanvasSurface;
use crate::client::wire::{CreateVersionRequest, UpdateVersionRequest};
use crate::client::{ApiClient, ApiError};
use crate::config::EngineConfig;
use crate::model::ValidationError;
use crate::session::EditorSession;
use crate::utils::{Debouncer, RetryPolicy};
use crate::versions::resolve_draft_candidate;
use crate::viewport::restore_viewport;

/// Lifecycle of the save status indicator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SaveState {
    #[default]
    Idle,
    Saving,
    Saved,
    Error,
}

/// Save state plus the transient status-bar message.
#[derive(Clone, Debug, Default)]
pub struct SaveStatus {
    pub state: SaveState,
    pub message: Option<String>,
}

/// What a save attempt did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SaveReport {
    /// The existing draft's graph was replaced.
    Updated { version_id: String },
    /// No draft existed; one was created.
    CreatedDraft { version_id: String },
    /// Nothing differed from the saved baseline.
    SkippedClean,
    /// A gate failed (no workflow, panel open, already saving); the
    /// debounce was re-armed.
    SkippedNotReady,
    /// Another caller was already creating the draft; this one backed
    /// off.
    SkippedDraftRace,
}

/// Why a save attempt failed.
#[derive(Debug, Error, Diagnostic)]
pub enum SaveError {
    /// Blocking validation findings; nothing was sent to the server.
    #[error("workflow failed validation: {}", first_message(findings))]
    #[diagnostic(code(draftloom::save::validation))]
    Validation { findings: Vec<ValidationError> },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Api(#[from] ApiError),

    #[error("failed to serialize graph")]
    #[diagnostic(code(draftloom::save::serialize))]
    Serialize(#[from] serde_json::Error),
}

fn first_message(findings: &[ValidationError]) -> String {
    findings
        .first()
        .map(|f| f.to_string())
        .unwrap_or_else(|| "unknown validation error".to_string())
}

/// Debounced autosave state machine.
pub struct SaveOrchestrator {
    debounce: Debouncer,
    status: SaveStatus,
    saved_hold: Duration,
    revert_at: Option<Instant>,
    restore_policy: RetryPolicy,
}

impl SaveOrchestrator {
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            debounce: config.autosave_debouncer(),
            status: SaveStatus::default(),
            saved_hold: config.saved_hold,
            revert_at: None,
            restore_policy: config.restore_policy,
        }
    }

    #[must_use]
    pub fn status(&self) -> &SaveStatus {
        &self.status
    }

    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.status.state == SaveState::Saving
    }

    /// Arm (or re-arm) the autosave window after a committed mutation.
    pub fn note_mutation(&mut self, now: Instant) {
        self.debounce.schedule(now);
    }

    /// Whether the autosave window has elapsed with every gate open.
    ///
    /// A due-but-gated window re-arms itself, so autosave fires on the
    /// next quiet interval after the gate clears.
    pub fn autosave_ready(&mut self, session: &EditorSession, now: Instant) -> bool {
        if !self.debounce.fire_due(now) {
            return false;
        }
        if !session.pending_changes() {
            return false;
        }
        let gated = self.is_saving()
            || session.workflow().is_none()
            || session.properties_panel_open()
            || session.is_hydrating()
            || session.is_dragging();
        if gated {
            self.debounce.schedule(now);
            return false;
        }
        true
    }

    /// Revert a transient `Saved`/`Error` status back to `Idle` once
    /// its hold expires.
    pub fn tick(&mut self, now: Instant) {
        if let Some(revert_at) = self.revert_at {
            if now >= revert_at {
                self.revert_at = None;
                self.status = SaveStatus::default();
            }
        }
    }

    /// Run one save attempt against the store.
    ///
    /// On success the session's baseline snapshot advances, the version
    /// list is refreshed in the background, and — because rendering
    /// libraries may reset the camera on prop refresh — the current
    /// viewport is forcibly reapplied through the convergence policy
    /// when a surface is supplied.
    pub async fn handle_save(
        &mut self,
        session: &mut EditorSession,
        client: &ApiClient,
        mut surface: Option<&mut dyn CanvasSurface>,
        now: Instant,
    ) -> Result<SaveReport, SaveError> {
        if self.is_saving() {
            return Ok(SaveReport::SkippedNotReady);
        }
        let findings = session.blocking_validation();
        if !findings.is_empty() {
            self.fail(first_message(&findings), now);
            return Err(SaveError::Validation { findings });
        }
        let Some(workflow_id) = session.workflow_id().map(str::to_string) else {
            return Ok(SaveReport::SkippedNotReady);
        };

        let snapshot = session.graph.canonical_json()?;
        if session.last_saved_snapshot() == Some(snapshot.as_str()) {
            session.mark_saved(snapshot);
            return Ok(SaveReport::SkippedClean);
        }

        self.status = SaveStatus {
            state: SaveState::Saving,
            message: None,
        };
        self.revert_at = None;

        let payload = session.graph.payload();
        let draft_id = session
            .registry
            .draft_id()
            .map(str::to_string)
            .or_else(|| {
                resolve_draft_candidate(session.registry.versions()).map(|v| v.id.clone())
            });

        let result = match draft_id {
            Some(draft_id) => client
                .update_version_graph(
                    &workflow_id,
                    &draft_id,
                    &UpdateVersionRequest { graph: payload },
                )
                .await
                .map(|response| (response, false)),
            None => {
                if session.draft_creation_in_flight() {
                    tracing::warn!(
                        %workflow_id,
                        "draft creation already in flight, skipping duplicate save"
                    );
                    self.status = SaveStatus::default();
                    return Ok(SaveReport::SkippedDraftRace);
                }
                session.set_draft_creation_in_flight(true);
                let created = client
                    .create_version(&workflow_id, &CreateVersionRequest::draft(payload))
                    .await;
                session.set_draft_creation_in_flight(false);
                created.map(|response| (response, true))
            }
        };

        match result {
            Ok((response, created)) => {
                let version_id = response.id.clone();
                session.registry.record_draft(response.summary());
                session.mark_saved(snapshot);

                // Background refresh of the version list; the reload
                // must not register as an undoable edit.
                session.history.mark_restoring();
                match client.list_versions(&workflow_id).await {
                    Ok(fresh) => {
                        let authoritative = session.is_authoritative();
                        session.registry.apply_refresh(fresh, authoritative);
                    }
                    Err(err) => {
                        tracing::debug!(error = %err, "post-save version refresh failed");
                    }
                }

                if let Some(surface) = surface.as_deref_mut() {
                    let viewport = surface.viewport();
                    restore_viewport(surface, viewport, &self.restore_policy).await;
                }

                self.status = SaveStatus {
                    state: SaveState::Saved,
                    message: Some("saved".to_string()),
                };
                self.revert_at = Some(now + self.saved_hold);

                if created {
                    Ok(SaveReport::CreatedDraft { version_id })
                } else {
                    Ok(SaveReport::Updated { version_id })
                }
            }
            Err(err) => {
                // Pending-changes stays set; the re-armed debounce
                // retries on the next cycle.
                self.fail(err.user_message(), now);
                self.debounce.schedule(now);
                Err(err.into())
            }
        }
    }

    fn fail(&mut self, message: String, now: Instant) {
        self.status = SaveStatus {
            state: SaveState::Error,
            message: Some(message),
        };
        self.revert_at = Some(now + self.saved_hold);
    }
}
