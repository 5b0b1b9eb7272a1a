//! Version registry: classifying, ordering, and tracking workflow
//! versions around the single mutable draft.
//!
//! A workflow's versions are immutable once promoted. Exactly one may be
//! the mutable *draft*: the highest-numbered non-active version whose
//! number exceeds the active version's. If none qualifies, there is no
//! draft and the next save must create one (see [`crate::save`]).
//!
//! # Examples
//!
//! ```rust
//! use draftloom::versions::{WorkflowVersionSummary, resolve_draft_candidate};
//!
//! let versions = vec![
//!     WorkflowVersionSummary::sample("v1", "wf", 1, true),
//!     WorkflowVersionSummary::sample("v2", "wf", 2, false),
//!     WorkflowVersionSummary::sample("v3", "wf", 3, false),
//! ];
//! let draft = resolve_draft_candidate(&versions).unwrap();
//! assert_eq!(draft.id, "v3");
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed display label for the draft; the server-stored name is never
/// shown for the draft entry. The host localizes this key.
pub const DRAFT_DISPLAY_NAME: &str = "draft";

/// A workflow as listed by the remote store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSummary {
    pub id: String,
    pub slug: String,
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub active_version_id: Option<String>,
    #[serde(default)]
    pub is_chatkit_default: bool,
}

/// One version of a workflow, as listed by the remote store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkflowVersionSummary {
    pub id: String,
    pub workflow_id: String,
    pub name: String,
    pub version: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowVersionSummary {
    /// A minimal summary for docs and tests.
    #[must_use]
    pub fn sample(id: &str, workflow_id: &str, version: i64, is_active: bool) -> Self {
        Self {
            id: id.to_string(),
            workflow_id: workflow_id.to_string(),
            name: format!("v{version}"),
            version,
            is_active,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

/// Find the draft among a version list.
///
/// Returns the highest-numbered entry with `is_active == false` whose
/// number strictly exceeds the active version's number, or `None`. With
/// no active version at all, any non-active entry qualifies.
#[must_use]
pub fn resolve_draft_candidate(
    versions: &[WorkflowVersionSummary],
) -> Option<&WorkflowVersionSummary> {
    let active_version = versions
        .iter()
        .filter(|v| v.is_active)
        .map(|v| v.version)
        .max()
        .unwrap_or(0);
    versions
        .iter()
        .filter(|v| !v.is_active && v.version > active_version)
        .max_by_key(|v| v.version)
}

/// Order versions for display: draft first, then newest.
///
/// Total order: (1) the draft id first regardless of number, (2)
/// descending version number, (3) active before inactive, (4) descending
/// `updated_at`, (5) stable by original index.
///
/// ```rust
/// use draftloom::versions::{WorkflowVersionSummary, sort_versions_with_draft_first};
///
/// let mut versions = vec![
///     WorkflowVersionSummary::sample("1", "wf", 3, true),
///     WorkflowVersionSummary::sample("2", "wf", 1, false),
///     WorkflowVersionSummary::sample("3", "wf", 2, false),
/// ];
/// sort_versions_with_draft_first(&mut versions, Some("2"));
/// let order: Vec<_> = versions.iter().map(|v| v.id.as_str()).collect();
/// assert_eq!(order, ["2", "1", "3"]);
/// ```
pub fn sort_versions_with_draft_first(
    versions: &mut [WorkflowVersionSummary],
    draft_id: Option<&str>,
) {
    versions.sort_by(|a, b| {
        let a_draft = draft_id == Some(a.id.as_str());
        let b_draft = draft_id == Some(b.id.as_str());
        b_draft
            .cmp(&a_draft)
            .then(b.version.cmp(&a.version))
            .then(b.is_active.cmp(&a.is_active))
            .then(b.updated_at.cmp(&a.updated_at))
    });
}

/// Local registry of a workflow's known versions and draft identity.
///
/// Owns the compensation for eventually-consistent list endpoints: if a
/// previously known draft id disappears from a refreshed list while the
/// session is still authoritative for the workflow, a synthetic summary
/// is fabricated so the UI does not lose the "editing a draft" state
/// mid-edit. The synthetic entry is discarded the moment the server's
/// copy reappears.
#[derive(Clone, Debug, Default)]
pub struct VersionRegistry {
    versions: Vec<WorkflowVersionSummary>,
    draft_id: Option<String>,
    synthetic_draft: bool,
}

impl VersionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn versions(&self) -> &[WorkflowVersionSummary] {
        &self.versions
    }

    #[must_use]
    pub fn draft_id(&self) -> Option<&str> {
        self.draft_id.as_deref()
    }

    /// Whether the current draft entry was fabricated locally.
    #[must_use]
    pub fn draft_is_synthetic(&self) -> bool {
        self.synthetic_draft
    }

    #[must_use]
    pub fn active_version(&self) -> Option<&WorkflowVersionSummary> {
        self.versions
            .iter()
            .filter(|v| v.is_active)
            .max_by_key(|v| v.version)
    }

    #[must_use]
    pub fn version(&self, id: &str) -> Option<&WorkflowVersionSummary> {
        self.versions.iter().find(|v| v.id == id)
    }

    /// Adopt a freshly loaded list, deriving the draft from it.
    pub fn adopt(&mut self, versions: Vec<WorkflowVersionSummary>) {
        self.draft_id = resolve_draft_candidate(&versions).map(|v| v.id.clone());
        self.versions = versions;
        self.synthetic_draft = false;
    }

    /// Record a draft the orchestrator just created remotely.
    pub fn record_draft(&mut self, summary: WorkflowVersionSummary) {
        self.draft_id = Some(summary.id.clone());
        self.synthetic_draft = false;
        match self.versions.iter_mut().find(|v| v.id == summary.id) {
            Some(existing) => *existing = summary,
            None => self.versions.push(summary),
        }
    }

    /// Merge a refreshed list while preserving draft identity.
    ///
    /// `authoritative` means this session still holds the workflow open
    /// with local edits; only then is a vanished draft id compensated
    /// with a synthetic summary (`version = max(fresh) + 1`, carrying
    /// forward the last known timestamps).
    pub fn apply_refresh(&mut self, mut fresh: Vec<WorkflowVersionSummary>, authoritative: bool) {
        match &self.draft_id {
            Some(draft_id) if fresh.iter().any(|v| &v.id == draft_id) => {
                self.synthetic_draft = false;
            }
            Some(draft_id) if authoritative => {
                let next_version = fresh.iter().map(|v| v.version).max().unwrap_or(0) + 1;
                let carried = self.versions.iter().find(|v| &v.id == draft_id);
                let synthetic = match carried {
                    Some(known) => WorkflowVersionSummary {
                        version: next_version,
                        is_active: false,
                        ..known.clone()
                    },
                    None => WorkflowVersionSummary {
                        id: draft_id.clone(),
                        workflow_id: fresh
                            .first()
                            .map(|v| v.workflow_id.clone())
                            .unwrap_or_default(),
                        name: DRAFT_DISPLAY_NAME.to_string(),
                        version: next_version,
                        is_active: false,
                        created_at: Utc::now(),
                        updated_at: Utc::now(),
                    },
                };
                tracing::warn!(
                    draft_id = %draft_id,
                    version = synthetic.version,
                    "draft missing from refreshed version list, keeping synthetic summary"
                );
                fresh.push(synthetic);
                self.synthetic_draft = true;
            }
            _ => {
                self.draft_id = resolve_draft_candidate(&fresh).map(|v| v.id.clone());
                self.synthetic_draft = false;
            }
        }
        self.versions = fresh;
    }

    /// The display name for a version: the fixed draft label for the
    /// draft entry, the stored name otherwise.
    #[must_use]
    pub fn display_name<'a>(&self, version: &'a WorkflowVersionSummary) -> &'a str {
        if self.draft_id.as_deref() == Some(version.id.as_str()) {
            DRAFT_DISPLAY_NAME
        } else {
            version.name.as_str()
        }
    }

    /// Versions ordered for display, draft first.
    #[must_use]
    pub fn ordered(&self) -> Vec<WorkflowVersionSummary> {
        let mut ordered = self.versions.clone();
        sort_versions_with_draft_first(&mut ordered, self.draft_id.as_deref());
        ordered
    }
}
