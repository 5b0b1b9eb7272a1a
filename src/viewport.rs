//! Per-device viewport memory.
//!
//! Camera state is remembered per `(device, workflow, version)` key,
//! hydrated from the remote store at session start, updated on every
//! settled pan/zoom, and pushed back as a debounced full-table upsert.
//! Restoration after a workflow/version switch is best-effort with
//! forced reapplication, since the rendering surface may auto-fit over
//! a freshly assigned camera (see [`restore_viewport`]).

use serde::{Deserialize, Serialize};
use std::time::Instant;

use rustc_hash::FxHashMap;

use crate::canvas::CanvasSurface;
use crate::types::DeviceType;
use crate::utils::{Debouncer, RetryPolicy};

/// Camera state of the graph canvas.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Viewport {
    /// The uninitialized camera. Entries equal to this are "no
    /// preference" and are never restored.
    pub const DEFAULT: Viewport = Viewport {
        x: 0.0,
        y: 0.0,
        zoom: 1.0,
    };

    #[must_use]
    pub fn new(x: f64, y: f64, zoom: f64) -> Self {
        Self { x, y, zoom }
    }

    #[must_use]
    pub fn is_default(&self) -> bool {
        *self == Self::DEFAULT
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.zoom.is_finite()
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Key-component used when no concrete version is selected.
pub const LATEST_VERSION_KEY: &str = "latest";

/// Identity of one remembered camera.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ViewportKey {
    pub device: DeviceType,
    pub workflow_id: String,
    pub version_id: Option<String>,
}

impl ViewportKey {
    #[must_use]
    pub fn new(device: DeviceType, workflow_id: impl Into<String>, version_id: Option<&str>) -> Self {
        Self {
            device,
            workflow_id: workflow_id.into(),
            version_id: version_id.map(str::to_string),
        }
    }

    /// Flat string form, collapsing a missing version to
    /// [`LATEST_VERSION_KEY`].
    ///
    /// ```rust
    /// use draftloom::types::DeviceType;
    /// use draftloom::viewport::ViewportKey;
    ///
    /// let latest = ViewportKey::new(DeviceType::Desktop, "wf-1", None);
    /// let pinned = ViewportKey::new(DeviceType::Desktop, "wf-1", Some("v-2"));
    /// assert_eq!(latest.storage_key(), "wf-1:latest:desktop");
    /// assert_ne!(latest.storage_key(), pinned.storage_key());
    /// ```
    #[must_use]
    pub fn storage_key(&self) -> String {
        format!(
            "{}:{}:{}",
            self.workflow_id,
            self.version_id.as_deref().unwrap_or(LATEST_VERSION_KEY),
            self.device.as_str()
        )
    }
}

/// One row of the remote viewport table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewportRecord {
    pub workflow_id: String,
    #[serde(default)]
    pub version_id: Option<String>,
    pub device_type: DeviceType,
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl ViewportRecord {
    #[must_use]
    pub fn key(&self) -> ViewportKey {
        ViewportKey::new(
            self.device_type,
            self.workflow_id.clone(),
            self.version_id.as_deref(),
        )
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.x, self.y, self.zoom)
    }

    #[must_use]
    pub fn from_entry(key: &ViewportKey, viewport: Viewport) -> Self {
        Self {
            workflow_id: key.workflow_id.clone(),
            version_id: key.version_id.clone(),
            device_type: key.device,
            x: viewport.x,
            y: viewport.y,
            zoom: viewport.zoom,
        }
    }
}

/// In-memory viewport table with debounced remote sync.
///
/// The table is the single source for restores; the remote store is a
/// write-behind mirror refreshed by full-table upserts.
#[derive(Clone, Debug)]
pub struct ViewportMemory {
    entries: FxHashMap<ViewportKey, Viewport>,
    debounce: Debouncer,
    dirty: bool,
    pending_restore: Option<(ViewportKey, Viewport)>,
}

impl ViewportMemory {
    #[must_use]
    pub fn new(debounce: Debouncer) -> Self {
        Self {
            entries: FxHashMap::default(),
            debounce,
            dirty: false,
            pending_restore: None,
        }
    }

    /// Load the table from the remote list endpoint.
    ///
    /// Entries exactly equal to the default camera are "no preference"
    /// (an uninitialized surface once persisted them) and are excluded;
    /// so are rows with non-finite coordinates.
    pub fn hydrate(&mut self, records: Vec<ViewportRecord>) {
        self.entries.clear();
        for record in records {
            let viewport = record.viewport();
            if !viewport.is_finite() || viewport.is_default() {
                continue;
            }
            self.entries.insert(record.key(), viewport);
        }
    }

    #[must_use]
    pub fn get(&self, key: &ViewportKey) -> Option<Viewport> {
        self.entries.get(key).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a settled pan/zoom and schedule the debounced sync.
    ///
    /// Non-finite cameras are dropped before they can poison the table.
    pub fn note_settled(&mut self, key: ViewportKey, viewport: Viewport, now: Instant) {
        if !viewport.is_finite() {
            tracing::warn!(key = %key.storage_key(), "dropping non-finite viewport");
            return;
        }
        self.entries.insert(key, viewport);
        self.dirty = true;
        self.debounce.schedule(now);
    }

    /// Whether a sync is scheduled but not yet due.
    #[must_use]
    pub fn sync_pending(&self) -> bool {
        self.dirty && self.debounce.pending()
    }

    /// The full table to PUT, once the debounce window has passed.
    ///
    /// Returns `None` until due; consuming the due deadline clears the
    /// dirty flag, so a failed upload should call
    /// [`mark_dirty`](Self::mark_dirty) to re-arm.
    pub fn take_due_sync(&mut self, now: Instant) -> Option<Vec<ViewportRecord>> {
        if !self.dirty || !self.debounce.fire_due(now) {
            return None;
        }
        self.dirty = false;
        let mut records: Vec<ViewportRecord> = self
            .entries
            .iter()
            .filter(|(_, viewport)| viewport.is_finite())
            .map(|(key, viewport)| ViewportRecord::from_entry(key, *viewport))
            .collect();
        records.sort_by_key(|r| (r.workflow_id.clone(), r.version_id.clone()));
        Some(records)
    }

    /// Re-arm the sync after a failed upload.
    pub fn mark_dirty(&mut self, now: Instant) {
        self.dirty = true;
        self.debounce.schedule(now);
    }

    /// Look up the key for a freshly selected workflow/version and mark
    /// it for restoration if the table remembers a camera for it.
    pub fn plan_restore(&mut self, key: &ViewportKey) -> Option<Viewport> {
        let viewport = self.get(key)?;
        self.pending_restore = Some((key.clone(), viewport));
        Some(viewport)
    }

    /// Consume the pending restore, if any.
    pub fn take_pending_restore(&mut self) -> Option<(ViewportKey, Viewport)> {
        self.pending_restore.take()
    }

    #[must_use]
    pub fn restore_pending(&self) -> bool {
        self.pending_restore.is_some()
    }
}

/// Reapply a remembered camera until the surface keeps it.
///
/// The surface may run its own auto-fit after mount, so a single
/// assignment is not enough; the policy drives apply/check rounds with
/// a 1-unit default tolerance on x/y. Best-effort: exhausting the
/// attempts logs a warning and gives up rather than retrying forever.
pub async fn restore_viewport(
    surface: &mut dyn CanvasSurface,
    target: Viewport,
    policy: &RetryPolicy,
) -> bool {
    let converged = policy
        .converge_on(
            surface,
            |s| s.set_viewport(target),
            |s| {
                let actual = s.viewport();
                policy.within_tolerance(target.x, actual.x)
                    && policy.within_tolerance(target.y, actual.y)
            },
        )
        .await;
    if !converged {
        tracing::warn!(
            target_x = target.x,
            target_y = target.y,
            "viewport restore did not converge"
        );
    }
    converged
}
