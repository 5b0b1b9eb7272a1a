//! Undo/redo history over whole-graph snapshots.
//!
//! Snapshots are canonical serialization strings (see
//! [`crate::model::GraphPayload::canonical_json`]); equality of strings
//! is equality of graphs, so the engine never diffs structures. Stacks
//! are bounded; continuous drags coalesce into a single entry.

use crate::model::{WorkflowEdge, WorkflowNode};

/// Default bound for each history stack.
pub const DEFAULT_CAPACITY: usize = 50;

/// Linear undo/redo engine over canonical snapshots.
///
/// The engine only records; parsing a snapshot back into live
/// nodes/edges goes through [`restore_parts`], which drops nodes of
/// unrecognized kind.
///
/// # Examples
///
/// ```rust
/// use draftloom::history::HistoryEngine;
///
/// let mut history = HistoryEngine::new();
/// history.reset("a");
/// history.observe("b", false);
/// history.observe("c", false);
///
/// assert_eq!(history.undo(), Some("b".to_string()));
/// assert_eq!(history.undo(), Some("a".to_string()));
/// assert_eq!(history.undo(), None);
/// assert_eq!(history.redo(), Some("b".to_string()));
/// ```
#[derive(Clone, Debug)]
pub struct HistoryEngine {
    past: Vec<String>,
    future: Vec<String>,
    last: Option<String>,
    pending: Option<String>,
    restoring: bool,
    enabled: bool,
    capacity: usize,
}

impl Default for HistoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            past: Vec::new(),
            future: Vec::new(),
            last: None,
            pending: None,
            restoring: false,
            enabled: true,
            capacity: capacity.max(1),
        }
    }

    /// Disable recording entirely (preview mode). Re-enabling does not
    /// resurrect anything recorded before.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.past.clear();
            self.future.clear();
            self.pending = None;
        }
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.enabled && !self.past.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.enabled && !self.future.is_empty()
    }

    #[must_use]
    pub fn last_snapshot(&self) -> Option<&str> {
        self.last.as_deref()
    }

    /// Reset to a single committed snapshot with empty stacks: the entry
    /// point for loading a different version.
    pub fn reset(&mut self, snapshot: impl Into<String>) {
        self.past.clear();
        self.future.clear();
        self.pending = None;
        self.restoring = false;
        self.last = Some(snapshot.into());
    }

    /// Absorb exactly one upcoming snapshot without committing it.
    ///
    /// Armed before a background reload that rehydrates the same logical
    /// content after a save, so the rehydration does not register as an
    /// undoable edit.
    pub fn mark_restoring(&mut self) {
        self.restoring = true;
    }

    /// Record a committed mutation's snapshot.
    ///
    /// While `dragging`, changes buffer into a pending snapshot instead
    /// of committing; see [`end_drag`](Self::end_drag). Outside a drag, a
    /// snapshot that differs from the committed one pushes the previous
    /// snapshot onto the past stack (bounded) and clears the future.
    pub fn observe(&mut self, snapshot: &str, dragging: bool) {
        if !self.enabled {
            return;
        }
        if self.restoring {
            self.restoring = false;
            self.last = Some(snapshot.to_string());
            self.pending = None;
            return;
        }
        if dragging {
            self.pending = Some(snapshot.to_string());
            return;
        }
        self.commit(snapshot);
    }

    /// Commit the coalesced drag gesture, if it changed anything.
    pub fn end_drag(&mut self) {
        if let Some(pending) = self.pending.take() {
            if self.enabled {
                self.commit(&pending);
            }
        }
    }

    fn commit(&mut self, snapshot: &str) {
        if self.last.as_deref() == Some(snapshot) {
            return;
        }
        if let Some(last) = self.last.replace(snapshot.to_string()) {
            self.past.push(last);
            if self.past.len() > self.capacity {
                let overflow = self.past.len() - self.capacity;
                self.past.drain(..overflow);
            }
        }
        self.future.clear();
    }

    /// Step back, returning the snapshot to restore.
    pub fn undo(&mut self) -> Option<String> {
        if !self.enabled {
            return None;
        }
        let restored = self.past.pop()?;
        if let Some(last) = self.last.replace(restored.clone()) {
            self.future.push(last);
            if self.future.len() > self.capacity {
                let overflow = self.future.len() - self.capacity;
                self.future.drain(..overflow);
            }
        }
        self.pending = None;
        Some(restored)
    }

    /// Step forward, returning the snapshot to restore.
    pub fn redo(&mut self) -> Option<String> {
        if !self.enabled {
            return None;
        }
        let restored = self.future.pop()?;
        if let Some(last) = self.last.replace(restored.clone()) {
            self.past.push(last);
            if self.past.len() > self.capacity {
                let overflow = self.past.len() - self.capacity;
                self.past.drain(..overflow);
            }
        }
        self.pending = None;
        Some(restored)
    }
}

/// Parse a snapshot back into live parts, dropping unrecognized kinds.
///
/// Kind validation on restore mirrors the merge engine's import filter:
/// a node whose kind this build does not know never re-enters the live
/// graph, and edges it anchored are dropped with it.
pub fn restore_parts(
    snapshot: &str,
) -> Result<(Vec<WorkflowNode>, Vec<WorkflowEdge>), serde_json::Error> {
    let payload = crate::model::GraphPayload::parse(snapshot)?;
    Ok(payload.into_recognized_parts())
}
