//! Trailing-edge debounce with an injected clock.
//!
//! Timers in this engine never own a background task: the host's event
//! loop calls [`Debouncer::fire_due`] on its tick, which keeps the logic
//! deterministic and lets tests drive time explicitly.

use std::time::{Duration, Instant};

/// A trailing-edge debounce deadline.
///
/// Each [`schedule`](Self::schedule) replaces any pending deadline, so
/// only the most recent trigger survives — the semantics autosave and
/// viewport persistence both rely on.
///
/// # Examples
///
/// ```rust
/// use draftloom::utils::Debouncer;
/// use std::time::{Duration, Instant};
///
/// let mut debounce = Debouncer::new(Duration::from_millis(400));
/// let t0 = Instant::now();
///
/// debounce.schedule(t0);
/// // A second edit inside the window replaces the deadline.
/// debounce.schedule(t0 + Duration::from_millis(200));
///
/// assert!(!debounce.fire_due(t0 + Duration::from_millis(500)));
/// assert!(debounce.fire_due(t0 + Duration::from_millis(600)));
/// // Firing consumes the deadline.
/// assert!(!debounce.fire_due(t0 + Duration::from_millis(700)));
/// ```
#[derive(Clone, Debug)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Arm (or re-arm) the deadline at `now + delay`.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// Returns `true` exactly once when the deadline has passed,
    /// consuming it.
    pub fn fire_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Whether a deadline is currently armed.
    #[must_use]
    pub fn pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Drop any armed deadline without firing.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// The configured delay.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }
}
