//! Engine configuration.
//!
//! All tunables live here so hosts and tests can shrink delays to zero.
//! Endpoint candidates resolve from the environment when not provided,
//! supporting the multiple deployment topologies the client must try in
//! order.

use std::time::Duration;

use crate::utils::{Debouncer, RetryPolicy};

/// Environment variable listing comma-separated API base URLs.
pub const API_BASES_ENV: &str = "DRAFTLOOM_API_BASES";

const DEFAULT_BASE: &str = "http://localhost:8000";

/// Tunables for the reconciliation engine.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Trailing-edge delay between the last edit and the autosave.
    pub autosave_delay: Duration,
    /// How long the transient `saved` status is shown before reverting
    /// to `idle`.
    pub saved_hold: Duration,
    /// Trailing-edge delay for the viewport full-table upsert.
    pub viewport_debounce: Duration,
    /// Interval between remote version-list polls.
    pub poll_interval: Duration,
    /// Bound for each undo/redo stack.
    pub history_capacity: usize,
    /// Ordered candidate base URLs for the workflow store.
    pub endpoints: Vec<String>,
    /// Reapplication schedule for viewport restores.
    pub restore_policy: RetryPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            autosave_delay: Duration::from_millis(800),
            saved_hold: Duration::from_secs(2),
            viewport_debounce: Duration::from_millis(500),
            poll_interval: Duration::from_secs(15),
            history_capacity: crate::history::DEFAULT_CAPACITY,
            endpoints: Self::resolve_endpoints(None),
            restore_policy: RetryPolicy::default(),
        }
    }
}

impl EngineConfig {
    fn resolve_endpoints(provided: Option<Vec<String>>) -> Vec<String> {
        if let Some(endpoints) = provided {
            if !endpoints.is_empty() {
                return endpoints;
            }
        }
        dotenvy::dotenv().ok();
        match std::env::var(API_BASES_ENV) {
            Ok(joined) => {
                let endpoints: Vec<String> = joined
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
                if endpoints.is_empty() {
                    vec![DEFAULT_BASE.to_string()]
                } else {
                    endpoints
                }
            }
            Err(_) => vec![DEFAULT_BASE.to_string()],
        }
    }

    #[must_use]
    pub fn with_endpoints(mut self, endpoints: Vec<String>) -> Self {
        self.endpoints = Self::resolve_endpoints(Some(endpoints));
        self
    }

    #[must_use]
    pub fn with_autosave_delay(mut self, delay: Duration) -> Self {
        self.autosave_delay = delay;
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub fn with_restore_policy(mut self, policy: RetryPolicy) -> Self {
        self.restore_policy = policy;
        self
    }

    /// Debouncer for the viewport table sync.
    #[must_use]
    pub fn viewport_debouncer(&self) -> Debouncer {
        Debouncer::new(self.viewport_debounce)
    }

    /// Debouncer for autosave.
    #[must_use]
    pub fn autosave_debouncer(&self) -> Debouncer {
        Debouncer::new(self.autosave_delay)
    }
}
