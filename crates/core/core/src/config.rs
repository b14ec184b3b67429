//! Recorder configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Component name used when none is configured.
pub const DEFAULT_COMPONENT: &str = "wpcore";

/// Default upper bound for a single context read, in milliseconds.
pub const DEFAULT_CONTEXT_TIMEOUT_MS: u64 = 250;

/// Configuration for a [`FootstepRecorder`](crate::FootstepRecorder).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Component name written into every footstep.
    pub component: String,
    /// Upper bound for each context provider read, in milliseconds.
    pub context_timeout_ms: u64,
    /// Accepted actions. Empty means any non-empty action is accepted.
    pub allowed_actions: Vec<String>,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            component: DEFAULT_COMPONENT.to_string(),
            context_timeout_ms: DEFAULT_CONTEXT_TIMEOUT_MS,
            allowed_actions: Vec::new(),
        }
    }
}

impl RecorderConfig {
    /// Creates a config for the given component with default settings.
    pub fn for_component(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            ..Self::default()
        }
    }

    /// Sets the context read timeout.
    pub fn with_context_timeout(mut self, timeout: Duration) -> Self {
        self.context_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Restricts accepted actions to the given list.
    pub fn with_allowed_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_actions = actions.into_iter().map(Into::into).collect();
        self
    }

    /// Returns the context read timeout as a [`Duration`].
    pub fn context_timeout(&self) -> Duration {
        Duration::from_millis(self.context_timeout_ms)
    }

    /// Returns true if `action` passes the allow-list.
    pub fn accepts_action(&self, action: &str) -> bool {
        self.allowed_actions.is_empty() || self.allowed_actions.iter().any(|a| a == action)
    }
}
