//! Workspace configuration.

use std::time::Duration;

/// Configuration for opening a workspace.
#[derive(Debug, Clone)]
pub struct Config {
    /// Prefix for snapshot keys (`<app_name>_<collection>`).
    pub app_name: String,

    /// Quiet period after the last mutation before a snapshot is written.
    pub persist_debounce: Duration,

    /// How long a notification stays active.
    pub notification_ttl: Duration,

    /// Number of sample rows in an import template (1 to 3).
    pub template_rows: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "tabula".to_string(),
            persist_debounce: Duration::from_millis(300),
            notification_ttl: Duration::from_secs(3),
            template_rows: 2,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the snapshot key prefix.
    #[must_use]
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    /// Sets the persistence debounce window.
    #[must_use]
    pub const fn persist_debounce(mut self, window: Duration) -> Self {
        self.persist_debounce = window;
        self
    }

    /// Sets the notification lifetime.
    #[must_use]
    pub const fn notification_ttl(mut self, ttl: Duration) -> Self {
        self.notification_ttl = ttl;
        self
    }

    /// Sets the number of template sample rows, clamped to 1..=3.
    #[must_use]
    pub fn template_rows(mut self, rows: usize) -> Self {
        self.template_rows = rows.clamp(1, 3);
        self
    }
}
