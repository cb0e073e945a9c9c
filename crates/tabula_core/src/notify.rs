//! Notification channel.
//!
//! Operations report their outcome as a [`Notification`]. Exactly one
//! notification is active at a time: a new one replaces the previous one,
//! and each expires after the configured lifetime. Missed notifications
//! are not queued for [`NotificationChannel::current`]; observers that
//! need every one subscribe instead.

use crate::clock::Clock;
use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

/// Outcome category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// The operation succeeded.
    Success,
    /// The operation failed, in whole or in part.
    Error,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
        })
    }
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Message text.
    pub message: String,
    /// Outcome category.
    pub kind: NotificationKind,
}

impl Notification {
    /// Creates a success notification.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: NotificationKind::Success,
        }
    }

    /// Creates an error notification.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: NotificationKind::Error,
        }
    }

    /// Returns true for error notifications.
    pub fn is_error(&self) -> bool {
        self.kind == NotificationKind::Error
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// Holds the active notification and fans out to subscribers.
pub struct NotificationChannel {
    clock: Arc<dyn Clock>,
    ttl_ms: i64,
    active: Option<(Notification, i64)>,
    subscribers: Vec<Sender<Notification>>,
    published: u64,
}

impl NotificationChannel {
    /// Creates a channel whose notifications live for `ttl_ms`.
    pub fn new(clock: Arc<dyn Clock>, ttl_ms: i64) -> Self {
        Self {
            clock,
            ttl_ms,
            active: None,
            subscribers: Vec::new(),
            published: 0,
        }
    }

    /// Makes `notification` the active one and sends it to subscribers.
    pub fn publish(&mut self, notification: Notification) {
        let expires = self.clock.now_ms().saturating_add(self.ttl_ms);
        self.subscribers
            .retain(|tx| tx.send(notification.clone()).is_ok());
        self.active = Some((notification, expires));
        self.published += 1;
    }

    /// Publishes a success notification.
    pub fn success(&mut self, message: impl Into<String>) {
        self.publish(Notification::success(message));
    }

    /// Publishes an error notification.
    pub fn error(&mut self, message: impl Into<String>) {
        self.publish(Notification::error(message));
    }

    /// Returns the active notification, unless it has expired.
    pub fn current(&self) -> Option<&Notification> {
        let now = self.clock.now_ms();
        self.active
            .as_ref()
            .filter(|(_, expires)| now < *expires)
            .map(|(n, _)| n)
    }

    /// Clears the active notification.
    pub fn dismiss(&mut self) {
        self.active = None;
    }

    /// Returns a receiver for every future notification.
    pub fn subscribe(&mut self) -> Receiver<Notification> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Returns how many notifications have been published.
    pub fn published(&self) -> u64 {
        self.published
    }
}

impl fmt::Debug for NotificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationChannel")
            .field("ttl_ms", &self.ttl_ms)
            .field("active", &self.active)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
