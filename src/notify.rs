//! Toast-style notifications surfaced to the user.

use std::sync::Mutex;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }
}

/// Notification surface supplied by the host.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Emits notifications as tracing events (headless hosts, the CLI).
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Error => tracing::warn!(message = %notification.message, "notify"),
            NotificationLevel::Success | NotificationLevel::Info => {
                tracing::info!(message = %notification.message, "notify")
            }
        }
    }
}

/// Collects notifications until the host drains them.
#[derive(Default)]
pub struct BufferedNotifier {
    pending: Mutex<Vec<Notification>>,
}

impl BufferedNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take everything received so far.
    pub fn drain(&self) -> Vec<Notification> {
        self.pending
            .lock()
            .map(|mut p| std::mem::take(&mut *p))
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<Notification> {
        self.pending.lock().ok().and_then(|p| p.last().cloned())
    }
}

impl Notifier for BufferedNotifier {
    fn notify(&self, notification: Notification) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.push(notification);
        }
    }
}
