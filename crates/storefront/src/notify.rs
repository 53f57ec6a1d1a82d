//! Transient user-facing notifications.
//!
//! Every storefront action ends in at most one notification: a success
//! message or the message of the error that stopped it. How notifications
//! are displayed is up to the front end; this module only defines the seam.

use std::sync::Mutex;

use serde::Serialize;

use crate::error::AppError;

/// How prominently a notification should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// A message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Display severity.
    pub severity: Severity,
    /// Message text.
    pub message: String,
}

impl Notification {
    /// Create a notification.
    #[must_use]
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }

    /// A success notification.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message)
    }
}

impl From<&AppError> for Notification {
    fn from(err: &AppError) -> Self {
        Self::new(err.severity(), err.user_message())
    }
}

/// Something that can show notifications to the user.
pub trait Notifier: Send + Sync {
    /// Show a notification.
    fn notify(&self, notification: Notification);

    /// Show the notification for a failed action.
    fn report(&self, err: &AppError) {
        self.notify(Notification::from(err));
    }
}

/// Notifier that writes to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Info | Severity::Success => tracing::info!("{}", notification.message),
            Severity::Warning => tracing::warn!("{}", notification.message),
            Severity::Error => tracing::error!("{}", notification.message),
        }
    }
}

/// Notifier that keeps every notification, for assertions in tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    /// Notifications received so far, oldest first.
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(notification);
        }
    }
}
