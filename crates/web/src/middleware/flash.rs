//! One-shot toast notifications.
//!
//! A handler that redirects queues its toast in the cookie session; the next
//! rendered page drains the queue. A handler that re-renders puts the toast
//! straight on its [`Page`](crate::page::Page).

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use super::session::keys;

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastLevel {
    Success,
    Error,
}

impl ToastLevel {
    /// CSS modifier class.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Success => "toast-success",
            Self::Error => "toast-error",
        }
    }
}

/// A notification shown once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

impl Toast {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Error,
            message: message.into(),
        }
    }
}

/// Queue a toast for the next rendered page.
///
/// # Errors
///
/// Returns an error if the session cannot be read or written.
pub async fn push_toast(session: &Session, toast: Toast) -> Result<(), tower_sessions::session::Error> {
    let mut queued: Vec<Toast> = session.get(keys::TOASTS).await?.unwrap_or_default();
    queued.push(toast);
    session.insert(keys::TOASTS, queued).await
}

/// Remove and return every queued toast, oldest first.
pub async fn take_toasts(session: &Session) -> Vec<Toast> {
    match session.remove::<Vec<Toast>>(keys::TOASTS).await {
        Ok(toasts) => toasts.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read queued toasts");
            Vec::new()
        }
    }
}
