//! Notification dispatcher: every push becomes a visible notification.
//!
//! Subscriptions are created with `userVisibleOnly`, so browsers expect each
//! push to show something. The payload text is used as the body under a
//! fixed title; notifications carry no tag and are never merged.

use std::sync::Arc;

use crate::error::AgentError;
use crate::platform::{NotificationHost, NotificationOptions, PushEvent};

/// Shows one notification per inbound push.
pub struct NotificationDispatcher {
    title: String,
    host: Arc<dyn NotificationHost>,
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher")
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}

impl NotificationDispatcher {
    /// Creates a dispatcher showing notifications titled `title` on `host`.
    pub fn new(title: impl Into<String>, host: Arc<dyn NotificationHost>) -> Self {
        Self {
            title: title.into(),
            host,
        }
    }

    /// Push handler.
    ///
    /// Fails with `PayloadError` before touching the notification host when
    /// the push has no data.
    pub async fn on_push(&self, event: &PushEvent) -> Result<(), AgentError> {
        let body = event.text()?;
        log::debug!("[WebPush] Push received ({} bytes)", body.len());

        self.host
            .show_notification(&self.title, &NotificationOptions { body })
            .await?;
        Ok(())
    }
}
