//! Native (non-browser) host adapters used by the `ap-push-agent` binary.
//!
//! - [`ConsoleNotifier`] prints notifications to stdout.
//! - [`RecordedPushManager`] hands out a subscription previously captured
//!   from a browser (`JSON.stringify(subscription)`), which lets the save
//!   flow run end to end from a terminal.
//! - [`LocalContainer`] accepts any non-empty script URL.
//! - [`forward_events`] turns JSON lines into [`AgentEvent`]s.
//! - [`run_host`] drives an [`AgentHost`] from such a stream.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

use crate::agent::AgentEvent;
use crate::host::{AgentHost, HostStats};
use crate::error::{NotificationError, RegistrationError, SubscriptionError};
use crate::platform::{AgentContainer, NotificationHost, NotificationOptions, PushEvent, PushManager, RegistrationHandle};
use crate::subscription::{PushSubscription, SubscribeOptions};

/// Prints each notification as `[title] body`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

#[async_trait]
impl NotificationHost for ConsoleNotifier {
    async fn show_notification(
        &self,
        title: &str,
        options: &NotificationOptions,
    ) -> Result<(), NotificationError> {
        println!("[{}] {}", title, options.body);
        Ok(())
    }
}

/// Push manager replaying a recorded subscription.
#[derive(Debug)]
pub struct RecordedPushManager {
    recorded: PushSubscription,
    active: AtomicBool,
}

impl RecordedPushManager {
    /// Wrap an already validated subscription.
    pub fn new(recorded: PushSubscription) -> Self {
        Self {
            recorded,
            active: AtomicBool::new(false),
        }
    }

    /// Load and validate a subscription JSON file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        Ok(Self::new(read_subscription(path)?))
    }
}

/// Read a subscription descriptor JSON file and validate it.
pub fn read_subscription(path: &Path) -> anyhow::Result<PushSubscription> {
    use anyhow::Context;

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let subscription: PushSubscription = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a push subscription", path.display()))?;
    subscription
        .validate()
        .with_context(|| format!("{} holds an invalid subscription", path.display()))?;
    Ok(subscription)
}

#[async_trait]
impl PushManager for RecordedPushManager {
    async fn subscribe(&self, options: &SubscribeOptions) -> Result<PushSubscription, SubscriptionError> {
        if !options.user_visible_only {
            return Err(SubscriptionError::Platform(
                "only user-visible subscriptions are supported".to_string(),
            ));
        }
        if options.application_server_key.is_empty() {
            return Err(SubscriptionError::InvalidKey(
                "applicationServerKey is empty".to_string(),
            ));
        }

        self.active.store(true, Ordering::SeqCst);
        Ok(self.recorded.clone())
    }

    async fn get_subscription(&self) -> Result<Option<PushSubscription>, SubscriptionError> {
        Ok(self
            .active
            .load(Ordering::SeqCst)
            .then(|| self.recorded.clone()))
    }
}

/// Container for the native host; scripts are not actually loaded.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalContainer;

#[async_trait]
impl AgentContainer for LocalContainer {
    async fn register(&self, script_url: &str) -> Result<RegistrationHandle, RegistrationError> {
        if script_url.trim().is_empty() {
            return Err(RegistrationError::ScriptUnavailable {
                script_url: script_url.to_string(),
                reason: "empty script URL".to_string(),
            });
        }
        Ok(RegistrationHandle {
            script_url: script_url.to_string(),
            scope: "/".to_string(),
        })
    }
}

/// One line of the event stream read by `ap-push-agent run`.
///
/// ```json
/// {"type": "activate"}
/// {"type": "push", "data": "AP 12 is offline"}
/// {"type": "push"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EventLine {
    /// Agent activation.
    Activate,
    /// Push message with optional text payload.
    Push {
        /// Payload text; absent means a push without data.
        #[serde(default)]
        data: Option<String>,
    },
}

impl From<EventLine> for AgentEvent {
    fn from(line: EventLine) -> Self {
        match line {
            EventLine::Activate => AgentEvent::Activate,
            EventLine::Push { data: Some(text) } => AgentEvent::Push(PushEvent::with_data(text)),
            EventLine::Push { data: None } => AgentEvent::Push(PushEvent::empty()),
        }
    }
}

/// Read JSON-lines events from `reader` and deliver them to `events`.
///
/// Blank lines are skipped; lines that are not UTF-8 or not a valid event are
/// logged and skipped. Stops at end of input or when the host hangs up.
/// Returns the number of events delivered.
pub async fn forward_events<R>(mut reader: R, events: mpsc::Sender<AgentEvent>) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let mut delivered = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        let line = match std::str::from_utf8(&buf) {
            Ok(text) => text.trim(),
            Err(e) => {
                log::warn!("[Host] Skipping non UTF-8 event line: {}", e);
                continue;
            }
        };
        if line.is_empty() {
            continue;
        }

        let event = match serde_json::from_str::<EventLine>(line) {
            Ok(parsed) => AgentEvent::from(parsed),
            Err(e) => {
                log::warn!("[Host] Skipping malformed event {:?}: {}", line, e);
                continue;
            }
        };

        if events.send(event).await.is_err() {
            log::warn!("[Host] Agent host stopped, dropping remaining input");
            break;
        }
        delivered += 1;
    }

    Ok(delivered)
}

/// Run `host` on the events read from `reader`.
///
/// The host drains its outstanding work before this returns, also when
/// reading fails. The read result is returned next to the host's counters.
pub async fn run_host<R>(
    host: AgentHost,
    events: mpsc::Sender<AgentEvent>,
    reader: R,
) -> (HostStats, std::io::Result<usize>)
where
    R: AsyncBufRead + Unpin,
{
    tokio::join!(host.run(), forward_events(reader, events))
}
