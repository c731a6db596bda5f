//! The background agent: event routing and the top-level failure handler.
//!
//! # Architecture
//!
//! ```text
//! host event ──► BackgroundAgent::dispatch ──► ExtendableEvent::wait_until(task)
//!                                                │
//!                 activate ──► PushSubscriber::on_activate ──► subscribe ──► save (retry)
//!                 push     ──► NotificationDispatcher::on_push ──► show_notification
//!                                                │
//!                                       Err ──► handle_failure (log / notify user)
//! ```
//!
//! Every handler returns an explicit `Result`; the only place that decides
//! what a failure means for the user is [`BackgroundAgent::handle_failure`].

use std::sync::Arc;

use crate::config::AgentConfig;
use crate::dispatcher::NotificationDispatcher;
use crate::error::{AgentError, SubscriptionError};
use crate::lifetime::ExtendableEvent;
use crate::platform::{NotificationHost, NotificationOptions, PushEvent, PushManager};
use crate::subscriber::PushSubscriber;
use crate::transmitter::Transmit;

/// Title of notifications reporting a setup failure.
pub const FAILURE_TITLE: &str = "Push notifications unavailable";

/// Lifecycle events delivered to the agent by its host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEvent {
    /// The agent became active; subscribe and save.
    Activate,
    /// A push message arrived.
    Push(PushEvent),
}

impl AgentEvent {
    /// Event name as the host would report it.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Activate => "activate",
            Self::Push(_) => "push",
        }
    }
}

/// What the top-level handler did about a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureAction {
    /// Logged only.
    Logged,
    /// Logged and reported to the user with this notification body.
    NotifiedUser(String),
}

/// The agent: owns the subscriber and the dispatcher.
pub struct BackgroundAgent {
    subscriber: PushSubscriber,
    dispatcher: NotificationDispatcher,
    notifier: Arc<dyn NotificationHost>,
}

impl std::fmt::Debug for BackgroundAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundAgent")
            .field("subscriber", &self.subscriber)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

impl BackgroundAgent {
    /// Wire an agent from configuration and platform capabilities.
    ///
    /// Fails if the configured server key is malformed.
    pub fn new(
        config: &AgentConfig,
        push_manager: Arc<dyn PushManager>,
        transmitter: Arc<dyn Transmit>,
        notifier: Arc<dyn NotificationHost>,
    ) -> Result<Self, SubscriptionError> {
        let subscriber = PushSubscriber::new(
            push_manager,
            transmitter,
            config.server_key()?,
            config.retry.clone(),
        );
        let dispatcher =
            NotificationDispatcher::new(config.notification_title.clone(), Arc::clone(&notifier));

        Ok(Self {
            subscriber,
            dispatcher,
            notifier,
        })
    }

    /// Start handling `event` and return it with the handler's work
    /// registered, so the caller can hold the agent open until it settles.
    pub fn dispatch(self: &Arc<Self>, event: AgentEvent) -> ExtendableEvent {
        let extendable = ExtendableEvent::new(event.kind());
        let agent = Arc::clone(self);

        extendable.wait_until(async move {
            if let Err(e) = agent.handle(event).await {
                agent.handle_failure(&e).await;
            }
        });

        extendable
    }

    /// Run the handler for `event` to completion.
    pub async fn handle(&self, event: AgentEvent) -> Result<(), AgentError> {
        match event {
            AgentEvent::Activate => self.subscriber.on_activate().await.map(|_| ()),
            AgentEvent::Push(push) => self.dispatcher.on_push(&push).await,
        }
    }

    /// Decide what a failure means for the user, and act on it.
    ///
    /// - denied permission and failed saves (retries already exhausted) are
    ///   reported to the user, since otherwise the device silently never
    ///   receives alerts;
    /// - everything else is logged.
    pub async fn handle_failure(&self, error: &AgentError) -> FailureAction {
        log::error!("[Agent] {}", error);

        let Some(body) = user_message(error) else {
            return FailureAction::Logged;
        };

        let options = NotificationOptions {
            body: body.to_string(),
        };
        match self.notifier.show_notification(FAILURE_TITLE, &options).await {
            Ok(()) => FailureAction::NotifiedUser(options.body),
            Err(e) => {
                log::warn!("[Agent] Could not report failure to user: {}", e);
                FailureAction::Logged
            }
        }
    }
}

/// User-facing explanation for failures the user should hear about.
fn user_message(error: &AgentError) -> Option<&'static str> {
    match error {
        AgentError::Subscription(SubscriptionError::PermissionDenied) => Some(
            "Notifications are blocked for this site. Allow them in your browser settings to receive access point alerts.",
        ),
        AgentError::Transmission(_) => Some(
            "This device could not be registered for access point alerts. It will try again next time it starts.",
        ),
        _ => None,
    }
}
