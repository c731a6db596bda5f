//! In-memory platform doubles shared by unit tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::{NotificationError, RegistrationError, SubscriptionError, TransmissionError};
use crate::platform::{AgentContainer, NotificationHost, NotificationOptions, PushManager, RegistrationHandle};
use crate::subscription::fixtures::descriptor;
use crate::subscription::{BackendConfirmation, PushSubscription, SubscribeOptions};
use crate::transmitter::Transmit;

/// Push manager that behaves like a browser: the first subscribe creates a
/// subscription, later ones return it unchanged.
#[derive(Debug, Default)]
pub struct FakePushManager {
    deny: bool,
    active: Mutex<Option<PushSubscription>>,
    subscribe_calls: AtomicUsize,
    last_options: Mutex<Option<SubscribeOptions>>,
}

impl FakePushManager {
    pub fn granting() -> Self {
        Self::default()
    }

    pub fn denying() -> Self {
        Self {
            deny: true,
            ..Self::default()
        }
    }

    pub fn subscribe_calls(&self) -> usize {
        self.subscribe_calls.load(Ordering::SeqCst)
    }

    /// The subscription handed out so far; panics if none was created.
    pub fn active_subscription(&self) -> PushSubscription {
        self.active.lock().unwrap().clone().expect("no active subscription")
    }

    pub fn last_options(&self) -> Option<SubscribeOptions> {
        self.last_options.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushManager for FakePushManager {
    async fn subscribe(&self, options: &SubscribeOptions) -> Result<PushSubscription, SubscriptionError> {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_options.lock().unwrap() = Some(options.clone());

        if self.deny {
            return Err(SubscriptionError::PermissionDenied);
        }

        let mut active = self.active.lock().unwrap();
        let sub = active
            .get_or_insert_with(|| descriptor("https://fcm.googleapis.com/fcm/send/device-1"))
            .clone();
        Ok(sub)
    }

    async fn get_subscription(&self) -> Result<Option<PushSubscription>, SubscriptionError> {
        Ok(self.active.lock().unwrap().clone())
    }
}

/// Transmitter that records what it was asked to send.
#[derive(Debug, Default)]
pub struct RecordingTransmitter {
    delay: Duration,
    failures: Mutex<VecDeque<TransmissionError>>,
    sent: Mutex<Vec<PushSubscription>>,
    attempts: AtomicUsize,
    finished: AtomicBool,
}

impl RecordingTransmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each send sleeps for `delay` before answering.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    /// The next sends fail with `errors`, in order.
    pub fn failing_with(errors: Vec<TransmissionError>) -> Self {
        Self {
            failures: Mutex::new(errors.into()),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<PushSubscription> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transmit for RecordingTransmitter {
    async fn send(&self, subscription: &PushSubscription) -> Result<BackendConfirmation, TransmissionError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;

        if let Some(err) = self.failures.lock().unwrap().pop_front() {
            return Err(err);
        }

        self.sent.lock().unwrap().push(subscription.clone());
        self.finished.store(true, Ordering::SeqCst);
        Ok(BackendConfirmation(serde_json::json!({"data": {"success": true}})))
    }
}

/// Notification host that records every notification.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    fail: bool,
    shown: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// `(title, body)` pairs in display order.
    pub fn shown(&self) -> Vec<(String, String)> {
        self.shown.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationHost for RecordingNotifier {
    async fn show_notification(
        &self,
        title: &str,
        options: &NotificationOptions,
    ) -> Result<(), NotificationError> {
        if self.fail {
            return Err(NotificationError("permission not granted".to_string()));
        }
        self.shown
            .lock()
            .unwrap()
            .push((title.to_string(), options.body.clone()));
        Ok(())
    }
}

/// Agent container with configurable support.
#[derive(Debug, Default)]
pub struct FakeContainer {
    unsupported: bool,
    registrations: AtomicUsize,
}

impl FakeContainer {
    pub fn supported() -> Self {
        Self::default()
    }

    pub fn unsupported() -> Self {
        Self {
            unsupported: true,
            ..Self::default()
        }
    }

    pub fn registrations(&self) -> usize {
        self.registrations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AgentContainer for FakeContainer {
    fn is_supported(&self) -> bool {
        !self.unsupported
    }

    async fn register(&self, script_url: &str) -> Result<RegistrationHandle, RegistrationError> {
        self.registrations.fetch_add(1, Ordering::SeqCst);
        if script_url.ends_with(".js") {
            Ok(RegistrationHandle {
                script_url: script_url.to_string(),
                scope: "/".to_string(),
            })
        } else {
            Err(RegistrationError::ScriptUnavailable {
                script_url: script_url.to_string(),
                reason: "not a script".to_string(),
            })
        }
    }
}
