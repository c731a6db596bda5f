// End-to-end tests: events from a JSON-lines stream through the host loop,
// the recorded push manager and the HTTP transmitter against a mock backend.

use std::sync::{Arc, Mutex};

use ap_push_agent::agent::FAILURE_TITLE;
use ap_push_agent::base64url;
use ap_push_agent::config::DEFAULT_SERVER_PUBLIC_KEY;
use ap_push_agent::error::NotificationError;
use ap_push_agent::host::HostStats;
use ap_push_agent::native::{run_host, RecordedPushManager};
use ap_push_agent::platform::NotificationOptions;
use ap_push_agent::retry::RetryPolicy;
use ap_push_agent::subscription::SubscriptionKeys;
use ap_push_agent::{
    AgentConfig, AgentHost, BackgroundAgent, HttpTransmitter, NotificationHost, PushSubscription,
};
use async_trait::async_trait;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Collects notifications instead of showing them.
#[derive(Default)]
struct CollectingNotifier {
    shown: Mutex<Vec<(String, String)>>,
}

impl CollectingNotifier {
    fn shown(&self) -> Vec<(String, String)> {
        self.shown.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationHost for CollectingNotifier {
    async fn show_notification(
        &self,
        title: &str,
        options: &NotificationOptions,
    ) -> Result<(), NotificationError> {
        self.shown
            .lock()
            .unwrap()
            .push((title.to_string(), options.body.clone()));
        Ok(())
    }
}

fn recorded_subscription() -> PushSubscription {
    PushSubscription {
        endpoint: "https://updates.push.services.mozilla.com/wpush/v2/device-42".to_string(),
        expiration_time: None,
        keys: SubscriptionKeys {
            p256dh: DEFAULT_SERVER_PUBLIC_KEY.to_string(),
            auth: base64url::encode(&[7u8; 16]),
        },
    }
}

fn config_for(server: &MockServer, max_attempts: u32) -> AgentConfig {
    AgentConfig {
        save_endpoint: format!("{}/save-subscription", server.uri()),
        transmit_timeout_secs: 5,
        retry: RetryPolicy {
            max_attempts,
            initial_backoff_ms: 10,
            max_backoff_ms: 20,
            jitter_ms: 0,
        },
        ..AgentConfig::default()
    }
}

async fn run_agent(config: &AgentConfig, notifier: &Arc<CollectingNotifier>, input: &[u8]) -> HostStats {
    let agent = Arc::new(
        BackgroundAgent::new(
            config,
            Arc::new(RecordedPushManager::new(recorded_subscription())),
            Arc::new(HttpTransmitter::from_config(config).unwrap()),
            Arc::clone(notifier) as Arc<dyn NotificationHost>,
        )
        .unwrap(),
    );

    let (host, events) = AgentHost::new(agent, 4);
    let (stats, read) = run_host(host, events, input).await;
    read.unwrap();
    stats
}

#[tokio::test]
async fn test_activation_saves_subscription_and_push_notifies() {
    let server = MockServer::start().await;
    let expected_body = serde_json::to_value(recorded_subscription()).unwrap();

    Mock::given(method("POST"))
        .and(path("/save-subscription"))
        .and(body_json(&expected_body))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"success": true}})))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = Arc::new(CollectingNotifier::default());
    let input = b"{\"type\":\"activate\"}\n{\"type\":\"push\",\"data\":\"AP 3 offline\"}\n";

    let stats = run_agent(&config_for(&server, 1), &notifier, input).await;

    assert_eq!(stats, HostStats { activations: 1, pushes: 1 });
    assert_eq!(
        notifier.shown(),
        vec![("Got it".to_string(), "AP 3 offline".to_string())]
    );
}

#[tokio::test]
async fn test_repeated_activation_saves_each_time() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/save-subscription"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(2)
        .mount(&server)
        .await;

    let notifier = Arc::new(CollectingNotifier::default());
    let input = b"{\"type\":\"activate\"}\n{\"type\":\"activate\"}\n";

    let stats = run_agent(&config_for(&server, 1), &notifier, input).await;

    assert_eq!(stats.activations, 2);
    assert!(notifier.shown().is_empty());
}

#[tokio::test]
async fn test_backend_outage_is_retried_then_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/save-subscription"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let notifier = Arc::new(CollectingNotifier::default());
    let stats = run_agent(&config_for(&server, 3), &notifier, b"{\"type\":\"activate\"}\n").await;

    assert_eq!(stats.activations, 1);
    let shown = notifier.shown();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].0, FAILURE_TITLE);
}

#[tokio::test]
async fn test_push_without_data_shows_nothing() {
    let server = MockServer::start().await;
    let notifier = Arc::new(CollectingNotifier::default());

    let stats = run_agent(&config_for(&server, 1), &notifier, b"{\"type\":\"push\"}\n").await;

    assert_eq!(stats.pushes, 1);
    assert!(notifier.shown().is_empty());
}

#[tokio::test]
async fn test_undecodable_line_does_not_stop_the_agent() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/save-subscription"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = Arc::new(CollectingNotifier::default());
    let input = b"{\"type\":\"activate\"}\n\xff\xfe\n{\"type\":\"push\",\"data\":\"AP 9 back online\"}\n";

    let stats = run_agent(&config_for(&server, 1), &notifier, input).await;

    assert_eq!(stats, HostStats { activations: 1, pushes: 1 });
    assert_eq!(
        notifier.shown(),
        vec![("Got it".to_string(), "AP 9 back online".to_string())]
    );
}
