//! Event-driven host loop for the background agent.
//!
//! The host owns the event queue. Each event is dispatched to the agent as
//! soon as it arrives, so a slow activation never delays a push. Before the
//! host shuts down it waits for every event's extended lifetime to settle;
//! no handler is cut off mid-request.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::task::TaskTracker;

use crate::agent::{AgentEvent, BackgroundAgent};

/// Counters reported when the host stops.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HostStats {
    /// Activation events handled.
    pub activations: usize,
    /// Push events handled.
    pub pushes: usize,
}

/// Runs the agent until its event source closes.
#[derive(Debug)]
pub struct AgentHost {
    agent: Arc<BackgroundAgent>,
    events: mpsc::Receiver<AgentEvent>,
    lifetimes: TaskTracker,
}

impl AgentHost {
    /// Create a host and the sender used to deliver events to it.
    pub fn new(agent: Arc<BackgroundAgent>, capacity: usize) -> (Self, mpsc::Sender<AgentEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let host = Self {
            agent,
            events: rx,
            lifetimes: TaskTracker::new(),
        };
        (host, tx)
    }

    /// Dispatch events until every sender is dropped, then wait for all
    /// outstanding handler work.
    pub async fn run(mut self) -> HostStats {
        let mut stats = HostStats::default();

        while let Some(event) = self.events.recv().await {
            match event {
                AgentEvent::Activate => stats.activations += 1,
                AgentEvent::Push(_) => stats.pushes += 1,
            }

            let extendable = self.agent.dispatch(event);
            log::debug!(
                "[Host] Dispatched {} event ({} task(s) pending)",
                extendable.kind(),
                extendable.pending()
            );

            self.lifetimes.spawn(async move {
                extendable.settled().await;
                log::debug!("[Host] {} event settled", extendable.kind());
            });
        }

        self.lifetimes.close();
        if !self.lifetimes.is_empty() {
            log::info!(
                "[Host] Event source closed, waiting for {} pending event(s)",
                self.lifetimes.len()
            );
        }
        self.lifetimes.wait().await;

        log::info!(
            "[Host] Stopped after {} activation(s), {} push(es)",
            stats.activations,
            stats.pushes
        );
        stats
    }
}
