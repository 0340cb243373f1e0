use crate::models::PushEvent;
use tokio::sync::broadcast;

/// In-process fan-out of backend push events.
///
/// Producers (the webhook handler) call [`EventBus::publish`]; every armed
/// request holds its own receiver from [`EventBus::subscribe`] and drops it
/// when the request resolves.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PushEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PushEvent> {
        self.tx.subscribe()
    }

    /// Returns how many subscribers saw the event. Zero just means no
    /// request is waiting right now.
    pub fn publish(&self, event: PushEvent) -> usize {
        let name = event.name();
        match self.tx.send(event) {
            Ok(receivers) => {
                tracing::debug!(event = name, receivers, "Push event delivered");
                receivers
            }
            Err(_) => {
                tracing::debug!(event = name, "Push event dropped, no active subscribers");
                0
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
