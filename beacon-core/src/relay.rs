use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::broadcast;

/// Relay channel names shared between producers and the pipeline.
pub mod channels {
    /// Incident reports, consumed by the broadcast server.
    pub const URGENT_EVENT: &str = "urgent-event";
    /// Resource requests, consumed by the broadcast server.
    pub const NORMAL_EVENT: &str = "normal-event";
    /// Status changes, consumed by the broadcast server.
    pub const STATUS_EVENT: &str = "status-event";
    /// Worker-produced notifications, consumed by the targeted router.
    pub const TARGETED_NOTIFICATION: &str = "targeted-notification";
}

/// A single message carried through the relay.
#[derive(Debug, Clone)]
pub struct RelayMessage {
    pub channel: Arc<str>,
    pub payload: Value,
}

/// Named-channel publish/subscribe decoupling producers from consumers.
///
/// Delivery is fire-and-forget and at-most-once: publishing never blocks on
/// subscriber processing, there is no replay for late subscribers, and a
/// subscriber that lags or drops its receiver never affects siblings or the
/// publisher. Each channel is an independent broadcast ring.
#[derive(Debug)]
pub struct Relay {
    channels: DashMap<String, broadcast::Sender<RelayMessage>>,
    capacity: usize,
}

impl Relay {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            capacity,
        }
    }

    fn sender(&self, channel: &str) -> broadcast::Sender<RelayMessage> {
        if let Some(sender) = self.channels.get(channel) {
            return sender.clone();
        }
        self.channels
            .entry(channel.to_owned())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    /// Publish `payload` to every current subscriber of `channel`.
    ///
    /// Messages published while no subscriber is attached are dropped.
    pub fn publish(&self, channel: &str, payload: Value) {
        let sender = self.sender(channel);
        let receivers = sender.receiver_count();
        let message = RelayMessage {
            channel: Arc::from(channel),
            payload,
        };
        // send only errors when there are no receivers; fire-and-forget.
        let _ = sender.send(message);
        tracing::debug!(channel, receivers, "relay publish");
    }

    /// Subscribe to `channel`, receiving every message published afterwards.
    pub fn subscribe(&self, channel: &str) -> broadcast::Receiver<RelayMessage> {
        self.sender(channel).subscribe()
    }

    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.channels
            .get(channel)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }
}

impl Default for Relay {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn every_subscriber_receives_every_message() {
        let relay = Relay::default();
        let mut first = relay.subscribe(channels::URGENT_EVENT);
        let mut second = relay.subscribe(channels::URGENT_EVENT);

        relay.publish(channels::URGENT_EVENT, json!({"id": 1}));
        relay.publish(channels::URGENT_EVENT, json!({"id": 2}));

        for receiver in [&mut first, &mut second] {
            assert_eq!(receiver.recv().await.unwrap().payload["id"], 1);
            assert_eq!(receiver.recv().await.unwrap().payload["id"], 2);
        }
    }

    #[tokio::test]
    async fn channels_are_isolated() {
        let relay = Relay::default();
        let mut urgent = relay.subscribe(channels::URGENT_EVENT);
        let mut normal = relay.subscribe(channels::NORMAL_EVENT);

        relay.publish(channels::NORMAL_EVENT, json!({"kind": "request"}));

        assert_eq!(normal.recv().await.unwrap().payload["kind"], "request");
        assert!(matches!(
            urgent.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_dropped_silently() {
        let relay = Relay::default();
        relay.publish(channels::STATUS_EVENT, json!({"lost": true}));

        // A late subscriber sees nothing that was published before it joined.
        let mut late = relay.subscribe(channels::STATUS_EVENT);
        assert!(matches!(
            late.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn dropped_subscriber_does_not_affect_siblings() {
        let relay = Relay::default();
        let dropped = relay.subscribe(channels::URGENT_EVENT);
        let mut kept = relay.subscribe(channels::URGENT_EVENT);
        drop(dropped);

        relay.publish(channels::URGENT_EVENT, json!({"id": 3}));
        assert_eq!(kept.recv().await.unwrap().payload["id"], 3);
    }
}
