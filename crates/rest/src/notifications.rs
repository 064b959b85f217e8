//! Fire-and-forget change notifications.
//!
//! Writes hand notifications to a [`Notifier`], which pushes them onto a
//! bounded queue and returns immediately. A background worker drains the
//! queue into a [`Publisher`]. The request path never waits on the
//! publisher:
//!
//! - a full queue drops the notification with a warning
//! - a failed publish is logged and not retried
//!
//! # Example
//!
//! ```ignore
//! use sensorthings_rest::notifications::{BroadcastPublisher, Notifier};
//!
//! let publisher = BroadcastPublisher::new(16);
//! let mut subscription = publisher.subscribe();
//! let notifier = Notifier::spawn(publisher, 64);
//!
//! notifier.notify("Observations", serde_json::json!({"result": 1}));
//! let notification = subscription.recv().await?;
//! assert_eq!(notification.topic, "Observations");
//! ```

use async_trait::async_trait;
use sensorthings_persistence::types::{EntityId, Observation};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::config::PublisherKind;

/// Topic for every new Observation.
pub const OBSERVATIONS_TOPIC: &str = "Observations";

/// Topic for new Observations of one Datastream.
pub fn datastream_observations_topic(datastream_id: EntityId) -> String {
    format!("Datastreams({})/Observations", datastream_id)
}

/// A message bound for subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Topic, e.g. `Datastreams(7)/Observations`.
    pub topic: String,
    /// The serialized entity.
    pub payload: Value,
}

/// Errors reported by a publisher.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The transport could not deliver the message.
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Delivers notifications to subscribers.
#[async_trait]
pub trait Publisher: Send + Sync + 'static {
    /// Returns a short name for log output.
    fn name(&self) -> &'static str;

    /// Publishes one payload on a topic.
    async fn publish(&self, topic: &str, payload: &Value) -> Result<(), PublishError>;
}

/// Publishes by emitting a tracing event.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPublisher;

#[async_trait]
impl Publisher for LogPublisher {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn publish(&self, topic: &str, payload: &Value) -> Result<(), PublishError> {
        info!(topic = %topic, payload = %payload, "Notification published");
        Ok(())
    }
}

/// In-process fan-out over a `tokio::sync::broadcast` channel.
#[derive(Debug, Clone)]
pub struct BroadcastPublisher {
    sender: broadcast::Sender<Notification>,
}

impl BroadcastPublisher {
    /// Creates a publisher whose subscribers buffer up to `capacity` messages.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to every subsequent notification.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl Publisher for BroadcastPublisher {
    fn name(&self) -> &'static str {
        "broadcast"
    }

    async fn publish(&self, topic: &str, payload: &Value) -> Result<(), PublishError> {
        let notification = Notification {
            topic: topic.to_string(),
            payload: payload.clone(),
        };
        // No subscribers is not a delivery failure.
        if self.sender.send(notification).is_err() {
            debug!(topic = %topic, "No subscribers for notification");
        }
        Ok(())
    }
}

/// Handle used by the write path to queue notifications.
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: Option<mpsc::Sender<Notification>>,
}

impl Notifier {
    /// Starts a background worker that drains a queue of `capacity` into `publisher`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<P: Publisher>(publisher: P, capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        tokio::spawn(Self::worker(publisher, receiver));
        Self {
            sender: Some(sender),
        }
    }

    /// Builds the notifier selected by configuration.
    pub fn from_kind(kind: PublisherKind, capacity: usize) -> Self {
        match kind {
            PublisherKind::Log => Self::spawn(LogPublisher, capacity),
            PublisherKind::None => Self::disabled(),
        }
    }

    /// A notifier that discards everything.
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    /// Returns true if notifications are delivered anywhere.
    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    /// Queues a notification without waiting. Returns false if it was dropped.
    pub fn notify(&self, topic: impl Into<String>, payload: Value) -> bool {
        let Some(sender) = &self.sender else {
            return false;
        };

        let notification = Notification {
            topic: topic.into(),
            payload,
        };
        match sender.try_send(notification) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(dropped)) => {
                warn!(topic = %dropped.topic, "Notification queue full, dropping notification");
                false
            }
            Err(mpsc::error::TrySendError::Closed(dropped)) => {
                warn!(topic = %dropped.topic, "Notification worker stopped, dropping notification");
                false
            }
        }
    }

    /// Queues the two notifications for a newly persisted Observation.
    pub fn observation_created(&self, datastream_id: EntityId, observation: &Observation) {
        if !self.is_enabled() {
            return;
        }

        let payload = match serde_json::to_value(observation) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Failed to serialize Observation for notification");
                return;
            }
        };

        self.notify(datastream_observations_topic(datastream_id), payload.clone());
        self.notify(OBSERVATIONS_TOPIC, payload);
    }

    async fn worker<P: Publisher>(publisher: P, mut receiver: mpsc::Receiver<Notification>) {
        debug!(publisher = publisher.name(), "Notification worker started");

        while let Some(notification) = receiver.recv().await {
            if let Err(e) = publisher
                .publish(&notification.topic, &notification.payload)
                .await
            {
                warn!(
                    publisher = publisher.name(),
                    topic = %notification.topic,
                    error = %e,
                    "Failed to publish notification"
                );
            }
        }

        debug!(publisher = publisher.name(), "Notification worker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingPublisher {
        attempts: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Publisher for FailingPublisher {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn publish(&self, _topic: &str, _payload: &Value) -> Result<(), PublishError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(PublishError::Transport("broker unreachable".to_string()))
        }
    }

    #[test]
    fn test_topics() {
        assert_eq!(
            datastream_observations_topic(EntityId::new(7)),
            "Datastreams(7)/Observations"
        );
        assert_eq!(OBSERVATIONS_TOPIC, "Observations");
    }

    #[test]
    fn test_disabled_notifier_drops() {
        let notifier = Notifier::disabled();
        assert!(!notifier.is_enabled());
        assert!(!notifier.notify("Observations", json!({})));
    }

    #[tokio::test]
    async fn test_broadcast_delivery() {
        let publisher = BroadcastPublisher::new(8);
        let mut subscription = publisher.subscribe();
        let notifier = Notifier::spawn(publisher, 8);

        assert!(notifier.notify("Observations", json!({"result": 1})));

        let received = subscription.recv().await.unwrap();
        assert_eq!(received.topic, "Observations");
        assert_eq!(received.payload["result"], 1);
    }

    #[tokio::test]
    async fn test_failed_publish_not_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let notifier = Notifier::spawn(
            FailingPublisher {
                attempts: Arc::clone(&attempts),
            },
            8,
        );

        assert!(notifier.notify("Observations", json!({})));

        for _ in 0..50 {
            if attempts.load(Ordering::SeqCst) > 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        tokio::task::yield_now().await;
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        // Hold the only slot by never letting the worker run.
        let (sender, _receiver) = mpsc::channel(1);
        let notifier = Notifier {
            sender: Some(sender),
        };

        assert!(notifier.notify("Observations", json!(1)));
        assert!(!notifier.notify("Observations", json!(2)));
    }
}
