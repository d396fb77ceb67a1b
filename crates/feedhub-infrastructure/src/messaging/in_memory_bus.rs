use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::publisher::TopicPublisher;
use feedhub_domain::notification::{EnvelopeHandler, NotificationEnvelope, TopicId, TopicNamespace};
use feedhub_domain::shared::DomainError;

#[derive(Debug, Clone)]
pub struct PublishedMessage {
    pub id: String,
    pub topic: String,
    pub data: Vec<u8>,
    pub attributes: HashMap<String, String>,
}

/// Single-process topic bus.
///
/// Every message is recorded and handed to the subscribed handlers before
/// the publish is acknowledged. A failing handler is logged and does not
/// fail the publish.
pub struct InMemoryTopicBus {
    namespace: TopicNamespace,
    handlers: RwLock<Vec<Arc<dyn EnvelopeHandler>>>,
    published: RwLock<Vec<PublishedMessage>>,
    next_id: AtomicU64,
}

impl InMemoryTopicBus {
    pub fn new(namespace: TopicNamespace) -> Self {
        Self {
            namespace,
            handlers: RwLock::new(Vec::new()),
            published: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub async fn subscribe(&self, handler: Arc<dyn EnvelopeHandler>) {
        debug!(handler = handler.name(), topics = ?handler.topics(), "Handler subscribed");
        self.handlers.write().await.push(handler);
    }

    pub async fn published(&self) -> Vec<PublishedMessage> {
        self.published.read().await.clone()
    }

    pub async fn published_on(&self, topic: TopicId) -> Vec<PublishedMessage> {
        let qualified = self.namespace.qualify(topic);
        self.published
            .read()
            .await
            .iter()
            .filter(|m| m.topic == qualified)
            .cloned()
            .collect()
    }

    async fn dispatch(&self, topic: TopicId, data: &[u8]) {
        let envelope = match NotificationEnvelope::from_bytes(data) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(topic = %topic, error = %e, "Dropping undecodable envelope");
                return;
            }
        };

        // Snapshot so handlers may publish without holding the lock.
        let handlers: Vec<Arc<dyn EnvelopeHandler>> = self
            .handlers
            .read()
            .await
            .iter()
            .filter(|h| h.topics().contains(&topic))
            .cloned()
            .collect();

        let results = join_all(handlers.iter().map(|h| h.handle(topic, &envelope))).await;
        for (handler, result) in handlers.iter().zip(results) {
            if let Err(e) = result {
                warn!(
                    handler = handler.name(),
                    topic = %topic,
                    error = %e.format_with_code(),
                    "Envelope handler failed"
                );
            }
        }
    }
}

#[async_trait]
impl TopicPublisher for InMemoryTopicBus {
    async fn publish(
        &self,
        topic: &str,
        data: Vec<u8>,
        attributes: HashMap<String, String>,
    ) -> Result<String, DomainError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();

        self.published.write().await.push(PublishedMessage {
            id: id.clone(),
            topic: topic.to_string(),
            data: data.clone(),
            attributes,
        });

        match self.namespace.resolve(topic) {
            Some(topic_id) => self.dispatch(topic_id, &data).await,
            None => debug!(topic, "No local route for topic"),
        }

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedhub_domain::feed::{FeedScope, Flavour};
    use std::sync::atomic::AtomicUsize;

    struct CountingHandler {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl EnvelopeHandler for CountingHandler {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn topics(&self) -> Vec<TopicId> {
            vec![TopicId::ItemPublish]
        }

        async fn handle(&self, _topic: TopicId, envelope: &NotificationEnvelope) -> Result<(), DomainError> {
            assert_eq!(envelope.uid, "user-1");
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DomainError::Infrastructure("boom".to_string()));
            }
            Ok(())
        }
    }

    fn envelope_bytes() -> Vec<u8> {
        let scope = FeedScope::new("user-1", Flavour::Consumer).unwrap();
        NotificationEnvelope {
            uid: scope.uid().to_string(),
            flavour: scope.flavour(),
            payload: b"{}".to_vec(),
            metadata: Default::default(),
        }
        .to_bytes()
        .unwrap()
    }

    #[tokio::test]
    async fn test_publish_dispatches_to_subscribed_topics_only() {
        let namespace = TopicNamespace::new("test");
        let bus = InMemoryTopicBus::new(namespace.clone());
        let handler = Arc::new(CountingHandler { calls: AtomicUsize::new(0), fail: false });
        bus.subscribe(handler.clone()).await;

        bus.publish(&namespace.qualify(TopicId::ItemPublish), envelope_bytes(), HashMap::new())
            .await
            .unwrap();
        bus.publish(&namespace.qualify(TopicId::ItemDelete), envelope_bytes(), HashMap::new())
            .await
            .unwrap();

        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
        assert_eq!(bus.published().await.len(), 2);
        assert_eq!(bus.published_on(TopicId::ItemDelete).await.len(), 1);
    }

    #[tokio::test]
    async fn test_handler_failure_does_not_fail_publish() {
        let namespace = TopicNamespace::new("test");
        let bus = InMemoryTopicBus::new(namespace.clone());
        let handler = Arc::new(CountingHandler { calls: AtomicUsize::new(0), fail: true });
        bus.subscribe(handler.clone()).await;

        let id = bus
            .publish(&namespace.qualify(TopicId::ItemPublish), envelope_bytes(), HashMap::new())
            .await
            .unwrap();

        assert_eq!(id, "1");
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_foreign_topic_is_recorded_but_not_routed() {
        let bus = InMemoryTopicBus::new(TopicNamespace::new("test"));
        let handler = Arc::new(CountingHandler { calls: AtomicUsize::new(0), fail: false });
        bus.subscribe(handler.clone()).await;

        bus.publish("engagement-items-publish-prod-v1", envelope_bytes(), HashMap::new())
            .await
            .unwrap();

        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
        assert_eq!(bus.published().await.len(), 1);
    }
}
