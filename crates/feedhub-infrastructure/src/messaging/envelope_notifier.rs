use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::publisher::TopicPublisher;
use feedhub_domain::element::Element;
use feedhub_domain::feed::FeedScope;
use feedhub_domain::notification::{NotificationEnvelope, NotificationService, TopicId, TopicNamespace};
use feedhub_domain::shared::{Attributes, DomainError};

/// `NotificationService` that ships `NotificationEnvelope`s over a
/// `TopicPublisher`, addressing namespaced topics.
pub struct EnvelopeNotificationService {
    publisher: Arc<dyn TopicPublisher>,
    namespace: TopicNamespace,
}

impl EnvelopeNotificationService {
    pub fn new(publisher: Arc<dyn TopicPublisher>, namespace: TopicNamespace) -> Self {
        Self { publisher, namespace }
    }

    pub fn namespace(&self) -> &TopicNamespace {
        &self.namespace
    }

    fn build_attributes(topic: TopicId, scope: &FeedScope, element: &dyn Element) -> HashMap<String, String> {
        HashMap::from([
            ("uid".to_string(), scope.uid().to_string()),
            ("flavour".to_string(), scope.flavour().to_string()),
            ("kind".to_string(), element.kind().to_string()),
            ("topic".to_string(), topic.as_str().to_string()),
        ])
    }
}

#[async_trait]
impl NotificationService for EnvelopeNotificationService {
    async fn notify(
        &self,
        topic: TopicId,
        scope: &FeedScope,
        element: &dyn Element,
        metadata: Attributes,
    ) -> Result<(), DomainError> {
        let envelope = NotificationEnvelope::wrap(scope, element, metadata)?;
        let data = envelope.to_bytes()?;
        let qualified = self.namespace.qualify(topic);
        let attributes = Self::build_attributes(topic, scope, element);

        let message_id = self.publisher.publish(&qualified, data, attributes).await?;

        debug!(
            topic = %qualified,
            scope = %scope,
            message_id = %message_id,
            "Envelope published"
        );
        Ok(())
    }

    fn topic_ids(&self) -> Vec<String> {
        self.namespace.qualified_topics()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::InMemoryTopicBus;
    use chrono::{Duration, Utc};
    use feedhub_domain::feed::{Flavour, Item, Link};
    use feedhub_domain::shared::ElementId;

    fn item() -> Item {
        let mut item = Item::new(
            "author",
            "text",
            Link::png_image("https://example.com/icon.png"),
            Utc::now() + Duration::days(1),
        );
        item.id = ElementId::from_string("item-1");
        item.sequence_number = 1;
        item
    }

    fn scope() -> FeedScope {
        FeedScope::new("user-1", Flavour::Pro).unwrap()
    }

    #[tokio::test]
    async fn test_notify_publishes_to_qualified_topic() {
        let namespace = TopicNamespace::new("testing");
        let bus = Arc::new(InMemoryTopicBus::new(namespace.clone()));
        let service = EnvelopeNotificationService::new(bus.clone(), namespace);

        service
            .notify(TopicId::ItemPublish, &scope(), &item(), Attributes::new())
            .await
            .unwrap();

        let published = bus.published().await;
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].topic, "engagement-items-publish-testing-v1");
        assert_eq!(published[0].attributes["kind"], "item");
        assert_eq!(published[0].attributes["flavour"], "PRO");

        let envelope = NotificationEnvelope::from_bytes(&published[0].data).unwrap();
        assert_eq!(envelope.uid, "user-1");
        let decoded: Item = envelope.decode_payload().unwrap();
        assert_eq!(decoded.id.as_str(), "item-1");
    }

    #[tokio::test]
    async fn test_invalid_element_is_never_published() {
        let namespace = TopicNamespace::new("testing");
        let bus = Arc::new(InMemoryTopicBus::new(namespace.clone()));
        let service = EnvelopeNotificationService::new(bus.clone(), namespace);

        let mut invalid = item();
        invalid.text.clear();

        let result = service
            .notify(TopicId::ItemPublish, &scope(), &invalid, Attributes::new())
            .await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert!(bus.published().await.is_empty());
    }

    #[test]
    fn test_topic_ids_cover_catalogue() {
        let namespace = TopicNamespace::new("prod");
        let bus = Arc::new(InMemoryTopicBus::new(namespace.clone()));
        let service = EnvelopeNotificationService::new(bus, namespace);

        let ids = service.topic_ids();
        assert_eq!(ids.len(), TopicId::ALL.len());
        assert!(ids.contains(&"engagement-feed-get-prod-v1".to_string()));
    }
}
