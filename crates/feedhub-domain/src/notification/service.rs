use async_trait::async_trait;

use super::topic::TopicId;
use crate::element::Element;
use crate::feed::FeedScope;
use crate::shared::{Attributes, DomainError};

/// Topic-addressed publish port.
///
/// `notify` must wrap the validated element into a `NotificationEnvelope`,
/// publish it to the namespaced topic and return only once the transport
/// has acknowledged durable acceptance.
#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn notify(
        &self,
        topic: TopicId,
        scope: &FeedScope,
        element: &dyn Element,
        metadata: Attributes,
    ) -> Result<(), DomainError>;

    /// Every fully qualified topic this service is prepared to route.
    fn topic_ids(&self) -> Vec<String>;
}
