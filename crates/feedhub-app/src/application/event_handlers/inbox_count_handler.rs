use async_trait::async_trait;
use tracing::debug;

use feedhub_domain::feed::Collection;
use feedhub_domain::notification::{EnvelopeHandler, NotificationEnvelope, TopicId};
use feedhub_domain::shared::DomainError;

/// Keeps the unread persistent-item counter in step with item changes.
pub struct InboxCountHandler {
    collection: Collection,
}

impl InboxCountHandler {
    pub fn new(collection: Collection) -> Self {
        Self { collection }
    }
}

#[async_trait]
impl EnvelopeHandler for InboxCountHandler {
    fn name(&self) -> &'static str {
        "inbox_count"
    }

    fn topics(&self) -> Vec<TopicId> {
        TopicId::ITEM_CHANGES.to_vec()
    }

    async fn handle(&self, topic: TopicId, envelope: &NotificationEnvelope) -> Result<(), DomainError> {
        let scope = envelope.scope()?;
        let feed = self.collection.get_thin_feed(scope.uid(), scope.flavour())?;
        feed.update_unread_persistent_items_count().await?;

        debug!("Recounted unread items for {} after {}", scope, topic);
        Ok(())
    }
}
