use async_trait::async_trait;

use feedhub_domain::feed::{Collection, Item};
use feedhub_domain::notification::{EnvelopeHandler, NotificationEnvelope, TopicId};
use feedhub_domain::shared::DomainError;

/// Records the label of every published item so label listings stay
/// complete.
pub struct LabelIndexHandler {
    collection: Collection,
}

impl LabelIndexHandler {
    pub fn new(collection: Collection) -> Self {
        Self { collection }
    }
}

#[async_trait]
impl EnvelopeHandler for LabelIndexHandler {
    fn name(&self) -> &'static str {
        "label_index"
    }

    fn topics(&self) -> Vec<TopicId> {
        vec![TopicId::ItemPublish]
    }

    async fn handle(&self, _topic: TopicId, envelope: &NotificationEnvelope) -> Result<(), DomainError> {
        let item: Item = envelope.decode_payload()?;
        if item.label.trim().is_empty() {
            return Ok(());
        }

        let scope = envelope.scope()?;
        let feed = self.collection.get_thin_feed(scope.uid(), scope.flavour())?;
        feed.save_label(&item.label).await
    }
}
