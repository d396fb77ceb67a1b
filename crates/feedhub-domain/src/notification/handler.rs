use async_trait::async_trait;

use super::envelope::NotificationEnvelope;
use super::topic::TopicId;
use crate::shared::DomainError;

/// Downstream consumer of published envelopes (inbox counters, label
/// indexes, channel senders).
#[async_trait]
pub trait EnvelopeHandler: Send + Sync {
    fn name(&self) -> &'static str;

    /// Topics this handler subscribes to.
    fn topics(&self) -> Vec<TopicId>;

    async fn handle(&self, topic: TopicId, envelope: &NotificationEnvelope) -> Result<(), DomainError>;
}
