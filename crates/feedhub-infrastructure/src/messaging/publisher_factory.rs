use std::sync::Arc;

use super::{HttpPubSubPublisher, InMemoryTopicBus, TopicPublisher};
use crate::config::{MessagingConfig, TimeoutConfig, TransportKind};
use feedhub_domain::shared::DomainError;

/// The configured transport. The in-memory bus is kept concrete so the
/// composition root can subscribe local handlers to it.
pub enum MessagingTransport {
    Memory(Arc<InMemoryTopicBus>),
    PubSub(Arc<HttpPubSubPublisher>),
}

impl MessagingTransport {
    pub fn publisher(&self) -> Arc<dyn TopicPublisher> {
        match self {
            MessagingTransport::Memory(bus) => bus.clone(),
            MessagingTransport::PubSub(publisher) => publisher.clone(),
        }
    }

    pub fn local_bus(&self) -> Option<Arc<InMemoryTopicBus>> {
        match self {
            MessagingTransport::Memory(bus) => Some(bus.clone()),
            MessagingTransport::PubSub(_) => None,
        }
    }
}

/// Create the topic publisher described by the messaging configuration
pub fn create_publisher(
    config: &MessagingConfig,
    timeouts: &TimeoutConfig,
) -> Result<MessagingTransport, DomainError> {
    match config.transport {
        TransportKind::Memory => Ok(MessagingTransport::Memory(Arc::new(InMemoryTopicBus::new(
            config.namespace.clone(),
        )))),
        TransportKind::PubSub => {
            let pubsub = config.pubsub.as_ref().ok_or_else(|| {
                DomainError::Precondition("pubsub transport selected without pubsub settings".to_string())
            })?;
            Ok(MessagingTransport::PubSub(Arc::new(HttpPubSubPublisher::new(
                pubsub.endpoint.clone(),
                pubsub.project_id.clone(),
                pubsub.access_token.clone(),
                timeouts.http_request,
            )?)))
        }
    }
}
