use std::collections::HashMap;

use async_trait::async_trait;

use feedhub_domain::shared::DomainError;

/// Transport seam under the notification service.
///
/// `publish` resolves only after the transport has accepted the message and
/// returns the transport's message id.
#[async_trait]
pub trait TopicPublisher: Send + Sync {
    async fn publish(
        &self,
        topic: &str,
        data: Vec<u8>,
        attributes: HashMap<String, String>,
    ) -> Result<String, DomainError>;
}
