use std::collections::HashMap;

use async_trait::async_trait;
use tracing::debug;

use crate::messaging::TopicPublisher;
use feedhub_domain::shared::DomainError;

#[async_trait]
impl TopicPublisher for super::HttpPubSubPublisher {
    async fn publish(
        &self,
        topic: &str,
        data: Vec<u8>,
        attributes: HashMap<String, String>,
    ) -> Result<String, DomainError> {
        let url = self.build_publish_url(topic);
        let payload = Self::build_request_body(&data, &attributes);

        let mut request = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&payload);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            DomainError::Infrastructure(format!("Failed to publish to {}: {}", topic, e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::Infrastructure(format!(
                "Publish to {} failed with status {}: {}",
                topic, status, body
            )));
        }

        let body: serde_json::Value = response.json().await.map_err(|e| {
            DomainError::Infrastructure(format!("Failed to parse publish response: {}", e))
        })?;

        let message_id = Self::parse_message_id(&body)?;
        debug!(topic, message_id = %message_id, "Pub/Sub accepted message");
        Ok(message_id)
    }
}
