mod publisher;

use std::collections::HashMap;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde_json::{json, Value};

use feedhub_domain::shared::DomainError;

/// Publishes to a Google Pub/Sub compatible REST endpoint.
pub struct HttpPubSubPublisher {
    endpoint: String,
    project_id: String,
    access_token: Option<String>,
    client: Client,
}

impl HttpPubSubPublisher {
    pub fn new(
        endpoint: impl Into<String>,
        project_id: impl Into<String>,
        access_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::Infrastructure(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into(),
            project_id: project_id.into(),
            access_token,
            client,
        })
    }

    fn build_publish_url(&self, topic: &str) -> String {
        format!(
            "{}/v1/projects/{}/topics/{}:publish",
            self.endpoint.trim_end_matches('/'),
            self.project_id,
            topic
        )
    }

    fn build_request_body(data: &[u8], attributes: &HashMap<String, String>) -> Value {
        json!({
            "messages": [{
                "data": STANDARD.encode(data),
                "attributes": attributes,
            }]
        })
    }

    /// The broker acknowledges with the ids of the accepted messages.
    fn parse_message_id(body: &Value) -> Result<String, DomainError> {
        body.get("messageIds")
            .and_then(|ids| ids.get(0))
            .and_then(|id| id.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                DomainError::Infrastructure(format!("Publish response carried no message id: {}", body))
            })
    }
}
