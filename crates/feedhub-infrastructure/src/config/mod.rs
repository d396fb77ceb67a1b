mod timeouts;

pub use timeouts::TimeoutConfig;

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use feedhub_domain::feed::FeedConfig;
use feedhub_domain::notification::TopicNamespace;
use feedhub_domain::shared::DomainError;

const DEFAULT_ENVIRONMENT: &str = "development";
const DEFAULT_PUBSUB_ENDPOINT: &str = "https://pubsub.googleapis.com";

/// Which `TopicPublisher` backs the notification service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Memory,
    PubSub,
}

impl FromStr for TransportKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(TransportKind::Memory),
            "pubsub" => Ok(TransportKind::PubSub),
            other => Err(DomainError::InvalidInput(format!(
                "Unknown transport '{}', expected 'memory' or 'pubsub'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PubSubConfig {
    pub endpoint: String,
    pub project_id: String,
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagingConfig {
    pub transport: TransportKind,
    pub namespace: TopicNamespace,
    pub pubsub: Option<PubSubConfig>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub log_dir: PathBuf,
    pub feed: FeedConfig,
    pub messaging: MessagingConfig,
    pub timeouts: TimeoutConfig,
}

impl AppConfig {
    /// Build from `FEEDHUB_*` process environment variables.
    pub fn from_env() -> Result<Self, DomainError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, DomainError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let data_dir = default_data_dir();

        let database_path = get("FEEDHUB_DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("feedhub.db"));
        let log_dir = get("FEEDHUB_LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("logs"));

        let mut feed = FeedConfig::default();
        if let Some(limit) = get("FEEDHUB_ITEMS_LIMIT") {
            feed.items_limit = parse_number("FEEDHUB_ITEMS_LIMIT", &limit)?;
        }
        if let Some(label) = get("FEEDHUB_DEFAULT_LABEL") {
            feed.default_label = label;
        }
        if let Some(org) = get("FEEDHUB_DEFAULT_ORGANIZATION_ID") {
            feed.default_organization_id = org;
        }
        if let Some(location) = get("FEEDHUB_DEFAULT_LOCATION_ID") {
            feed.default_location_id = location;
        }

        let mut namespace =
            TopicNamespace::new(get("FEEDHUB_ENVIRONMENT").unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()));
        if let Some(service) = get("FEEDHUB_SERVICE_NAME") {
            namespace.service = service;
        }
        if let Some(version) = get("FEEDHUB_TOPIC_VERSION") {
            namespace.version = version;
        }

        let transport = match get("FEEDHUB_TRANSPORT") {
            Some(value) => value.parse()?,
            None => TransportKind::Memory,
        };
        let pubsub = match transport {
            TransportKind::Memory => None,
            TransportKind::PubSub => {
                let project_id = get("FEEDHUB_PUBSUB_PROJECT").ok_or_else(|| {
                    DomainError::InvalidInput(
                        "FEEDHUB_PUBSUB_PROJECT is required for the pubsub transport".to_string(),
                    )
                })?;
                Some(PubSubConfig {
                    endpoint: get("FEEDHUB_PUBSUB_ENDPOINT")
                        .unwrap_or_else(|| DEFAULT_PUBSUB_ENDPOINT.to_string()),
                    project_id,
                    access_token: get("FEEDHUB_PUBSUB_TOKEN"),
                })
            }
        };

        let mut timeouts = TimeoutConfig::default();
        if let Some(secs) = get("FEEDHUB_HTTP_TIMEOUT_SECS") {
            timeouts.http_request = Duration::from_secs(parse_number("FEEDHUB_HTTP_TIMEOUT_SECS", &secs)?);
        }

        Ok(Self {
            database_path,
            log_dir,
            feed,
            messaging: MessagingConfig {
                transport,
                namespace,
                pubsub,
            },
            timeouts,
        })
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("feedhub")
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T, DomainError> {
    value
        .trim()
        .parse()
        .map_err(|_| DomainError::InvalidInput(format!("{} must be a number, got '{}'", key, value)))
}
