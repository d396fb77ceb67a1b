mod envelope_notifier;
mod in_memory_bus;
mod publisher;
mod publisher_factory;
mod pubsub;

pub use envelope_notifier::EnvelopeNotificationService;
pub use in_memory_bus::{InMemoryTopicBus, PublishedMessage};
pub use publisher::TopicPublisher;
pub use publisher_factory::{create_publisher, MessagingTransport};
pub use pubsub::HttpPubSubPublisher;
