pub mod envelope;
pub mod handler;
pub mod service;
pub mod topic;

pub use envelope::NotificationEnvelope;
pub use handler::EnvelopeHandler;
pub use service::NotificationService;
pub use topic::{TopicId, TopicNamespace};
