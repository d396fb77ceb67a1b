use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use super::repository::MockFeedRepository;
use super::{
    Action, ActionType, Feed, FeedConfig, FeedScope, Flavour, Handling, Item, Link, Nudge,
};
use crate::element::Element;
use crate::notification::{NotificationEnvelope, NotificationService, TopicId, TopicNamespace};
use crate::shared::{Attributes, DomainError};

/// Notifier that keeps every envelope it is asked to send.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(TopicId, NotificationEnvelope)>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn topics(&self) -> Vec<TopicId> {
        self.sent.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }

    pub fn last(&self) -> Option<(TopicId, NotificationEnvelope)> {
        self.sent.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl NotificationService for RecordingNotifier {
    async fn notify(
        &self,
        topic: TopicId,
        scope: &FeedScope,
        element: &dyn Element,
        metadata: Attributes,
    ) -> Result<(), DomainError> {
        if self.fail {
            return Err(DomainError::Notification("broker unavailable".to_string()));
        }
        let envelope = NotificationEnvelope::wrap(scope, element, metadata)?;
        self.sent.lock().unwrap().push((topic, envelope));
        Ok(())
    }

    fn topic_ids(&self) -> Vec<String> {
        TopicNamespace::new("test").qualified_topics()
    }
}

pub fn consumer_scope() -> FeedScope {
    FeedScope::new("user-1", Flavour::Consumer).unwrap()
}

pub fn thin_feed(repository: MockFeedRepository, notifier: Arc<RecordingNotifier>) -> Feed {
    Feed::new(
        consumer_scope(),
        Arc::new(repository),
        notifier,
        Arc::new(FeedConfig::default()),
    )
}

pub fn sample_item() -> Item {
    Item::new(
        "Care Team",
        "Your lab results are ready",
        Link::png_image("https://assets.example.com/lab.png"),
        Utc::now() + Duration::days(14),
    )
    .with_action(Action::new("View", ActionType::Primary, Handling::FullPage))
}

pub fn sample_nudge() -> Nudge {
    Nudge::new(
        "Verify your phone",
        "We need a verified number to send reminders",
        Utc::now() + Duration::days(3),
    )
}
