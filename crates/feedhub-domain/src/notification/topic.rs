use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::shared::DomainError;

pub const DEFAULT_SERVICE_NAME: &str = "engagement";
pub const DEFAULT_TOPIC_VERSION: &str = "v1";

/// Every topic a feed mutation (or retrieval) can be announced on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TopicId {
    FeedRetrieval,
    ItemPublish,
    ItemDelete,
    ItemResolve,
    ItemUnresolve,
    ItemHide,
    ItemShow,
    ItemPin,
    ItemUnpin,
    NudgePublish,
    NudgeDelete,
    NudgeResolve,
    NudgeUnresolve,
    NudgeHide,
    NudgeShow,
    ActionPublish,
    ActionDelete,
    MessagePost,
    MessageDelete,
    IncomingEvent,
}

impl TopicId {
    pub const ALL: &'static [TopicId] = &[
        TopicId::FeedRetrieval,
        TopicId::ItemPublish,
        TopicId::ItemDelete,
        TopicId::ItemResolve,
        TopicId::ItemUnresolve,
        TopicId::ItemHide,
        TopicId::ItemShow,
        TopicId::ItemPin,
        TopicId::ItemUnpin,
        TopicId::NudgePublish,
        TopicId::NudgeDelete,
        TopicId::NudgeResolve,
        TopicId::NudgeUnresolve,
        TopicId::NudgeHide,
        TopicId::NudgeShow,
        TopicId::ActionPublish,
        TopicId::ActionDelete,
        TopicId::MessagePost,
        TopicId::MessageDelete,
        TopicId::IncomingEvent,
    ];

    /// Topics that change an item.
    pub const ITEM_CHANGES: &'static [TopicId] = &[
        TopicId::ItemPublish,
        TopicId::ItemDelete,
        TopicId::ItemResolve,
        TopicId::ItemUnresolve,
        TopicId::ItemHide,
        TopicId::ItemShow,
        TopicId::ItemPin,
        TopicId::ItemUnpin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TopicId::FeedRetrieval => "feed.get",
            TopicId::ItemPublish => "items.publish",
            TopicId::ItemDelete => "items.delete",
            TopicId::ItemResolve => "items.resolve",
            TopicId::ItemUnresolve => "items.unresolve",
            TopicId::ItemHide => "items.hide",
            TopicId::ItemShow => "items.show",
            TopicId::ItemPin => "items.pin",
            TopicId::ItemUnpin => "items.unpin",
            TopicId::NudgePublish => "nudges.publish",
            TopicId::NudgeDelete => "nudges.delete",
            TopicId::NudgeResolve => "nudges.resolve",
            TopicId::NudgeUnresolve => "nudges.unresolve",
            TopicId::NudgeHide => "nudges.hide",
            TopicId::NudgeShow => "nudges.show",
            TopicId::ActionPublish => "actions.publish",
            TopicId::ActionDelete => "actions.delete",
            TopicId::MessagePost => "message.post",
            TopicId::MessageDelete => "message.delete",
            TopicId::IncomingEvent => "incoming.event",
        }
    }
}

impl FromStr for TopicId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TopicId::ALL
            .iter()
            .copied()
            .find(|topic| topic.as_str() == s)
            .ok_or_else(|| DomainError::InvalidInput(format!("unknown topic: {s}")))
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Qualifies logical topic ids so environments sharing one broker project
/// never cross-deliver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicNamespace {
    pub service: String,
    pub environment: String,
    pub version: String,
}

impl TopicNamespace {
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            service: DEFAULT_SERVICE_NAME.to_string(),
            environment: environment.into(),
            version: DEFAULT_TOPIC_VERSION.to_string(),
        }
    }

    /// `<service>-<topic>-<environment>-<version>`, dots in the topic
    /// replaced by dashes (broker topic names are restricted).
    pub fn qualify(&self, topic: TopicId) -> String {
        format!(
            "{}-{}-{}-{}",
            self.service,
            topic.as_str().replace('.', "-"),
            self.environment,
            self.version
        )
    }

    /// Reverse of `qualify` for names produced by this namespace.
    pub fn resolve(&self, qualified: &str) -> Option<TopicId> {
        TopicId::ALL
            .iter()
            .copied()
            .find(|topic| self.qualify(*topic) == qualified)
    }

    pub fn qualified_topics(&self) -> Vec<String> {
        TopicId::ALL.iter().map(|t| self.qualify(*t)).collect()
    }
}
