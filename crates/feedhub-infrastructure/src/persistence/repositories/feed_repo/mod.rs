mod inbox;
mod mutations;
mod queries;
mod types;

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::sync::Arc;

use feedhub_domain::feed::{
    Action, Event, FeedConfig, FeedRepository, FeedScope, FeedSnapshot, Item, ItemQuery, Message,
    Nudge, NudgeQuery,
};
use feedhub_domain::shared::{DomainError, ElementId};

/// SQLite document store for feeds.
///
/// Each sub-collection is a table keyed by `(uid, flavour, id)` that keeps
/// the latest version of every element as JSON.
pub struct SqliteFeedRepository {
    pool: Arc<SqlitePool>,
    default_label: String,
}

impl SqliteFeedRepository {
    pub fn new(pool: Arc<SqlitePool>, config: &FeedConfig) -> Self {
        Self {
            pool,
            default_label: config.default_label.clone(),
        }
    }
}

#[async_trait]
impl FeedRepository for SqliteFeedRepository {
    async fn get_feed(&self, scope: &FeedScope, query: &ItemQuery) -> Result<FeedSnapshot, DomainError> {
        self.get_feed_impl(scope, query).await
    }

    async fn get_items(&self, scope: &FeedScope, query: &ItemQuery) -> Result<Vec<Item>, DomainError> {
        self.get_items_impl(scope, query).await
    }

    async fn get_nudges(&self, scope: &FeedScope, query: &NudgeQuery) -> Result<Vec<Nudge>, DomainError> {
        self.get_nudges_impl(scope, query).await
    }

    async fn get_actions(&self, scope: &FeedScope) -> Result<Vec<Action>, DomainError> {
        self.get_actions_impl(scope).await
    }

    async fn get_feed_item(&self, scope: &FeedScope, item_id: &ElementId) -> Result<Option<Item>, DomainError> {
        self.get_feed_item_impl(scope, item_id).await
    }

    async fn save_feed_item(&self, scope: &FeedScope, item: &Item) -> Result<Item, DomainError> {
        self.save_feed_item_impl(scope, item, true).await
    }

    async fn update_feed_item(&self, scope: &FeedScope, item: &Item) -> Result<Item, DomainError> {
        self.save_feed_item_impl(scope, item, false).await
    }

    async fn delete_feed_item(&self, scope: &FeedScope, item_id: &ElementId) -> Result<(), DomainError> {
        self.delete_feed_item_impl(scope, item_id).await
    }

    async fn get_nudge(&self, scope: &FeedScope, nudge_id: &ElementId) -> Result<Option<Nudge>, DomainError> {
        self.get_nudge_impl(scope, nudge_id).await
    }

    async fn save_nudge(&self, scope: &FeedScope, nudge: &Nudge) -> Result<Nudge, DomainError> {
        self.save_nudge_impl(scope, nudge, true).await
    }

    async fn update_nudge(&self, scope: &FeedScope, nudge: &Nudge) -> Result<Nudge, DomainError> {
        self.save_nudge_impl(scope, nudge, false).await
    }

    async fn delete_nudge(&self, scope: &FeedScope, nudge_id: &ElementId) -> Result<(), DomainError> {
        self.delete_element_impl("feed_nudges", scope, nudge_id).await
    }

    async fn get_default_nudge_by_title(&self, scope: &FeedScope, title: &str) -> Result<Option<Nudge>, DomainError> {
        self.get_nudge_by_title_impl(scope, title).await
    }

    async fn get_action(&self, scope: &FeedScope, action_id: &ElementId) -> Result<Option<Action>, DomainError> {
        self.get_action_impl(scope, action_id).await
    }

    async fn save_action(&self, scope: &FeedScope, action: &Action) -> Result<Action, DomainError> {
        self.save_action_impl(scope, action).await
    }

    async fn delete_action(&self, scope: &FeedScope, action_id: &ElementId) -> Result<(), DomainError> {
        self.delete_element_impl("feed_actions", scope, action_id).await
    }

    async fn post_message(&self, scope: &FeedScope, item_id: &ElementId, message: &Message) -> Result<Message, DomainError> {
        self.post_message_impl(scope, item_id, message).await
    }

    async fn get_message(&self, scope: &FeedScope, item_id: &ElementId, message_id: &ElementId) -> Result<Option<Message>, DomainError> {
        self.get_message_impl(scope, item_id, message_id).await
    }

    async fn delete_message(&self, scope: &FeedScope, item_id: &ElementId, message_id: &ElementId) -> Result<(), DomainError> {
        self.delete_message_impl(scope, item_id, message_id).await
    }

    async fn get_messages(&self, scope: &FeedScope, item_id: &ElementId) -> Result<Vec<Message>, DomainError> {
        self.get_messages_impl(scope, item_id).await
    }

    async fn save_incoming_event(&self, event: &Event) -> Result<(), DomainError> {
        self.save_event_impl("incoming_events", event).await
    }

    async fn save_outgoing_event(&self, event: &Event) -> Result<(), DomainError> {
        self.save_event_impl("outgoing_events", event).await
    }

    async fn labels(&self, scope: &FeedScope) -> Result<Vec<String>, DomainError> {
        self.labels_impl(scope).await
    }

    async fn save_label(&self, scope: &FeedScope, label: &str) -> Result<(), DomainError> {
        self.save_label_impl(scope, label).await
    }

    async fn unread_persistent_items(&self, scope: &FeedScope) -> Result<u64, DomainError> {
        self.unread_persistent_items_impl(scope).await
    }

    async fn update_unread_persistent_items_count(&self, scope: &FeedScope) -> Result<(), DomainError> {
        self.update_unread_persistent_items_count_impl(scope).await
    }
}
