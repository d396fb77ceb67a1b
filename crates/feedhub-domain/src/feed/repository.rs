use async_trait::async_trait;

use super::action::Action;
use super::event::Event;
use super::item::Item;
use super::message::Message;
use super::nudge::Nudge;
use super::query::{ItemQuery, NudgeQuery};
use super::snapshot::FeedSnapshot;
use super::value_objects::FeedScope;
use crate::shared::{DomainError, ElementId};

/// Persistence port for feed content.
///
/// Every operation is scoped to one (uid, flavour) pair. Single-element
/// reads return the latest version of the element, or `None` on a miss.
/// `save_*` is the new-element path: it rejects an `(id, sequence_number)`
/// pair that already exists with `DomainError::DuplicateElement`.
/// `update_*` skips that check. Both upsert by id.
///
/// Implementations are shared across many feeds and must be safe for
/// concurrent use.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedRepository: Send + Sync {
    /// Composed read. Items are ordered expiry DESC, id DESC, sequence
    /// number DESC, capped at `query.limit`, de-duplicated by id and carry
    /// their conversations. Actions and nudges are ordered id DESC,
    /// sequence number DESC.
    async fn get_feed(&self, scope: &FeedScope, query: &ItemQuery)
        -> Result<FeedSnapshot, DomainError>;

    async fn get_items(&self, scope: &FeedScope, query: &ItemQuery) -> Result<Vec<Item>, DomainError>;
    async fn get_nudges(&self, scope: &FeedScope, query: &NudgeQuery) -> Result<Vec<Nudge>, DomainError>;
    async fn get_actions(&self, scope: &FeedScope) -> Result<Vec<Action>, DomainError>;

    // Items
    async fn get_feed_item(&self, scope: &FeedScope, item_id: &ElementId) -> Result<Option<Item>, DomainError>;
    async fn save_feed_item(&self, scope: &FeedScope, item: &Item) -> Result<Item, DomainError>;
    async fn update_feed_item(&self, scope: &FeedScope, item: &Item) -> Result<Item, DomainError>;
    async fn delete_feed_item(&self, scope: &FeedScope, item_id: &ElementId) -> Result<(), DomainError>;

    // Nudges
    async fn get_nudge(&self, scope: &FeedScope, nudge_id: &ElementId) -> Result<Option<Nudge>, DomainError>;
    async fn save_nudge(&self, scope: &FeedScope, nudge: &Nudge) -> Result<Nudge, DomainError>;
    async fn update_nudge(&self, scope: &FeedScope, nudge: &Nudge) -> Result<Nudge, DomainError>;
    async fn delete_nudge(&self, scope: &FeedScope, nudge_id: &ElementId) -> Result<(), DomainError>;
    async fn get_default_nudge_by_title(&self, scope: &FeedScope, title: &str) -> Result<Option<Nudge>, DomainError>;

    // Actions
    async fn get_action(&self, scope: &FeedScope, action_id: &ElementId) -> Result<Option<Action>, DomainError>;
    async fn save_action(&self, scope: &FeedScope, action: &Action) -> Result<Action, DomainError>;
    async fn delete_action(&self, scope: &FeedScope, action_id: &ElementId) -> Result<(), DomainError>;

    // Messages, threaded under an item
    async fn post_message(&self, scope: &FeedScope, item_id: &ElementId, message: &Message) -> Result<Message, DomainError>;
    async fn get_message(&self, scope: &FeedScope, item_id: &ElementId, message_id: &ElementId) -> Result<Option<Message>, DomainError>;
    async fn delete_message(&self, scope: &FeedScope, item_id: &ElementId, message_id: &ElementId) -> Result<(), DomainError>;
    async fn get_messages(&self, scope: &FeedScope, item_id: &ElementId) -> Result<Vec<Message>, DomainError>;

    // Events, append only
    async fn save_incoming_event(&self, event: &Event) -> Result<(), DomainError>;
    async fn save_outgoing_event(&self, event: &Event) -> Result<(), DomainError>;

    // Labels
    async fn labels(&self, scope: &FeedScope) -> Result<Vec<String>, DomainError>;
    async fn save_label(&self, scope: &FeedScope, label: &str) -> Result<(), DomainError>;

    // Unread counter
    async fn unread_persistent_items(&self, scope: &FeedScope) -> Result<u64, DomainError>;
    async fn update_unread_persistent_items_count(&self, scope: &FeedScope) -> Result<(), DomainError>;
}
