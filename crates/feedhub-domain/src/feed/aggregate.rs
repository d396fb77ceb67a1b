use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::action::{find_floating, Action};
use super::config::FeedConfig;
use super::event::Event;
use super::item::Item;
use super::message::Message;
use super::nudge::Nudge;
use super::query::{ItemQuery, NudgeQuery};
use super::repository::FeedRepository;
use super::snapshot::FeedSnapshot;
use super::value_objects::{FeedScope, Flavour, Status, Visibility};
use crate::element::{Element, ElementKind};
use crate::notification::{NotificationService, TopicId};
use crate::shared::{AttributeValue, Attributes, DomainError, ElementId};

/// Per-(uid, flavour) aggregate root.
///
/// A feed is never stored as one document. It is composed from the item,
/// nudge and action sub-collections on read, or constructed empty ("thin")
/// when only a write handle is needed. Every mutation persists first and
/// notifies second; a notification failure therefore means the change is
/// already committed.
#[derive(Clone)]
pub struct Feed {
    scope: FeedScope,
    sequence_number: i64,
    actions: Vec<Action>,
    items: Vec<Item>,
    nudges: Vec<Nudge>,
    repository: Arc<dyn FeedRepository>,
    notifier: Arc<dyn NotificationService>,
    config: Arc<FeedConfig>,
}

impl Feed {
    /// Thin feed: no content loaded, usable for writes.
    pub fn new(
        scope: FeedScope,
        repository: Arc<dyn FeedRepository>,
        notifier: Arc<dyn NotificationService>,
        config: Arc<FeedConfig>,
    ) -> Self {
        Self {
            scope,
            sequence_number: 0,
            actions: Vec::new(),
            items: Vec::new(),
            nudges: Vec::new(),
            repository,
            notifier,
            config,
        }
    }

    pub(crate) fn from_snapshot(
        scope: FeedScope,
        snapshot: FeedSnapshot,
        repository: Arc<dyn FeedRepository>,
        notifier: Arc<dyn NotificationService>,
        config: Arc<FeedConfig>,
    ) -> Self {
        Self {
            scope,
            sequence_number: snapshot.sequence_number,
            actions: snapshot.actions,
            items: snapshot.items,
            nudges: snapshot.nudges,
            repository,
            notifier,
            config,
        }
    }

    // Getters
    pub fn id(&self) -> String {
        self.scope.feed_id()
    }

    pub fn uid(&self) -> &str {
        self.scope.uid()
    }

    pub fn flavour(&self) -> Flavour {
        self.scope.flavour()
    }

    pub fn scope(&self) -> &FeedScope {
        &self.scope
    }

    pub fn sequence_number(&self) -> i64 {
        self.sequence_number
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn nudges(&self) -> &[Nudge] {
        &self.nudges
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            id: self.id(),
            uid: self.uid().to_string(),
            flavour: self.flavour(),
            sequence_number: self.sequence_number,
            actions: self.actions.clone(),
            items: self.items.clone(),
            nudges: self.nudges.clone(),
        }
    }

    pub(crate) fn stamp_sequence_number(&mut self) {
        self.sequence_number = current_sequence_number();
    }

    /// Dependencies are constructor-required, so only the scope can be
    /// wrong here.
    pub fn check_preconditions(&self) -> Result<(), DomainError> {
        if self.scope.uid().trim().is_empty() {
            return Err(DomainError::Precondition("feed uid is blank".to_string()));
        }
        Ok(())
    }

    // Reads

    pub async fn get_feed_item(&self, item_id: &ElementId) -> Result<Option<Item>, DomainError> {
        self.check_preconditions()?;
        self.repository
            .get_feed_item(&self.scope, item_id)
            .await
            .map_err(|e| e.context("unable to retrieve feed item"))
    }

    pub async fn get_nudge(&self, nudge_id: &ElementId) -> Result<Option<Nudge>, DomainError> {
        self.check_preconditions()?;
        self.repository
            .get_nudge(&self.scope, nudge_id)
            .await
            .map_err(|e| e.context("unable to retrieve nudge"))
    }

    pub async fn get_action(&self, action_id: &ElementId) -> Result<Option<Action>, DomainError> {
        self.check_preconditions()?;
        self.repository
            .get_action(&self.scope, action_id)
            .await
            .map_err(|e| e.context("unable to retrieve action"))
    }

    pub async fn get_message(
        &self,
        item_id: &ElementId,
        message_id: &ElementId,
    ) -> Result<Option<Message>, DomainError> {
        self.check_preconditions()?;
        self.repository
            .get_message(&self.scope, item_id, message_id)
            .await
            .map_err(|e| e.context("unable to retrieve message"))
    }

    pub async fn get_messages(&self, item_id: &ElementId) -> Result<Vec<Message>, DomainError> {
        self.check_preconditions()?;
        self.repository
            .get_messages(&self.scope, item_id)
            .await
            .map_err(|e| e.context("unable to retrieve messages"))
    }

    pub async fn get_items(&self, query: &ItemQuery) -> Result<Vec<Item>, DomainError> {
        self.check_preconditions()?;
        self.repository
            .get_items(&self.scope, query)
            .await
            .map_err(|e| e.context("unable to retrieve feed items"))
    }

    pub async fn get_nudges(&self, query: &NudgeQuery) -> Result<Vec<Nudge>, DomainError> {
        self.check_preconditions()?;
        self.repository
            .get_nudges(&self.scope, query)
            .await
            .map_err(|e| e.context("unable to retrieve nudges"))
    }

    pub async fn get_actions(&self) -> Result<Vec<Action>, DomainError> {
        self.check_preconditions()?;
        self.repository
            .get_actions(&self.scope)
            .await
            .map_err(|e| e.context("unable to retrieve actions"))
    }

    pub async fn get_default_nudge_by_title(&self, title: &str) -> Result<Option<Nudge>, DomainError> {
        self.check_preconditions()?;
        self.repository
            .get_default_nudge_by_title(&self.scope, title)
            .await
            .map_err(|e| e.context("unable to retrieve default nudge"))
    }

    // Items

    pub async fn publish_feed_item(&self, mut item: Item) -> Result<Item, DomainError> {
        self.check_preconditions()?;
        item.assign_defaults(current_sequence_number(), &self.config.default_label);
        // Threads are written through post_message only.
        item.conversations.clear();
        item.validate().map_err(|e| e.context("invalid feed item"))?;
        reject_floating(&item.actions, ElementKind::Item, &item.id)?;

        let saved = self
            .repository
            .save_feed_item(&self.scope, &item)
            .await
            .map_err(|e| e.context("unable to publish feed item"))?;

        self.notify(TopicId::ItemPublish, &saved, element_metadata("itemID", &saved.id))
            .await?;

        info!(
            "Published item {} (seq {}) to feed {}",
            saved.id,
            saved.sequence_number,
            self.id()
        );
        Ok(saved)
    }

    pub async fn delete_feed_item(&self, item_id: &ElementId) -> Result<(), DomainError> {
        self.check_preconditions()?;
        let Some(item) = self.get_feed_item(item_id).await? else {
            debug!("Item {} already absent from feed {}", item_id, self.id());
            return Ok(());
        };

        self.repository
            .delete_feed_item(&self.scope, item_id)
            .await
            .map_err(|e| e.context("unable to delete feed item"))?;

        self.notify(TopicId::ItemDelete, &item, element_metadata("itemID", item_id))
            .await
    }

    pub async fn resolve_feed_item(&self, item_id: &ElementId) -> Result<Item, DomainError> {
        self.transition_item(item_id, TopicId::ItemResolve, |item| item.status = Status::Done)
            .await
    }

    pub async fn unresolve_feed_item(&self, item_id: &ElementId) -> Result<Item, DomainError> {
        self.transition_item(item_id, TopicId::ItemUnresolve, |item| {
            item.status = Status::Pending
        })
        .await
    }

    pub async fn pin_feed_item(&self, item_id: &ElementId) -> Result<Item, DomainError> {
        self.transition_item(item_id, TopicId::ItemPin, |item| item.persistent = true)
            .await
    }

    pub async fn unpin_feed_item(&self, item_id: &ElementId) -> Result<Item, DomainError> {
        self.transition_item(item_id, TopicId::ItemUnpin, |item| item.persistent = false)
            .await
    }

    pub async fn hide_feed_item(&self, item_id: &ElementId) -> Result<Item, DomainError> {
        self.transition_item(item_id, TopicId::ItemHide, |item| {
            item.visibility = Visibility::Hide
        })
        .await
    }

    pub async fn show_feed_item(&self, item_id: &ElementId) -> Result<Item, DomainError> {
        self.transition_item(item_id, TopicId::ItemShow, |item| {
            item.visibility = Visibility::Show
        })
        .await
    }

    async fn transition_item<F>(
        &self,
        item_id: &ElementId,
        topic: TopicId,
        mutate: F,
    ) -> Result<Item, DomainError>
    where
        F: FnOnce(&mut Item) + Send,
    {
        self.check_preconditions()?;
        let mut item = self
            .get_feed_item(item_id)
            .await?
            .ok_or_else(|| DomainError::NilElement(format!("nil feed item {item_id}")))?;

        mutate(&mut item);
        item.sequence_number += 1;

        let updated = self
            .repository
            .update_feed_item(&self.scope, &item)
            .await
            .map_err(|e| e.context(&format!("unable to apply {topic} to feed item")))?;

        self.notify(topic, &updated, element_metadata("itemID", &updated.id))
            .await?;

        debug!(
            "Applied {} to item {} (seq {})",
            topic, updated.id, updated.sequence_number
        );
        Ok(updated)
    }

    // Nudges

    pub async fn publish_nudge(&self, mut nudge: Nudge) -> Result<Nudge, DomainError> {
        self.check_preconditions()?;
        nudge.assign_defaults(current_sequence_number());
        nudge.validate().map_err(|e| e.context("invalid nudge"))?;
        reject_floating(&nudge.actions, ElementKind::Nudge, &nudge.id)?;

        let saved = self
            .repository
            .save_nudge(&self.scope, &nudge)
            .await
            .map_err(|e| e.context("unable to publish nudge"))?;

        self.notify(TopicId::NudgePublish, &saved, element_metadata("nudgeID", &saved.id))
            .await?;

        info!(
            "Published nudge {} (seq {}) to feed {}",
            saved.id,
            saved.sequence_number,
            self.id()
        );
        Ok(saved)
    }

    pub async fn delete_nudge(&self, nudge_id: &ElementId) -> Result<(), DomainError> {
        self.check_preconditions()?;
        let Some(nudge) = self.get_nudge(nudge_id).await? else {
            debug!("Nudge {} already absent from feed {}", nudge_id, self.id());
            return Ok(());
        };

        self.repository
            .delete_nudge(&self.scope, nudge_id)
            .await
            .map_err(|e| e.context("unable to delete nudge"))?;

        self.notify(TopicId::NudgeDelete, &nudge, element_metadata("nudgeID", nudge_id))
            .await
    }

    pub async fn resolve_nudge(&self, nudge_id: &ElementId) -> Result<Nudge, DomainError> {
        self.transition_nudge(nudge_id, TopicId::NudgeResolve, |nudge| {
            nudge.status = Status::Done
        })
        .await
    }

    pub async fn unresolve_nudge(&self, nudge_id: &ElementId) -> Result<Nudge, DomainError> {
        self.transition_nudge(nudge_id, TopicId::NudgeUnresolve, |nudge| {
            nudge.status = Status::Pending
        })
        .await
    }

    pub async fn hide_nudge(&self, nudge_id: &ElementId) -> Result<Nudge, DomainError> {
        self.transition_nudge(nudge_id, TopicId::NudgeHide, |nudge| {
            nudge.visibility = Visibility::Hide
        })
        .await
    }

    pub async fn show_nudge(&self, nudge_id: &ElementId) -> Result<Nudge, DomainError> {
        self.transition_nudge(nudge_id, TopicId::NudgeShow, |nudge| {
            nudge.visibility = Visibility::Show
        })
        .await
    }

    async fn transition_nudge<F>(
        &self,
        nudge_id: &ElementId,
        topic: TopicId,
        mutate: F,
    ) -> Result<Nudge, DomainError>
    where
        F: FnOnce(&mut Nudge) + Send,
    {
        self.check_preconditions()?;
        let mut nudge = self
            .get_nudge(nudge_id)
            .await?
            .ok_or_else(|| DomainError::NilElement(format!("nil nudge {nudge_id}")))?;

        mutate(&mut nudge);
        nudge.sequence_number += 1;

        let updated = self
            .repository
            .update_nudge(&self.scope, &nudge)
            .await
            .map_err(|e| e.context(&format!("unable to apply {topic} to nudge")))?;

        self.notify(topic, &updated, element_metadata("nudgeID", &updated.id))
            .await?;

        debug!(
            "Applied {} to nudge {} (seq {})",
            topic, updated.id, updated.sequence_number
        );
        Ok(updated)
    }

    // Actions

    /// Feed-level actions are the only place a floating action may live.
    pub async fn publish_action(&self, mut action: Action) -> Result<Action, DomainError> {
        self.check_preconditions()?;
        action.assign_defaults(current_sequence_number());
        action.validate().map_err(|e| e.context("invalid action"))?;

        let saved = self
            .repository
            .save_action(&self.scope, &action)
            .await
            .map_err(|e| e.context("unable to publish action"))?;

        self.notify(TopicId::ActionPublish, &saved, element_metadata("actionID", &saved.id))
            .await?;
        Ok(saved)
    }

    pub async fn delete_action(&self, action_id: &ElementId) -> Result<(), DomainError> {
        self.check_preconditions()?;
        let Some(action) = self.get_action(action_id).await? else {
            debug!("Action {} already absent from feed {}", action_id, self.id());
            return Ok(());
        };

        self.repository
            .delete_action(&self.scope, action_id)
            .await
            .map_err(|e| e.context("unable to delete action"))?;

        self.notify(TopicId::ActionDelete, &action, element_metadata("actionID", action_id))
            .await
    }

    // Messages

    pub async fn post_message(
        &self,
        item_id: &ElementId,
        mut message: Message,
    ) -> Result<Message, DomainError> {
        self.check_preconditions()?;
        if message.id.is_blank() {
            message.id = ElementId::new();
        }
        if message.sequence_number == 0 {
            message.sequence_number = current_sequence_number();
        }
        message.validate().map_err(|e| e.context("invalid message"))?;

        if self.get_feed_item(item_id).await?.is_none() {
            return Err(DomainError::NilElement(format!(
                "cannot post message to nil feed item {item_id}"
            )));
        }

        let saved = self
            .repository
            .post_message(&self.scope, item_id, &message)
            .await
            .map_err(|e| e.context("unable to post message"))?;

        self.notify(TopicId::MessagePost, &saved, message_metadata(item_id, &saved.id))
            .await?;
        Ok(saved)
    }

    pub async fn delete_message(
        &self,
        item_id: &ElementId,
        message_id: &ElementId,
    ) -> Result<(), DomainError> {
        self.check_preconditions()?;
        let Some(message) = self.get_message(item_id, message_id).await? else {
            debug!("Message {} already absent from item {}", message_id, item_id);
            return Ok(());
        };

        self.repository
            .delete_message(&self.scope, item_id, message_id)
            .await
            .map_err(|e| e.context("unable to delete message"))?;

        self.notify(TopicId::MessageDelete, &message, message_metadata(item_id, message_id))
            .await
    }

    // Events

    /// Record a client event against this feed. Missing id, user and
    /// flavour are taken from the feed; an explicit flavour that differs
    /// from the feed's is rejected.
    pub async fn process_event(&self, mut event: Event) -> Result<Event, DomainError> {
        self.check_preconditions()?;
        if event.id.is_blank() {
            event.id = ElementId::new();
        }
        if event.context.user_id.trim().is_empty() {
            event.context.user_id = self.uid().to_string();
        }
        if event.context.organization_id.trim().is_empty() {
            event.context.organization_id = self.config.default_organization_id.clone();
        }
        if event.context.location_id.trim().is_empty() {
            event.context.location_id = self.config.default_location_id.clone();
        }
        let flavour = *event.context.flavour.get_or_insert(self.flavour());

        event.validate().map_err(|e| e.context("invalid event"))?;

        if flavour != self.flavour() {
            return Err(DomainError::FlavourMismatch {
                expected: self.flavour().to_string(),
                actual: flavour.to_string(),
            });
        }

        self.repository
            .save_incoming_event(&event)
            .await
            .map_err(|e| e.context("unable to save incoming event"))?;

        let mut metadata = element_metadata("eventID", &event.id);
        metadata.insert("eventName".to_string(), AttributeValue::from(event.name.as_str()));
        self.notify(TopicId::IncomingEvent, &event, metadata).await?;

        Ok(event)
    }

    /// Record an event emitted by the system on behalf of this feed.
    pub async fn save_outgoing_event(&self, event: &Event) -> Result<(), DomainError> {
        self.check_preconditions()?;
        event.validate().map_err(|e| e.context("invalid event"))?;
        self.repository
            .save_outgoing_event(event)
            .await
            .map_err(|e| e.context("unable to save outgoing event"))
    }

    // Labels and counters

    pub async fn labels(&self) -> Result<Vec<String>, DomainError> {
        self.check_preconditions()?;
        self.repository
            .labels(&self.scope)
            .await
            .map_err(|e| e.context("unable to retrieve labels"))
    }

    pub async fn save_label(&self, label: &str) -> Result<(), DomainError> {
        self.check_preconditions()?;
        if label.trim().is_empty() {
            return Err(DomainError::Validation("label is blank".to_string()));
        }
        self.repository
            .save_label(&self.scope, label)
            .await
            .map_err(|e| e.context("unable to save label"))
    }

    pub async fn unread_persistent_items(&self) -> Result<u64, DomainError> {
        self.check_preconditions()?;
        self.repository
            .unread_persistent_items(&self.scope)
            .await
            .map_err(|e| e.context("unable to retrieve unread persistent items count"))
    }

    pub async fn update_unread_persistent_items_count(&self) -> Result<(), DomainError> {
        self.check_preconditions()?;
        self.repository
            .update_unread_persistent_items_count(&self.scope)
            .await
            .map_err(|e| e.context("unable to update unread persistent items count"))
    }

    pub(crate) async fn notify(
        &self,
        topic: TopicId,
        element: &dyn Element,
        metadata: Attributes,
    ) -> Result<(), DomainError> {
        self.notifier
            .notify(topic, &self.scope, element, metadata)
            .await
            .map_err(|e| match e {
                DomainError::Notification(msg) => {
                    DomainError::Notification(format!("{topic}: {msg}"))
                }
                other => DomainError::Notification(format!("{topic}: {other}")),
            })
    }
}

impl fmt::Debug for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Feed")
            .field("id", &self.id())
            .field("sequence_number", &self.sequence_number)
            .field("actions", &self.actions.len())
            .field("items", &self.items.len())
            .field("nudges", &self.nudges.len())
            .finish()
    }
}

fn reject_floating(actions: &[Action], kind: ElementKind, id: &ElementId) -> Result<(), DomainError> {
    if let Some(action) = find_floating(actions) {
        return Err(DomainError::FloatingAction(format!(
            "{kind} {id} embeds floating action '{}'; floating actions are only allowed at the global level",
            action.name
        )));
    }
    Ok(())
}

fn current_sequence_number() -> i64 {
    Utc::now().timestamp()
}

fn element_metadata(key: &str, id: &ElementId) -> Attributes {
    let mut metadata = Attributes::new();
    metadata.insert(key.to_string(), AttributeValue::from(id.as_str()));
    metadata
}

fn message_metadata(item_id: &ElementId, message_id: &ElementId) -> Attributes {
    let mut metadata = element_metadata("itemID", item_id);
    metadata.insert(
        "messageID".to_string(),
        AttributeValue::from(message_id.as_str()),
    );
    metadata
}
