use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use feedhub_domain::element::{Element, ElementKind};
use feedhub_domain::feed::query::{compare_id_sequence, compare_items};
use feedhub_domain::feed::{
    Action, Event, FeedConfig, FeedRepository, FeedScope, FeedSnapshot, Item, ItemQuery, Message,
    Nudge, NudgeQuery,
};
use feedhub_domain::shared::{DomainError, ElementId};

#[derive(Default)]
struct ScopeState {
    items: HashMap<ElementId, Item>,
    nudges: HashMap<ElementId, Nudge>,
    actions: HashMap<ElementId, Action>,
    messages: HashMap<ElementId, BTreeMap<ElementId, Message>>,
    labels: Vec<String>,
    unread: Option<u64>,
}

#[derive(Default)]
struct Store {
    scopes: HashMap<FeedScope, ScopeState>,
    incoming_events: Vec<Event>,
    outgoing_events: Vec<Event>,
}

/// Process-local repository. Keeps only the latest version of every
/// element and follows the same duplicate and ordering rules as the SQLite
/// store, so it can stand in for it in tests and single-process setups.
pub struct InMemoryFeedRepository {
    store: RwLock<Store>,
    default_label: String,
}

impl InMemoryFeedRepository {
    pub fn new(config: &FeedConfig) -> Self {
        Self {
            store: RwLock::new(Store::default()),
            default_label: config.default_label.clone(),
        }
    }

    pub async fn incoming_events(&self) -> Vec<Event> {
        self.store.read().await.incoming_events.clone()
    }

    pub async fn outgoing_events(&self) -> Vec<Event> {
        self.store.read().await.outgoing_events.clone()
    }

    fn with_conversations(state: &ScopeState, mut item: Item) -> Item {
        item.conversations = sorted_messages(state, &item.id);
        item
    }
}

impl Default for InMemoryFeedRepository {
    fn default() -> Self {
        Self::new(&FeedConfig::default())
    }
}

fn sorted_messages(state: &ScopeState, item_id: &ElementId) -> Vec<Message> {
    let mut messages: Vec<Message> = state
        .messages
        .get(item_id)
        .map(|thread| thread.values().cloned().collect())
        .unwrap_or_default();
    messages.sort_by(|a, b| compare_id_sequence(&a.id, a.sequence_number, &b.id, b.sequence_number));
    messages
}

fn check_duplicate(
    existing: Option<i64>,
    kind: ElementKind,
    id: &ElementId,
    sequence_number: i64,
) -> Result<(), DomainError> {
    if existing == Some(sequence_number) {
        return Err(DomainError::DuplicateElement {
            kind: kind.to_string(),
            id: id.to_string(),
            sequence_number,
        });
    }
    Ok(())
}

#[async_trait]
impl FeedRepository for InMemoryFeedRepository {
    async fn get_feed(&self, scope: &FeedScope, query: &ItemQuery) -> Result<FeedSnapshot, DomainError> {
        let mut snapshot = FeedSnapshot::empty(scope);
        snapshot.items = self.get_items(scope, query).await?;
        snapshot.nudges = self.get_nudges(scope, &query.nudge_query()).await?;
        snapshot.actions = self.get_actions(scope).await?;
        Ok(snapshot)
    }

    async fn get_items(&self, scope: &FeedScope, query: &ItemQuery) -> Result<Vec<Item>, DomainError> {
        let store = self.store.read().await;
        let Some(state) = store.scopes.get(scope) else {
            return Ok(Vec::new());
        };

        let now = Utc::now();
        let mut items: Vec<Item> = state
            .items
            .values()
            .filter(|item| query.matches(item, now))
            .cloned()
            .collect();
        items.sort_by(compare_items);
        items.truncate(query.limit);

        Ok(items
            .into_iter()
            .map(|item| Self::with_conversations(state, item))
            .collect())
    }

    async fn get_nudges(&self, scope: &FeedScope, query: &NudgeQuery) -> Result<Vec<Nudge>, DomainError> {
        let store = self.store.read().await;
        let Some(state) = store.scopes.get(scope) else {
            return Ok(Vec::new());
        };

        let now = Utc::now();
        let mut nudges: Vec<Nudge> = state
            .nudges
            .values()
            .filter(|nudge| query.matches(nudge, now))
            .cloned()
            .collect();
        nudges.sort_by(|a, b| compare_id_sequence(&a.id, a.sequence_number, &b.id, b.sequence_number));
        nudges.truncate(query.limit);
        Ok(nudges)
    }

    async fn get_actions(&self, scope: &FeedScope) -> Result<Vec<Action>, DomainError> {
        let store = self.store.read().await;
        let mut actions: Vec<Action> = store
            .scopes
            .get(scope)
            .map(|state| state.actions.values().cloned().collect())
            .unwrap_or_default();
        actions.sort_by(|a, b| compare_id_sequence(&a.id, a.sequence_number, &b.id, b.sequence_number));
        Ok(actions)
    }

    async fn get_feed_item(&self, scope: &FeedScope, item_id: &ElementId) -> Result<Option<Item>, DomainError> {
        let store = self.store.read().await;
        Ok(store.scopes.get(scope).and_then(|state| {
            state
                .items
                .get(item_id)
                .cloned()
                .map(|item| Self::with_conversations(state, item))
        }))
    }

    async fn save_feed_item(&self, scope: &FeedScope, item: &Item) -> Result<Item, DomainError> {
        item.validate()?;
        let mut store = self.store.write().await;
        let state = store.scopes.entry(scope.clone()).or_default();
        check_duplicate(
            state.items.get(&item.id).map(|i| i.sequence_number),
            ElementKind::Item,
            &item.id,
            item.sequence_number,
        )?;
        let mut stored = item.clone();
        stored.conversations.clear();
        state.items.insert(item.id.clone(), stored);
        Ok(item.clone())
    }

    async fn update_feed_item(&self, scope: &FeedScope, item: &Item) -> Result<Item, DomainError> {
        item.validate()?;
        let mut store = self.store.write().await;
        let mut stored = item.clone();
        stored.conversations.clear();
        store
            .scopes
            .entry(scope.clone())
            .or_default()
            .items
            .insert(item.id.clone(), stored);
        Ok(item.clone())
    }

    async fn delete_feed_item(&self, scope: &FeedScope, item_id: &ElementId) -> Result<(), DomainError> {
        let mut store = self.store.write().await;
        if let Some(state) = store.scopes.get_mut(scope) {
            state.items.remove(item_id);
            state.messages.remove(item_id);
        }
        Ok(())
    }

    async fn get_nudge(&self, scope: &FeedScope, nudge_id: &ElementId) -> Result<Option<Nudge>, DomainError> {
        let store = self.store.read().await;
        Ok(store
            .scopes
            .get(scope)
            .and_then(|state| state.nudges.get(nudge_id).cloned()))
    }

    async fn save_nudge(&self, scope: &FeedScope, nudge: &Nudge) -> Result<Nudge, DomainError> {
        nudge.validate()?;
        let mut store = self.store.write().await;
        let state = store.scopes.entry(scope.clone()).or_default();
        check_duplicate(
            state.nudges.get(&nudge.id).map(|n| n.sequence_number),
            ElementKind::Nudge,
            &nudge.id,
            nudge.sequence_number,
        )?;
        state.nudges.insert(nudge.id.clone(), nudge.clone());
        Ok(nudge.clone())
    }

    async fn update_nudge(&self, scope: &FeedScope, nudge: &Nudge) -> Result<Nudge, DomainError> {
        nudge.validate()?;
        let mut store = self.store.write().await;
        store
            .scopes
            .entry(scope.clone())
            .or_default()
            .nudges
            .insert(nudge.id.clone(), nudge.clone());
        Ok(nudge.clone())
    }

    async fn delete_nudge(&self, scope: &FeedScope, nudge_id: &ElementId) -> Result<(), DomainError> {
        let mut store = self.store.write().await;
        if let Some(state) = store.scopes.get_mut(scope) {
            state.nudges.remove(nudge_id);
        }
        Ok(())
    }

    async fn get_default_nudge_by_title(&self, scope: &FeedScope, title: &str) -> Result<Option<Nudge>, DomainError> {
        let store = self.store.read().await;
        Ok(store.scopes.get(scope).and_then(|state| {
            state
                .nudges
                .values()
                .filter(|nudge| nudge.title == title)
                .max_by_key(|nudge| nudge.sequence_number)
                .cloned()
        }))
    }

    async fn get_action(&self, scope: &FeedScope, action_id: &ElementId) -> Result<Option<Action>, DomainError> {
        let store = self.store.read().await;
        Ok(store
            .scopes
            .get(scope)
            .and_then(|state| state.actions.get(action_id).cloned()))
    }

    async fn save_action(&self, scope: &FeedScope, action: &Action) -> Result<Action, DomainError> {
        action.validate()?;
        let mut store = self.store.write().await;
        let state = store.scopes.entry(scope.clone()).or_default();
        check_duplicate(
            state.actions.get(&action.id).map(|a| a.sequence_number),
            ElementKind::Action,
            &action.id,
            action.sequence_number,
        )?;
        state.actions.insert(action.id.clone(), action.clone());
        Ok(action.clone())
    }

    async fn delete_action(&self, scope: &FeedScope, action_id: &ElementId) -> Result<(), DomainError> {
        let mut store = self.store.write().await;
        if let Some(state) = store.scopes.get_mut(scope) {
            state.actions.remove(action_id);
        }
        Ok(())
    }

    async fn post_message(&self, scope: &FeedScope, item_id: &ElementId, message: &Message) -> Result<Message, DomainError> {
        message.validate()?;
        let mut store = self.store.write().await;
        let thread = store
            .scopes
            .entry(scope.clone())
            .or_default()
            .messages
            .entry(item_id.clone())
            .or_default();
        check_duplicate(
            thread.get(&message.id).map(|m| m.sequence_number),
            ElementKind::Message,
            &message.id,
            message.sequence_number,
        )?;
        thread.insert(message.id.clone(), message.clone());
        Ok(message.clone())
    }

    async fn get_message(&self, scope: &FeedScope, item_id: &ElementId, message_id: &ElementId) -> Result<Option<Message>, DomainError> {
        let store = self.store.read().await;
        Ok(store
            .scopes
            .get(scope)
            .and_then(|state| state.messages.get(item_id))
            .and_then(|thread| thread.get(message_id).cloned()))
    }

    async fn delete_message(&self, scope: &FeedScope, item_id: &ElementId, message_id: &ElementId) -> Result<(), DomainError> {
        let mut store = self.store.write().await;
        if let Some(thread) = store
            .scopes
            .get_mut(scope)
            .and_then(|state| state.messages.get_mut(item_id))
        {
            thread.remove(message_id);
        }
        Ok(())
    }

    async fn get_messages(&self, scope: &FeedScope, item_id: &ElementId) -> Result<Vec<Message>, DomainError> {
        let store = self.store.read().await;
        Ok(store
            .scopes
            .get(scope)
            .map(|state| sorted_messages(state, item_id))
            .unwrap_or_default())
    }

    async fn save_incoming_event(&self, event: &Event) -> Result<(), DomainError> {
        event.validate()?;
        self.store.write().await.incoming_events.push(event.clone());
        Ok(())
    }

    async fn save_outgoing_event(&self, event: &Event) -> Result<(), DomainError> {
        event.validate()?;
        self.store.write().await.outgoing_events.push(event.clone());
        Ok(())
    }

    async fn labels(&self, scope: &FeedScope) -> Result<Vec<String>, DomainError> {
        let mut store = self.store.write().await;
        let state = store.scopes.entry(scope.clone()).or_default();
        if state.labels.is_empty() {
            state.labels.push(self.default_label.clone());
        }
        Ok(state.labels.clone())
    }

    async fn save_label(&self, scope: &FeedScope, label: &str) -> Result<(), DomainError> {
        let mut store = self.store.write().await;
        let state = store.scopes.entry(scope.clone()).or_default();
        if !state.labels.iter().any(|l| l == label) {
            state.labels.push(label.to_string());
        }
        Ok(())
    }

    async fn unread_persistent_items(&self, scope: &FeedScope) -> Result<u64, DomainError> {
        let mut store = self.store.write().await;
        let state = store.scopes.entry(scope.clone()).or_default();
        Ok(*state.unread.get_or_insert(0))
    }

    async fn update_unread_persistent_items_count(&self, scope: &FeedScope) -> Result<(), DomainError> {
        let mut store = self.store.write().await;
        let state = store.scopes.entry(scope.clone()).or_default();
        let count = state.items.values().filter(|item| item.persistent).count() as u64;
        state.unread = Some(count);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use feedhub_domain::feed::{Flavour, Link};

    fn scope() -> FeedScope {
        FeedScope::new("user-1", Flavour::Consumer).unwrap()
    }

    fn item(id: &str, seq: i64, hours: i64) -> Item {
        let mut item = Item::new(
            "author",
            "text",
            Link::png_image("https://example.com/icon.png"),
            Utc::now() + Duration::hours(hours),
        );
        item.id = ElementId::from_string(id);
        item.sequence_number = seq;
        item
    }

    #[tokio::test]
    async fn test_new_item_with_same_sequence_is_duplicate() {
        let repo = InMemoryFeedRepository::default();
        repo.save_feed_item(&scope(), &item("a", 1, 1)).await.unwrap();

        let err = repo.save_feed_item(&scope(), &item("a", 1, 1)).await.unwrap_err();
        assert!(err.is_duplicate());

        // A newer sequence number is accepted and replaces the old version.
        repo.save_feed_item(&scope(), &item("a", 2, 1)).await.unwrap();
        let stored = repo.get_feed_item(&scope(), &ElementId::from_string("a")).await.unwrap();
        assert_eq!(stored.unwrap().sequence_number, 2);
    }

    #[tokio::test]
    async fn test_items_ordered_by_expiry_then_id() {
        let repo = InMemoryFeedRepository::default();
        repo.save_feed_item(&scope(), &item("a", 1, 1)).await.unwrap();
        repo.save_feed_item(&scope(), &item("b", 1, 1)).await.unwrap();
        repo.save_feed_item(&scope(), &item("c", 1, 5)).await.unwrap();

        let items = repo.get_items(&scope(), &ItemQuery::new()).await.unwrap();
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[tokio::test]
    async fn test_scopes_are_isolated() {
        let repo = InMemoryFeedRepository::default();
        repo.save_feed_item(&scope(), &item("a", 1, 1)).await.unwrap();

        let pro = FeedScope::new("user-1", Flavour::Pro).unwrap();
        assert!(repo.get_items(&pro, &ItemQuery::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_labels_default_and_unread_counter() {
        let repo = InMemoryFeedRepository::default();
        assert_eq!(repo.labels(&scope()).await.unwrap(), vec!["A Default Label".to_string()]);
        assert_eq!(repo.unread_persistent_items(&scope()).await.unwrap(), 0);

        repo.save_feed_item(&scope(), &item("a", 1, 1).pinned()).await.unwrap();
        repo.save_feed_item(&scope(), &item("b", 1, 1)).await.unwrap();
        repo.update_unread_persistent_items_count(&scope()).await.unwrap();

        assert_eq!(repo.unread_persistent_items(&scope()).await.unwrap(), 1);
    }
}
