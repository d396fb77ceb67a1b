/// E2E: feed lifecycle through the Collection facade, backed by SQLite and
/// the in-memory topic bus.
use chrono::Utc;

use feedhub_domain::feed::{
    Action, ActionType, BooleanFilter, Event, EventContext, FeedRepository, FeedSnapshot, Flavour,
    Handling, Item, ItemQuery, Message, Nudge, NudgeQuery, Status, Visibility,
};
use feedhub_domain::notification::{NotificationEnvelope, TopicId};
use feedhub_domain::shared::{DomainError, ElementId};

mod test_helpers;

use test_helpers::{consumer_scope, draft_item, draft_nudge, harness, icon};

#[tokio::test]
async fn e2e_publish_resolve_unresolve() {
    let h = harness().await;
    let feed = h.collection.get_thin_feed("user-1", Flavour::Consumer).unwrap();

    let published = feed.publish_feed_item(draft_item("Your claim was received")).await.unwrap();
    assert_eq!(published.status, Status::Pending);
    let original = published.sequence_number;
    assert!(original > 0);

    let resolved = feed.resolve_feed_item(&published.id).await.unwrap();
    assert_eq!(resolved.status, Status::Done);
    assert_eq!(resolved.sequence_number, original + 1);

    let unresolved = feed.unresolve_feed_item(&published.id).await.unwrap();
    assert_eq!(unresolved.status, Status::Pending);
    assert_eq!(unresolved.sequence_number, original + 2);

    assert_eq!(h.bus.published_on(TopicId::ItemPublish).await.len(), 1);
    assert_eq!(h.bus.published_on(TopicId::ItemResolve).await.len(), 1);
    let unresolve = h.bus.published_on(TopicId::ItemUnresolve).await;
    assert_eq!(unresolve.len(), 1);

    let envelope = NotificationEnvelope::from_bytes(&unresolve[0].data).unwrap();
    assert_eq!(envelope.uid, "user-1");
    assert_eq!(envelope.flavour, Flavour::Consumer);
    assert_eq!(envelope.metadata["itemID"].as_text(), Some(published.id.as_str()));
    let carried: Item = envelope.decode_payload().unwrap();
    assert_eq!(carried.sequence_number, original + 2);
}

#[tokio::test]
async fn e2e_sequence_strictly_increases_per_transition() {
    let h = harness().await;
    let feed = h.collection.get_thin_feed("user-1", Flavour::Consumer).unwrap();
    let item = feed.publish_feed_item(draft_item("Monthly summary")).await.unwrap();

    let mut last = item.sequence_number;
    for round in 0..6 {
        let next = if round % 2 == 0 {
            feed.resolve_feed_item(&item.id).await.unwrap()
        } else {
            feed.unresolve_feed_item(&item.id).await.unwrap()
        };
        assert_eq!(next.sequence_number, last + 1);
        last = next.sequence_number;
    }

    for transition in 0..4 {
        let next = match transition {
            0 => feed.pin_feed_item(&item.id).await.unwrap(),
            1 => feed.unpin_feed_item(&item.id).await.unwrap(),
            2 => feed.hide_feed_item(&item.id).await.unwrap(),
            _ => feed.show_feed_item(&item.id).await.unwrap(),
        };
        assert_eq!(next.sequence_number, last + 1);
        last = next.sequence_number;
    }

    let stored = feed.get_feed_item(&item.id).await.unwrap().unwrap();
    assert_eq!(stored.sequence_number, last);
}

#[tokio::test]
async fn e2e_idempotent_delete() {
    let h = harness().await;
    let feed = h.collection.get_thin_feed("user-1", Flavour::Consumer).unwrap();
    let item = feed.publish_feed_item(draft_item("Delete me")).await.unwrap();

    feed.delete_feed_item(&item.id).await.unwrap();
    feed.delete_feed_item(&item.id).await.unwrap();
    feed.delete_nudge(&ElementId::from_string("never-existed")).await.unwrap();
    feed.delete_action(&ElementId::from_string("never-existed")).await.unwrap();

    // Only the delete that removed something is announced.
    assert_eq!(h.bus.published_on(TopicId::ItemDelete).await.len(), 1);
    assert!(h.bus.published_on(TopicId::NudgeDelete).await.is_empty());
}

#[tokio::test]
async fn e2e_duplicate_publish_is_rejected() {
    let h = harness().await;
    let feed = h.collection.get_thin_feed("user-1", Flavour::Consumer).unwrap();

    let mut item = draft_item("Retry safe");
    item.id = ElementId::from_string("item-fixed");
    item.sequence_number = 42;

    feed.publish_feed_item(item.clone()).await.unwrap();
    let err = feed.publish_feed_item(item).await.unwrap_err();
    assert!(err.is_duplicate(), "expected duplicate error, got {err:?}");

    let mut nudge = draft_nudge("Add a photo");
    nudge.id = ElementId::from_string("nudge-fixed");
    nudge.sequence_number = 42;
    feed.publish_nudge(nudge.clone()).await.unwrap();
    assert!(feed.publish_nudge(nudge).await.unwrap_err().is_duplicate());

    // One announcement per successful publish.
    assert_eq!(h.bus.published_on(TopicId::ItemPublish).await.len(), 1);
    assert_eq!(h.bus.published_on(TopicId::NudgePublish).await.len(), 1);
}

#[tokio::test]
async fn e2e_floating_action_guard() {
    let h = harness().await;
    let feed = h.collection.get_thin_feed("user-1", Flavour::Consumer).unwrap();
    let floating = Action::new("Chat", ActionType::Floating, Handling::FullPage);

    let item_result = feed
        .publish_feed_item(draft_item("Has a floating action").with_action(floating.clone()))
        .await;
    assert!(matches!(item_result, Err(DomainError::FloatingAction(_))));

    let nudge_result = feed.publish_nudge(draft_nudge("Floating").with_action(floating.clone())).await;
    assert!(matches!(nudge_result, Err(DomainError::FloatingAction(_))));

    let scope = consumer_scope("user-1");
    assert!(h.repository.get_items(&scope, &ItemQuery::new()).await.unwrap().is_empty());
    assert!(h.bus.published().await.is_empty());

    // The feed-level action list is where floating actions belong.
    let action = feed.publish_action(floating).await.unwrap();
    assert!(action.is_floating());
    assert_eq!(feed.get_actions().await.unwrap().len(), 1);
}

#[tokio::test]
async fn e2e_get_feed_is_stable_across_reads() {
    let h = harness().await;
    let feed = h.collection.get_thin_feed("user-1", Flavour::Consumer).unwrap();
    for n in 0..3 {
        feed.publish_feed_item(draft_item(&format!("item {n}"))).await.unwrap();
    }
    feed.publish_nudge(draft_nudge("Nudge")).await.unwrap();
    feed.publish_action(Action::new("Help", ActionType::Overflow, Handling::Inline))
        .await
        .unwrap();

    let query = ItemQuery::new();
    for _ in 0..10 {
        let full = h
            .collection
            .get_feed("user-1", Flavour::Consumer, &query)
            .await
            .unwrap();
        assert_eq!(
            (full.actions().len(), full.nudges().len(), full.items().len()),
            (1, 1, 3)
        );
    }

    let retrievals = h.bus.published_on(TopicId::FeedRetrieval).await;
    assert_eq!(retrievals.len(), 10);
    let envelope = NotificationEnvelope::from_bytes(&retrievals[0].data).unwrap();
    let snapshot: FeedSnapshot = envelope.decode_payload().unwrap();
    assert_eq!(snapshot.items.len(), 3);
}

#[tokio::test]
async fn e2e_persistent_both_is_union() {
    let h = harness().await;
    let feed = h.collection.get_thin_feed("user-1", Flavour::Consumer).unwrap();
    feed.publish_feed_item(draft_item("pinned").pinned()).await.unwrap();
    feed.publish_feed_item(draft_item("loose")).await.unwrap();
    feed.publish_feed_item(draft_item("loose too")).await.unwrap();

    let read = |filter: BooleanFilter| {
        let collection = h.collection.clone();
        async move {
            collection
                .get_feed("user-1", Flavour::Consumer, &ItemQuery::new().persistent(filter))
                .await
                .unwrap()
                .items()
                .len()
        }
    };

    let t = read(BooleanFilter::True).await;
    let f = read(BooleanFilter::False).await;
    let both = read(BooleanFilter::Both).await;
    assert_eq!(both, t + f);
    assert_eq!((t, f), (1, 2));
}

#[tokio::test]
async fn e2e_event_flavour_guard() {
    let h = harness().await;
    let feed = h.collection.get_thin_feed("user-1", Flavour::Consumer).unwrap();

    let foreign = Event::new("PAGE_VIEWED").with_context(EventContext {
        flavour: Some(Flavour::Pro),
        ..Default::default()
    });
    let err = feed.process_event(foreign).await.unwrap_err();
    assert!(matches!(err, DomainError::FlavourMismatch { .. }));
    assert!(h.bus.published_on(TopicId::IncomingEvent).await.is_empty());

    let processed = feed.process_event(Event::new("PAGE_VIEWED")).await.unwrap();
    assert_eq!(processed.context.user_id, "user-1");
    assert_eq!(processed.context.flavour, Some(Flavour::Consumer));
    assert_eq!(processed.context.organization_id, "default-organization");
    assert_eq!(h.bus.published_on(TopicId::IncomingEvent).await.len(), 1);
}

#[tokio::test]
async fn e2e_messages_follow_their_item() {
    let h = harness().await;
    let feed = h.collection.get_thin_feed("user-1", Flavour::Consumer).unwrap();
    let item = feed.publish_feed_item(draft_item("Let's talk")).await.unwrap();

    let first = feed
        .post_message(&item.id, Message::new("Hi", "user-1", "Jane"))
        .await
        .unwrap();
    feed.post_message(&item.id, Message::new("Hello", "agent-7", "Sam").in_reply_to(first.id.clone()))
        .await
        .unwrap();

    let stored = feed.get_feed_item(&item.id).await.unwrap().unwrap();
    assert_eq!(stored.conversations.len(), 2);

    let orphan = feed
        .post_message(&ElementId::from_string("missing"), Message::new("?", "user-1", "Jane"))
        .await;
    assert!(matches!(orphan, Err(DomainError::NilElement(_))));

    feed.delete_message(&item.id, &first.id).await.unwrap();
    assert_eq!(feed.get_messages(&item.id).await.unwrap().len(), 1);
    assert_eq!(h.bus.published_on(TopicId::MessagePost).await.len(), 2);
    assert_eq!(h.bus.published_on(TopicId::MessageDelete).await.len(), 1);
}

#[tokio::test]
async fn e2e_transition_on_missing_item_is_nil() {
    let h = harness().await;
    let feed = h.collection.get_thin_feed("user-1", Flavour::Consumer).unwrap();

    let err = feed
        .resolve_feed_item(&ElementId::from_string("ghost"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NilElement(_)));

    let err = feed.hide_nudge(&ElementId::from_string("ghost")).await.unwrap_err();
    assert!(matches!(err, DomainError::NilElement(_)));
}

#[tokio::test]
async fn e2e_flavours_are_isolated() {
    let h = harness().await;
    let consumer = h.collection.get_thin_feed("user-1", Flavour::Consumer).unwrap();
    let pro = h.collection.get_thin_feed("user-1", Flavour::Pro).unwrap();

    consumer
        .publish_feed_item(Item::new("Care Team", "consumer only", icon(), Utc::now() + chrono::Duration::days(1)))
        .await
        .unwrap();

    assert_eq!(consumer.get_items(&ItemQuery::new()).await.unwrap().len(), 1);
    assert!(pro.get_items(&ItemQuery::new()).await.unwrap().is_empty());
}

#[tokio::test]
async fn e2e_nudge_lifecycle() {
    let h = harness().await;
    let feed = h.collection.get_thin_feed("user-1", Flavour::Consumer).unwrap();

    let published: Nudge = feed.publish_nudge(draft_nudge("Verify your email")).await.unwrap();
    let original = published.sequence_number;

    let resolved = feed.resolve_nudge(&published.id).await.unwrap();
    assert_eq!(resolved.status, Status::Done);
    let unresolved = feed.unresolve_nudge(&published.id).await.unwrap();
    assert_eq!(unresolved.status, Status::Pending);

    feed.hide_nudge(&published.id).await.unwrap();
    let visible_only = NudgeQuery {
        visibility: Some(Visibility::Show),
        ..NudgeQuery::default()
    };
    assert!(feed.get_nudges(&visible_only).await.unwrap().is_empty());

    let shown = feed.show_nudge(&published.id).await.unwrap();
    assert_eq!(shown.visibility, Visibility::Show);
    assert_eq!(shown.sequence_number, original + 4);
    assert_eq!(feed.get_nudges(&visible_only).await.unwrap().len(), 1);

    for topic in [
        TopicId::NudgeResolve,
        TopicId::NudgeUnresolve,
        TopicId::NudgeHide,
        TopicId::NudgeShow,
    ] {
        assert_eq!(h.bus.published_on(topic).await.len(), 1, "{}", topic);
    }

    feed.delete_nudge(&published.id).await.unwrap();
    assert!(feed.get_nudge(&published.id).await.unwrap().is_none());
}
