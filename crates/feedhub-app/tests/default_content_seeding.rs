use std::sync::Arc;

use feedhub_domain::feed::{BooleanFilter, Collection, FeedConfig, Flavour, ItemQuery};
use feedhub_domain::notification::{TopicId, TopicNamespace};
use feedhub_infrastructure::messaging::{EnvelopeNotificationService, InMemoryTopicBus};
use feedhub_infrastructure::persistence::InMemoryFeedRepository;
use feedhub_lib::application::{DefaultContentSeeder, InboxCountHandler, LabelIndexHandler};

struct Fixture {
    collection: Collection,
    bus: Arc<InMemoryTopicBus>,
}

async fn fixture() -> Fixture {
    let config = FeedConfig::default();
    let namespace = TopicNamespace::new("test");
    let bus = Arc::new(InMemoryTopicBus::new(namespace.clone()));
    let notifier = Arc::new(EnvelopeNotificationService::new(bus.clone(), namespace));
    let repository = Arc::new(InMemoryFeedRepository::new(&config));

    let collection = Collection::new(repository, notifier, config)
        .with_initializer(Arc::new(DefaultContentSeeder::builtin().unwrap()));

    bus.subscribe(Arc::new(InboxCountHandler::new(collection.clone())))
        .await;
    bus.subscribe(Arc::new(LabelIndexHandler::new(collection.clone())))
        .await;

    Fixture { collection, bus }
}

#[tokio::test]
async fn test_empty_consumer_feed_is_seeded_on_first_read() {
    let fx = fixture().await;

    let feed = fx
        .collection
        .get_feed("user-1", Flavour::Consumer, &ItemQuery::new())
        .await
        .unwrap();

    assert_eq!(feed.actions().len(), 4);
    assert_eq!(feed.nudges().len(), 2);
    assert_eq!(feed.items().len(), 2);
    assert_eq!(fx.bus.published_on(TopicId::ItemPublish).await.len(), 2);
    assert_eq!(fx.bus.published_on(TopicId::NudgePublish).await.len(), 2);
    assert_eq!(fx.bus.published_on(TopicId::FeedRetrieval).await.len(), 1);
}

#[tokio::test]
async fn test_seeding_happens_once() {
    let fx = fixture().await;
    let query = ItemQuery::new();

    fx.collection
        .get_feed("user-1", Flavour::Consumer, &query)
        .await
        .unwrap();
    let feed = fx
        .collection
        .get_feed("user-1", Flavour::Consumer, &query)
        .await
        .unwrap();

    assert_eq!(feed.items().len(), 2);
    assert_eq!(fx.bus.published_on(TopicId::ItemPublish).await.len(), 2);
    assert_eq!(fx.bus.published_on(TopicId::FeedRetrieval).await.len(), 2);
}

#[tokio::test]
async fn test_filtered_read_of_empty_feed_does_not_seed() {
    let fx = fixture().await;

    let feed = fx
        .collection
        .get_feed(
            "user-1",
            Flavour::Consumer,
            &ItemQuery::new().persistent(BooleanFilter::True),
        )
        .await
        .unwrap();

    assert!(feed.items().is_empty());
    assert!(feed.actions().is_empty());
    assert!(fx.bus.published_on(TopicId::ItemPublish).await.is_empty());
}

#[tokio::test]
async fn test_flavours_get_their_own_content() {
    let fx = fixture().await;

    let pro = fx
        .collection
        .get_feed("user-1", Flavour::Pro, &ItemQuery::new())
        .await
        .unwrap();
    assert_eq!(pro.actions().len(), 3);
    assert_eq!(pro.nudges().len(), 1);
    assert_eq!(pro.items().len(), 1);

    let consumer = fx
        .collection
        .get_feed("user-1", Flavour::Consumer, &ItemQuery::new())
        .await
        .unwrap();
    assert_eq!(consumer.items().len(), 2);
}

#[tokio::test]
async fn test_handlers_follow_seeded_items() {
    let fx = fixture().await;

    let feed = fx
        .collection
        .get_feed("user-1", Flavour::Consumer, &ItemQuery::new())
        .await
        .unwrap();

    assert_eq!(feed.unread_persistent_items().await.unwrap(), 1);
    assert_eq!(feed.labels().await.unwrap(), vec!["Welcome".to_string()]);
}

#[tokio::test]
async fn test_pinning_updates_unread_count() {
    let fx = fixture().await;

    let feed = fx
        .collection
        .get_feed("user-1", Flavour::Consumer, &ItemQuery::new())
        .await
        .unwrap();
    let transient = feed
        .items()
        .iter()
        .find(|item| !item.persistent)
        .cloned()
        .unwrap();

    feed.pin_feed_item(&transient.id).await.unwrap();
    assert_eq!(feed.unread_persistent_items().await.unwrap(), 2);

    feed.unpin_feed_item(&transient.id).await.unwrap();
    assert_eq!(feed.unread_persistent_items().await.unwrap(), 1);
}
