#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};

use feedhub_domain::feed::{Collection, FeedConfig, FeedScope, Flavour, Item, Link, Nudge};
use feedhub_domain::notification::TopicNamespace;
use feedhub_domain::shared::ElementId;
use feedhub_infrastructure::messaging::{EnvelopeNotificationService, InMemoryTopicBus};
use feedhub_infrastructure::persistence::{Database, SqliteFeedRepository};

pub const TEST_ENVIRONMENT: &str = "testing";

/// Fresh in-memory SQLite database with migrations applied
pub async fn setup_in_memory_db() -> Database {
    let db = Database::in_memory().await.expect("open in-memory database");
    db.run_migrations().await.expect("run migrations");
    db
}

pub async fn sqlite_repository() -> (Database, SqliteFeedRepository) {
    let db = setup_in_memory_db().await;
    let repo = SqliteFeedRepository::new(db.shared_pool(), &FeedConfig::default());
    (db, repo)
}

pub struct Harness {
    pub collection: Collection,
    pub bus: Arc<InMemoryTopicBus>,
    pub repository: Arc<SqliteFeedRepository>,
    _db: Database,
}

/// Collection over SQLite and the in-memory bus, the same wiring the
/// application uses with the memory transport.
pub async fn harness() -> Harness {
    let (db, repo) = sqlite_repository().await;
    let repository = Arc::new(repo);
    let namespace = TopicNamespace::new(TEST_ENVIRONMENT);
    let bus = Arc::new(InMemoryTopicBus::new(namespace.clone()));
    let notifier = Arc::new(EnvelopeNotificationService::new(bus.clone(), namespace));
    let collection = Collection::new(repository.clone(), notifier, FeedConfig::default());

    Harness {
        collection,
        bus,
        repository,
        _db: db,
    }
}

pub fn consumer_scope(uid: &str) -> FeedScope {
    FeedScope::new(uid, Flavour::Consumer).expect("valid scope")
}

pub fn icon() -> Link {
    Link::png_image("https://assets.example.com/icon.png")
}

/// Unpublished item: id and sequence number are assigned on publish.
pub fn draft_item(text: &str) -> Item {
    Item::new("Care Team", text, icon(), Utc::now() + Duration::days(7))
}

/// Item with a fixed identity, ready for the repository.
pub fn stored_item(id: &str, sequence_number: i64, expiry_hours: i64) -> Item {
    let mut item = Item::new(
        "Care Team",
        format!("item {id}"),
        icon(),
        Utc::now() + Duration::hours(expiry_hours),
    )
    .with_label("A Default Label");
    item.id = ElementId::from_string(id);
    item.sequence_number = sequence_number;
    item
}

pub fn draft_nudge(title: &str) -> Nudge {
    Nudge::new(title, "Complete your profile", Utc::now() + Duration::days(7))
}

/// Same wiring as [`harness`] over a database file in `dir`, so writers
/// contend through separate pooled connections.
pub async fn file_harness(dir: &tempfile::TempDir) -> Harness {
    let path = dir.path().join("feedhub.db");
    let db = Database::new(path.to_str().expect("utf-8 path"))
        .await
        .expect("open database");
    db.run_migrations().await.expect("run migrations");
    let repository = Arc::new(SqliteFeedRepository::new(db.shared_pool(), &FeedConfig::default()));
    let namespace = TopicNamespace::new(TEST_ENVIRONMENT);
    let bus = Arc::new(InMemoryTopicBus::new(namespace.clone()));
    let notifier = Arc::new(EnvelopeNotificationService::new(bus.clone(), namespace));
    let collection = Collection::new(repository.clone(), notifier, FeedConfig::default());

    Harness {
        collection,
        bus,
        repository,
        _db: db,
    }
}
