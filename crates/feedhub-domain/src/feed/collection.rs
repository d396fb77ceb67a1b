use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::aggregate::Feed;
use super::config::FeedConfig;
use super::query::ItemQuery;
use super::repository::FeedRepository;
use super::snapshot::FeedSnapshot;
use super::value_objects::{FeedScope, Flavour};
use crate::notification::{NotificationService, TopicId};
use crate::shared::{Attributes, DomainError};

/// Populates an empty feed the first time it is read.
#[async_trait]
pub trait FeedInitializer: Send + Sync {
    async fn initialize(&self, feed: &Feed) -> Result<(), DomainError>;
}

/// Hands out feeds bound to one shared repository and notifier.
#[derive(Clone)]
pub struct Collection {
    repository: Arc<dyn FeedRepository>,
    notifier: Arc<dyn NotificationService>,
    config: Arc<FeedConfig>,
    initializer: Option<Arc<dyn FeedInitializer>>,
    /// One lock per scope being seeded, shared by every clone.
    seed_locks: Arc<Mutex<HashMap<FeedScope, Arc<Mutex<()>>>>>,
}

impl Collection {
    pub fn new(
        repository: Arc<dyn FeedRepository>,
        notifier: Arc<dyn NotificationService>,
        config: FeedConfig,
    ) -> Self {
        Self {
            repository,
            notifier,
            config: Arc::new(config),
            initializer: None,
            seed_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn with_initializer(mut self, initializer: Arc<dyn FeedInitializer>) -> Self {
        self.initializer = Some(initializer);
        self
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn topic_ids(&self) -> Vec<String> {
        self.notifier.topic_ids()
    }

    /// Full read of a feed, announced on `feed.get`.
    ///
    /// An unfiltered read of an empty feed runs the initializer (if any)
    /// once and reads again. Concurrent first reads of the same scope wait
    /// for the one that seeds.
    pub async fn get_feed(
        &self,
        uid: &str,
        flavour: Flavour,
        query: &ItemQuery,
    ) -> Result<Feed, DomainError> {
        let scope = FeedScope::new(uid, flavour)?;
        let query = query.clone().limit(query.limit.min(self.config.items_limit));

        let mut snapshot = self
            .repository
            .get_feed(&scope, &query)
            .await
            .map_err(|e| e.context("unable to retrieve feed"))?;

        if snapshot.is_empty() && query.is_unfiltered() {
            if let Some(initializer) = &self.initializer {
                snapshot = self
                    .initialize(&scope, initializer.as_ref(), &query)
                    .await?;
            }
        }

        let mut feed = Feed::from_snapshot(
            scope,
            snapshot,
            self.repository.clone(),
            self.notifier.clone(),
            self.config.clone(),
        );
        feed.stamp_sequence_number();
        feed.check_preconditions()?;

        let snapshot = feed.snapshot();
        feed.notify(TopicId::FeedRetrieval, &snapshot, Attributes::new())
            .await?;

        Ok(feed)
    }

    async fn initialize(
        &self,
        scope: &FeedScope,
        initializer: &dyn FeedInitializer,
        query: &ItemQuery,
    ) -> Result<FeedSnapshot, DomainError> {
        let lock = self
            .seed_locks
            .lock()
            .await
            .entry(scope.clone())
            .or_default()
            .clone();
        let guard = lock.lock().await;

        let current = self
            .repository
            .get_feed(scope, query)
            .await
            .map_err(|e| e.context("unable to retrieve feed"))?;
        if !current.is_empty() {
            debug!("Feed {} was initialized by a concurrent read", scope);
            return Ok(current);
        }

        info!("Feed {} is empty, initializing default content", scope);
        let thin = self.get_thin_feed(scope.uid(), scope.flavour())?;
        let seeded = initializer.initialize(&thin).await;

        drop(guard);
        self.seed_locks.lock().await.remove(scope);
        seeded.map_err(|e| e.context("unable to initialize feed"))?;

        self.repository
            .get_feed(scope, query)
            .await
            .map_err(|e| e.context("unable to retrieve initialized feed"))
    }

    /// Empty feed handle for writes. No I/O.
    pub fn get_thin_feed(&self, uid: &str, flavour: Flavour) -> Result<Feed, DomainError> {
        let scope = FeedScope::new(uid, flavour)?;
        let feed = Feed::new(
            scope,
            self.repository.clone(),
            self.notifier.clone(),
            self.config.clone(),
        );
        feed.check_preconditions()?;
        Ok(feed)
    }
}
