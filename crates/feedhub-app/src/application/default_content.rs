use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Deserialize;
use tracing::{debug, info, warn};

use feedhub_domain::feed::{Action, ActionType, Feed, FeedInitializer, Handling, Item, Link, Nudge};
use feedhub_domain::shared::DomainError;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuiltinAction {
    name: String,
    action_type: ActionType,
    handling: Handling,
}

impl BuiltinAction {
    fn to_action(&self) -> Action {
        Action::new(self.name.clone(), self.action_type, self.handling)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuiltinNudge {
    title: String,
    text: String,
    expiry_days: i64,
    #[serde(default)]
    actions: Vec<BuiltinAction>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuiltinItem {
    author: String,
    tagline: String,
    label: String,
    summary: String,
    text: String,
    icon: String,
    expiry_days: i64,
    #[serde(default)]
    persistent: bool,
    #[serde(default)]
    actions: Vec<BuiltinAction>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FlavourContent {
    #[serde(default)]
    actions: Vec<BuiltinAction>,
    #[serde(default)]
    nudges: Vec<BuiltinNudge>,
    #[serde(default)]
    items: Vec<BuiltinItem>,
}

fn builtin_content() -> Result<BTreeMap<String, FlavourContent>, DomainError> {
    const RAW_CONTENT: &str = include_str!("../../config/default_content.json");
    serde_json::from_str(RAW_CONTENT).map_err(|e| {
        DomainError::Deserialization(format!("Failed to parse default content: {e}"))
    })
}

/// Seeds first-run content into an empty feed through its public publish
/// operations.
pub struct DefaultContentSeeder {
    catalogue: BTreeMap<String, FlavourContent>,
}

impl DefaultContentSeeder {
    pub fn builtin() -> Result<Self, DomainError> {
        Ok(Self {
            catalogue: builtin_content()?,
        })
    }

    /// Outcome of a publish during seeding. Content that is already there
    /// and fan-out failures after a durable write do not stop the seeding.
    fn tolerate<T>(what: &str, result: Result<T, DomainError>) -> Result<bool, DomainError> {
        match result {
            Ok(_) => Ok(true),
            Err(e) if e.is_duplicate() => {
                debug!("Default {} already present: {}", what, e);
                Ok(false)
            }
            Err(e) if e.is_committed() => {
                warn!("Default {} stored but not announced: {}", what, e);
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl FeedInitializer for DefaultContentSeeder {
    async fn initialize(&self, feed: &Feed) -> Result<(), DomainError> {
        let Some(content) = self.catalogue.get(feed.flavour().as_str()) else {
            debug!("No default content for flavour {}", feed.flavour());
            return Ok(());
        };

        let mut seeded = 0;
        for action in &content.actions {
            if Self::tolerate("action", feed.publish_action(action.to_action()).await)? {
                seeded += 1;
            }
        }

        for builtin in &content.nudges {
            if feed.get_default_nudge_by_title(&builtin.title).await?.is_some() {
                continue;
            }
            let nudge = builtin.actions.iter().fold(
                Nudge::new(
                    builtin.title.clone(),
                    builtin.text.clone(),
                    Utc::now() + Duration::days(builtin.expiry_days),
                ),
                |nudge, action| nudge.with_action(action.to_action()),
            );
            if Self::tolerate("nudge", feed.publish_nudge(nudge).await)? {
                seeded += 1;
            }
        }

        for builtin in &content.items {
            let mut item = Item::new(
                builtin.author.clone(),
                builtin.text.clone(),
                Link::png_image(builtin.icon.clone()),
                Utc::now() + Duration::days(builtin.expiry_days),
            )
            .with_label(builtin.label.clone());
            item.tagline = builtin.tagline.clone();
            item.summary = builtin.summary.clone();
            item.persistent = builtin.persistent;
            for action in &builtin.actions {
                item = item.with_action(action.to_action());
            }
            if Self::tolerate("item", feed.publish_feed_item(item).await)? {
                seeded += 1;
            }
        }

        info!("Seeded {} default elements into feed {}", seeded, feed.id());
        Ok(())
    }
}
