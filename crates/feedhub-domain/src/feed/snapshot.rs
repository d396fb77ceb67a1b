use serde::{Deserialize, Serialize};

use super::action::Action;
use super::item::Item;
use super::nudge::Nudge;
use super::value_objects::{FeedScope, Flavour};
use crate::element::{require_text, Element, ElementKind};
use crate::shared::DomainError;

/// Read-time composition of a feed's three sub-collections.
///
/// This is what the repository returns from a composed query and what the
/// `feed.get` notification carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSnapshot {
    pub id: String,
    pub uid: String,
    pub flavour: Flavour,
    #[serde(default)]
    pub sequence_number: i64,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub nudges: Vec<Nudge>,
}

impl FeedSnapshot {
    pub fn empty(scope: &FeedScope) -> Self {
        Self {
            id: scope.feed_id(),
            uid: scope.uid().to_string(),
            flavour: scope.flavour(),
            sequence_number: 0,
            actions: Vec::new(),
            items: Vec::new(),
            nudges: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty() && self.items.is_empty() && self.nudges.is_empty()
    }
}

impl Element for FeedSnapshot {
    fn kind(&self) -> ElementKind {
        ElementKind::Feed
    }

    fn element_id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), DomainError> {
        require_text(&self.uid, "uid", ElementKind::Feed)?;
        let expected_id = format!("{}|{}", self.uid, self.flavour);
        if self.id != expected_id {
            return Err(DomainError::Validation(format!(
                "feed id '{}' does not match '{}'",
                self.id, expected_id
            )));
        }
        for action in &self.actions {
            action.validate()?;
        }
        for item in &self.items {
            item.validate()?;
        }
        for nudge in &self.nudges {
            nudge.validate()?;
        }
        Ok(())
    }

    fn marshal(&self) -> Result<Vec<u8>, DomainError> {
        serde_json::to_vec(self)
            .map_err(|e| DomainError::Serialization(format!("unable to encode feed {}: {}", self.id, e)))
    }
}
