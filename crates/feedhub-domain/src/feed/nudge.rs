use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::action::Action;
use super::link::Link;
use super::value_objects::{Channel, LinkType, Status, Visibility};
use crate::element::{impl_element, require_sequence, require_text, ElementKind};
use crate::shared::{DomainError, ElementId};

/// A prompt asking the user to do something.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nudge {
    #[serde(default = "ElementId::unassigned")]
    pub id: ElementId,
    #[serde(default)]
    pub sequence_number: i64,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub status: Status,
    pub expiry: DateTime<Utc>,
    pub title: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Link>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub users: BTreeSet<String>,
    #[serde(default)]
    pub groups: BTreeSet<String>,
    #[serde(default)]
    pub notification_channels: Vec<Channel>,
}

impl Nudge {
    pub fn new(title: impl Into<String>, text: impl Into<String>, expiry: DateTime<Utc>) -> Self {
        Self {
            id: ElementId::unassigned(),
            sequence_number: 0,
            visibility: Visibility::Show,
            status: Status::Pending,
            expiry,
            title: title.into(),
            text: text.into(),
            image: None,
            actions: Vec::new(),
            users: BTreeSet::new(),
            groups: BTreeSet::new(),
            notification_channels: Vec::new(),
        }
    }

    pub fn with_image(mut self, image: Link) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub(crate) fn assign_defaults(&mut self, sequence_number: i64) {
        if self.id.is_blank() {
            self.id = ElementId::new();
        }
        if self.sequence_number == 0 {
            self.sequence_number = sequence_number;
        }
        for action in &mut self.actions {
            action.assign_defaults(self.sequence_number);
        }
    }

    fn check_schema(&self) -> Result<(), DomainError> {
        require_text(self.id.as_str(), "id", ElementKind::Nudge)?;
        require_sequence(self.sequence_number, ElementKind::Nudge)?;
        require_text(&self.title, "title", ElementKind::Nudge)?;
        require_text(&self.text, "text", ElementKind::Nudge)?;
        if let Some(image) = &self.image {
            image.validate_as(LinkType::PngImage, "nudge image")?;
        }
        for action in &self.actions {
            action.check_schema()?;
        }
        Ok(())
    }
}

impl_element!(Nudge, ElementKind::Nudge);
