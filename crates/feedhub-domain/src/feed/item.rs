use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::action::Action;
use super::link::Link;
use super::message::Message;
use super::value_objects::{Channel, LinkType, Status, TextType, Visibility};
use crate::element::{impl_element, require_sequence, require_text, ElementKind};
use crate::shared::{DomainError, ElementId};

/// A rich content card in the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(default = "ElementId::unassigned")]
    pub id: ElementId,
    #[serde(default)]
    pub sequence_number: i64,
    pub expiry: DateTime<Utc>,
    #[serde(default)]
    pub persistent: bool,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub visibility: Visibility,
    pub icon: Link,
    pub author: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub label: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub summary: String,
    pub text: String,
    #[serde(default)]
    pub text_type: TextType,
    #[serde(default)]
    pub images: Vec<Link>,
    #[serde(default)]
    pub videos: Vec<Link>,
    #[serde(default)]
    pub documents: Vec<Link>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub conversations: Vec<Message>,
    #[serde(default)]
    pub users: BTreeSet<String>,
    #[serde(default)]
    pub groups: BTreeSet<String>,
    #[serde(default)]
    pub notification_channels: Vec<Channel>,
}

impl Item {
    pub fn new(
        author: impl Into<String>,
        text: impl Into<String>,
        icon: Link,
        expiry: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ElementId::unassigned(),
            sequence_number: 0,
            expiry,
            persistent: false,
            status: Status::Pending,
            visibility: Visibility::Show,
            icon,
            author: author.into(),
            tagline: String::new(),
            label: String::new(),
            timestamp: Utc::now(),
            summary: String::new(),
            text: text.into(),
            text_type: TextType::Plain,
            images: Vec::new(),
            videos: Vec::new(),
            documents: Vec::new(),
            actions: Vec::new(),
            conversations: Vec::new(),
            users: BTreeSet::new(),
            groups: BTreeSet::new(),
            notification_channels: Vec::new(),
        }
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn pinned(mut self) -> Self {
        self.persistent = true;
        self
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry <= now
    }

    pub(crate) fn assign_defaults(&mut self, sequence_number: i64, default_label: &str) {
        if self.id.is_blank() {
            self.id = ElementId::new();
        }
        if self.sequence_number == 0 {
            self.sequence_number = sequence_number;
        }
        if self.label.trim().is_empty() {
            self.label = default_label.to_string();
        }
        for action in &mut self.actions {
            action.assign_defaults(self.sequence_number);
        }
    }

    fn check_schema(&self) -> Result<(), DomainError> {
        require_text(self.id.as_str(), "id", ElementKind::Item)?;
        require_sequence(self.sequence_number, ElementKind::Item)?;
        require_text(&self.author, "author", ElementKind::Item)?;
        require_text(&self.text, "text", ElementKind::Item)?;
        self.icon.validate_as(LinkType::PngImage, "item icon")?;

        for image in &self.images {
            image.validate_as(LinkType::PngImage, "item image")?;
        }
        for video in &self.videos {
            video.validate_as(LinkType::YoutubeVideo, "item video")?;
        }
        for document in &self.documents {
            document.validate_as(LinkType::PdfDocument, "item document")?;
        }
        for action in &self.actions {
            action.check_schema()?;
        }
        Ok(())
    }
}

impl_element!(Item, ElementKind::Item);
