use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::element::{impl_element, require_sequence, require_text, ElementKind};
use crate::shared::{DomainError, ElementId};

/// A reply in the conversation thread of one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default = "ElementId::unassigned")]
    pub id: ElementId,
    #[serde(default)]
    pub sequence_number: i64,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<ElementId>,
    pub posted_by_uid: String,
    pub posted_by_name: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(
        text: impl Into<String>,
        posted_by_uid: impl Into<String>,
        posted_by_name: impl Into<String>,
    ) -> Self {
        Self {
            id: ElementId::unassigned(),
            sequence_number: 0,
            text: text.into(),
            reply_to: None,
            posted_by_uid: posted_by_uid.into(),
            posted_by_name: posted_by_name.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn in_reply_to(mut self, message_id: ElementId) -> Self {
        self.reply_to = Some(message_id);
        self
    }

    fn check_schema(&self) -> Result<(), DomainError> {
        require_text(self.id.as_str(), "id", ElementKind::Message)?;
        require_sequence(self.sequence_number, ElementKind::Message)?;
        require_text(&self.text, "text", ElementKind::Message)?;
        require_text(&self.posted_by_uid, "postedByUid", ElementKind::Message)?;
        require_text(&self.posted_by_name, "postedByName", ElementKind::Message)?;
        if let Some(reply_to) = &self.reply_to {
            if reply_to == &self.id {
                return Err(DomainError::Validation(
                    "a message cannot reply to itself".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl_element!(Message, ElementKind::Message);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;

    #[test]
    fn test_message_validation() {
        let mut message = Message::new("hello", "user-1", "Jane");
        assert!(message.validate().is_err());

        message.id = ElementId::from_string("m1");
        message.sequence_number = 1;
        assert!(message.validate().is_ok());

        message.reply_to = Some(ElementId::from_string("m1"));
        assert!(message.validate().is_err());
    }
}
