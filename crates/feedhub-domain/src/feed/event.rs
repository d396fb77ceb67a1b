use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::value_objects::Flavour;
use crate::element::{impl_element, require_text, ElementKind};
use crate::shared::{Attributes, DomainError, ElementId};

/// Who raised an event and where.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventContext {
    #[serde(default)]
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flavour: Option<Flavour>,
    #[serde(default)]
    pub organization_id: String,
    #[serde(default)]
    pub location_id: String,
    pub timestamp: DateTime<Utc>,
}

impl Default for EventContext {
    fn default() -> Self {
        Self {
            user_id: String::new(),
            flavour: None,
            organization_id: String::new(),
            location_id: String::new(),
            timestamp: Utc::now(),
        }
    }
}

/// A client-emitted signal that is not tied to a specific item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default = "ElementId::unassigned")]
    pub id: ElementId,
    pub name: String,
    #[serde(default)]
    pub context: EventContext,
    #[serde(default)]
    pub payload: Attributes,
}

impl Event {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ElementId::unassigned(),
            name: name.into(),
            context: EventContext::default(),
            payload: Attributes::new(),
        }
    }

    pub fn with_context(mut self, context: EventContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_payload(mut self, payload: Attributes) -> Self {
        self.payload = payload;
        self
    }

    fn check_schema(&self) -> Result<(), DomainError> {
        require_text(self.id.as_str(), "id", ElementKind::Event)?;
        validate_event_name(&self.name)?;
        require_text(&self.context.user_id, "context.userId", ElementKind::Event)?;
        if self.context.flavour.is_none() {
            return Err(DomainError::Validation(
                "event context.flavour is required".to_string(),
            ));
        }
        Ok(())
    }
}

impl_element!(Event, ElementKind::Event);

/// Event names are upper snake case, e.g. `COMPLETE_PROFILE`.
pub fn validate_event_name(name: &str) -> Result<(), DomainError> {
    let well_formed = !name.is_empty()
        && !name.starts_with('_')
        && !name.ends_with('_')
        && !name.contains("__")
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');

    if !well_formed {
        return Err(DomainError::Validation(format!(
            "event name '{name}' must be upper snake case"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;

    fn complete_event() -> Event {
        let mut event = Event::new("VISIT_PROFILE");
        event.id = ElementId::new();
        event.context.user_id = "user-1".to_string();
        event.context.flavour = Some(Flavour::Consumer);
        event
    }

    #[test]
    fn test_event_names() {
        assert!(validate_event_name("PLAY_VIDEO").is_ok());
        assert!(validate_event_name("OPEN").is_ok());
        assert!(validate_event_name("play_video").is_err());
        assert!(validate_event_name("PLAY__VIDEO").is_err());
        assert!(validate_event_name("").is_err());
    }

    #[test]
    fn test_complete_event_validates() {
        assert!(complete_event().validate().is_ok());
    }

    #[test]
    fn test_event_requires_flavour() {
        let mut event = complete_event();
        event.context.flavour = None;
        assert!(matches!(event.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_validate_and_unmarshal_rejects_incomplete_event() {
        let bytes = serde_json::to_vec(&Event::new("OPEN")).unwrap();
        assert!(Event::validate_and_unmarshal(&bytes).is_err());

        let good = complete_event().validate_and_marshal().unwrap();
        let decoded = Event::validate_and_unmarshal(&good).unwrap();
        assert_eq!(decoded.name, "VISIT_PROFILE");
    }
}
