use serde::{Deserialize, Serialize};

use super::event::{validate_event_name, Event};
use super::value_objects::{ActionType, Handling};
use crate::element::{impl_element, require_sequence, require_text, ElementKind};
use crate::shared::{DomainError, ElementId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    #[serde(default = "ElementId::unassigned")]
    pub id: ElementId,
    #[serde(default)]
    pub sequence_number: i64,
    pub name: String,
    pub action_type: ActionType,
    #[serde(default)]
    pub handling: Handling,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<Event>,
}

impl Action {
    pub fn new(name: impl Into<String>, action_type: ActionType, handling: Handling) -> Self {
        Self {
            id: ElementId::unassigned(),
            sequence_number: 0,
            name: name.into(),
            action_type,
            handling,
            event: None,
        }
    }

    pub fn with_event(mut self, event: Event) -> Self {
        self.event = Some(event);
        self
    }

    pub fn is_floating(&self) -> bool {
        self.action_type == ActionType::Floating
    }

    /// Fill in an id and sequence number left blank by the caller.
    pub(crate) fn assign_defaults(&mut self, sequence_number: i64) {
        if self.id.is_blank() {
            self.id = ElementId::new();
        }
        if self.sequence_number == 0 {
            self.sequence_number = sequence_number;
        }
    }

    pub(crate) fn check_schema(&self) -> Result<(), DomainError> {
        require_text(self.id.as_str(), "id", ElementKind::Action)?;
        require_sequence(self.sequence_number, ElementKind::Action)?;
        require_text(&self.name, "name", ElementKind::Action)?;
        // Embedded events are templates; only their name is fixed up front.
        if let Some(event) = &self.event {
            validate_event_name(&event.name)?;
        }
        Ok(())
    }
}

impl_element!(Action, ElementKind::Action);

/// First floating action in a list of embedded actions, if any.
pub(crate) fn find_floating(actions: &[Action]) -> Option<&Action> {
    actions.iter().find(|a| a.is_floating())
}
